//! Simulation errors
//!
//! Ошибки возвращаются только из setup-кода (tuning, capabilities, spawn).
//! Системы тика никогда не пробрасывают ошибки - актор деградирует (см. `CombatDisabled`).

use bevy::prelude::Entity;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimulationError {
    /// Обязательный коллаборатор отсутствует (player, animator, nav agent, attack origin)
    #[error("{owner:?}: missing required reference `{what}`")]
    MissingReference { owner: Entity, what: &'static str },

    /// Параметр tuning вне допустимого диапазона и не может быть автокорректирован
    #[error("invalid tuning value `{field}`: {reason}")]
    InvalidTuning { field: &'static str, reason: String },

    /// RON документ с tuning не распарсился
    #[error("failed to parse combat tuning: {0}")]
    TuningParse(#[from] ron::error::SpannedError),
}
