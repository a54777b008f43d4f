//! AI Events - переходы FSM врага (для анимации, звука, UI, тестов)

use bevy::prelude::*;

use crate::ai::EnemyState;

/// Событие: враг сменил состояние
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnemyStateChanged {
    pub entity: Entity,
    pub from: EnemyState,
    pub to: EnemyState,
}
