//! Combat tuning (один ресурс на всю симуляцию)
//!
//! Все параметры имеют defaults, RON документ может переопределить любое подмножество:
//!
//! ```ron
//! (
//!     enemy: (aggro_range: 12.0),
//!     combo: (max_combo_steps: 4),
//! )
//! ```
//!
//! `validated()` автокорректирует то, что можно исправить (warning в лог),
//! и возвращает `SimulationError::InvalidTuning` для остального.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::ai::EnemyConfig;
use crate::combat::{ComboConfig, EnemyAttackConfig};
use crate::error::SimulationError;
use crate::targeting::LockOnConfig;

/// Жизненный цикл акторов и снарядов
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Смерть врага → деспавн (секунды)
    pub death_cleanup_delay: f32,
    pub projectile_max_lifetime: f32,
    pub player_max_health: u32,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            death_cleanup_delay: 3.0,
            projectile_max_lifetime: 5.0,
            player_max_health: 100,
        }
    }
}

#[derive(Resource, Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatTuning {
    pub enemy: EnemyConfig,
    pub enemy_attack: EnemyAttackConfig,
    pub combo: ComboConfig,
    pub lock_on: LockOnConfig,
    pub lifecycle: LifecycleConfig,
}

fn non_negative(field: &'static str, value: f32) -> Result<(), SimulationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(SimulationError::InvalidTuning {
            field,
            reason: format!("expected finite value >= 0, got {}", value),
        });
    }
    Ok(())
}

fn positive(field: &'static str, value: f32) -> Result<(), SimulationError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(SimulationError::InvalidTuning {
            field,
            reason: format!("expected finite value > 0, got {}", value),
        });
    }
    Ok(())
}

impl CombatTuning {
    /// Парсинг RON + валидация
    pub fn from_ron_str(source: &str) -> Result<Self, SimulationError> {
        let tuning: CombatTuning = ron::from_str(source)?;
        tuning.validated()
    }

    pub fn validated(mut self) -> Result<Self, SimulationError> {
        let enemy = &self.enemy;
        positive("enemy.aggro_range", enemy.aggro_range)?;
        positive("enemy.attack_range", enemy.attack_range)?;
        non_negative("enemy.stopping_distance_engaged", enemy.stopping_distance_engaged)?;
        non_negative("enemy.patrol_radius", enemy.patrol_radius)?;
        non_negative("enemy.patrol_wait_min", enemy.patrol_wait_min)?;
        non_negative("enemy.patrol_wait_max", enemy.patrol_wait_max)?;
        non_negative("enemy.hit_stun_duration", enemy.hit_stun_duration)?;
        positive("enemy.disengage_multiplier", enemy.disengage_multiplier)?;
        non_negative("enemy.move_speed", enemy.move_speed)?;
        self.enemy = self.enemy.validated();

        let attack = &self.enemy_attack;
        non_negative("enemy_attack.damage_application_delay", attack.damage_application_delay)?;
        non_negative("enemy_attack.recovery_time", attack.recovery_time)?;
        non_negative("enemy_attack.attack_cooldown", attack.attack_cooldown)?;
        non_negative("enemy_attack.melee_radius", attack.melee_radius)?;
        non_negative("enemy_attack.projectile_speed", attack.projectile_speed)?;
        non_negative("enemy_attack.damage.critical_chance", attack.damage.critical_chance)?;

        let combo = &mut self.combo;
        non_negative("combo.combo_reset_time", combo.combo_reset_time)?;
        non_negative("combo.damage_application_point", combo.damage_application_point)?;
        non_negative("combo.hit_radius", combo.hit_radius)?;
        if combo.max_combo_steps == 0 {
            crate::logger::log_warning("CombatTuning: combo.max_combo_steps 0, raised to 1");
            combo.max_combo_steps = 1;
        }

        let lock_on = &self.lock_on;
        positive("lock_on.max_lock_distance", lock_on.max_lock_distance)?;
        positive("lock_on.lock_angle", lock_on.lock_angle)?;
        positive("lock_on.release_distance_multiplier", lock_on.release_distance_multiplier)?;
        positive("lock_on.release_angle_multiplier", lock_on.release_angle_multiplier)?;

        let lifecycle = &mut self.lifecycle;
        non_negative("lifecycle.death_cleanup_delay", lifecycle.death_cleanup_delay)?;
        positive("lifecycle.projectile_max_lifetime", lifecycle.projectile_max_lifetime)?;
        if lifecycle.player_max_health == 0 {
            crate::logger::log_warning("CombatTuning: lifecycle.player_max_health 0, raised to 1");
            lifecycle.player_max_health = 1;
        }

        Ok(self)
    }
}
