//! Enemy attack components: lifecycle state, attacker, config.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::animation::ClipId;
use crate::combat::damage::DamageProfile;
use crate::timer::Sequencer;

/// Фазы жизненного цикла атаки врага
///
/// Idle → Windup → Apply → Recover → Cooldown → Idle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EnemyAttackState {
    #[default]
    Idle,
    /// Замах: ждём damage_application_delay
    Windup,
    /// Момент удара (guard: жив И всё ещё currently_attacking)
    Apply,
    /// Восстановление: ждём recovery_time, потом снимаем флаг
    Recover,
    /// Кулдаун до следующей атаки
    Cooldown,
}

/// Тип атаки врага
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EnemyAttackKind {
    #[default]
    Melee,
    Ranged,
}

/// Параметры атаки врага
#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyAttackConfig {
    pub kind: EnemyAttackKind,
    /// Windup → Apply (секунды)
    pub damage_application_delay: f32,
    pub recovery_time: f32,
    pub attack_cooldown: f32,
    pub damage: DamageProfile,
    /// Melee: радиус overlap сферы
    pub melee_radius: f32,
    /// Melee: точка удара (локально: вперёд / вверх от Transform)
    pub attack_origin_forward: f32,
    pub attack_origin_height: f32,
    /// Ranged
    pub projectile_speed: f32,
    pub projectile_radius: f32,
}

impl Default for EnemyAttackConfig {
    fn default() -> Self {
        Self {
            kind: EnemyAttackKind::Melee,
            damage_application_delay: 0.5,
            recovery_time: 0.6,
            attack_cooldown: 1.5,
            damage: DamageProfile::default(),
            melee_radius: 1.0,
            attack_origin_forward: 1.0,
            attack_origin_height: 1.0,
            projectile_speed: 12.0,
            projectile_radius: 0.2,
        }
    }
}

impl EnemyAttackConfig {
    pub fn ranged() -> Self {
        Self {
            kind: EnemyAttackKind::Ranged,
            ..Self::default()
        }
    }

    /// Мировая точка удара / спавна снаряда
    pub fn attack_origin(&self, transform: &Transform) -> Vec3 {
        transform.translation
            + transform.forward() * self.attack_origin_forward
            + Vec3::Y * self.attack_origin_height
    }
}

/// Attack sequencer врага
///
/// Только один lifecycle на врага: новая атака не стартует,
/// пока `currently_attacking` или state == Cooldown.
#[derive(Component, Debug, Clone, PartialEq, Default)]
pub struct EnemyAttacker {
    pub state: EnemyAttackState,
    /// Снимается: Recover timeout, выход из attack animation, hit-stun, смерть
    pub currently_attacking: bool,
    /// Serial attack клипа текущего lifecycle (выход чужого клипа флаг не снимает)
    pub attack_clip: Option<ClipId>,
    pub sequencer: Sequencer<EnemyAttackState>,
}

impl EnemyAttacker {
    pub fn is_idle(&self) -> bool {
        self.state == EnemyAttackState::Idle
    }

    pub fn can_start(&self) -> bool {
        !self.currently_attacking && self.state == EnemyAttackState::Idle
    }

    /// Снять флаг атаки (идемпотентно). Возвращает true, если флаг был поднят.
    pub fn clear_attacking(&mut self) -> bool {
        std::mem::replace(&mut self.currently_attacking, false)
    }

    /// Выход клипа `clip` относится к текущей атаке?
    pub fn owns_clip(&self, clip: ClipId) -> bool {
        self.attack_clip == Some(clip)
    }

    /// Отмена всех pending фаз (смерть)
    pub fn cancel(&mut self) {
        self.sequencer.cancel();
        self.currently_attacking = false;
        self.attack_clip = None;
        self.state = EnemyAttackState::Idle;
    }
}
