//! Player combo components (combo counter, hit check, weapon)

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::combat::damage::DamageProfile;
use crate::timer::{Sequencer, TickDelay};

/// Параметры комбо игрока
#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComboConfig {
    pub max_combo_steps: u8,
    /// Без ввода дольше этого (и не в атаке) → step = 0
    pub combo_reset_time: f32,
    /// Доля длины клипа, на которой проверяется попадание
    pub damage_application_point: f32,
    /// Радиус overlap сферы удара
    pub hit_radius: f32,
    /// Тиков ожидания перехода animator'а перед чтением длины клипа
    pub settle_ticks: u32,
}

impl Default for ComboConfig {
    fn default() -> Self {
        Self {
            max_combo_steps: 3,
            combo_reset_time: 1.0,
            damage_application_point: 0.4,
            hit_radius: 1.2,
            settle_ticks: 2,
        }
    }
}

/// Фаза отложенной проверки попадания
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitCheckPhase {
    /// Ждём clip_length × damage_application_point
    Strike,
}

/// Отложенная проверка попадания (одна на игрока, новая заменяет старую)
#[derive(Debug, Clone, PartialEq)]
pub struct HitCheck {
    pub step: u8,
    pub settle: TickDelay,
    pub strike: Sequencer<HitCheckPhase>,
}

impl HitCheck {
    pub fn new(step: u8, settle_ticks: u32) -> Self {
        Self {
            step,
            settle: TickDelay::new(settle_ticks),
            strike: Sequencer::new(),
        }
    }
}

/// Состояние комбо игрока
#[derive(Component, Debug, Clone, PartialEq, Default)]
pub struct ComboState {
    /// 0 = вне комбо, 1..=max
    pub step: u8,
    pub last_input_time: f32,
    /// Одно-тиковый флаг буферизованного ввода
    pub buffered: bool,
    pub hit_check: Option<HitCheck>,
}

/// Следующий combo step при буферизованном вводе
///
/// - не в атаке или step == 0 → 1
/// - в атаке и step < max → step + 1
/// - в атаке и step == max → 1 (wrap)
pub fn next_combo_step(step: u8, mid_attack: bool, max_steps: u8) -> u8 {
    let max_steps = max_steps.max(1);
    if !mid_attack || step == 0 || step >= max_steps {
        1
    } else {
        step + 1
    }
}

/// Тип оружия в руках
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WeaponType {
    #[default]
    Unarmed,
    Melee,
    Ranged,
}

impl WeaponType {
    /// Оружие, которое бьёт через overlap (кулак/клинок)
    pub fn uses_hit_check(&self) -> bool {
        matches!(self, WeaponType::Unarmed | WeaponType::Melee)
    }
}

/// Экипированное оружие (поставляется inventory/equip системой)
#[derive(Component, Debug, Clone, PartialEq)]
pub struct EquippedWeapon {
    pub kind: WeaponType,
    /// Точка удара (кулак / клинок), локально относительно игрока
    pub hit_origin: Vec3,
    pub damage: DamageProfile,
}

impl Default for EquippedWeapon {
    fn default() -> Self {
        Self::unarmed()
    }
}

impl EquippedWeapon {
    pub fn unarmed() -> Self {
        Self {
            kind: WeaponType::Unarmed,
            hit_origin: Vec3::new(0.0, 1.0, -0.8),
            damage: DamageProfile::new(8),
        }
    }

    pub fn sword(base_damage: u32) -> Self {
        Self {
            kind: WeaponType::Melee,
            hit_origin: Vec3::new(0.0, 1.0, -1.2),
            damage: DamageProfile::new(base_damage),
        }
    }

    pub fn world_hit_origin(&self, transform: &Transform) -> Vec3 {
        transform.transform_point(self.hit_origin)
    }
}

/// Событие: игрок начал атаку (для оружейных систем хоста: выстрел, звук)
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct AttackSignal {
    pub attacker: Entity,
    pub weapon: WeaponType,
    pub step: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_combo_step_rule() {
        assert_eq!(next_combo_step(0, false, 3), 1);
        assert_eq!(next_combo_step(0, true, 3), 1);
        assert_eq!(next_combo_step(2, false, 3), 1);
        assert_eq!(next_combo_step(1, true, 3), 2);
        assert_eq!(next_combo_step(2, true, 3), 3);
        assert_eq!(next_combo_step(3, true, 3), 1);
    }

    #[test]
    fn test_four_buffered_attacks_wrap() {
        let mut step = 0;
        let mut seen = Vec::new();
        for press in 0..4 {
            // Первое нажатие - вне атаки, дальше в атаке
            step = next_combo_step(step, press > 0, 3);
            seen.push(step);
        }
        assert_eq!(seen, vec![1, 2, 3, 1]);
    }

    #[test]
    fn test_weapon_hit_check_kinds() {
        assert!(WeaponType::Unarmed.uses_hit_check());
        assert!(WeaponType::Melee.uses_hit_check());
        assert!(!WeaponType::Ranged.uses_hit_check());
    }

    #[test]
    fn test_world_hit_origin_follows_rotation() {
        let weapon = EquippedWeapon::unarmed();
        let transform = Transform::from_xyz(2.0, 0.0, 0.0);

        let origin = weapon.world_hit_origin(&transform);
        assert!((origin - Vec3::new(2.0, 1.0, -0.8)).length() < 1e-4);
    }
}
