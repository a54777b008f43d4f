//! Damage resolution
//!
//! Чистые функции (critical roll, final damage) + события и единая точка
//! применения урона к Health ledger (`DamageWriters::deal`).
//!
//! Формула:
//! - roll < critical_chance → round(base × critical_multiplier), is_critical
//! - иначе → base

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::components::{Health, HealthChange};

/// Параметры урона атаки
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DamageProfile {
    pub base_damage: u32,
    /// [0, 1]
    pub critical_chance: f32,
    pub critical_multiplier: f32,
}

impl Default for DamageProfile {
    fn default() -> Self {
        Self {
            base_damage: 10,
            critical_chance: 0.1,
            critical_multiplier: 1.5,
        }
    }
}

impl DamageProfile {
    pub fn new(base_damage: u32) -> Self {
        Self {
            base_damage,
            ..Self::default()
        }
    }

    pub fn with_critical(mut self, chance: f32, multiplier: f32) -> Self {
        self.critical_chance = chance;
        self.critical_multiplier = multiplier;
        self
    }
}

/// Итоговый урон одного попадания
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDamage {
    pub amount: u32,
    pub is_critical: bool,
}

/// Critical roll: `roll` ∈ [0, 1)
pub fn roll_critical(chance: f32, roll: f32) -> bool {
    roll < chance.clamp(0.0, 1.0)
}

pub fn critical_damage(base: u32, multiplier: f32) -> u32 {
    (base as f32 * multiplier.max(0.0)).round() as u32
}

/// Итоговый урон для заданного roll (детерминированно)
pub fn resolve_damage(profile: &DamageProfile, roll: f32) -> ResolvedDamage {
    if roll_critical(profile.critical_chance, roll) {
        ResolvedDamage {
            amount: critical_damage(profile.base_damage, profile.critical_multiplier),
            is_critical: true,
        }
    } else {
        ResolvedDamage {
            amount: profile.base_damage,
            is_critical: false,
        }
    }
}

/// Roll из RNG + resolve
pub fn roll_damage(profile: &DamageProfile, rng: &mut impl Rng) -> ResolvedDamage {
    resolve_damage(profile, rng.gen::<f32>())
}

/// Событие: урон применён к ledger'у
///
/// Чистое наблюдение: floaters, listeners, hit-stun.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct DamageApplied {
    pub attacker: Entity,
    pub target: Entity,
    pub amount: u32,
    pub is_critical: bool,
    pub remaining_health: u32,
    pub target_died: bool,
}

/// Событие: entity умер (ровно один раз на смерть)
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct EntityDied {
    pub entity: Entity,
    pub killer: Option<Entity>,
}

/// Единая точка применения урона (ledger + события)
#[derive(SystemParam)]
pub struct DamageWriters<'w> {
    applied: EventWriter<'w, DamageApplied>,
    died: EventWriter<'w, EntityDied>,
}

impl DamageWriters<'_> {
    /// Применить урон к живому ledger'у. Мёртвый - no-op без событий.
    pub fn deal(
        &mut self,
        attacker: Entity,
        target: Entity,
        health: &mut Health,
        damage: ResolvedDamage,
    ) -> HealthChange {
        if health.is_dead() {
            return health.apply_damage(0, damage.is_critical);
        }

        let amount = i32::try_from(damage.amount).unwrap_or(i32::MAX);
        let change = health.apply_damage(amount, damage.is_critical);

        self.applied.write(DamageApplied {
            attacker,
            target,
            amount: change.dealt,
            is_critical: damage.is_critical,
            remaining_health: change.new_health,
            target_died: change.just_died,
        });

        if change.just_died {
            crate::logger::log_info(&format!("💀 {:?} killed by {:?}", target, attacker));
            self.died.write(EntityDied {
                entity: target,
                killer: Some(attacker),
            });
        }

        change
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_critical_is_rounded() {
        let profile = DamageProfile::new(15).with_critical(0.25, 1.5);

        // 15 × 1.5 = 22.5 → 23
        assert_eq!(
            resolve_damage(&profile, 0.1),
            ResolvedDamage {
                amount: 23,
                is_critical: true
            }
        );
        assert_eq!(
            resolve_damage(&profile, 0.25),
            ResolvedDamage {
                amount: 15,
                is_critical: false
            }
        );
    }

    #[test]
    fn test_critical_property_over_bases() {
        for base in [0u32, 1, 7, 10, 33, 100, 999] {
            for multiplier in [1.0f32, 1.25, 1.5, 2.0, 2.5] {
                let profile = DamageProfile::new(base).with_critical(0.5, multiplier);
                let expected = (base as f32 * multiplier).round() as u32;

                assert_eq!(resolve_damage(&profile, 0.49).amount, expected);
                assert_eq!(resolve_damage(&profile, 0.5).amount, base);
            }
        }
    }

    #[test]
    fn test_zero_chance_never_crits() {
        let profile = DamageProfile::new(10).with_critical(0.0, 3.0);
        assert!(!resolve_damage(&profile, 0.0).is_critical);
    }

    #[test]
    fn test_full_chance_always_crits() {
        let profile = DamageProfile::new(10).with_critical(1.0, 2.0);
        assert!(resolve_damage(&profile, 0.999).is_critical);
        assert_eq!(resolve_damage(&profile, 0.999).amount, 20);
    }
}
