//! Combat system module
//!
//! ECS ответственность:
//! - Enemy attack sequencer: windup → apply → recover → cooldown
//! - Player combo: input buffering, combo step, отложенный hit check
//! - Damage resolution: critical roll, применение к Health ledger
//! - Death lifecycle: Dead marker, DespawnAfter
//!
//! Хост отвечает за клипы анимаций, звук, VFX (слушает AttackSignal / DamageApplied).

use bevy::prelude::*;

pub mod components;
pub mod damage;
pub mod systems;

// Re-export основных типов
pub use components::*;
pub use damage::{
    critical_damage, resolve_damage, roll_critical, roll_damage, DamageApplied, DamageProfile, DamageWriters,
    EntityDied, ResolvedDamage,
};
pub use systems::{Dead, DespawnAfter};

use crate::{FrameSet, SimulationSet};

/// Combat Plugin
///
/// FixedUpdate:
/// 1. Reactions - hit-stun / смерть врагов (до поведения, чтобы FSM видел оглушение)
/// 2. Attacks - старт атаки, фазы, снятие флага по выходу из анимации, снаряды
/// 3. Cleanup - деспавн по таймауту
///
/// Update:
/// - Combo - смерть игрока, буфер ввода, combo step
/// - HitDetection - отложенные проверки попадания (после тика анимаций)
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        // Регистрация событий
        app.add_event::<DamageApplied>()
            .add_event::<EntityDied>()
            .add_event::<AttackSignal>();

        app.add_systems(
            FixedUpdate,
            (
                (
                    crate::ai::systems::handle_enemy_death,
                    crate::ai::systems::enemy_hit_stun_on_damage,
                )
                    .chain()
                    .in_set(SimulationSet::Reactions),
                (
                    systems::enemy_attack_animation_exit,
                    systems::enemy_attack_start,
                    systems::enemy_attack_tick,
                    systems::advance_projectiles,
                )
                    .chain()
                    .in_set(SimulationSet::Attacks),
                systems::despawn_after_timeout.in_set(SimulationSet::Cleanup),
            ),
        );

        app.add_systems(
            Update,
            (
                (
                    systems::handle_player_death,
                    systems::buffer_attack_input,
                    systems::advance_combo,
                )
                    .chain()
                    .in_set(FrameSet::Combo),
                systems::run_hit_checks.in_set(FrameSet::HitDetection),
            ),
        );
    }
}
