//! Enemy AI module
//!
//! Movement FSM врага: Patrol / Engaged / HitStunned / Dead.
//! Атаки врага гейтятся этим состоянием (см. combat::systems::enemy_attack).

use bevy::prelude::*;

pub mod components;
pub mod events;
pub mod systems;

// Re-export основных типов
pub use components::*;
pub use events::EnemyStateChanged;

/// AI Plugin
///
/// Регистрирует AI системы в FixedUpdate для детерминизма.
/// Порядок выполнения:
/// 1. enemy_fsm_transitions - обновление FSM state
/// 2. enemy_locomotion - state → NavAgent destination
/// 3. drive_nav_agents - кинематический шаг
///
/// Реакции (hit-stun, death) регистрирует CombatPlugin после атак.
pub struct AIPlugin;

impl Plugin for AIPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<EnemyStateChanged>().add_systems(
            FixedUpdate,
            (
                systems::enemy_fsm_transitions,
                systems::enemy_locomotion,
                crate::navigation::drive_nav_agents,
            )
                .chain() // Последовательное выполнение для детерминизма
                .in_set(crate::SimulationSet::Behavior),
        );
    }
}
