//! Enemy FSM transitions system.

use bevy::prelude::*;

use super::{perceive, player_snapshot, PlayerView};
use crate::ai::{evaluate_transition, stun_exit_state, EnemyBrain, EnemyConfig, EnemyState, EnemyStateChanged};
use crate::combat::EnemyAttacker;
use crate::components::{CombatDisabled, Enemy, Health};
use crate::spatial::SpatialIndex;

/// System: FSM transitions (Patrol ↔ Engaged, выход из HitStunned)
///
/// Dead и вход в HitStunned - в reactions (event-driven).
/// Игрок пропал → враг halted (лог один раз), переходов нет.
pub fn enemy_fsm_transitions(
    mut enemies: Query<
        (Entity, &mut EnemyBrain, &EnemyConfig, &Transform, &Health, Option<&EnemyAttacker>),
        (With<Enemy>, Without<CombatDisabled>),
    >,
    players: PlayerView,
    index: Res<SpatialIndex>,
    time: Res<Time>,
    mut state_events: EventWriter<EnemyStateChanged>,
) {
    let now = time.elapsed_secs();
    let player = player_snapshot(&players);

    for (entity, mut brain, config, transform, health, attacker) in enemies.iter_mut() {
        if brain.is_dead() || health.is_dead() {
            continue;
        }

        let Some(player) = player else {
            if !brain.halted {
                brain.halted = true;
                crate::logger::log_warning(&format!("{:?}: player missing → enemy halted", entity));
            }
            continue;
        };

        if brain.halted {
            brain.halted = false;
            crate::logger::log(&format!("{:?}: player found → enemy resumed", entity));
        }

        let mid_attack = attacker.is_some_and(|attacker| attacker.currently_attacking);
        let perception = perceive(transform, config, &player, mid_attack, &index);

        let next = if brain.state == EnemyState::HitStunned {
            brain.stun.poll(now).map(|_| {
                let previous = brain.previous_state.take();
                stun_exit_state(previous, &perception, config)
            })
        } else {
            evaluate_transition(brain.state, &perception, config)
        };

        let Some(next) = next else {
            continue;
        };

        let from = brain.transition(next);
        crate::logger::log(&format!(
            "🧠 {:?}: {:?} → {:?} (distance {:?}, los {})",
            entity, from, next, perception.distance, perception.line_of_sight
        ));
        state_events.write(EnemyStateChanged { entity, from, to: next });
    }
}
