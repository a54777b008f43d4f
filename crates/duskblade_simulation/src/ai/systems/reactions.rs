//! AI reaction systems (hit-stun, death).

use bevy::prelude::*;

use crate::ai::{EnemyBrain, EnemyConfig, EnemyState, EnemyStateChanged};
use crate::animation::{AnimTrigger, Animator};
use crate::combat::{DamageApplied, Dead, DespawnAfter, EnemyAttacker, EntityDied};
use crate::components::Enemy;
use crate::config::CombatTuning;
use crate::navigation::NavAgent;
use crate::spatial::CollisionBody;

/// System: non-lethal урон → HitStunned
///
/// - запоминает previous_state (повторный stun только перезапускает таймер)
/// - снимает `currently_attacking` → Apply фаза атаки будет пропущена
/// - останавливает навигацию
pub fn enemy_hit_stun_on_damage(
    mut damage_events: EventReader<DamageApplied>,
    mut enemies: Query<
        (&mut EnemyBrain, &EnemyConfig, &mut NavAgent, &mut Animator, Option<&mut EnemyAttacker>),
        With<Enemy>,
    >,
    time: Res<Time>,
    mut state_events: EventWriter<EnemyStateChanged>,
) {
    let now = time.elapsed_secs();

    for event in damage_events.read() {
        if event.target_died || event.amount == 0 {
            continue;
        }

        let Ok((mut brain, config, mut nav, mut animator, attacker)) = enemies.get_mut(event.target) else {
            continue;
        };

        if brain.is_dead() {
            continue;
        }

        let from = brain.state;
        brain.enter_hit_stun(now, config.hit_stun_duration);

        if let Some(mut attacker) = attacker {
            if attacker.clear_attacking() {
                crate::logger::log(&format!("⚡ {:?}: attack interrupted by hit-stun", event.target));
            }
        }

        nav.stop();
        if let Err(err) = animator.trigger(AnimTrigger::HitReact) {
            crate::logger::log(&format!("{:?}: {}", event.target, err));
        }

        if from != EnemyState::HitStunned {
            crate::logger::log(&format!(
                "💫 {:?}: {:?} → HitStunned ({} damage from {:?})",
                event.target, from, event.amount, event.attacker
            ));
            state_events.write(EnemyStateChanged {
                entity: event.target,
                from,
                to: EnemyState::HitStunned,
            });
        }
    }
}

/// System: смерть врага → Dead (terminal)
///
/// Смерть - авторитетный триггер отмены: все pending фазы атаки/оглушения сбрасываются,
/// навигация останавливается, коллайдер выключается, через death_cleanup_delay - деспавн.
pub fn handle_enemy_death(
    mut commands: Commands,
    mut death_events: EventReader<EntityDied>,
    mut enemies: Query<
        (
            &mut EnemyBrain,
            &mut NavAgent,
            &mut Animator,
            Option<&mut EnemyAttacker>,
            Option<&mut CollisionBody>,
        ),
        With<Enemy>,
    >,
    tuning: Res<CombatTuning>,
    time: Res<Time>,
    mut state_events: EventWriter<EnemyStateChanged>,
) {
    let now = time.elapsed_secs();

    for event in death_events.read() {
        let Ok((mut brain, mut nav, mut animator, attacker, body)) = enemies.get_mut(event.entity) else {
            continue;
        };

        if brain.is_dead() {
            continue;
        }

        let from = brain.state;
        brain.state = EnemyState::Dead;
        brain.previous_state = None;
        brain.stun.cancel();
        brain.patrol_wait.cancel();

        if let Some(mut attacker) = attacker {
            attacker.cancel();
        }
        if let Some(mut body) = body {
            body.enabled = false;
        }
        nav.stop();
        animator.trigger(AnimTrigger::Death).ok();

        commands.entity(event.entity).insert((
            Dead,
            DespawnAfter {
                despawn_time: now + tuning.lifecycle.death_cleanup_delay,
            },
        ));

        crate::logger::log_info(&format!(
            "☠️ {:?}: {:?} → Dead (killer {:?}), despawn in {:.1}s",
            event.entity, from, event.killer, tuning.lifecycle.death_cleanup_delay
        ));
        state_events.write(EnemyStateChanged {
            entity: event.entity,
            from,
            to: EnemyState::Dead,
        });
    }
}
