//! Enemy attack sequencer systems.
//!
//! Lifecycle (FixedUpdate):
//! 1. Windup - поворот к игроку (yaw), триггер анимации, currently_attacking = true
//! 2. Apply - guard (жив И currently_attacking) → melee overlap / ranged projectile
//! 3. Recover - снимаем currently_attacking (анимация могла снять раньше, double clear безопасен)
//! 4. Cooldown → Idle
//!
//! Выход attack клипа снимает флаг только своего lifecycle: клип прошлого замаха,
//! прерванный новым триггером, новую атаку не отменяет.

use bevy::prelude::*;

use crate::ai::systems::{perceive, player_snapshot, PlayerView};
use crate::ai::{EnemyBrain, EnemyConfig, EnemyState};
use crate::animation::{AnimTrigger, AnimationStateExited, Animator, StateTag};
use crate::combat::components::projectile::{spawn_projectile, ProjectileInit};
use crate::combat::damage::{roll_damage, DamageWriters};
use crate::combat::{EnemyAttackConfig, EnemyAttackKind, EnemyAttackState, EnemyAttacker};
use crate::components::{CombatDisabled, Enemy, Health, Player};
use crate::config::CombatTuning;
use crate::spatial::{face_towards_flat, SpatialIndex, SpatialQuery, LAYER_PLAYER};
use crate::DeterministicRng;

/// System: старт атаки (gate по movement state)
///
/// Gate: Engaged, distance ≤ attack_range, LOS, игрок жив, атака не идёт, не Cooldown.
pub fn enemy_attack_start(
    mut enemies: Query<
        (
            Entity,
            &EnemyBrain,
            &EnemyConfig,
            &EnemyAttackConfig,
            &mut EnemyAttacker,
            &mut Transform,
            &mut Animator,
            &Health,
        ),
        (With<Enemy>, Without<Player>, Without<CombatDisabled>),
    >,
    players: PlayerView,
    index: Res<SpatialIndex>,
    time: Res<Time>,
) {
    let now = time.elapsed_secs();
    let Some(player) = player_snapshot(&players) else {
        return;
    };

    for (entity, brain, config, attack, mut attacker, mut transform, mut animator, health) in enemies.iter_mut() {
        if brain.state != EnemyState::Engaged || health.is_dead() || !attacker.can_start() {
            continue;
        }

        let perception = perceive(&transform, config, &player, false, &index);
        let in_range = perception
            .distance
            .is_some_and(|distance| distance <= config.attack_range);
        if !in_range || !perception.line_of_sight {
            continue;
        }

        // Windup
        face_towards_flat(&mut transform, player.position);
        attacker.attack_clip = match animator.trigger(AnimTrigger::Attack { step: 0 }) {
            Ok(clip) => Some(clip),
            Err(err) => {
                crate::logger::log(&format!("{:?}: {}", entity, err));
                None
            }
        };
        attacker.currently_attacking = true;
        attacker.state = EnemyAttackState::Windup;
        attacker
            .sequencer
            .start(EnemyAttackState::Windup, now, attack.damage_application_delay);

        crate::logger::log(&format!(
            "⚔️ {:?}: {:?} windup → {:?} ({:.2}s)",
            entity, attack.kind, player.entity, attack.damage_application_delay
        ));
    }
}

/// System: продвижение фаз атаки (resume points)
///
/// Нулевые длительности проходятся за один тик.
#[allow(clippy::too_many_arguments)]
pub fn enemy_attack_tick(
    mut commands: Commands,
    mut enemies: Query<
        (Entity, &EnemyAttackConfig, &mut EnemyAttacker, &Transform, &Health),
        (With<Enemy>, Without<Player>, Without<CombatDisabled>),
    >,
    mut players: Query<(Entity, &mut Health), (With<Player>, Without<Enemy>)>,
    index: Res<SpatialIndex>,
    tuning: Res<CombatTuning>,
    mut rng: ResMut<DeterministicRng>,
    mut writers: DamageWriters,
    time: Res<Time>,
) {
    let now = time.elapsed_secs();

    for (entity, attack, mut attacker, transform, health) in enemies.iter_mut() {
        if health.is_dead() {
            if attacker.sequencer.is_pending() {
                attacker.cancel();
            }
            continue;
        }

        while let Some(phase) = attacker.sequencer.poll(now) {
            match phase {
                EnemyAttackState::Windup => {
                    attacker.state = EnemyAttackState::Apply;

                    if health.is_alive() && attacker.currently_attacking {
                        match attack.kind {
                            EnemyAttackKind::Melee => {
                                let origin = attack.attack_origin(transform);
                                let hits = index.overlap_volume(origin, attack.melee_radius, LAYER_PLAYER);

                                // Первый найденный игрок - и стоп
                                let victim = hits.into_iter().find(|hit| players.contains(*hit));
                                match victim {
                                    Some(victim) => {
                                        if let Ok((_, mut victim_health)) = players.get_mut(victim) {
                                            let damage = roll_damage(&attack.damage, &mut rng.rng);
                                            let change = writers.deal(entity, victim, &mut victim_health, damage);
                                            crate::logger::log(&format!(
                                                "🗡️ {:?} hit {:?} for {} (crit: {}, hp left {})",
                                                entity, victim, change.dealt, damage.is_critical, change.new_health
                                            ));
                                        }
                                    }
                                    None => {
                                        crate::logger::log(&format!("{:?}: melee swing missed", entity));
                                    }
                                }
                            }
                            EnemyAttackKind::Ranged => {
                                if let Ok((target, _)) = players.single() {
                                    let origin = attack.attack_origin(transform);
                                    spawn_projectile(
                                        &mut commands,
                                        origin,
                                        transform.rotation,
                                        ProjectileInit {
                                            owner: entity,
                                            target,
                                            speed: attack.projectile_speed,
                                            damage: attack.damage,
                                            target_layer: LAYER_PLAYER,
                                            radius: attack.projectile_radius,
                                            max_lifetime: tuning.lifecycle.projectile_max_lifetime,
                                        },
                                    );
                                }
                            }
                        }
                    } else {
                        crate::logger::log(&format!("{:?}: attack apply skipped (interrupted)", entity));
                    }

                    attacker.state = EnemyAttackState::Recover;
                    attacker
                        .sequencer
                        .start(EnemyAttackState::Recover, now, attack.recovery_time);
                }
                EnemyAttackState::Recover => {
                    attacker.clear_attacking();
                    attacker.state = EnemyAttackState::Cooldown;
                    attacker
                        .sequencer
                        .start(EnemyAttackState::Cooldown, now, attack.attack_cooldown);
                }
                EnemyAttackState::Cooldown | EnemyAttackState::Idle | EnemyAttackState::Apply => {
                    attacker.state = EnemyAttackState::Idle;
                }
            }
        }
    }
}

/// System: выход из attack animation снимает флаг атаки (идемпотентно)
///
/// Выходы клипов прошлых атак игнорируются.
pub fn enemy_attack_animation_exit(
    mut exited_events: EventReader<AnimationStateExited>,
    mut attackers: Query<&mut EnemyAttacker, With<Enemy>>,
) {
    for event in exited_events.read() {
        if event.tag != StateTag::Attack {
            continue;
        }
        let Ok(mut attacker) = attackers.get_mut(event.entity) else {
            continue;
        };
        if !attacker.owns_clip(event.clip) {
            crate::logger::log(&format!(
                "{:?}: stale attack clip {} exited (current {:?})",
                event.entity, event.clip, attacker.attack_clip
            ));
            continue;
        }
        if attacker.clear_attacking() {
            crate::logger::log(&format!(
                "{:?}: attack flag cleared by animation exit ({:?})",
                event.entity, attacker.state
            ));
        }
    }
}
