//! Enemy locomotion: state → NavAgent destination.
//!
//! - Patrol: случайная точка вокруг spawn, пауза на прибытии
//! - Engaged: destination = игрок (кроме stopping_distance_engaged)
//! - HitStunned / mid-attack / halted: velocity = 0, destination не трогаем

use bevy::prelude::*;
use rand::Rng;

use super::{player_snapshot, PlayerView};
use crate::ai::{EnemyBrain, EnemyConfig, EnemyState, PatrolPhase};
use crate::animation::{AnimParam, Animator};
use crate::combat::EnemyAttacker;
use crate::components::{CombatDisabled, Enemy, SpawnPoint};
use crate::navigation::{flat_distance, pick_patrol_destination, NavAgent, NavigationSurface};
use crate::DeterministicRng;

/// Ниже этой скорости animator считает актора стоящим
const MOVING_SPEED_THRESHOLD: f32 = 0.05;

/// System: enemy locomotion (FixedUpdate, после FSM transitions)
pub fn enemy_locomotion(
    mut enemies: Query<
        (
            &mut EnemyBrain,
            &EnemyConfig,
            &Transform,
            &SpawnPoint,
            &mut NavAgent,
            &mut Animator,
            Option<&EnemyAttacker>,
        ),
        (With<Enemy>, Without<CombatDisabled>),
    >,
    players: PlayerView,
    surface: Res<NavigationSurface>,
    mut rng: ResMut<DeterministicRng>,
    time: Res<Time>,
) {
    let now = time.elapsed_secs();
    let player = player_snapshot(&players);

    for (mut brain, config, transform, spawn, mut nav, mut animator, attacker) in enemies.iter_mut() {
        let mid_attack = attacker.is_some_and(|attacker| attacker.currently_attacking);
        let frozen = brain.halted
            || brain.state == EnemyState::Dead
            || brain.state == EnemyState::HitStunned
            || mid_attack;

        if frozen {
            nav.stop();
            animator.set_speed(0.0).ok();
            animator.set_bool(AnimParam::IsMoving, false).ok();
            continue;
        }

        let position = transform.translation;

        match brain.state {
            EnemyState::Patrol => {
                nav.resume();

                let wait_over = brain.patrol_wait.poll(now).is_some();
                if brain.needs_patrol_destination || wait_over {
                    let destination = pick_patrol_destination(
                        spawn.0,
                        config.patrol_radius,
                        config.patrol_sample_attempts,
                        config.nav_sample_distance,
                        &*surface,
                        &mut rng.rng,
                    );
                    nav.set_destination(destination);
                    brain.needs_patrol_destination = false;
                } else if !brain.patrol_wait.is_pending()
                    && !nav.is_path_pending()
                    && nav.remaining_distance(position) <= config.arrival_threshold
                {
                    let wait = if config.patrol_wait_max > config.patrol_wait_min {
                        rng.rng.gen_range(config.patrol_wait_min..=config.patrol_wait_max)
                    } else {
                        config.patrol_wait_min
                    };
                    brain.patrol_wait.start(PatrolPhase::Waiting, now, wait);
                }
            }
            EnemyState::Engaged => {
                let Some(player) = player else {
                    nav.stop();
                    animator.set_speed(0.0).ok();
                    animator.set_bool(AnimParam::IsMoving, false).ok();
                    continue;
                };

                if flat_distance(position, player.position) > config.stopping_distance_engaged {
                    nav.resume();
                    nav.set_destination(player.position);
                } else {
                    nav.stop();
                }
            }
            EnemyState::HitStunned | EnemyState::Dead => {}
        }

        let speed = nav.current_velocity().length();
        animator.set_speed(speed).ok();
        animator.set_bool(AnimParam::IsMoving, speed > MOVING_SPEED_THRESHOLD).ok();
    }
}
