//! Player combo systems (Update).
//!
//! Порядок в кадре:
//! 1. handle_player_death - смерть отменяет pending hit check, блокирует движение
//! 2. buffer_attack_input - AttackPressed → buffered (одно-тиковый флаг)
//! 3. advance_combo - reset по таймауту, следующий step, триггер анимации, hit check
//! 4. tick_animators (animation)
//! 5. run_hit_checks - settle ticks → clip_length × point → overlap по врагам

use bevy::prelude::*;

use crate::animation::{AnimTrigger, Animator, StateTag};
use crate::combat::damage::{roll_damage, DamageWriters};
use crate::combat::{next_combo_step, AttackSignal, ComboConfig, ComboState, Dead, EntityDied, EquippedWeapon, HitCheck, HitCheckPhase};
use crate::components::{CombatDisabled, Enemy, Health, Player};
use crate::player::{PlayerAction, PlayerMotion, PointerOverUi};
use crate::spatial::{face_towards_flat, SpatialIndex, SpatialQuery, LAYER_ENEMY};
use crate::targeting::{TargetLock, TargetLockChanged};
use crate::DeterministicRng;

/// System: смерть игрока
///
/// can_move = false, pending hit check отменяется, lock сбрасывается.
pub fn handle_player_death(
    mut commands: Commands,
    mut death_events: EventReader<EntityDied>,
    mut players: Query<(&mut PlayerMotion, &mut ComboState, &mut Animator), With<Player>>,
    mut lock: ResMut<TargetLock>,
    mut lock_events: EventWriter<TargetLockChanged>,
) {
    for event in death_events.read() {
        let Ok((mut motion, mut combo, mut animator)) = players.get_mut(event.entity) else {
            continue;
        };

        motion.can_move = false;
        combo.buffered = false;
        combo.step = 0;
        if combo.hit_check.take().is_some() {
            crate::logger::log("player death: pending hit check cancelled");
        }
        animator.trigger(AnimTrigger::Death).ok();

        if let Some(previous) = lock.clear() {
            lock_events.write(TargetLockChanged {
                previous: Some(previous),
                current: None,
            });
        }

        commands.entity(event.entity).insert(Dead);
        crate::logger::log_info(&format!("☠️ Player {:?} died (killer {:?})", event.entity, event.killer));
    }
}

/// System: буферизация ввода атаки
///
/// Буферизуем только если игрок может двигаться ИЛИ уже в attack animation.
pub fn buffer_attack_input(
    mut actions: EventReader<PlayerAction>,
    pointer: Res<PointerOverUi>,
    mut players: Query<(&mut ComboState, &PlayerMotion, &Animator, &Health), (With<Player>, Without<CombatDisabled>)>,
) {
    for action in actions.read() {
        if *action != PlayerAction::AttackPressed || pointer.0 {
            continue;
        }

        for (mut combo, motion, animator, health) in players.iter_mut() {
            if health.is_dead() {
                continue;
            }
            if motion.can_move || animator.is_in_state_tagged(StateTag::Attack) {
                combo.buffered = true;
            }
        }
    }
}

/// System: продвижение комбо
#[allow(clippy::type_complexity)]
pub fn advance_combo(
    mut players: Query<
        (
            Entity,
            &mut ComboState,
            &ComboConfig,
            &mut Transform,
            &mut Animator,
            &EquippedWeapon,
            &Health,
        ),
        (With<Player>, Without<CombatDisabled>),
    >,
    targets: Query<&Transform, Without<Player>>,
    lock: Res<TargetLock>,
    mut signals: EventWriter<AttackSignal>,
    time: Res<Time>,
) {
    let now = time.elapsed_secs();

    for (entity, mut combo, config, mut transform, mut animator, weapon, health) in players.iter_mut() {
        if health.is_dead() {
            combo.buffered = false;
            continue;
        }

        let mid_attack = animator.is_in_state_tagged(StateTag::Attack);

        // Reset по таймауту (только вне атаки)
        if !mid_attack && combo.step != 0 && now > combo.last_input_time + config.combo_reset_time {
            crate::logger::log(&format!("combo reset (step {} timed out)", combo.step));
            combo.step = 0;
        }

        if !std::mem::take(&mut combo.buffered) {
            continue;
        }

        let step = next_combo_step(combo.step, mid_attack, config.max_combo_steps);
        combo.step = step;
        combo.last_input_time = now;

        // Лицом к захваченной цели
        if let Some(target_transform) = lock.get().and_then(|target| targets.get(target).ok()) {
            face_towards_flat(&mut transform, target_transform.translation);
        }

        if let Err(err) = animator.trigger(AnimTrigger::Attack { step }) {
            crate::logger::log_warning(&format!("{:?}: {}", entity, err));
        }
        signals.write(AttackSignal {
            attacker: entity,
            weapon: weapon.kind,
            step,
        });

        if weapon.kind.uses_hit_check() {
            let replaced = combo.hit_check.replace(HitCheck::new(step, config.settle_ticks));
            if replaced.is_some() {
                crate::logger::log("combo: pending hit check replaced");
            }
        }

        crate::logger::log(&format!("👊 combo step {} ({:?})", step, weapon.kind));
    }
}

/// System: отложенная проверка попадания игрока
///
/// Бьёт КАЖДОГО живого врага в сфере (без early exit).
/// Guard: animator всё ещё в Attack-tagged state И оружие всё ещё Unarmed/Melee.
#[allow(clippy::type_complexity)]
pub fn run_hit_checks(
    mut players: Query<
        (Entity, &mut ComboState, &ComboConfig, &Transform, &Animator, &EquippedWeapon),
        (With<Player>, Without<CombatDisabled>),
    >,
    mut enemies: Query<&mut Health, (With<Enemy>, Without<Player>)>,
    index: Res<SpatialIndex>,
    mut rng: ResMut<DeterministicRng>,
    mut writers: DamageWriters,
    time: Res<Time>,
) {
    let now = time.elapsed_secs();

    for (entity, mut combo, config, transform, animator, weapon) in players.iter_mut() {
        let Some(check) = combo.hit_check.as_mut() else {
            continue;
        };

        if !check.strike.is_pending() {
            // Ждём, пока animator перейдёт в attack state
            if !check.settle.tick() {
                continue;
            }
            let wait = animator.current_clip_length() * config.damage_application_point;
            check.strike.start(HitCheckPhase::Strike, now, wait);
        }

        if check.strike.poll(now).is_none() {
            continue;
        }
        let step = check.step;
        combo.hit_check = None;

        if !animator.is_in_state_tagged(StateTag::Attack) || !weapon.kind.uses_hit_check() {
            crate::logger::log(&format!("combo step {}: hit check skipped (attack interrupted)", step));
            continue;
        }

        let origin = weapon.world_hit_origin(transform);
        let mut hits = 0;
        for enemy in index.overlap_volume(origin, config.hit_radius, LAYER_ENEMY) {
            let Ok(mut health) = enemies.get_mut(enemy) else {
                continue;
            };
            if health.is_dead() {
                continue;
            }
            let damage = roll_damage(&weapon.damage, &mut rng.rng);
            writers.deal(entity, enemy, &mut health, damage);
            hits += 1;
        }

        crate::logger::log(&format!("combo step {}: {} enemies hit", step, hits));
    }
}
