//! Tests for enemy attack sequencer systems.

use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;

use super::enemy_attack::{enemy_attack_animation_exit, enemy_attack_start, enemy_attack_tick};
use crate::ai::{EnemyBrain, EnemyConfig, EnemyState};
use crate::animation::{tick_animators, AnimationStateExited, Animator, StateTag};
use crate::combat::damage::{DamageApplied, DamageProfile, EntityDied};
use crate::combat::{EnemyAttackConfig, EnemyAttackKind, EnemyAttackState, EnemyAttacker, Projectile};
use crate::components::{Enemy, Health, Player};
use crate::config::CombatTuning;
use crate::spatial::{sync_spatial_index, CollisionBody, SpatialIndex, LAYER_ENEMY, LAYER_PLAYER};
use crate::DeterministicRng;

fn attack_app() -> App {
    let mut app = base_app();
    app.add_systems(
        Update,
        (enemy_attack_animation_exit, enemy_attack_start, enemy_attack_tick).chain(),
    );
    app
}

/// То же + тик animator'ов перед атаками (как FixedUpdate после Update прошлого кадра)
fn animated_attack_app() -> App {
    let mut app = base_app();
    app.add_systems(
        Update,
        (
            tick_animators,
            enemy_attack_animation_exit,
            enemy_attack_start,
            enemy_attack_tick,
        )
            .chain(),
    );
    app
}

fn base_app() -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(100)))
        .insert_resource(DeterministicRng::new(3))
        .init_resource::<SpatialIndex>()
        .init_resource::<CombatTuning>()
        .add_event::<DamageApplied>()
        .add_event::<EntityDied>()
        .add_event::<AnimationStateExited>()
        .add_systems(PreUpdate, sync_spatial_index);
    app
}

fn spawn_player(app: &mut App, position: Vec3) -> Entity {
    app.world_mut()
        .spawn((
            Player,
            Health::new(100),
            Transform::from_translation(position),
            CollisionBody::new(0.4, LAYER_PLAYER).with_center_offset(Vec3::Y),
        ))
        .id()
}

/// Engaged враг в 1.5м от начала координат, урон ровно 10
fn spawn_engaged_enemy(app: &mut App, kind: EnemyAttackKind) -> Entity {
    spawn_enemy_with(
        app,
        EnemyAttackConfig {
            kind,
            ..EnemyAttackConfig::default()
        },
    )
}

fn spawn_enemy_with(app: &mut App, attack: EnemyAttackConfig) -> Entity {
    let attack = EnemyAttackConfig {
        damage: DamageProfile::new(10).with_critical(0.0, 1.5),
        ..attack
    };
    app.world_mut()
        .spawn((
            Enemy,
            Health::new(50),
            Transform::from_xyz(0.0, 0.0, -1.5),
            CollisionBody::new(0.5, LAYER_ENEMY).with_center_offset(Vec3::Y),
            EnemyBrain {
                state: EnemyState::Engaged,
                ..Default::default()
            },
            EnemyConfig::default(),
            attack,
            EnemyAttacker::default(),
            Animator::enemy(),
        ))
        .id()
}

fn attacker(app: &App, enemy: Entity) -> EnemyAttacker {
    app.world().get::<EnemyAttacker>(enemy).cloned().expect("attacker")
}

fn health(app: &App, entity: Entity) -> u32 {
    app.world().get::<Health>(entity).map(|h| h.current()).unwrap_or(0)
}

fn run(app: &mut App, updates: usize) {
    for _ in 0..updates {
        app.update();
    }
}

#[test]
fn test_melee_lifecycle_phases() {
    let mut app = attack_app();
    let player = spawn_player(&mut app, Vec3::ZERO);
    let enemy = spawn_engaged_enemy(&mut app, EnemyAttackKind::Melee);

    run(&mut app, 2); // старт на t = 0, сейчас t = 0.1
    let state = attacker(&app, enemy);
    assert_eq!(state.state, EnemyAttackState::Windup);
    assert!(state.currently_attacking);
    assert_eq!(
        app.world().get::<Animator>(enemy).and_then(|a| a.pending_trigger()),
        Some(crate::animation::AnimTrigger::Attack { step: 0 })
    );

    run(&mut app, 3); // t = 0.4
    assert_eq!(health(&app, player), 100);

    run(&mut app, 3); // t = 0.7: apply на 0.5 → recover
    assert_eq!(health(&app, player), 90);
    assert_eq!(attacker(&app, enemy).state, EnemyAttackState::Recover);
    assert!(attacker(&app, enemy).currently_attacking);

    run(&mut app, 6); // t = 1.3: recover → cooldown
    let state = attacker(&app, enemy);
    assert_eq!(state.state, EnemyAttackState::Cooldown);
    assert!(!state.currently_attacking);

    run(&mut app, 10); // t = 2.3: всё ещё cooldown, второй атаки нет
    assert_eq!(attacker(&app, enemy).state, EnemyAttackState::Cooldown);
    assert_eq!(health(&app, player), 90);

    run(&mut app, 6); // t = 2.9: idle → новый windup
    assert_eq!(attacker(&app, enemy).state, EnemyAttackState::Windup);
}

#[test]
fn test_melee_stops_after_first_victim() {
    let mut app = attack_app();
    let near = spawn_player(&mut app, Vec3::new(0.0, 0.0, -0.6));
    let far = spawn_player(&mut app, Vec3::new(0.0, 0.0, 0.5));
    let enemy = spawn_engaged_enemy(&mut app, EnemyAttackKind::Melee);

    // Два Player → старт не гейтится (нет single player), запускаем фазу вручную
    if let Some(mut attacker) = app.world_mut().get_mut::<EnemyAttacker>(enemy) {
        attacker.currently_attacking = true;
        attacker.state = EnemyAttackState::Windup;
        attacker.sequencer.start(EnemyAttackState::Windup, 0.0, 0.0);
    }
    if let Some(mut transform) = app.world_mut().get_mut::<Transform>(enemy) {
        transform.look_at(Vec3::new(0.0, 0.0, 5.0), Vec3::Y);
    }

    run(&mut app, 2);

    let damaged: Vec<_> = [near, far]
        .into_iter()
        .filter(|entity| health(&app, *entity) < 100)
        .collect();
    assert_eq!(damaged, vec![near]);
}

#[test]
fn test_interrupted_attack_skips_apply() {
    let mut app = attack_app();
    let player = spawn_player(&mut app, Vec3::ZERO);
    let enemy = spawn_engaged_enemy(&mut app, EnemyAttackKind::Melee);

    run(&mut app, 2);
    // Hit-stun снимает флаг во время windup
    if let Some(mut attacker) = app.world_mut().get_mut::<EnemyAttacker>(enemy) {
        attacker.clear_attacking();
    }
    if let Some(mut brain) = app.world_mut().get_mut::<EnemyBrain>(enemy) {
        brain.state = EnemyState::HitStunned;
    }

    run(&mut app, 8); // t = 0.9: deadline windup прошёл
    assert_eq!(health(&app, player), 100);
    assert_eq!(attacker(&app, enemy).state, EnemyAttackState::Recover);
}

#[test]
fn test_dead_enemy_cancels_pending_phases() {
    let mut app = attack_app();
    let player = spawn_player(&mut app, Vec3::ZERO);
    let enemy = spawn_engaged_enemy(&mut app, EnemyAttackKind::Melee);

    run(&mut app, 2);
    if let Some(mut health) = app.world_mut().get_mut::<Health>(enemy) {
        health.apply_damage(1000, false);
    }

    run(&mut app, 10);
    let state = attacker(&app, enemy);
    assert_eq!(health(&app, player), 100);
    assert!(!state.sequencer.is_pending());
    assert!(!state.currently_attacking);
    assert_eq!(state.state, EnemyAttackState::Idle);
}

#[test]
fn test_animation_exit_before_recover_timeout() {
    let mut app = attack_app();
    spawn_player(&mut app, Vec3::ZERO);
    let enemy = spawn_engaged_enemy(&mut app, EnemyAttackKind::Melee);

    run(&mut app, 8); // t = 0.7: recover
    assert!(attacker(&app, enemy).currently_attacking);

    let clip = attacker(&app, enemy).attack_clip.expect("attack clip");
    app.world_mut().send_event(AnimationStateExited {
        entity: enemy,
        tag: StateTag::Attack,
        clip,
    });
    app.update(); // первый clear - анимация
    let state = attacker(&app, enemy);
    assert!(!state.currently_attacking);
    assert_eq!(state.state, EnemyAttackState::Recover);

    run(&mut app, 6); // второй clear - таймер recover (no-op)
    let state = attacker(&app, enemy);
    assert!(!state.currently_attacking);
    assert_eq!(state.state, EnemyAttackState::Cooldown);
}

#[test]
fn test_animation_exit_after_recover_timeout() {
    let mut app = attack_app();
    spawn_player(&mut app, Vec3::ZERO);
    let enemy = spawn_engaged_enemy(&mut app, EnemyAttackKind::Melee);

    run(&mut app, 14); // t = 1.3: recover → cooldown, флаг снят таймером
    assert_eq!(attacker(&app, enemy).state, EnemyAttackState::Cooldown);

    let clip = attacker(&app, enemy).attack_clip.expect("attack clip");
    app.world_mut().send_event(AnimationStateExited {
        entity: enemy,
        tag: StateTag::Attack,
        clip,
    });
    app.update();

    let state = attacker(&app, enemy);
    assert!(!state.currently_attacking);
    assert_eq!(state.state, EnemyAttackState::Cooldown);
    assert!(state.sequencer.is_pending());
}

#[test]
fn test_stale_clip_exit_keeps_new_attack() {
    let mut app = attack_app();
    let player = spawn_player(&mut app, Vec3::ZERO);
    let enemy = spawn_engaged_enemy(&mut app, EnemyAttackKind::Melee);

    run(&mut app, 2); // windup, clip поднят
    let current = attacker(&app, enemy).attack_clip.expect("attack clip");

    // Клип прошлого замаха закончился - к этой атаке не относится
    app.world_mut().send_event(AnimationStateExited {
        entity: enemy,
        tag: StateTag::Attack,
        clip: current.wrapping_sub(1),
    });
    app.update();
    assert!(attacker(&app, enemy).currently_attacking);

    run(&mut app, 4); // t = 0.6: apply прошёл
    assert_eq!(health(&app, player), 90);
}

#[test]
fn test_back_to_back_attacks_without_cooldown_all_land() {
    // delay + recovery (1.1s) короче enemy attack клипа (1.2s):
    // следующий замах прерывает ещё играющий клип прошлого
    let mut app = animated_attack_app();
    let player = spawn_player(&mut app, Vec3::ZERO);
    let enemy = spawn_enemy_with(
        &mut app,
        EnemyAttackConfig {
            attack_cooldown: 0.0,
            ..EnemyAttackConfig::default()
        },
    );

    run(&mut app, 8); // t = 0.7: первый удар
    assert_eq!(health(&app, player), 90);

    run(&mut app, 13); // t = 2.0: второй замах стартовал на 1.2, удар на 1.7
    assert_eq!(health(&app, player), 80);
    assert!(attacker(&app, enemy).currently_attacking);

    run(&mut app, 11); // t = 3.1: третий удар (старт 2.4 → 2.9)
    assert_eq!(health(&app, player), 70);
}

#[test]
fn test_ranged_attack_spawns_projectile() {
    let mut app = attack_app();
    let player = spawn_player(&mut app, Vec3::ZERO);
    let enemy = spawn_engaged_enemy(&mut app, EnemyAttackKind::Ranged);

    run(&mut app, 8);

    let mut projectiles = app.world_mut().query::<&Projectile>();
    let spawned: Vec<_> = projectiles.iter(app.world()).cloned().collect();
    assert_eq!(spawned.len(), 1);
    assert_eq!(spawned[0].owner, enemy);
    assert_eq!(spawned[0].target, player);
    assert_eq!(spawned[0].target_layer, LAYER_PLAYER);
    // Урон наносит сам снаряд, не apply
    assert_eq!(health(&app, player), 100);
}

#[test]
fn test_no_attack_out_of_range() {
    let mut app = attack_app();
    spawn_player(&mut app, Vec3::new(0.0, 0.0, 5.0));
    let enemy = spawn_engaged_enemy(&mut app, EnemyAttackKind::Melee);

    run(&mut app, 5);
    assert!(attacker(&app, enemy).is_idle());
    assert!(!attacker(&app, enemy).currently_attacking);
}
