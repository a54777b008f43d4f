//! Tests for player combo systems (buffer → step → animator → hit check).

use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;

use super::combo::{advance_combo, buffer_attack_input, handle_player_death, run_hit_checks};
use super::damage::Dead;
use crate::animation::{tick_animators, AnimationStateExited, Animator, StateTag};
use crate::combat::damage::{DamageApplied, DamageProfile, EntityDied};
use crate::combat::{AttackSignal, ComboConfig, ComboState, EquippedWeapon, WeaponType};
use crate::components::{Enemy, Health, Player};
use crate::player::{PlayerAction, PlayerMotion, PointerOverUi};
use crate::spatial::{sync_spatial_index, CollisionBody, SpatialIndex, LAYER_ENEMY, LAYER_PLAYER};
use crate::targeting::{TargetLock, TargetLockChanged};
use crate::DeterministicRng;

#[derive(Resource, Default)]
struct Signals(Vec<u8>);

fn record_signals(mut signals: EventReader<AttackSignal>, mut recorded: ResMut<Signals>) {
    recorded.0.extend(signals.read().map(|signal| signal.step));
}

/// Игрок в (0,0,0), смотрит в -Z, кулак без критов (урон ровно 8)
fn combo_app() -> (App, Entity) {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(100)))
        .insert_resource(DeterministicRng::new(7))
        .init_resource::<SpatialIndex>()
        .init_resource::<TargetLock>()
        .init_resource::<PointerOverUi>()
        .init_resource::<Signals>()
        .add_event::<PlayerAction>()
        .add_event::<AttackSignal>()
        .add_event::<DamageApplied>()
        .add_event::<EntityDied>()
        .add_event::<AnimationStateExited>()
        .add_event::<TargetLockChanged>()
        .add_systems(PreUpdate, sync_spatial_index)
        .add_systems(
            Update,
            (
                handle_player_death,
                buffer_attack_input,
                advance_combo,
                tick_animators,
                run_hit_checks,
                record_signals,
            )
                .chain(),
        );

    let weapon = EquippedWeapon {
        damage: DamageProfile::new(8).with_critical(0.0, 1.5),
        ..EquippedWeapon::unarmed()
    };
    let player = app
        .world_mut()
        .spawn((
            Player,
            Health::new(100),
            Transform::default(),
            CollisionBody::new(0.4, LAYER_PLAYER).with_center_offset(Vec3::Y),
            PlayerMotion::default(),
            ComboState::default(),
            ComboConfig::default(),
            weapon,
            Animator::player(),
        ))
        .id();

    app.update(); // t = 0 (первый кадр без delta)
    (app, player)
}

fn spawn_enemy_at(app: &mut App, position: Vec3) -> Entity {
    app.world_mut()
        .spawn((
            Enemy,
            Health::new(50),
            Transform::from_translation(position),
            CollisionBody::new(0.5, LAYER_ENEMY),
        ))
        .id()
}

fn press_attack(app: &mut App) {
    app.world_mut().send_event(PlayerAction::AttackPressed);
    app.update();
}

fn combo_state(app: &App, player: Entity) -> ComboState {
    app.world().get::<ComboState>(player).cloned().expect("combo state")
}

#[test]
fn test_four_presses_cycle_through_steps() {
    let (mut app, _player) = combo_app();

    for _ in 0..4 {
        press_attack(&mut app);
    }

    assert_eq!(app.world().resource::<Signals>().0, vec![1, 2, 3, 1]);
}

#[test]
fn test_pointer_over_ui_blocks_attack() {
    let (mut app, player) = combo_app();
    app.insert_resource(PointerOverUi(true));

    press_attack(&mut app);

    assert!(app.world().resource::<Signals>().0.is_empty());
    assert_eq!(combo_state(&app, player).step, 0);
}

#[test]
fn test_combo_resets_after_idle_window() {
    let (mut app, player) = combo_app();

    press_attack(&mut app); // t = 0.1
    for _ in 0..4 {
        app.update(); // t = 0.5
    }
    assert_eq!(combo_state(&app, player).step, 1);

    for _ in 0..10 {
        app.update(); // t = 1.5: клип доигран, окно 1.0 прошло
    }
    let animator = app.world().get::<Animator>(player).expect("animator");
    assert!(!animator.is_in_state_tagged(StateTag::Attack));
    assert_eq!(combo_state(&app, player).step, 0);

    // После reset новая серия начинается с 1
    press_attack(&mut app);
    assert_eq!(app.world().resource::<Signals>().0, vec![1, 1]);
}

#[test]
fn test_hit_check_damages_every_enemy_in_sphere() {
    let (mut app, player) = combo_app();
    let left = spawn_enemy_at(&mut app, Vec3::new(-0.5, 1.0, -1.2));
    let right = spawn_enemy_at(&mut app, Vec3::new(0.5, 1.0, -1.2));
    let far = spawn_enemy_at(&mut app, Vec3::new(0.0, 1.0, -8.0));

    press_attack(&mut app); // settle tick 1
    app.update(); // settle tick 2 → strike через 0.6 × 0.4 = 0.24s
    assert_eq!(app.world().get::<Health>(left).map(|h| h.current()), Some(50));

    for _ in 0..3 {
        app.update();
    }

    let health = |entity: Entity| app.world().get::<Health>(entity).map(|h| h.current());
    assert_eq!(health(left), Some(42));
    assert_eq!(health(right), Some(42));
    assert_eq!(health(far), Some(50));
    assert!(combo_state(&app, player).hit_check.is_none());
}

#[test]
fn test_hit_check_skipped_after_weapon_swap() {
    let (mut app, player) = combo_app();
    let enemy = spawn_enemy_at(&mut app, Vec3::new(0.0, 1.0, -1.0));

    press_attack(&mut app);
    if let Some(mut weapon) = app.world_mut().get_mut::<EquippedWeapon>(player) {
        weapon.kind = WeaponType::Ranged;
    }
    for _ in 0..5 {
        app.update();
    }

    assert_eq!(app.world().get::<Health>(enemy).map(|h| h.current()), Some(50));
    assert!(combo_state(&app, player).hit_check.is_none());
}

#[test]
fn test_player_death_cancels_pending_hit_check() {
    let (mut app, player) = combo_app();
    let enemy = spawn_enemy_at(&mut app, Vec3::new(0.0, 1.0, -1.0));

    press_attack(&mut app);
    assert!(combo_state(&app, player).hit_check.is_some());

    app.world_mut().send_event(EntityDied {
        entity: player,
        killer: Some(enemy),
    });
    for _ in 0..5 {
        app.update();
    }

    let world = app.world();
    assert!(combo_state(&app, player).hit_check.is_none());
    assert_eq!(world.get::<PlayerMotion>(player).map(|m| m.can_move), Some(false));
    assert!(world.get::<Dead>(player).is_some());
    assert_eq!(world.get::<Health>(enemy).map(|h| h.current()), Some(50));
}
