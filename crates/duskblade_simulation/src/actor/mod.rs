//! Actor spawn helpers + setup validation
//!
//! Спавн собирает полный набор компонентов актора (ledger, collider, animator,
//! nav agent, brain) из `CombatTuning`. Хост может спавнить сам, тогда
//! `validate_combatants` проверит, что ничего не забыли.

use bevy::prelude::*;

use crate::ai::{EnemyBrain, EnemyConfig};
use crate::animation::Animator;
use crate::combat::{ComboConfig, ComboState, EnemyAttackConfig, EnemyAttacker, EquippedWeapon};
use crate::components::{Actor, CombatDisabled, Enemy, Health, Player, SpawnPoint};
use crate::config::CombatTuning;
use crate::error::SimulationError;
use crate::navigation::NavAgent;
use crate::player::PlayerMotion;
use crate::spatial::{CollisionBody, Obstacle, LAYER_ENEMY, LAYER_PLAYER};
use crate::targeting::LockReference;

/// Центр капсулы над землёй
const BODY_CENTER_HEIGHT: f32 = 1.0;
const PLAYER_RADIUS: f32 = 0.4;
const ENEMY_RADIUS: f32 = 0.5;

/// Параметры спавна врага
#[derive(Debug, Clone, PartialEq)]
pub struct EnemySpawn {
    pub position: Vec3,
    pub config: EnemyConfig,
    pub attack: EnemyAttackConfig,
}

impl EnemySpawn {
    pub fn from_tuning(position: Vec3, tuning: &CombatTuning) -> Self {
        Self {
            position,
            config: tuning.enemy.clone(),
            attack: tuning.enemy_attack.clone(),
        }
    }

    /// Ranged вариант (снаряды вместо melee overlap)
    pub fn ranged(mut self) -> Self {
        self.attack.kind = crate::combat::EnemyAttackKind::Ranged;
        self
    }
}

/// Spawn player entity
///
/// Компоненты: Player (→ Actor → Health), collider, combo, оружие (unarmed), animator.
/// Player НЕ получает NavAgent - движение задаёт хост.
pub fn spawn_player(commands: &mut Commands, position: Vec3, tuning: &CombatTuning) -> Entity {
    let entity = commands
        .spawn((
            Player,
            Health::new(tuning.lifecycle.player_max_health),
            Transform::from_translation(position),
            CollisionBody::new(PLAYER_RADIUS, LAYER_PLAYER).with_center_offset(Vec3::Y * BODY_CENTER_HEIGHT),
            PlayerMotion::default(),
            ComboState::default(),
            tuning.combo.clone(),
            EquippedWeapon::unarmed(),
            Animator::player(),
        ))
        .id();

    crate::logger::log_info(&format!("🧍 Player spawned: {:?} at {:?}", entity, position));
    entity
}

/// Spawn enemy entity (config проходит автокоррекцию)
pub fn spawn_enemy(commands: &mut Commands, spawn: EnemySpawn) -> Entity {
    let config = spawn.config.validated();
    let entity = commands
        .spawn((
            Enemy,
            Health::new(config.max_health),
            Transform::from_translation(spawn.position),
            SpawnPoint(spawn.position),
            CollisionBody::new(ENEMY_RADIUS, LAYER_ENEMY).with_center_offset(Vec3::Y * BODY_CENTER_HEIGHT),
            NavAgent::new(config.move_speed),
            Animator::enemy(),
            EnemyBrain::default(),
            EnemyAttacker::default(),
            spawn.attack.clone(),
            config,
        ))
        .id();

    crate::logger::log_info(&format!(
        "👹 Enemy spawned: {:?} at {:?} ({:?})",
        entity, spawn.position, spawn.attack.kind
    ));
    entity
}

/// Spawn статичного препятствия (стена, колонна)
pub fn spawn_obstacle(commands: &mut Commands, center: Vec3, half_extents: Vec3) -> Entity {
    commands
        .spawn((Transform::from_translation(center), Obstacle { half_extents }))
        .id()
}

/// Spawn reference transform для lock-on конуса (камера)
pub fn spawn_lock_reference(commands: &mut Commands, transform: Transform) -> Entity {
    commands.spawn((transform, LockReference)).id()
}

/// Первый отсутствующий коллаборатор врага
fn missing_enemy_part(
    animator: bool,
    nav: bool,
    brain: bool,
    config: bool,
    attacker: bool,
    attack_config: bool,
) -> Option<&'static str> {
    [
        (animator, "Animator"),
        (nav, "NavAgent"),
        (brain, "EnemyBrain"),
        (config, "EnemyConfig"),
        (attacker, "EnemyAttacker"),
        (attack_config, "EnemyAttackConfig"),
    ]
    .into_iter()
    .find_map(|(present, name)| (!present).then_some(name))
}

/// System: актор без обязательных коллабораторов → CombatDisabled (лог один раз)
#[allow(clippy::type_complexity)]
pub fn validate_combatants(
    mut commands: Commands,
    enemies: Query<
        (
            Entity,
            Has<Animator>,
            Has<NavAgent>,
            Has<EnemyBrain>,
            Has<EnemyConfig>,
            Has<EnemyAttacker>,
            Has<EnemyAttackConfig>,
        ),
        (With<Enemy>, Without<CombatDisabled>),
    >,
    players: Query<
        (Entity, Has<Animator>, Has<ComboState>, Has<ComboConfig>, Has<EquippedWeapon>, Has<PlayerMotion>),
        (With<Player>, Without<CombatDisabled>),
    >,
    actors: Query<Entity, (With<Actor>, Without<Transform>, Without<CombatDisabled>)>,
) {
    let mut disable = |owner: Entity, what: &'static str| {
        let error = SimulationError::MissingReference { owner, what };
        crate::logger::log_error(&format!("{} → combat disabled", error));
        commands.entity(owner).insert(CombatDisabled {
            reason: error.to_string(),
        });
    };

    for (entity, animator, nav, brain, config, attacker, attack_config) in enemies.iter() {
        if let Some(what) = missing_enemy_part(animator, nav, brain, config, attacker, attack_config) {
            disable(entity, what);
        }
    }

    for (entity, animator, combo, combo_config, weapon, motion) in players.iter() {
        let missing = [
            (animator, "Animator"),
            (combo, "ComboState"),
            (combo_config, "ComboConfig"),
            (weapon, "EquippedWeapon"),
            (motion, "PlayerMotion"),
        ]
        .into_iter()
        .find_map(|(present, name)| (!present).then_some(name));

        if let Some(what) = missing {
            disable(entity, what);
        }
    }

    for entity in actors.iter() {
        disable(entity, "Transform");
    }
}
