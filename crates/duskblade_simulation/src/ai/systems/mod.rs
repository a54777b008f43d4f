//! AI systems (FSM transitions, locomotion, reactions)

use bevy::prelude::*;

use crate::components::{Health, Player};
use crate::spatial::{has_line_of_sight, CollisionBody, SpatialIndex, ENEMY_SIGHT_MASK};
use crate::ai::{EnemyConfig, Perception};

pub mod fsm;
pub mod movement;
pub mod reactions;

pub use fsm::*;
pub use movement::*;
pub use reactions::*;

/// Игрок глазами AI (read-only)
pub type PlayerView<'w, 's> =
    Query<'w, 's, (Entity, &'static Transform, &'static Health, Option<&'static CollisionBody>), With<Player>>;

/// Снимок игрока для одного тика
#[derive(Debug, Clone, Copy)]
pub struct PlayerSnapshot {
    pub entity: Entity,
    pub position: Vec3,
    /// Точка прицеливания (центр коллайдера)
    pub aim_point: Vec3,
    pub alive: bool,
}

pub fn player_snapshot(players: &PlayerView) -> Option<PlayerSnapshot> {
    let (entity, transform, health, body) = players.single().ok()?;
    Some(PlayerSnapshot {
        entity,
        position: transform.translation,
        aim_point: body
            .map(|body| body.center(transform))
            .unwrap_or(transform.translation),
        alive: health.is_alive(),
    })
}

/// Восприятие игрока врагом (distance + LOS от глаз врага)
pub fn perceive(
    transform: &Transform,
    config: &EnemyConfig,
    player: &PlayerSnapshot,
    mid_attack: bool,
    index: &SpatialIndex,
) -> Perception {
    if !player.alive {
        return Perception {
            distance: None,
            line_of_sight: false,
            mid_attack,
        };
    }

    let eye = transform.translation + Vec3::Y * config.eye_height;
    Perception {
        distance: Some(transform.translation.distance(player.position)),
        line_of_sight: has_line_of_sight(index, eye, player.entity, player.aim_point, ENEMY_SIGHT_MASK),
        mid_attack,
    }
}
