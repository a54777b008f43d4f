//! Guided projectile (ranged enemy attack)

use bevy::prelude::*;
use bevy_rapier3d::prelude::Group;

use crate::combat::damage::DamageProfile;

/// Параметры спавна снаряда
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileInit {
    pub owner: Entity,
    pub target: Entity,
    pub speed: f32,
    pub damage: DamageProfile,
    /// Слой, по которому снаряд наносит урон
    pub target_layer: Group,
    pub radius: f32,
    pub max_lifetime: f32,
}

/// Самонаводящийся снаряд
///
/// Летит к центру цели, пока цель существует; потерял цель → летит прямо.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Projectile {
    pub owner: Entity,
    pub target: Entity,
    pub speed: f32,
    pub damage: DamageProfile,
    pub target_layer: Group,
    pub radius: f32,
    pub age: f32,
    pub max_lifetime: f32,
}

impl From<ProjectileInit> for Projectile {
    fn from(init: ProjectileInit) -> Self {
        Self {
            owner: init.owner,
            target: init.target,
            speed: init.speed,
            damage: init.damage,
            target_layer: init.target_layer,
            radius: init.radius,
            age: 0.0,
            max_lifetime: init.max_lifetime,
        }
    }
}

impl Projectile {
    pub fn is_expired(&self) -> bool {
        self.age >= self.max_lifetime
    }
}

/// Спавн снаряда
pub fn spawn_projectile(commands: &mut Commands, position: Vec3, rotation: Quat, init: ProjectileInit) -> Entity {
    crate::logger::log(&format!(
        "🏹 Projectile from {:?} → {:?} (speed {:.1})",
        init.owner, init.target, init.speed
    ));

    commands
        .spawn((
            Projectile::from(init),
            Transform::from_translation(position).with_rotation(rotation),
        ))
        .id()
}
