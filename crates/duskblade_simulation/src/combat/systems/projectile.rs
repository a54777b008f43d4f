//! Guided projectile systems.

use bevy::prelude::*;

use crate::combat::damage::{roll_damage, DamageWriters};
use crate::combat::Projectile;
use crate::components::Health;
use crate::spatial::{CollisionBody, SpatialIndex, SpatialQuery, LAYER_ENVIRONMENT};
use crate::DeterministicRng;

/// System: полёт снарядов (FixedUpdate)
///
/// 1. age += dt, истёк max_lifetime → despawn
/// 2. наведение на центр цели (цель пропала → летим прямо)
/// 3. стена на пути → despawn
/// 4. overlap по target_layer → урон первой живой цели, despawn
#[allow(clippy::too_many_arguments)]
pub fn advance_projectiles(
    mut commands: Commands,
    mut projectiles: Query<(Entity, &mut Projectile, &mut Transform)>,
    targets: Query<(&Transform, Option<&CollisionBody>), Without<Projectile>>,
    mut healths: Query<&mut Health>,
    index: Res<SpatialIndex>,
    mut rng: ResMut<DeterministicRng>,
    mut writers: DamageWriters,
    time: Res<Time>,
) {
    let delta = time.delta_secs();

    for (entity, mut projectile, mut transform) in projectiles.iter_mut() {
        projectile.age += delta;
        if projectile.is_expired() {
            crate::logger::log(&format!("{:?}: projectile expired", entity));
            commands.entity(entity).despawn();
            continue;
        }

        let forward: Vec3 = transform.forward().into();
        let direction = targets
            .get(projectile.target)
            .ok()
            .map(|(target_transform, body)| {
                body.map(|body| body.center(target_transform))
                    .unwrap_or(target_transform.translation)
            })
            .and_then(|aim| (aim - transform.translation).try_normalize())
            .unwrap_or(forward);

        let step = projectile.speed * delta;
        if index
            .raycast(transform.translation, direction, step, LAYER_ENVIRONMENT)
            .is_some()
        {
            crate::logger::log(&format!("{:?}: projectile hit environment", entity));
            commands.entity(entity).despawn();
            continue;
        }

        transform.translation += direction * step;
        let ahead = transform.translation + direction;
        transform.look_at(ahead, Vec3::Y);

        let hits = index.overlap_volume(transform.translation, projectile.radius, projectile.target_layer);
        let victim = hits
            .into_iter()
            .filter(|hit| *hit != projectile.owner)
            .find(|hit| healths.get(*hit).is_ok_and(|health| health.is_alive()));

        if let Some(victim) = victim {
            if let Ok(mut health) = healths.get_mut(victim) {
                let damage = roll_damage(&projectile.damage, &mut rng.rng);
                let change = writers.deal(projectile.owner, victim, &mut health, damage);
                crate::logger::log(&format!(
                    "🎯 projectile {:?} hit {:?} for {} (hp left {})",
                    entity, victim, change.dealt, change.new_health
                ));
            }
            commands.entity(entity).despawn();
        }
    }
}
