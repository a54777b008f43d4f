//! Spatial Query Service
//!
//! Геометрия на Rapier коллайдерах (parry shape queries): range, cone, LOS, overlap.
//!
//! - `CollisionBody` - сфера на акторе (или на hurtbox'е, которым владеет актор)
//! - `Obstacle` - box окружения (блокирует LOS)
//! - `SpatialIndex` - снапшот `Collider` + `CollisionGroups`, пересобирается каждый тик (`sync_spatial_index`)
//! - `SpatialQuery` - trait на стыке: системы боя не знают, кто отвечает на запросы
//!
//! Полный RapierPhysicsPlugin не подключаем: query pipeline Rapier видит коллайдеры
//! только после своего sync/step, а боевой логике нужны позиции текущего тика.

use bevy::prelude::*;
use bevy_rapier3d::prelude::{Collider, CollisionGroups, Group};

pub mod layers;

pub use layers::*;

#[cfg(test)]
mod spatial_tests;

/// Сферический коллайдер актора
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct CollisionBody {
    pub radius: f32,
    /// Один из `LAYER_*`
    pub layer: Group,
    /// Смещение центра от Transform (капсула стоит на земле, центр на уровне груди)
    pub center_offset: Vec3,
    /// Владелец коллайдера (hurtbox → актор). None → коллайдер принадлежит своей entity
    pub owner: Option<Entity>,
    /// Выключается при смерти
    pub enabled: bool,
}

impl CollisionBody {
    pub fn new(radius: f32, layer: Group) -> Self {
        Self {
            radius,
            layer,
            center_offset: Vec3::ZERO,
            owner: None,
            enabled: true,
        }
    }

    pub fn with_center_offset(mut self, offset: Vec3) -> Self {
        self.center_offset = offset;
        self
    }

    pub fn owned_by(mut self, owner: Entity) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn center(&self, transform: &Transform) -> Vec3 {
        transform.translation + self.center_offset
    }
}

/// Статичное препятствие окружения (box вокруг Transform.translation, с поворотом Transform)
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub half_extents: Vec3,
}

/// Результат raycast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Entity коллайдера, в который попал луч
    pub collider: Entity,
    /// Актор-владелец (== collider для обычных тел)
    pub entity: Entity,
    pub point: Vec3,
    pub distance: f32,
}

/// Стык для геометрических запросов
pub trait SpatialQuery {
    /// Ближайшее пересечение луча. `direction` нормализуется внутри.
    ///
    /// Коллайдеры, внутри которых находится origin, игнорируются.
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32, mask: Group) -> Option<RayHit>;

    /// Акторы, чьи коллайдеры пересекают сферу. Отсортированы по дистанции, затем по entity.
    fn overlap_volume(&self, center: Vec3, radius: f32, mask: Group) -> Vec<Entity>;

    /// Принадлежит ли коллайдер `collider` актору `target`
    fn owns_collider(&self, collider: Entity, target: Entity) -> bool;
}

/// Коллайдер в индексе: форма Rapier + поза + группы
#[derive(Clone)]
pub struct IndexedCollider {
    pub collider: Entity,
    pub owner: Entity,
    pub groups: CollisionGroups,
    pub shape: Collider,
    pub translation: Vec3,
    pub rotation: Quat,
}

impl IndexedCollider {
    /// Дистанция от точки до поверхности (0 внутри)
    fn distance_to(&self, point: Vec3) -> f32 {
        let projection = self.shape.project_point(self.translation, self.rotation, point, true);
        point.distance(projection.point)
    }

    fn contains(&self, point: Vec3) -> bool {
        self.shape
            .project_point(self.translation, self.rotation, point, false)
            .is_inside
    }
}

/// Spatial index (пересобирается в начале каждого тика)
#[derive(Resource, Clone, Default)]
pub struct SpatialIndex {
    colliders: Vec<IndexedCollider>,
}

impl SpatialIndex {
    pub fn clear(&mut self) {
        self.colliders.clear();
    }

    pub fn insert_sphere(&mut self, collider: Entity, owner: Entity, layer: Group, center: Vec3, radius: f32) {
        self.colliders.push(IndexedCollider {
            collider,
            owner,
            groups: body_groups(layer),
            shape: Collider::ball(radius),
            translation: center,
            rotation: Quat::IDENTITY,
        });
    }

    pub fn insert_box(&mut self, collider: Entity, layer: Group, center: Vec3, rotation: Quat, half_extents: Vec3) {
        self.colliders.push(IndexedCollider {
            collider,
            owner: collider,
            groups: body_groups(layer),
            shape: Collider::cuboid(half_extents.x, half_extents.y, half_extents.z),
            translation: center,
            rotation,
        });
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    fn matching(&self, mask: Group) -> impl Iterator<Item = &IndexedCollider> {
        self.colliders
            .iter()
            .filter(move |entry| matches_mask(&entry.groups, mask))
    }
}

impl SpatialQuery for SpatialIndex {
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32, mask: Group) -> Option<RayHit> {
        let direction = direction.normalize_or_zero();
        if direction == Vec3::ZERO || max_distance <= 0.0 {
            return None;
        }

        let mut best: Option<RayHit> = None;

        for entry in self.matching(mask) {
            if entry.contains(origin) {
                continue;
            }

            let Some(toi) = entry
                .shape
                .cast_ray(entry.translation, entry.rotation, origin, direction, max_distance, true)
            else {
                continue;
            };

            let closer = match best {
                None => true,
                Some(hit) => toi < hit.distance || (toi == hit.distance && entry.collider < hit.collider),
            };
            if closer {
                best = Some(RayHit {
                    collider: entry.collider,
                    entity: entry.owner,
                    point: origin + direction * toi,
                    distance: toi,
                });
            }
        }

        best
    }

    fn overlap_volume(&self, center: Vec3, radius: f32, mask: Group) -> Vec<Entity> {
        let mut found: Vec<(f32, Entity)> = Vec::new();

        for entry in self.matching(mask) {
            let gap = entry.distance_to(center);
            if gap > radius {
                continue;
            }

            // Несколько коллайдеров одного владельца → одна запись (ближайшая)
            match found.iter_mut().find(|(_, owner)| *owner == entry.owner) {
                Some(existing) => existing.0 = existing.0.min(gap),
                None => found.push((gap, entry.owner)),
            }
        }

        found.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        found.into_iter().map(|(_, entity)| entity).collect()
    }

    fn owns_collider(&self, collider: Entity, target: Entity) -> bool {
        if collider == target {
            return true;
        }
        self.colliders
            .iter()
            .any(|entry| entry.collider == collider && entry.owner == target)
    }
}

// ============================================================================
// Helpers (range / cone / LOS)
// ============================================================================

pub fn within_range(a: Vec3, b: Vec3, range: f32) -> bool {
    a.distance_squared(b) <= range * range
}

/// Угол между векторами в градусах (0 для вырожденных векторов)
pub fn angle_between_deg(a: Vec3, b: Vec3) -> f32 {
    let (Some(a), Some(b)) = (a.try_normalize(), b.try_normalize()) else {
        return 0.0;
    };
    a.dot(b).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Line-of-sight: луч от `from` к `target_point`.
///
/// - нет попаданий → LOS clear
/// - попали в target (или коллайдер, которым он владеет) → LOS clear
/// - попали во что-то другое → LOS blocked
pub fn has_line_of_sight(
    query: &impl SpatialQuery,
    from: Vec3,
    target: Entity,
    target_point: Vec3,
    mask: Group,
) -> bool {
    let to_target = target_point - from;
    let distance = to_target.length();
    if distance <= f32::EPSILON {
        return true;
    }

    match query.raycast(from, to_target / distance, distance, mask) {
        None => true,
        Some(hit) => hit.entity == target || query.owns_collider(hit.collider, target),
    }
}

/// Yaw-only поворот `transform` к точке (Y игнорируется)
pub fn face_towards_flat(transform: &mut Transform, point: Vec3) {
    let flat = Vec3::new(point.x, transform.translation.y, point.z);
    if flat.distance_squared(transform.translation) > f32::EPSILON {
        transform.look_at(flat, Vec3::Y);
    }
}

/// System: пересборка SpatialIndex из CollisionBody/Obstacle
///
/// Запускается в FixedPreUpdate, после `SimulationSet::Behavior` (атаки видят позиции после
/// шага навигации) и в PreUpdate (Update-системы targeting/combo видят свежий индекс).
pub fn sync_spatial_index(
    mut index: ResMut<SpatialIndex>,
    bodies: Query<(Entity, &Transform, &CollisionBody)>,
    obstacles: Query<(Entity, &Transform, &Obstacle)>,
) {
    index.clear();

    for (entity, transform, body) in bodies.iter() {
        if !body.enabled {
            continue;
        }
        index.insert_sphere(
            entity,
            body.owner.unwrap_or(entity),
            body.layer,
            body.center(transform),
            body.radius,
        );
    }

    for (entity, transform, obstacle) in obstacles.iter() {
        index.insert_box(
            entity,
            LAYER_ENVIRONMENT,
            transform.translation,
            transform.rotation,
            obstacle.half_extents,
        );
    }
}

/// Spatial Plugin
pub struct SpatialPlugin;

impl Plugin for SpatialPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SpatialIndex>()
            .add_systems(FixedPreUpdate, sync_spatial_index)
            .add_systems(
                FixedUpdate,
                sync_spatial_index
                    .after(crate::SimulationSet::Behavior)
                    .before(crate::SimulationSet::Attacks),
            )
            .add_systems(PreUpdate, sync_spatial_index);
    }
}
