//! Tests for the spatial index (Rapier shape queries).

use super::*;

fn e(index: u32) -> Entity {
    Entity::from_raw(index)
}

#[test]
fn test_raycast_hits_nearest_sphere() {
    let mut index = SpatialIndex::default();
    index.insert_sphere(e(1), e(1), LAYER_ENEMY, Vec3::new(0.0, 0.0, -10.0), 0.5);
    index.insert_sphere(e(2), e(2), LAYER_ENEMY, Vec3::new(0.0, 0.0, -5.0), 0.5);

    let hit = index
        .raycast(Vec3::ZERO, Vec3::NEG_Z, 20.0, LAYER_ENEMY)
        .expect("ray should hit");

    assert_eq!(hit.entity, e(2));
    assert!((hit.distance - 4.5).abs() < 1e-4);
}

#[test]
fn test_raycast_respects_mask_and_max_distance() {
    let mut index = SpatialIndex::default();
    index.insert_sphere(e(1), e(1), LAYER_PLAYER, Vec3::new(0.0, 0.0, -5.0), 0.5);

    assert!(index.raycast(Vec3::ZERO, Vec3::NEG_Z, 20.0, LAYER_ENEMY).is_none());
    assert!(index.raycast(Vec3::ZERO, Vec3::NEG_Z, 3.0, LAYER_PLAYER).is_none());
    assert!(index.raycast(Vec3::ZERO, Vec3::NEG_Z, 5.0, LAYER_PLAYER).is_some());
}

#[test]
fn test_raycast_skips_collider_containing_origin() {
    let mut index = SpatialIndex::default();
    index.insert_sphere(e(1), e(1), LAYER_ENEMY, Vec3::ZERO, 1.0);

    assert!(index.raycast(Vec3::ZERO, Vec3::X, 10.0, LAYER_ALL).is_none());
}

#[test]
fn test_raycast_hits_box() {
    let mut index = SpatialIndex::default();
    index.insert_box(e(7), LAYER_ENVIRONMENT, Vec3::new(5.0, 0.0, 0.0), Quat::IDENTITY, Vec3::splat(1.0));

    let hit = index
        .raycast(Vec3::ZERO, Vec3::X, 10.0, LAYER_ENVIRONMENT)
        .expect("ray should hit the wall");
    assert_eq!(hit.collider, e(7));
    assert!((hit.distance - 4.0).abs() < 1e-4);

    // Луч мимо стены
    assert!(index.raycast(Vec3::new(0.0, 3.0, 0.0), Vec3::X, 10.0, LAYER_ALL).is_none());
}

#[test]
fn test_raycast_respects_box_rotation() {
    let mut index = SpatialIndex::default();
    // Тонкая стена вдоль X, повёрнутая на 90° → стоит вдоль Z
    index.insert_box(
        e(7),
        LAYER_ENVIRONMENT,
        Vec3::new(3.0, 0.0, 0.0),
        Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
        Vec3::new(2.0, 1.0, 0.1),
    );

    let hit = index
        .raycast(Vec3::ZERO, Vec3::X, 10.0, LAYER_ENVIRONMENT)
        .expect("rotated wall blocks the ray");
    assert!((hit.distance - 2.9).abs() < 1e-3);

    // Без поворота стена тянулась бы по X до 5 и перекрыла бы этот луч
    assert!(index
        .raycast(Vec3::new(4.5, 0.0, 5.0), Vec3::NEG_Z, 10.0, LAYER_ENVIRONMENT)
        .is_none());
}

#[test]
fn test_overlap_touching_box() {
    let mut index = SpatialIndex::default();
    index.insert_box(e(5), LAYER_ENVIRONMENT, Vec3::new(2.0, 0.0, 0.0), Quat::IDENTITY, Vec3::splat(0.5));

    assert_eq!(index.overlap_volume(Vec3::ZERO, 1.6, LAYER_ENVIRONMENT), vec![e(5)]);
    assert!(index.overlap_volume(Vec3::ZERO, 1.4, LAYER_ENVIRONMENT).is_empty());
    assert!(index.overlap_volume(Vec3::ZERO, 1.6, LAYER_ENEMY).is_empty());
}

#[test]
fn test_overlap_sorted_by_distance_and_deduplicated_by_owner() {
    let mut index = SpatialIndex::default();
    index.insert_sphere(e(3), e(3), LAYER_ENEMY, Vec3::new(2.0, 0.0, 0.0), 0.5);
    index.insert_sphere(e(1), e(1), LAYER_ENEMY, Vec3::new(1.0, 0.0, 0.0), 0.5);
    // Hurtbox врага 3
    index.insert_sphere(e(9), e(3), LAYER_ENEMY, Vec3::new(0.5, 0.0, 0.0), 0.2);
    index.insert_sphere(e(4), e(4), LAYER_ENEMY, Vec3::new(10.0, 0.0, 0.0), 0.5);

    let found = index.overlap_volume(Vec3::ZERO, 2.0, LAYER_ENEMY);
    assert_eq!(found, vec![e(3), e(1)]);
}

#[test]
fn test_owns_collider() {
    let mut index = SpatialIndex::default();
    index.insert_sphere(e(9), e(3), LAYER_ENEMY, Vec3::ZERO, 0.2);

    assert!(index.owns_collider(e(9), e(3)));
    assert!(index.owns_collider(e(3), e(3)));
    assert!(!index.owns_collider(e(9), e(4)));
}

#[test]
fn test_line_of_sight_blocked_by_wall() {
    let mut index = SpatialIndex::default();
    let target = e(2);
    let target_point = Vec3::new(0.0, 1.0, -10.0);
    index.insert_sphere(target, target, LAYER_PLAYER, target_point, 0.5);

    assert!(has_line_of_sight(&index, Vec3::new(0.0, 1.0, 0.0), target, target_point, ENEMY_SIGHT_MASK));

    index.insert_box(
        e(5),
        LAYER_ENVIRONMENT,
        Vec3::new(0.0, 1.0, -5.0),
        Quat::IDENTITY,
        Vec3::new(2.0, 2.0, 0.5),
    );
    assert!(!has_line_of_sight(&index, Vec3::new(0.0, 1.0, 0.0), target, target_point, ENEMY_SIGHT_MASK));
}

#[test]
fn test_line_of_sight_through_owned_hurtbox() {
    let mut index = SpatialIndex::default();
    let target = e(2);
    index.insert_sphere(e(8), target, LAYER_ENEMY, Vec3::new(0.0, 0.0, -4.0), 0.5);

    assert!(has_line_of_sight(&index, Vec3::ZERO, target, Vec3::new(0.0, 0.0, -6.0), LOCK_SIGHT_MASK));
}

#[test]
fn test_angle_between_deg() {
    assert!((angle_between_deg(Vec3::NEG_Z, Vec3::X) - 90.0).abs() < 1e-3);
    assert!(angle_between_deg(Vec3::NEG_Z, Vec3::new(0.0, 0.0, -3.0)).abs() < 1e-3);
    assert_eq!(angle_between_deg(Vec3::ZERO, Vec3::X), 0.0);
}

#[test]
fn test_within_range_inclusive() {
    assert!(within_range(Vec3::ZERO, Vec3::new(3.0, 0.0, 4.0), 5.0));
    assert!(!within_range(Vec3::ZERO, Vec3::new(3.0, 0.0, 4.1), 5.0));
}
