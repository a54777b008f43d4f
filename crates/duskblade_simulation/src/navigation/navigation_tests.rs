//! Tests for NavAgent and patrol destination sampling.

use super::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Поверхность без проходимых точек
struct NoSurface;

impl NavigableSurface for NoSurface {
    fn sample_navigable_point_near(&self, _point: Vec3, _max_distance: f32) -> Option<Vec3> {
        None
    }
}

#[test]
fn test_patrol_destination_within_radius() {
    let surface = NavigationSurface::default();
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let spawn = Vec3::new(3.0, 0.0, -2.0);

    for _ in 0..50 {
        let point = pick_patrol_destination(spawn, 8.0, 30, 2.0, &surface, &mut rng);
        assert!(flat_distance(point, spawn) <= 8.0 + 1e-4);
    }
}

#[test]
fn test_patrol_destination_falls_back_to_spawn() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let spawn = Vec3::new(1.0, 0.0, 1.0);

    let point = pick_patrol_destination(spawn, 8.0, 30, 2.0, &NoSurface, &mut rng);
    assert_eq!(point, spawn);
}

#[test]
fn test_sample_pushes_point_out_of_blocked_circle() {
    let surface = NavigationSurface::default().with_blocked(Vec2::ZERO, 1.0);

    let sampled = surface
        .sample_navigable_point_near(Vec3::new(0.5, 0.0, 0.0), 2.0)
        .expect("edge of the circle is close enough");
    assert!(sampled.xz().length() >= 1.0);

    // Слишком далеко от проходимой зоны
    let far = NavigationSurface::default().with_blocked(Vec2::ZERO, 10.0);
    assert!(far.sample_navigable_point_near(Vec3::ZERO, 2.0).is_none());
}

#[test]
fn test_sample_clamps_to_bounds() {
    let surface = NavigationSurface::default();

    let sampled = surface.sample_navigable_point_near(Vec3::new(51.0, 0.0, 0.0), 2.0);
    assert_eq!(sampled, Some(Vec3::new(50.0, 0.0, 0.0)));
    assert!(surface.sample_navigable_point_near(Vec3::new(60.0, 0.0, 0.0), 2.0).is_none());
}

#[test]
fn test_nav_agent_stop_resume() {
    let mut agent = NavAgent::new(4.0);
    agent.set_destination(Vec3::new(0.0, 0.0, -10.0));

    assert!(agent.is_path_pending());
    assert_eq!(agent.remaining_distance(Vec3::ZERO), 10.0);

    agent.stop();
    assert!(agent.is_stopped());
    assert_eq!(agent.current_velocity(), Vec3::ZERO);

    agent.resume();
    assert!(!agent.is_stopped());
}

#[test]
fn test_drive_nav_agents_moves_towards_destination() {
    use std::time::Duration;

    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .insert_resource(bevy::time::TimeUpdateStrategy::ManualDuration(Duration::from_millis(100)))
        .add_systems(Update, drive_nav_agents);

    let mut agent = NavAgent::new(5.0);
    agent.set_destination(Vec3::new(0.0, 0.0, -10.0));
    let entity = app.world_mut().spawn((agent, Transform::default())).id();

    // Первый update: delta == 0
    app.update();
    app.update();

    let world = app.world();
    let transform = world.get::<Transform>(entity).expect("transform");
    let agent = world.get::<NavAgent>(entity).expect("agent");

    assert!((transform.translation.z + 0.5).abs() < 1e-3);
    assert!(!agent.is_path_pending());
    assert!((agent.current_velocity().length() - 5.0).abs() < 1e-3);
}
