//! Navigation (headless locomotion)
//!
//! ECS решает КУДА идти (destination), NavAgent - КАК (кинематический шаг).
//! Pathfinding и физика капсулы - забота хоста; здесь прямая линия по XZ.
//!
//! - `NavAgent` - destination, speed, stop/resume, velocity
//! - `NavigableSurface` - валидация точек патруля
//! - `NavigationSurface` - headless реализация (bounds + blocked circles)

use bevy::prelude::*;
use rand::Rng;

#[cfg(test)]
mod navigation_tests;

/// Navigation agent (per actor)
#[derive(Component, Debug, Clone, PartialEq)]
pub struct NavAgent {
    pub speed: f32,
    /// Агент останавливается, не доходя stopping_distance до цели
    pub stopping_distance: f32,
    destination: Option<Vec3>,
    stopped: bool,
    velocity: Vec3,
    path_pending: bool,
}

impl Default for NavAgent {
    fn default() -> Self {
        Self::new(3.5)
    }
}

impl NavAgent {
    pub fn new(speed: f32) -> Self {
        Self {
            speed,
            stopping_distance: 0.0,
            destination: None,
            stopped: false,
            velocity: Vec3::ZERO,
            path_pending: false,
        }
    }

    /// Новая цель; путь считается на следующем шаге (`is_path_pending` до тех пор)
    pub fn set_destination(&mut self, destination: Vec3) {
        if self.destination != Some(destination) {
            self.path_pending = true;
        }
        self.destination = Some(destination);
    }

    pub fn destination(&self) -> Option<Vec3> {
        self.destination
    }

    /// Дистанция по XZ до destination (0 без цели)
    pub fn remaining_distance(&self, position: Vec3) -> f32 {
        self.destination
            .map(|destination| flat_distance(position, destination))
            .unwrap_or(0.0)
    }

    pub fn is_path_pending(&self) -> bool {
        self.path_pending
    }

    pub fn current_velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn stop(&mut self) {
        self.stopped = true;
        self.velocity = Vec3::ZERO;
    }

    pub fn resume(&mut self) {
        self.stopped = false;
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

/// Стык навигационного меша
pub trait NavigableSurface {
    /// Ближайшая проходимая точка не дальше `max_distance` от `point`
    fn sample_navigable_point_near(&self, point: Vec3, max_distance: f32) -> Option<Vec3>;
}

/// Headless navigable surface: прямоугольник XZ минус круглые препятствия
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct NavigationSurface {
    pub min: Vec2,
    pub max: Vec2,
    /// (center XZ, radius)
    pub blocked: Vec<(Vec2, f32)>,
}

impl Default for NavigationSurface {
    fn default() -> Self {
        Self {
            min: Vec2::splat(-50.0),
            max: Vec2::splat(50.0),
            blocked: Vec::new(),
        }
    }
}

impl NavigationSurface {
    pub fn with_blocked(mut self, center: Vec2, radius: f32) -> Self {
        self.blocked.push((center, radius));
        self
    }

    fn is_navigable(&self, xz: Vec2) -> bool {
        let inside = xz.cmpge(self.min).all() && xz.cmple(self.max).all();
        inside
            && !self
                .blocked
                .iter()
                .any(|(center, radius)| xz.distance_squared(*center) < radius * radius)
    }
}

impl NavigableSurface for NavigationSurface {
    fn sample_navigable_point_near(&self, point: Vec3, max_distance: f32) -> Option<Vec3> {
        let xz = point.xz();
        if self.is_navigable(xz) {
            return Some(point);
        }

        let mut candidates = vec![xz.clamp(self.min, self.max)];
        for (center, radius) in &self.blocked {
            let away = (xz - *center).try_normalize().unwrap_or(Vec2::X);
            candidates.push(*center + away * (radius + 0.01));
        }

        candidates
            .into_iter()
            .filter(|candidate| self.is_navigable(*candidate))
            .filter(|candidate| candidate.distance(xz) <= max_distance)
            .min_by(|a, b| a.distance_squared(xz).total_cmp(&b.distance_squared(xz)))
            .map(|candidate| Vec3::new(candidate.x, point.y, candidate.y))
    }
}

/// Случайная проходимая точка в радиусе от spawn (до `attempts` попыток)
///
/// Fallback: сам spawn.
pub fn pick_patrol_destination(
    spawn: Vec3,
    radius: f32,
    attempts: u32,
    sample_distance: f32,
    surface: &dyn NavigableSurface,
    rng: &mut impl Rng,
) -> Vec3 {
    for _ in 0..attempts {
        let angle = rng.gen_range(0.0..std::f32::consts::TAU);
        let distance = radius.max(0.0) * rng.gen::<f32>().sqrt();
        let candidate = spawn + Vec3::new(angle.cos(), 0.0, angle.sin()) * distance;

        if let Some(point) = surface.sample_navigable_point_near(candidate, sample_distance) {
            return point;
        }
    }

    crate::logger::log_warning(&format!(
        "pick_patrol_destination: no navigable point after {} attempts, falling back to spawn {:?}",
        attempts, spawn
    ));
    spawn
}

pub fn flat_distance(a: Vec3, b: Vec3) -> f32 {
    a.xz().distance(b.xz())
}

/// System: кинематический шаг NavAgent'ов (FixedUpdate)
///
/// Двигает Transform по XZ к destination, поворачивает по направлению движения.
pub fn drive_nav_agents(mut agents: Query<(&mut NavAgent, &mut Transform)>, time: Res<Time>) {
    let delta = time.delta_secs();

    for (mut agent, mut transform) in agents.iter_mut() {
        // Путь "посчитан" к концу тика
        agent.path_pending = false;

        let Some(destination) = agent.destination else {
            agent.velocity = Vec3::ZERO;
            continue;
        };

        if agent.stopped {
            agent.velocity = Vec3::ZERO;
            continue;
        }

        let to_destination = Vec3::new(
            destination.x - transform.translation.x,
            0.0,
            destination.z - transform.translation.z,
        );
        let remaining = to_destination.length() - agent.stopping_distance;

        if remaining <= f32::EPSILON || delta <= 0.0 {
            agent.velocity = Vec3::ZERO;
            continue;
        }

        let direction = to_destination.normalize_or_zero();
        let step = (agent.speed * delta).min(remaining);
        transform.translation += direction * step;
        agent.velocity = direction * (step / delta);

        let look_at = transform.translation + direction;
        transform.look_at(look_at, Vec3::Y);
    }
}

/// Navigation Plugin
pub struct NavigationPlugin;

impl Plugin for NavigationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<NavigationSurface>();
    }
}
