//! Target Lock Controller
//!
//! Lock-on по врагам в конусе обзора (reference = камера `LockReference`, иначе игрок).
//!
//! - Acquisition: overlap в max_lock_distance → живые, в конусе lock_angle/2, с LOS
//!   → ранжирование по удалённости от центра экрана
//! - Maintenance: гистерезис (1.2× дистанция, 1.5× полуугол), LOS, смерть цели
//! - Cycling: ранжирование по горизонтали экрана, ±1 с wraparound
//!
//! TargetLock хранит только Entity (слабая ссылка): цель может исчезнуть в любой момент.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::{Enemy, Health, Player};
use crate::config::CombatTuning;
use crate::player::{CycleDirection, PlayerAction};
use crate::spatial::{angle_between_deg, has_line_of_sight, CollisionBody, SpatialIndex, SpatialQuery, LAYER_ENEMY, LOCK_SIGHT_MASK};
use crate::FrameSet;


/// Параметры lock-on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockOnConfig {
    pub max_lock_distance: f32,
    /// Полный угол конуса (градусы)
    pub lock_angle: f32,
    pub release_distance_multiplier: f32,
    pub release_angle_multiplier: f32,
    pub reacquire_on_target_death: bool,
}

impl Default for LockOnConfig {
    fn default() -> Self {
        Self {
            max_lock_distance: 20.0,
            lock_angle: 60.0,
            release_distance_multiplier: 1.2,
            release_angle_multiplier: 1.5,
            reacquire_on_target_death: true,
        }
    }
}

/// Текущая захваченная цель (weak reference)
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TargetLock {
    target: Option<Entity>,
}

impl TargetLock {
    pub fn get(&self) -> Option<Entity> {
        self.target
    }

    pub fn is_locked(&self) -> bool {
        self.target.is_some()
    }

    /// Возвращает предыдущую цель
    pub fn set(&mut self, target: Option<Entity>) -> Option<Entity> {
        std::mem::replace(&mut self.target, target)
    }

    pub fn clear(&mut self) -> Option<Entity> {
        self.target.take()
    }
}

/// Маркер: transform, от которого считается конус (камера)
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct LockReference;

/// Событие: цель сменилась
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetLockChanged {
    pub previous: Option<Entity>,
    pub current: Option<Entity>,
}

/// Кандидат на захват
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LockCandidate {
    pub entity: Entity,
    /// Проекция на экран (x вправо, y вверх), в единицах tan
    pub screen: Vec2,
}

/// Проекция точки в пространство reference'а (pinhole: x/-z, y/-z). None - за спиной.
pub fn project_to_screen(reference: &Transform, point: Vec3) -> Option<Vec2> {
    let local = reference.rotation.inverse() * (point - reference.translation);
    if local.z >= -f32::EPSILON {
        return None;
    }
    Some(Vec2::new(local.x / -local.z, local.y / -local.z))
}

/// Initial acquisition: ближе к центру экрана, ties → по entity
pub fn rank_for_acquisition(candidates: &mut [LockCandidate]) {
    candidates.sort_by(|a, b| {
        a.screen
            .length_squared()
            .total_cmp(&b.screen.length_squared())
            .then(a.entity.cmp(&b.entity))
    });
}

/// Cycling: слева направо, ties → по entity
pub fn rank_for_cycling(candidates: &mut [LockCandidate]) {
    candidates.sort_by(|a, b| a.screen.x.total_cmp(&b.screen.x).then(a.entity.cmp(&b.entity)));
}

/// Следующая цель при cycling (candidates уже отсортированы по x)
pub fn cycle_target(candidates: &[LockCandidate], current: Option<Entity>, direction: CycleDirection) -> Option<Entity> {
    if candidates.is_empty() {
        return None;
    }
    let len = candidates.len();
    let index = match current.and_then(|current| candidates.iter().position(|c| c.entity == current)) {
        Some(index) => match direction {
            CycleDirection::Right => (index + 1) % len,
            CycleDirection::Left => (index + len - 1) % len,
        },
        None => match direction {
            CycleDirection::Right => 0,
            CycleDirection::Left => len - 1,
        },
    };
    Some(candidates[index].entity)
}

/// Геометрия одного тика: игрок + reference
#[derive(Debug, Clone, Copy)]
pub struct LockFrame {
    pub player: Entity,
    pub player_position: Vec3,
    pub reference: Transform,
}

/// Центр цели (центр коллайдера, если есть)
fn target_center(transform: &Transform, body: Option<&CollisionBody>) -> Vec3 {
    body.map(|body| body.center(transform)).unwrap_or(transform.translation)
}

/// Валидна ли цель для захвата / удержания с заданными порогами
///
/// Дистанция - от игрока до позиции цели; угол и LOS - от reference до центра цели.
pub fn is_target_valid(
    frame: &LockFrame,
    target: Entity,
    position: Vec3,
    center: Vec3,
    max_distance: f32,
    half_angle: f32,
    index: &impl SpatialQuery,
) -> bool {
    let forward: Vec3 = frame.reference.forward().into();

    frame.player_position.distance(position) <= max_distance
        && angle_between_deg(forward, center - frame.reference.translation) <= half_angle
        && has_line_of_sight(index, frame.reference.translation, target, center, LOCK_SIGHT_MASK)
}

/// Type alias для запросов целей
pub type LockTargets<'w, 's> = Query<
    'w,
    's,
    (&'static Transform, &'static Health, Option<&'static CollisionBody>),
    (With<Enemy>, Without<Player>),
>;

/// Все валидные кандидаты (проекция на экран)
pub fn gather_candidates(
    frame: &LockFrame,
    config: &LockOnConfig,
    targets: &LockTargets,
    index: &SpatialIndex,
) -> Vec<LockCandidate> {
    let half_angle = config.lock_angle * 0.5;

    index
        .overlap_volume(frame.player_position, config.max_lock_distance, LAYER_ENEMY)
        .into_iter()
        .filter_map(|entity| {
            let (transform, health, body) = targets.get(entity).ok()?;
            if health.is_dead() {
                return None;
            }
            let center = target_center(transform, body);
            if !is_target_valid(
                frame,
                entity,
                transform.translation,
                center,
                config.max_lock_distance,
                half_angle,
                index,
            ) {
                return None;
            }
            let screen = project_to_screen(&frame.reference, center)?;
            Some(LockCandidate { entity, screen })
        })
        .collect()
}

/// Лучший кандидат для первого захвата
pub fn acquire_target(
    frame: &LockFrame,
    config: &LockOnConfig,
    targets: &LockTargets,
    index: &SpatialIndex,
) -> Option<Entity> {
    let mut candidates = gather_candidates(frame, config, targets, index);
    rank_for_acquisition(&mut candidates);
    candidates.first().map(|candidate| candidate.entity)
}

fn lock_frame(
    players: &Query<(Entity, &Transform), With<Player>>,
    references: &Query<&Transform, (With<LockReference>, Without<Player>)>,
) -> Option<LockFrame> {
    let (player, player_transform) = players.single().ok()?;
    let reference = references.iter().next().copied().unwrap_or(*player_transform);
    Some(LockFrame {
        player,
        player_position: player_transform.translation,
        reference,
    })
}

/// System: lock / unlock / cycle по вводу
#[allow(clippy::too_many_arguments)]
pub fn handle_lock_actions(
    mut actions: EventReader<PlayerAction>,
    mut lock: ResMut<TargetLock>,
    mut lock_events: EventWriter<TargetLockChanged>,
    players: Query<(Entity, &Transform), With<Player>>,
    player_health: Query<&Health, With<Player>>,
    references: Query<&Transform, (With<LockReference>, Without<Player>)>,
    targets: LockTargets,
    index: Res<SpatialIndex>,
    tuning: Res<CombatTuning>,
) {
    let config = &tuning.lock_on;

    for action in actions.read() {
        let next = match action {
            PlayerAction::AttackPressed => continue,
            PlayerAction::ToggleLock => {
                if lock.is_locked() {
                    None
                } else {
                    let Some(frame) = lock_frame(&players, &references) else {
                        continue;
                    };
                    if player_health.get(frame.player).is_ok_and(|health| health.is_dead()) {
                        continue;
                    }
                    acquire_target(&frame, config, &targets, &index)
                }
            }
            PlayerAction::CycleTarget(direction) => {
                // Без lock - no-op
                if !lock.is_locked() {
                    continue;
                }
                let Some(frame) = lock_frame(&players, &references) else {
                    continue;
                };
                let mut candidates = gather_candidates(&frame, config, &targets, &index);
                rank_for_cycling(&mut candidates);
                match cycle_target(&candidates, lock.get(), *direction) {
                    Some(next) => Some(next),
                    None => continue,
                }
            }
        };

        let previous = lock.set(next);
        if previous != next {
            crate::logger::log(&format!("🎯 lock: {:?} → {:?}", previous, next));
            lock_events.write(TargetLockChanged { previous, current: next });
        }
    }
}

/// System: удержание lock'а (гистерезис) + re-acquire после смерти цели
pub fn maintain_lock(
    mut lock: ResMut<TargetLock>,
    mut lock_events: EventWriter<TargetLockChanged>,
    players: Query<(Entity, &Transform), With<Player>>,
    references: Query<&Transform, (With<LockReference>, Without<Player>)>,
    targets: LockTargets,
    index: Res<SpatialIndex>,
    tuning: Res<CombatTuning>,
) {
    let Some(current) = lock.get() else {
        return;
    };
    let config = &tuning.lock_on;

    let Some(frame) = lock_frame(&players, &references) else {
        lock.clear();
        lock_events.write(TargetLockChanged {
            previous: Some(current),
            current: None,
        });
        return;
    };

    let (keep, died) = match targets.get(current) {
        Err(_) => (false, false),
        Ok((_, health, _)) if health.is_dead() => (false, true),
        Ok((transform, _, body)) => {
            let center = target_center(transform, body);
            let keep = is_target_valid(
                &frame,
                current,
                transform.translation,
                center,
                config.max_lock_distance * config.release_distance_multiplier,
                config.lock_angle * 0.5 * config.release_angle_multiplier,
                &*index,
            );
            (keep, false)
        }
    };

    if keep {
        return;
    }

    let next = if died && config.reacquire_on_target_death {
        acquire_target(&frame, config, &targets, &index)
    } else {
        None
    };

    lock.set(next);
    crate::logger::log(&format!(
        "🎯 lock lost on {:?} (died: {}) → {:?}",
        current, died, next
    ));
    lock_events.write(TargetLockChanged {
        previous: Some(current),
        current: next,
    });
}

/// Targeting Plugin
pub struct TargetingPlugin;

impl Plugin for TargetingPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TargetLock>()
            .add_event::<TargetLockChanged>()
            .add_systems(
                Update,
                (handle_lock_actions, maintain_lock)
                    .chain()
                    .in_set(FrameSet::Targeting),
            );
    }
}
