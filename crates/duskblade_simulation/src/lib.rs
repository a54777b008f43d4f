//! Duskblade Simulation Core
//!
//! ECS-симуляция боя и поведения на Bevy 0.16 (headless).
//!
//! Движок-хост (рендер, физика, ввод) подключается через стыки:
//! - `SpatialQuery` - raycast / overlap (headless: `SpatialIndex`)
//! - `NavigableSurface` + `NavAgent` - навигация (headless: `NavigationSurface`)
//! - `Animator` - параметры и триггеры анимаций, state tags
//! - `PlayerAction` - ввод игрока
//!
//! Расписание:
//! - FixedUpdate (60Hz): Reactions → Behavior → Attacks → Cleanup
//! - Update: Targeting → Combo → Animation → HitDetection → Feedback

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod actor;
pub mod ai;
pub mod animation;
pub mod combat;
pub mod components;
pub mod config;
pub mod error;
pub mod feedback;
pub mod logger;
pub mod navigation;
pub mod player;
pub mod spatial;
pub mod targeting;
pub mod timer;

// Re-export базовых типов для удобства
pub use actor::{spawn_enemy, spawn_lock_reference, spawn_obstacle, spawn_player, validate_combatants, EnemySpawn};
pub use ai::{AIPlugin, EnemyBrain, EnemyConfig, EnemyState, EnemyStateChanged};
pub use animation::{AnimationPlugin, Animator, AnimatorCapabilities, StateTag};
pub use combat::{
    ComboConfig, ComboState, CombatPlugin, DamageApplied, DamageProfile, Dead, EnemyAttackConfig, EnemyAttacker,
    EntityDied, EquippedWeapon, WeaponType,
};
pub use components::*;
pub use config::{CombatTuning, LifecycleConfig};
pub use error::SimulationError;
pub use feedback::{DamageListeners, FeedbackPlugin};
pub use logger::{init_logger, log, log_error, log_info, log_warning, set_log_level, LogLevel};
pub use navigation::{NavAgent, NavigationPlugin, NavigationSurface};
pub use player::{CycleDirection, PlayerAction, PlayerPlugin};
pub use spatial::{SpatialIndex, SpatialPlugin, SpatialQuery};
pub use targeting::{LockOnConfig, TargetLock, TargetingPlugin};

/// Порядок фаз FixedUpdate (chain)
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    /// Реакции на урон/смерть прошлого тика (hit-stun, Dead)
    Reactions,
    /// FSM + locomotion + навигация
    Behavior,
    /// Атаки врагов, снаряды
    Attacks,
    /// Деспавн
    Cleanup,
}

/// Порядок фаз Update (chain)
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameSet {
    Targeting,
    Combo,
    /// Тик animator'ов: триггеры применяются после combo
    Animation,
    /// Отложенные hit check'и читают state animator'а после тика
    HitDetection,
    Feedback,
}

/// Главный plugin симуляции (объединяет все подсистемы)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app
            // Fixed timestep 60Hz для simulation tick
            .insert_resource(Time::<Fixed>::from_hz(60.0))
            .configure_sets(
                FixedUpdate,
                (
                    SimulationSet::Reactions,
                    SimulationSet::Behavior,
                    SimulationSet::Attacks,
                    SimulationSet::Cleanup,
                )
                    .chain(),
            )
            .configure_sets(
                Update,
                (
                    FrameSet::Targeting,
                    FrameSet::Combo,
                    FrameSet::Animation,
                    FrameSet::HitDetection,
                    FrameSet::Feedback,
                )
                    .chain(),
            )
            .add_plugins((
                SpatialPlugin,
                NavigationPlugin,
                AnimationPlugin,
                PlayerPlugin,
                CombatPlugin,
                AIPlugin,
                TargetingPlugin,
                FeedbackPlugin,
            ))
            .add_systems(PreUpdate, validate_combatants);

        // Детерминистичный RNG и tuning - если хост не вставил свои
        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(42));
        }
        if !app.world().contains_resource::<CombatTuning>() {
            app.init_resource::<CombatTuning>();
        }
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции (со всеми подсистемами)
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .add_plugins(SimulationPlugin);

    app
}

/// Snapshot мира для сравнения детерминизма
///
/// Entity id + Debug представление компонента, отсортировано по id.
pub fn world_snapshot<T>(world: &mut World) -> Vec<u8>
where
    T: Component + std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
