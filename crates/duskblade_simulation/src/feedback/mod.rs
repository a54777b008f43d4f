//! Damage feedback: listeners registry + floating damage numbers.
//!
//! - `DamageListeners` - подписки на урон конкретного актора (health bars, квесты, звук)
//!   Отписка явная (`unsubscribe`) или автоматическая при деспавне актора.
//! - `DamageNumber` - всплывающие цифры урона (позиция + таймер, рендер на стороне хоста)

use bevy::prelude::*;

use crate::combat::DamageApplied;
use crate::components::Actor;
use crate::FrameSet;


/// Время жизни цифры урона (секунды)
pub const DAMAGE_NUMBER_LIFETIME: f32 = 0.8;

/// Скорость подъёма цифры (м/с)
pub const DAMAGE_NUMBER_RISE_SPEED: f32 = 1.5;

/// Высота появления над целью
const DAMAGE_NUMBER_HEIGHT: f32 = 1.0;

pub type DamageCallback = Box<dyn Fn(&DamageApplied) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

struct Listener {
    id: ListenerId,
    target: Entity,
    callback: DamageCallback,
}

/// Реестр подписчиков на урон
#[derive(Resource, Default)]
pub struct DamageListeners {
    next_id: u64,
    listeners: Vec<Listener>,
}

impl DamageListeners {
    /// Подписка на урон по `target`
    pub fn subscribe(&mut self, target: Entity, callback: impl Fn(&DamageApplied) + Send + Sync + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push(Listener {
            id,
            target,
            callback: Box::new(callback),
        });
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|listener| listener.id != id);
        self.listeners.len() != before
    }

    /// Снять все подписки на `target`. Возвращает количество снятых.
    pub fn release_target(&mut self, target: Entity) -> usize {
        let before = self.listeners.len();
        self.listeners.retain(|listener| listener.target != target);
        before - self.listeners.len()
    }

    pub fn notify(&self, event: &DamageApplied) {
        for listener in self.listeners.iter().filter(|listener| listener.target == event.target) {
            (listener.callback)(event);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

/// Всплывающая цифра урона
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct DamageNumber {
    pub amount: u32,
    pub is_critical: bool,
    pub target: Entity,
    /// Секунды с момента появления
    pub timer: f32,
}

/// System: рассылка DamageApplied подписчикам
pub fn dispatch_damage_listeners(mut damage_events: EventReader<DamageApplied>, listeners: Res<DamageListeners>) {
    for event in damage_events.read() {
        listeners.notify(event);
    }
}

/// System: автоматическая отписка при деспавне актора
pub fn release_despawned_listeners(mut removed: RemovedComponents<Actor>, mut listeners: ResMut<DamageListeners>) {
    for entity in removed.read() {
        let released = listeners.release_target(entity);
        if released > 0 {
            crate::logger::log(&format!("{:?} despawned → {} damage listeners released", entity, released));
        }
    }
}

/// System: спавн цифр урона
pub fn spawn_damage_numbers(
    mut commands: Commands,
    mut damage_events: EventReader<DamageApplied>,
    targets: Query<&Transform>,
) {
    for event in damage_events.read() {
        if event.amount == 0 {
            continue;
        }
        let Ok(target_transform) = targets.get(event.target) else {
            continue;
        };

        commands.spawn((
            DamageNumber {
                amount: event.amount,
                is_critical: event.is_critical,
                target: event.target,
                timer: 0.0,
            },
            Transform::from_translation(target_transform.translation + Vec3::Y * DAMAGE_NUMBER_HEIGHT),
        ));
    }
}

/// System: подъём и деспавн цифр урона
pub fn tick_damage_numbers(
    mut commands: Commands,
    mut numbers: Query<(Entity, &mut DamageNumber, &mut Transform)>,
    time: Res<Time>,
) {
    let delta = time.delta_secs();

    for (entity, mut number, mut transform) in numbers.iter_mut() {
        number.timer += delta;
        if number.timer >= DAMAGE_NUMBER_LIFETIME {
            commands.entity(entity).despawn();
            continue;
        }
        transform.translation.y += DAMAGE_NUMBER_RISE_SPEED * delta;
    }
}

/// Feedback Plugin
pub struct FeedbackPlugin;

impl Plugin for FeedbackPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DamageListeners>().add_systems(
            Update,
            (
                dispatch_damage_listeners,
                spawn_damage_numbers,
                tick_damage_numbers,
                release_despawned_listeners,
            )
                .chain()
                .in_set(FrameSet::Feedback),
        );
    }
}
