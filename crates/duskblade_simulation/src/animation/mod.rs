//! Animation driver (headless)
//!
//! Клипы не проигрываются - моделируем только то, что читает боевая логика:
//! - текущий state tag (Locomotion / Attack / HitReact / Death) и длина клипа
//! - триггеры применяются на следующем тике аниматора (как в движке)
//! - выход из state → `AnimationStateExited` (enemy attack снимает флаг атаки)
//! - каждый запущенный клип получает serial: выход старого клипа нельзя спутать с новым
//!
//! Параметры проверяются по `AnimatorCapabilities`, собранным один раз при спавне.

use bevy::prelude::*;
use thiserror::Error;


/// Параметры animator'а, известные симуляции
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AnimParam {
    Speed,
    IsMoving,
    Attack,
    ComboStep,
    HitReact,
    Death,
}

impl AnimParam {
    pub const ALL: [AnimParam; 6] = [
        AnimParam::Speed,
        AnimParam::IsMoving,
        AnimParam::Attack,
        AnimParam::ComboStep,
        AnimParam::HitReact,
        AnimParam::Death,
    ];

    /// Имя параметра в animator controller
    pub fn name(&self) -> &'static str {
        match self {
            AnimParam::Speed => "Speed",
            AnimParam::IsMoving => "IsMoving",
            AnimParam::Attack => "Attack",
            AnimParam::ComboStep => "ComboStep",
            AnimParam::HitReact => "Hit",
            AnimParam::Death => "Die",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnimationError {
    #[error("animator does not expose parameter `{}`", .0.name())]
    Unsupported(AnimParam),
}

/// Таблица поддерживаемых параметров (резолвится один раз)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnimatorCapabilities {
    supported: Vec<AnimParam>,
}

impl AnimatorCapabilities {
    pub fn all() -> Self {
        Self {
            supported: AnimParam::ALL.to_vec(),
        }
    }

    /// Резолв по именам параметров controller'а; неизвестные имена игнорируются
    pub fn resolve<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut supported: Vec<AnimParam> = names
            .into_iter()
            .filter_map(|name| AnimParam::ALL.into_iter().find(|param| param.name() == name))
            .collect();
        supported.sort();
        supported.dedup();
        Self { supported }
    }

    pub fn supports(&self, param: AnimParam) -> bool {
        self.supported.contains(&param)
    }

    pub fn check(&self, param: AnimParam) -> Result<(), AnimationError> {
        if self.supports(param) {
            Ok(())
        } else {
            Err(AnimationError::Unsupported(param))
        }
    }
}

/// Тег animator state (Unity-style state tags)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateTag {
    Locomotion,
    Attack,
    HitReact,
    Death,
}

/// Триггер перехода
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimTrigger {
    /// Атака (combo step для игрока, 0 для врага)
    Attack { step: u8 },
    HitReact,
    Death,
}

impl AnimTrigger {
    fn param(&self) -> AnimParam {
        match self {
            AnimTrigger::Attack { .. } => AnimParam::Attack,
            AnimTrigger::HitReact => AnimParam::HitReact,
            AnimTrigger::Death => AnimParam::Death,
        }
    }
}

/// Длины клипов (секунды)
#[derive(Debug, Clone, PartialEq)]
pub struct ClipLengths {
    /// Индекс = combo step - 1 (для врага используется [0])
    pub attack: Vec<f32>,
    pub hit_react: f32,
    pub death: f32,
}

impl ClipLengths {
    pub fn player() -> Self {
        Self {
            attack: vec![0.6, 0.6, 0.8],
            hit_react: 0.4,
            death: 1.5,
        }
    }

    pub fn enemy() -> Self {
        Self {
            attack: vec![1.2],
            hit_react: 0.4,
            death: 1.5,
        }
    }

    fn attack_length(&self, step: u8) -> f32 {
        let index = (step.max(1) as usize - 1).min(self.attack.len().saturating_sub(1));
        self.attack.get(index).copied().unwrap_or(1.0)
    }
}

/// Serial клипа, запущенного триггером (0 = Locomotion)
pub type ClipId = u32;

/// Текущий state animator'а
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimState {
    pub tag: StateTag,
    pub clip: ClipId,
    pub elapsed: f32,
    /// 0 для бесконечных (Locomotion, Death)
    pub length: f32,
}

impl AnimState {
    fn locomotion() -> Self {
        Self {
            tag: StateTag::Locomotion,
            clip: 0,
            elapsed: 0.0,
            length: 0.0,
        }
    }
}

/// Выход из state: тег и serial клипа, который закончился
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipExit {
    pub tag: StateTag,
    pub clip: ClipId,
}

/// Animator (headless driver)
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Animator {
    capabilities: AnimatorCapabilities,
    clips: ClipLengths,
    state: AnimState,
    pending_trigger: Option<(AnimTrigger, ClipId)>,
    last_clip: ClipId,
    speed: f32,
    /// Демпфированная скорость (то, что реально видит blend tree)
    damped_speed: f32,
    damp_rate: f32,
    is_moving: bool,
}

impl Animator {
    pub fn new(capabilities: AnimatorCapabilities, clips: ClipLengths) -> Self {
        Self {
            capabilities,
            clips,
            state: AnimState::locomotion(),
            pending_trigger: None,
            last_clip: 0,
            speed: 0.0,
            damped_speed: 0.0,
            damp_rate: 10.0,
            is_moving: false,
        }
    }

    pub fn player() -> Self {
        Self::new(AnimatorCapabilities::all(), ClipLengths::player())
    }

    pub fn enemy() -> Self {
        Self::new(AnimatorCapabilities::all(), ClipLengths::enemy())
    }

    pub fn set_speed(&mut self, speed: f32) -> Result<(), AnimationError> {
        self.capabilities.check(AnimParam::Speed)?;
        self.speed = speed.max(0.0);
        Ok(())
    }

    pub fn speed(&self) -> f32 {
        self.damped_speed
    }

    pub fn set_bool(&mut self, param: AnimParam, value: bool) -> Result<(), AnimationError> {
        self.capabilities.check(param)?;
        if param == AnimParam::IsMoving {
            self.is_moving = value;
        }
        Ok(())
    }

    pub fn is_moving(&self) -> bool {
        self.is_moving
    }

    /// Поставить триггер (применится на следующем `tick_animators`)
    ///
    /// Возвращает serial клипа, который запустит триггер.
    /// Death перекрывает любой pending триггер и сам не перекрывается.
    pub fn trigger(&mut self, trigger: AnimTrigger) -> Result<ClipId, AnimationError> {
        self.capabilities.check(trigger.param())?;
        if let Some((AnimTrigger::Death, clip)) = self.pending_trigger {
            return Ok(clip);
        }
        self.last_clip = self.last_clip.wrapping_add(1).max(1);
        self.pending_trigger = Some((trigger, self.last_clip));
        Ok(self.last_clip)
    }

    pub fn pending_trigger(&self) -> Option<AnimTrigger> {
        self.pending_trigger.map(|(trigger, _)| trigger)
    }

    pub fn is_in_state_tagged(&self, tag: StateTag) -> bool {
        self.state.tag == tag
    }

    /// Serial текущего клипа (0 = Locomotion)
    pub fn current_clip(&self) -> ClipId {
        self.state.clip
    }

    pub fn current_clip_length(&self) -> f32 {
        self.state.length
    }

    /// Шаг animator'а. Возвращает state, из которого вышли (если вышли).
    pub fn advance(&mut self, delta: f32) -> Option<ClipExit> {
        let t = (self.damp_rate * delta).clamp(0.0, 1.0);
        self.damped_speed += (self.speed - self.damped_speed) * t;

        if self.state.tag == StateTag::Death {
            self.pending_trigger = None;
            return None;
        }

        if let Some((trigger, clip)) = self.pending_trigger.take() {
            let exited = self.exit_info();
            let (tag, length) = match trigger {
                AnimTrigger::Attack { step } => (StateTag::Attack, self.clips.attack_length(step)),
                AnimTrigger::HitReact => (StateTag::HitReact, self.clips.hit_react),
                AnimTrigger::Death => (StateTag::Death, self.clips.death),
            };
            self.state = AnimState {
                tag,
                clip,
                elapsed: 0.0,
                length,
            };
            return (exited.tag != StateTag::Locomotion).then_some(exited);
        }

        if self.state.tag == StateTag::Locomotion {
            return None;
        }

        self.state.elapsed += delta;
        if self.state.elapsed >= self.state.length {
            let exited = self.exit_info();
            self.state = AnimState::locomotion();
            return Some(exited);
        }

        None
    }

    fn exit_info(&self) -> ClipExit {
        ClipExit {
            tag: self.state.tag,
            clip: self.state.clip,
        }
    }
}

/// Event: animator вышел из state (клип доигран или прерван триггером)
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct AnimationStateExited {
    pub entity: Entity,
    pub tag: StateTag,
    /// Serial закончившегося клипа
    pub clip: ClipId,
}

/// System: тик всех animator'ов (Update)
pub fn tick_animators(
    mut animators: Query<(Entity, &mut Animator)>,
    mut exited_events: EventWriter<AnimationStateExited>,
    time: Res<Time>,
) {
    let delta = time.delta_secs();

    for (entity, mut animator) in animators.iter_mut() {
        if let Some(exit) = animator.advance(delta) {
            exited_events.write(AnimationStateExited {
                entity,
                tag: exit.tag,
                clip: exit.clip,
            });
        }
    }
}

/// Animation Plugin
pub struct AnimationPlugin;

impl Plugin for AnimationPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<AnimationStateExited>()
            .add_systems(Update, tick_animators.in_set(crate::FrameSet::Animation));
    }
}
