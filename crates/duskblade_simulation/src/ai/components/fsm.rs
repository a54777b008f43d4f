//! Enemy movement FSM components (state, brain, config) + pure transition rules.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::timer::Sequencer;

/// Состояния врага
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EnemyState {
    /// Патруль вокруг spawn point
    #[default]
    Patrol,
    /// Преследование/бой с игроком
    Engaged,
    /// Оглушён после non-lethal урона
    HitStunned,
    /// Terminal
    Dead,
}

/// Фаза оглушения
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StunPhase {
    Stunned,
}

/// Фаза ожидания на патрульной точке
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatrolPhase {
    Waiting,
}

/// Параметры врага
#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyConfig {
    pub aggro_range: f32,
    pub attack_range: f32,
    /// Должен быть < attack_range (автокоррекция до 80% attack_range)
    pub stopping_distance_engaged: f32,
    pub patrol_radius: f32,
    pub patrol_wait_min: f32,
    pub patrol_wait_max: f32,
    pub patrol_sample_attempts: u32,
    pub nav_sample_distance: f32,
    pub arrival_threshold: f32,
    pub hit_stun_duration: f32,
    /// Engaged → Patrol при distance > aggro_range × disengage_multiplier
    pub disengage_multiplier: f32,
    /// Высота глаз (origin LOS луча)
    pub eye_height: f32,
    pub move_speed: f32,
    pub max_health: u32,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            aggro_range: 10.0,
            attack_range: 2.0,
            stopping_distance_engaged: 1.5,
            patrol_radius: 8.0,
            patrol_wait_min: 1.0,
            patrol_wait_max: 3.0,
            patrol_sample_attempts: 30,
            nav_sample_distance: 2.0,
            arrival_threshold: 0.5,
            hit_stun_duration: 0.5,
            disengage_multiplier: 1.2,
            eye_height: 0.8,
            move_speed: 3.5,
            max_health: 50,
        }
    }
}

impl EnemyConfig {
    /// Автокоррекция инвариантов (с warning в лог)
    pub fn validated(mut self) -> Self {
        if self.stopping_distance_engaged >= self.attack_range {
            let corrected = self.attack_range * 0.8;
            crate::logger::log_warning(&format!(
                "EnemyConfig: stopping_distance_engaged {:.2} >= attack_range {:.2}, corrected to {:.2}",
                self.stopping_distance_engaged, self.attack_range, corrected
            ));
            self.stopping_distance_engaged = corrected;
        }

        if self.patrol_wait_min > self.patrol_wait_max {
            crate::logger::log_warning(&format!(
                "EnemyConfig: patrol wait range [{:.2}, {:.2}] inverted, swapped",
                self.patrol_wait_min, self.patrol_wait_max
            ));
            std::mem::swap(&mut self.patrol_wait_min, &mut self.patrol_wait_max);
        }

        if self.max_health == 0 {
            crate::logger::log_warning("EnemyConfig: max_health 0, raised to 1");
            self.max_health = 1;
        }

        self
    }
}

/// Мозг врага: FSM + таймеры
#[derive(Component, Debug, Clone, PartialEq)]
pub struct EnemyBrain {
    pub state: EnemyState,
    /// Состояние до оглушения (никогда не Dead)
    pub previous_state: Option<EnemyState>,
    pub stun: Sequencer<StunPhase>,
    pub patrol_wait: Sequencer<PatrolPhase>,
    /// Нужно выбрать новую патрульную точку
    pub needs_patrol_destination: bool,
    /// Игрок пропал - враг стоит (лог один раз)
    pub halted: bool,
}

impl Default for EnemyBrain {
    fn default() -> Self {
        Self {
            state: EnemyState::Patrol,
            previous_state: None,
            stun: Sequencer::new(),
            patrol_wait: Sequencer::new(),
            needs_patrol_destination: true,
            halted: false,
        }
    }
}

impl EnemyBrain {
    pub fn is_dead(&self) -> bool {
        self.state == EnemyState::Dead
    }

    /// Переход с учётом патрульного под-состояния. Возвращает предыдущее состояние.
    pub fn transition(&mut self, next: EnemyState) -> EnemyState {
        let previous = self.state;
        self.state = next;
        if next == EnemyState::Patrol {
            self.needs_patrol_destination = true;
            self.patrol_wait.cancel();
        }
        previous
    }

    /// Оглушение: запоминаем previous_state (повторное оглушение его не перезаписывает)
    pub fn enter_hit_stun(&mut self, now: f32, duration: f32) {
        if self.state == EnemyState::Dead {
            return;
        }
        if self.state != EnemyState::HitStunned {
            self.previous_state = Some(self.state);
            self.state = EnemyState::HitStunned;
        }
        self.stun.start(StunPhase::Stunned, now, duration);
    }
}

/// Что враг знает об игроке на этом тике
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Perception {
    /// None - игрока нет или он мёртв
    pub distance: Option<f32>,
    pub line_of_sight: bool,
    pub mid_attack: bool,
}

impl Perception {
    pub fn player_in_aggro(&self, config: &EnemyConfig) -> bool {
        self.distance
            .is_some_and(|distance| distance <= config.aggro_range && self.line_of_sight)
    }
}

/// Переходы Patrol ↔ Engaged (HitStunned/Dead обрабатываются отдельно)
pub fn evaluate_transition(state: EnemyState, perception: &Perception, config: &EnemyConfig) -> Option<EnemyState> {
    match state {
        EnemyState::Patrol => perception
            .player_in_aggro(config)
            .then_some(EnemyState::Engaged),
        EnemyState::Engaged => {
            if perception.mid_attack {
                return None;
            }
            let lost = match perception.distance {
                None => true,
                Some(distance) => {
                    distance > config.aggro_range * config.disengage_multiplier
                        || (distance > config.attack_range && !perception.line_of_sight)
                }
            };
            lost.then_some(EnemyState::Patrol)
        }
        EnemyState::HitStunned | EnemyState::Dead => None,
    }
}

/// Куда выходить из оглушения
pub fn stun_exit_state(previous: Option<EnemyState>, perception: &Perception, config: &EnemyConfig) -> EnemyState {
    if perception.player_in_aggro(config) {
        return EnemyState::Engaged;
    }
    match previous {
        Some(EnemyState::Engaged) => EnemyState::Engaged,
        _ => EnemyState::Patrol,
    }
}
