//! Базовые компоненты акторов: Actor, Player, Enemy, Health

use bevy::prelude::*;

/// Актор (игрок, враг) - базовый компонент для живых существ
///
/// Автоматически добавляет Health через Required Components.
#[derive(Component, Debug, Clone, Copy, Default)]
#[require(Health)]
pub struct Actor;

/// Маркер игрока (ровно один на сцене)
#[derive(Component, Debug, Clone, Copy, Default)]
#[require(Actor)]
pub struct Player;

/// Маркер врага
#[derive(Component, Debug, Clone, Copy, Default)]
#[require(Actor)]
pub struct Enemy;

/// Точка спавна (центр патрульной зоны)
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct SpawnPoint(pub Vec3);

/// Актор без обязательных коллабораторов (animator, nav agent, brain)
///
/// Все боевые системы пропускают его. Ставится один раз, с логом.
#[derive(Component, Debug, Clone)]
pub struct CombatDisabled {
    pub reason: String,
}

/// Health ledger
///
/// Инвариант: 0 ≤ current ≤ max, max > 0.
/// После смерти current == 0 навсегда, dead == true.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Health {
    current: u32,
    max: u32,
    dead: bool,
}

/// Результат `Health::apply_damage`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthChange {
    pub new_health: u32,
    /// Фактически снятое здоровье (может быть меньше amount при overkill)
    pub dealt: u32,
    /// true только на переходе >0 → 0
    pub just_died: bool,
    pub is_critical: bool,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100)
    }
}

impl Health {
    /// `max == 0` поднимается до 1 (ledger всегда создаётся живым)
    pub fn new(max: u32) -> Self {
        let max = max.max(1);
        Self {
            current: max,
            max,
            dead: false,
        }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn is_alive(&self) -> bool {
        !self.dead
    }

    /// Снять здоровье.
    ///
    /// Мёртвый ledger и `amount <= 0` - no-op (dealt == 0).
    pub fn apply_damage(&mut self, amount: i32, is_critical: bool) -> HealthChange {
        if self.dead || amount <= 0 {
            return HealthChange {
                new_health: self.current,
                dealt: 0,
                just_died: false,
                is_critical,
            };
        }

        let dealt = (amount as u32).min(self.current);
        self.current -= dealt;

        let just_died = self.current == 0;
        if just_died {
            self.dead = true;
        }

        HealthChange {
            new_health: self.current,
            dealt,
            just_died,
            is_critical,
        }
    }

    /// Вылечить (clamp по max). Мёртвых не лечим. Возвращает новое здоровье.
    pub fn heal(&mut self, amount: u32) -> u32 {
        if !self.dead {
            self.current = self.current.saturating_add(amount).min(self.max);
        }
        self.current
    }
}
