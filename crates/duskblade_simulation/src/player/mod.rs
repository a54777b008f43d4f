//! Player input & control state
//!
//! Хост (input layer) пишет `PlayerAction` события, симуляция их читает в Update.
//! `PointerOverUi` - курсор над UI: атака не буферизуется.

use bevy::prelude::*;

/// Направление переключения цели
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleDirection {
    Left,
    Right,
}

/// Действие игрока (из input layer хоста)
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerAction {
    AttackPressed,
    /// Lock / unlock
    ToggleLock,
    CycleTarget(CycleDirection),
}

/// Курсор над UI (inventory, dialogue): атаки игнорируются
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PointerOverUi(pub bool);

/// Может ли игрок двигаться (false после смерти, в катсценах)
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerMotion {
    pub can_move: bool,
}

impl Default for PlayerMotion {
    fn default() -> Self {
        Self { can_move: true }
    }
}

/// Player Plugin
pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<PlayerAction>().init_resource::<PointerOverUi>();
    }
}
