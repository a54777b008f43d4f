//! ECS Components для акторов
//!
//! - actor: маркеры (Actor, Player, Enemy), SpawnPoint, CombatDisabled, Health ledger
//!
//! Доменные компоненты живут рядом со своими системами (ai, combat, navigation, animation).

pub mod actor;

pub use actor::*;
