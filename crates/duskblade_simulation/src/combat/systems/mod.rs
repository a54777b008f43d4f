//! Combat systems

pub mod combo;
pub mod damage;
pub mod enemy_attack;
pub mod projectile;

// Tests (separate files with _tests suffix)
#[cfg(test)]
mod combo_tests;
#[cfg(test)]
mod enemy_attack_tests;

// Re-export all systems
pub use combo::*;
pub use damage::*;
pub use enemy_attack::*;
pub use projectile::*;
