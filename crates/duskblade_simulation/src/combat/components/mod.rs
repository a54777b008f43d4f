//! Combat components

pub mod combo;
pub mod enemy_attack;
pub mod projectile;

// Re-export all components
pub use combo::*;
pub use enemy_attack::*;
pub use projectile::*;
