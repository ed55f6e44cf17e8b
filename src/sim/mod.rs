//! Deterministic arena simulation
//!
//! All gameplay logic lives here:
//! - Seeded RNG only
//! - Stable iteration order (by slot id)
//! - No rendering or platform dependencies

pub mod ai;
pub mod collision;
pub mod grid;
pub mod state;
pub mod storage;
pub mod tick;
pub mod timer;
pub mod world;

#[cfg(test)]
pub mod fixtures;

pub use ai::predict;
pub use collision::{Aabb, Circle};
pub use grid::{Address, SpatialHash};
pub use state::{Bullet, Controls, GameEvent, GamePhase, Tank};
pub use storage::{Key, Storage};
pub use tick::FrameInput;
pub use timer::{Easing, Interpolator, Timer};
pub use world::World;
