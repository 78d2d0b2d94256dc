//! Component definitions for the ECS world.
//!
//! Characters are entities carrying a [`Character`]. The submarine layout is
//! a single [`Submarine`] owned by the engine rather than spread over
//! entities, because every agent reads most of it every tick.

mod character;
mod item;
mod ship;

pub use character::*;
pub use item::*;
pub use ship::*;
