//! Subcrew Core - Submarine Crew AI Engine
//!
//! An ECS-based engine that decides what AI-controlled crew do aboard a
//! damageable submarine and walks them there through doors, hatches and
//! ladders.
//!
//! # Architecture
//!
//! The simulation uses an Entity Component System (ECS) architecture via `hecs`:
//! - **Entities**: Characters, player-driven or AI-driven
//! - **Components**: [`Character`](components::Character) on everyone; AI agents
//!   also carry an [`AiController`](controller::AiController), an
//!   [`ObjectiveManager`](objectives::ObjectiveManager), a
//!   [`HazardCache`](hazard_cache::HazardCache) and a
//!   [`Steering`](steering::Steering)
//! - **Systems**: The per-agent tick in [`controller`], then world-wide
//!   passes in [`systems`]
//!
//! The submarine itself is a plain [`Submarine`](components::Submarine)
//! owned by the engine. Pure decision rules live in `subcrew-logic`.
//!
//! # Example
//!
//! ```rust,no_run
//! use subcrew_core::prelude::*;
//! use subcrew_logic::access::Department;
//! use subcrew_logic::config::AiTuning;
//! use subcrew_logic::geometry::{Rect, Vec2};
//!
//! let mut sub = Submarine::new();
//! sub.add_hull("Control room", Rect::new(0.0, 0.0, 10.0, 3.0));
//!
//! let mut engine = SimulationEngine::new(sub, AiTuning::default()).unwrap();
//! let mate = engine.spawn_character(Character::crew("Mate", Department::Operations, 1).at(Vec2::new(2.0, 0.0)));
//! engine.attach_ai(mate).unwrap();
//!
//! loop {
//!     engine.update(1.0 / 60.0); // 60 FPS
//!     for event in engine.drain_events() {
//!         println!("{:.2}: {:?}", event.time, event.event);
//!     }
//! }
//! ```

pub mod components;
pub mod controller;
pub mod crew;
pub mod engine;
pub mod error;
pub mod events;
pub mod hazard_cache;
pub mod objectives;
pub mod scheduler;
pub mod steering;
pub mod systems;
pub mod violations;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::engine::SimulationEngine;
    pub use crate::error::AiError;
    pub use crate::events::{AiEvent, Order, OrderKind};
}
