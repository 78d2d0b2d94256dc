//! Systems - world-wide passes run once per tick after the agents

mod actions;
mod kinematics;

pub use actions::*;
pub use kinematics::*;
