//! Errors surfaced by the AI engine.
//!
//! None of these abort a tick: the engine logs them and skips the agent.

use hecs::Entity;
use thiserror::Error;

use crate::components::{ContainerId, DeviceId, DoorId, HullId, ItemId, LadderId};
use subcrew_logic::path::NodeId;

#[derive(Debug, Error, PartialEq)]
pub enum AiError {
    #[error("unknown hull {0}")]
    UnknownHull(HullId),
    #[error("unknown door {0}")]
    UnknownDoor(DoorId),
    #[error("unknown ladder {0}")]
    UnknownLadder(LadderId),
    #[error("unknown waypoint {0}")]
    UnknownNode(NodeId),
    #[error("unknown device {0}")]
    UnknownDevice(DeviceId),
    #[error("unknown container {0}")]
    UnknownContainer(ContainerId),
    #[error("item {0} not found")]
    UnknownItem(ItemId),
    #[error("entity {0:?} has no character")]
    NotACharacter(Entity),
    #[error("entity {0:?} has no AI attached")]
    NoAi(Entity),
    #[error("entity {0:?} already has an AI attached")]
    AlreadyAttached(Entity),
    #[error("objective {0} no longer exists")]
    StaleObjective(u32),
    #[error("{what} index {index} out of range (len {len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },
}
