//! Door geometry: which side a character is on, whether a door needs to be
//! open yet, and which buttons are reachable from where.
//!
//! Doors come in two orientations. A [`Passage::Horizontal`] door sits in a
//! wall and is walked through along `x`; a [`Passage::Vertical`] hatch sits in
//! a floor and is climbed through along `y`.

use serde::{Deserialize, Serialize};

use crate::geometry::Vec2;

/// Which way a door is passed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Passage {
    /// Wall door, traversed along `x`.
    Horizontal,
    /// Floor hatch, traversed along `y`.
    Vertical,
}

impl Passage {
    fn axis(self, v: Vec2) -> f32 {
        match self {
            Passage::Horizontal => v.x,
            Passage::Vertical => v.y,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DoorState {
    Open,
    #[default]
    Closed,
    /// Smashed; permanently passable.
    Broken,
    /// Welded shut.
    Jammed,
    /// Mechanism stuck in place.
    Stuck,
}

impl DoorState {
    pub fn passable(self) -> bool {
        matches!(self, DoorState::Open | DoorState::Broken)
    }

    /// Whether pressing a button does anything.
    pub fn can_toggle(self) -> bool {
        matches!(self, DoorState::Open | DoorState::Closed)
    }
}

/// Direction of travel through the door: `+1` or `-1` along its axis.
///
/// `towards` is the next point on the path beyond the door.
pub fn travel_direction(passage: Passage, door: Vec2, towards: Vec2) -> f32 {
    if passage.axis(towards) >= passage.axis(door) {
        1.0
    } else {
        -1.0
    }
}

/// Whether the door should be open for a character travelling through it.
///
/// True on the whole approach and until the character is more than `margin`
/// past the door along the direction of travel, so the door is already
/// swinging open well before the character reaches it.
pub fn should_be_open(passage: Passage, door: Vec2, agent: Vec2, towards: Vec2, margin: f32) -> bool {
    let dir = travel_direction(passage, door, towards);
    (passage.axis(door) - passage.axis(agent)) * dir > -margin
}

/// Whether the character has already passed through the door.
pub fn is_behind(passage: Passage, door: Vec2, agent: Vec2, towards: Vec2) -> bool {
    let dir = travel_direction(passage, door, towards);
    (passage.axis(agent) - passage.axis(door)) * dir > 0.0
}

/// Whether a button sits on the approach side for a character travelling
/// towards `towards`.
pub fn button_on_approach_side(passage: Passage, door: Vec2, button: Vec2, towards: Vec2) -> bool {
    let dir = travel_direction(passage, door, towards);
    passage.axis(button) * dir <= passage.axis(door) * dir
}

/// Whether a button sits on the same side of the door as `node`.
pub fn button_on_node_side(passage: Passage, door: Vec2, button: Vec2, node: Vec2) -> bool {
    let button_side = passage.axis(button) - passage.axis(door);
    let node_side = passage.axis(node) - passage.axis(door);
    button_side * node_side >= 0.0
}
