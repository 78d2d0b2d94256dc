//! Extra path cost for stepping onto a waypoint.
//!
//! The path-finder adds the returned penalty to the plain distance cost.
//! `None` removes the step from consideration entirely.

use serde::{Deserialize, Serialize};

use crate::config::SteeringTuning;

/// What stands between the two nodes of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Crossing {
    /// Nothing, or an open/broken door.
    Clear,
    /// A closed door. `accessible` is whether this character can get it open;
    /// `breakable` whether they are allowed to force it instead.
    ClosedDoor { accessible: bool, breakable: bool },
    /// A closed passage with no door to operate.
    ClosedGap,
}

/// Conditions at the node being stepped onto.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeHazards {
    /// Total size of fires in the node's room.
    pub fire_size: f32,
    /// Node is under water deeper than the submerged depth.
    pub submerged: bool,
    pub lethal_pressure: bool,
    /// Height difference between the two nodes.
    pub vertical_gap: f32,
    /// The destination has a ladder or stairs to make the height change.
    pub climb_aid: bool,
}

/// What the character brings to the step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraverserTraits {
    pub breathing_gear: bool,
    pub pressure_protection: bool,
    /// Creatures that live in water don't mind being submerged.
    pub aquatic: bool,
}

/// Penalty for stepping onto a node, or `None` if the step is impossible.
pub fn node_penalty(
    crossing: Crossing,
    hazards: &NodeHazards,
    traits: &TraverserTraits,
    tuning: &SteeringTuning,
) -> Option<f32> {
    let mut penalty = 0.0;

    match crossing {
        Crossing::Clear => {}
        Crossing::ClosedDoor {
            accessible: true, ..
        } => {}
        Crossing::ClosedDoor {
            accessible: false,
            breakable: true,
        } => penalty += tuning.break_door_penalty,
        Crossing::ClosedDoor {
            accessible: false,
            breakable: false,
        } => return None,
        Crossing::ClosedGap => penalty += tuning.closed_gap_penalty,
    }

    penalty += hazards.fire_size * tuning.fire_penalty_per_size;

    if hazards.submerged && !traits.breathing_gear && !traits.aquatic {
        penalty += tuning.submerged_penalty;
    }
    if hazards.lethal_pressure && !traits.pressure_protection {
        penalty += tuning.pressure_penalty;
    }
    if !hazards.climb_aid {
        penalty += hazards.vertical_gap.abs() * tuning.vertical_penalty_per_meter;
    }

    Some(penalty)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuning() -> SteeringTuning {
        SteeringTuning::default()
    }

    #[test]
    fn test_clear_step_costs_nothing() {
        let p = node_penalty(
            Crossing::Clear,
            &NodeHazards::default(),
            &TraverserTraits::default(),
            &tuning(),
        );
        assert_eq!(p, Some(0.0));
    }

    #[test]
    fn test_inaccessible_door_excluded_unless_breakable() {
        let locked = Crossing::ClosedDoor {
            accessible: false,
            breakable: false,
        };
        assert_eq!(
            node_penalty(locked, &NodeHazards::default(), &TraverserTraits::default(), &tuning()),
            None
        );

        let forced = Crossing::ClosedDoor {
            accessible: false,
            breakable: true,
        };
        assert_eq!(
            node_penalty(forced, &NodeHazards::default(), &TraverserTraits::default(), &tuning()),
            Some(tuning().break_door_penalty)
        );
    }

    #[test]
    fn test_closed_gap_penalised() {
        let p = node_penalty(
            Crossing::ClosedGap,
            &NodeHazards::default(),
            &TraverserTraits::default(),
            &tuning(),
        );
        assert_eq!(p, Some(100.0));
    }

    #[test]
    fn test_hazards_stack() {
        let hazards = NodeHazards {
            fire_size: 2.0,
            submerged: true,
            lethal_pressure: false,
            vertical_gap: 0.0,
            climb_aid: false,
        };
        let bare = node_penalty(Crossing::Clear, &hazards, &TraverserTraits::default(), &tuning());
        assert_eq!(bare, Some(20.0 + 500.0));

        let suited = TraverserTraits {
            breathing_gear: true,
            pressure_protection: true,
            aquatic: false,
        };
        assert_eq!(
            node_penalty(Crossing::Clear, &hazards, &suited, &tuning()),
            Some(20.0)
        );
    }

    #[test]
    fn test_vertical_gap_without_ladder() {
        let mut hazards = NodeHazards {
            vertical_gap: -3.0,
            ..NodeHazards::default()
        };
        let traits = TraverserTraits::default();
        assert_eq!(
            node_penalty(Crossing::Clear, &hazards, &traits, &tuning()),
            Some(30.0)
        );
        hazards.climb_aid = true;
        assert_eq!(
            node_penalty(Crossing::Clear, &hazards, &traits, &tuning()),
            Some(0.0)
        );
    }
}
