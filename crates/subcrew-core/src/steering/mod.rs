//! Turning a movement intent into a steering direction.
//!
//! Inside the submarine agents follow waypoint paths ([`IndoorSteering`]);
//! outside they seek, wander and avoid hulls ([`OpenWaterSteering`]). The
//! [`Steering`] component owns both and switches between them as the agent
//! enters or leaves a hull, resetting whichever one it switches to.

mod doors;
mod indoor;
mod open_water;

pub use indoor::*;
pub use open_water::*;

use hecs::Entity;
use log::debug;
use rand::rngs::StdRng;
use subcrew_logic::config::SteeringTuning;
use subcrew_logic::geometry::Vec2;
use subcrew_logic::pathfinding::PathFinder;

use crate::components::{Character, HullId, Submarine};
use crate::events::EventLog;

/// Where the current objective wants the body to go this tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MovementIntent {
    pub target: Option<Vec2>,
    /// Hull the target lies in; paths must end there.
    pub target_hull: Option<HullId>,
    pub run: bool,
    /// No target; drift about (open water only).
    pub wander: bool,
}

impl MovementIntent {
    pub fn go_to(&mut self, target: Vec2, hull: Option<HullId>, run: bool) {
        self.target = Some(target);
        self.target_hull = hull;
        self.run = run;
        self.wander = false;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// What the last steering pass found out about its target.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NavigationStatus {
    pub target: Option<Vec2>,
    /// No usable path leads to `target`.
    pub unreachable: bool,
    /// The path to `target` has been walked to the end.
    pub finished: bool,
}

impl NavigationStatus {
    /// Whether `target` (give or take `epsilon`) was found to be unreachable.
    pub fn unreachable_for(&self, target: Vec2, epsilon: f32) -> bool {
        self.unreachable && self.target.is_some_and(|t| t.distance(&target) <= epsilon)
    }
}

/// Everything a steering pass reads or touches.
pub struct SteeringContext<'a> {
    pub entity: Entity,
    pub character: &'a mut Character,
    pub sub: &'a mut Submarine,
    pub pathfinder: &'a dyn PathFinder,
    pub tuning: &'a SteeringTuning,
    pub rng: &'a mut StdRng,
    pub events: &'a mut EventLog,
    pub dt: f32,
    pub now: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SteeringMode {
    Indoor,
    OpenWater,
}

/// Component: the agent's steering state.
#[derive(Debug, Clone)]
pub struct Steering {
    pub indoor: IndoorSteering,
    pub open_water: OpenWaterSteering,
    mode: SteeringMode,
    status: NavigationStatus,
}

impl Default for Steering {
    fn default() -> Self {
        Self {
            indoor: IndoorSteering::default(),
            open_water: OpenWaterSteering::default(),
            mode: SteeringMode::Indoor,
            status: NavigationStatus::default(),
        }
    }
}

impl Steering {
    pub fn mode(&self) -> SteeringMode {
        self.mode
    }

    pub fn status(&self) -> NavigationStatus {
        self.status
    }

    /// Pick the strategy for where the agent is. Returns `true` on a switch.
    pub fn select(&mut self, inside: bool) -> bool {
        let wanted = if inside {
            SteeringMode::Indoor
        } else {
            SteeringMode::OpenWater
        };
        if wanted == self.mode {
            return false;
        }
        debug!("steering switched to {wanted:?}");
        match wanted {
            SteeringMode::Indoor => self.indoor.reset(),
            SteeringMode::OpenWater => self.open_water.reset(),
        }
        self.mode = wanted;
        true
    }

    /// Steering direction for this tick (unit length or zero).
    pub fn steer(&mut self, ctx: &mut SteeringContext<'_>, intent: &MovementIntent) -> Vec2 {
        self.indoor.tick_timers(ctx.dt);
        let direction = match (self.mode, intent.target) {
            (SteeringMode::Indoor, Some(target)) => {
                let dir = self.indoor.steer_to(ctx, target, intent.target_hull);
                self.status = self.indoor.status();
                dir
            }
            (SteeringMode::Indoor, None) => {
                self.indoor.stop(ctx);
                self.status = NavigationStatus::default();
                Vec2::ZERO
            }
            (SteeringMode::OpenWater, Some(target)) => {
                self.status = NavigationStatus {
                    target: Some(target),
                    unreachable: false,
                    finished: false,
                };
                let seek = self.open_water.seek(ctx.character.position, target);
                self.open_water.avoid(ctx, seek, Some(target))
            }
            (SteeringMode::OpenWater, None) => {
                self.status = NavigationStatus::default();
                if intent.wander {
                    let wander = self.open_water.wander(ctx);
                    self.open_water.avoid(ctx, wander, None)
                } else {
                    Vec2::ZERO
                }
            }
        };
        direction.normalize()
    }

    /// Drop any path; used when the agent goes limp or gets detached.
    pub fn reset(&mut self) {
        self.indoor.reset();
        self.open_water.reset();
        self.status = NavigationStatus::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreachable_status_matches_target() {
        let status = NavigationStatus {
            target: Some(Vec2::new(10.0, 0.0)),
            unreachable: true,
            finished: false,
        };
        assert!(status.unreachable_for(Vec2::new(10.5, 0.0), 1.0));
        assert!(!status.unreachable_for(Vec2::new(20.0, 0.0), 1.0));
        assert!(!NavigationStatus::default().unreachable_for(Vec2::ZERO, 1.0));
    }

    #[test]
    fn test_select_resets_entered_strategy() {
        let mut steering = Steering::default();
        assert!(!steering.select(true));
        assert!(steering.select(false));
        assert_eq!(steering.mode(), SteeringMode::OpenWater);
        assert!(steering.select(true));
        assert!(steering.indoor.path().is_none());
    }

    #[test]
    fn test_intent_go_to_clears_wander() {
        let mut intent = MovementIntent {
            wander: true,
            ..MovementIntent::default()
        };
        intent.go_to(Vec2::new(1.0, 2.0), Some(3), true);
        assert!(!intent.wander);
        assert_eq!(intent.target_hull, Some(3));
        intent.clear();
        assert_eq!(intent, MovementIntent::default());
    }
}
