//! Waypoint-following steering inside the submarine.

use log::debug;
use rand::Rng;
use subcrew_logic::config::SteeringTuning;
use subcrew_logic::geometry::{lerp, Vec2};
use subcrew_logic::path::SteeringPath;
use subcrew_logic::pathfinding::{PathNode, PathRequest};
use subcrew_logic::penalty::{node_penalty, Crossing, NodeHazards};
use subcrew_logic::progress::{reached_node, BodySample, TraversalMode};
use subcrew_logic::reroute::{self, RerouteContext};

use super::doors;
use super::{NavigationStatus, SteeringContext};
use crate::components::{Character, DoorId, HullId, Ladder, Submarine, Waypoint};

#[derive(Debug, Clone, Default)]
pub struct IndoorSteering {
    pub(super) path: Option<SteeringPath>,
    /// Target the current path was requested for.
    pub(super) target: Option<Vec2>,
    pub(super) find_path_timer: f32,
    pub(super) check_doors_timer: f32,
    pub(super) button_timer: f32,
    /// Door this agent opened and should close once through.
    pub(super) opened_door: Option<DoorId>,
}

impl IndoorSteering {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn path(&self) -> Option<&SteeringPath> {
        self.path.as_ref()
    }

    pub fn target(&self) -> Option<Vec2> {
        self.target
    }

    pub fn status(&self) -> NavigationStatus {
        NavigationStatus {
            target: self.target,
            unreachable: self.path.as_ref().is_some_and(SteeringPath::is_unreachable),
            finished: self.path.as_ref().is_some_and(SteeringPath::finished),
        }
    }

    pub(super) fn tick_timers(&mut self, dt: f32) {
        self.find_path_timer -= dt;
        self.check_doors_timer -= dt;
        self.button_timer -= dt;
    }

    pub(super) fn stop(&mut self, _ctx: &mut SteeringContext<'_>) {
        self.path = None;
        self.target = None;
    }

    pub fn steer_to(&mut self, ctx: &mut SteeringContext<'_>, target: Vec2, target_hull: Option<HullId>) -> Vec2 {
        let moved = self
            .target
            .map_or(true, |t| t.distance(&target) > ctx.tuning.target_moved_epsilon);
        if moved || self.path.is_none() || self.find_path_timer <= 0.0 {
            self.repath(ctx, target, target_hull, moved);
        }
        if self.path.as_ref().map_or(true, SteeringPath::is_unreachable) {
            return Vec2::ZERO;
        }
        self.follow(ctx, target)
    }

    /// Request a candidate path and keep whichever of old and new is better.
    fn repath(&mut self, ctx: &mut SteeringContext<'_>, target: Vec2, target_hull: Option<HullId>, moved: bool) {
        let candidate = request_path(ctx, target, target_hull);
        let reroute_ctx = RerouteContext {
            agent_position: ctx.character.position,
            target_moved: moved,
            climbing: ctx.character.climbing.is_some(),
        };
        let decision = reroute::evaluate(self.path.as_ref(), &candidate, &reroute_ctx, ctx.tuning);
        if decision.replaces() {
            if candidate.is_unreachable() {
                debug!("{}: no path to {target:?} ({decision:?})", ctx.character.name);
            } else {
                debug!(
                    "{}: new path of {} nodes ({decision:?})",
                    ctx.character.name,
                    candidate.len()
                );
            }
            self.path = Some(candidate);
        }
        self.target = Some(target);

        let t = ctx.tuning;
        let priority = ctx.character.pathfinder_priority.clamp(0.0, 1.0);
        let jitter = if t.repath_jitter > 1.0 {
            ctx.rng.gen_range(1.0..t.repath_jitter)
        } else {
            1.0
        };
        self.find_path_timer = lerp(t.repath_interval_slow, t.repath_interval_fast, priority) * jitter;
    }

    fn follow(&mut self, ctx: &mut SteeringContext<'_>, target: Vec2) -> Vec2 {
        self.update_climbing(ctx);
        for _ in 0..ctx.tuning.max_advance_nodes {
            let Some(path) = self.path.as_mut() else { break };
            let Some(node) = path.current_position() else { break };
            let c = &*ctx.character;
            let sample = BodySample {
                position: c.position,
                velocity: c.velocity,
                collider_radius: c.collider_radius,
                collider_height: c.collider_height,
                on_floor: c.on_floor,
                node,
            };
            if !reached_node(c.traversal_mode(), &sample, ctx.tuning) {
                break;
            }
            path.skip_to_next();
            self.update_climbing(ctx);
        }

        if self.check_doors_timer <= 0.0 {
            self.check_doors_timer = ctx.tuning.door_check_cooldown;
            doors::check_doors_in_path(self, ctx, target);
        }

        let Some(path) = self.path.as_ref() else {
            return Vec2::ZERO;
        };
        if path.is_unreachable() {
            return Vec2::ZERO;
        }
        let position = ctx.character.position;
        let Some(node) = path.current_position() else {
            return direct(ctx.character, target, ctx.tuning);
        };
        match ctx.character.traversal_mode() {
            TraversalMode::Climbing => {
                let ladder_x = ctx
                    .character
                    .climbing
                    .and_then(|l| ctx.sub.ladder(l).ok())
                    .map_or(node.x, |l| l.x);
                Vec2::new(ladder_x - position.x, node.y - position.y)
            }
            TraversalMode::Swimming => node - position,
            TraversalMode::Walking => Vec2::new(node.x - position.x, 0.0),
        }
    }

    /// Grab, swap or let go of ladders as the path demands.
    fn update_climbing(&mut self, ctx: &mut SteeringContext<'_>) {
        let Some(node) = self
            .path
            .as_ref()
            .and_then(SteeringPath::current_node)
            .and_then(|id| ctx.sub.waypoint(id).ok())
        else {
            return;
        };
        let (node_pos, node_ladder) = (node.position, node.ladder);
        let tolerance = ctx.tuning.ladder_align_tolerance;
        let grab = ctx.tuning.ladder_grab_distance;
        let character = &mut *ctx.character;

        match (character.climbing, node_ladder) {
            (None, Some(ladder)) if character.can_climb() => {
                let Ok(l) = ctx.sub.ladder(ladder) else { return };
                let dy = node_pos.y - character.position.y;
                if (character.position.x - l.x).abs() < grab && dy.abs() > tolerance {
                    debug!("{} grabs ladder {ladder}", character.name);
                    character.climbing = Some(ladder);
                    character.position.x = l.x;
                    character.on_floor = false;
                }
            }
            (Some(current), Some(next)) if current != next => {
                if let (Ok(a), Ok(b)) = (ctx.sub.ladder(current), ctx.sub.ladder(next)) {
                    if stacked(a, b, ctx.tuning) {
                        character.climbing = Some(next);
                    }
                }
            }
            (Some(_), None) => {
                if (node_pos.y - character.position.y).abs() < tolerance {
                    debug!("{} steps off the ladder", character.name);
                    character.climbing = None;
                    character.on_floor = true;
                }
            }
            _ => {}
        }
    }
}

/// Two ladders forming one continuous climb.
pub fn stacked(a: &Ladder, b: &Ladder, tuning: &SteeringTuning) -> bool {
    let tolerance = tuning.ladder_stack_tolerance;
    (a.x - b.x).abs() <= tolerance
        && ((a.top - b.bottom).abs() <= tolerance || (b.top - a.bottom).abs() <= tolerance)
}

/// Straight at the target once the path has been walked.
fn direct(character: &Character, target: Vec2, tuning: &SteeringTuning) -> Vec2 {
    let deadzone = tuning.final_approach_deadzone;
    let delta = target - character.position;
    match character.traversal_mode() {
        TraversalMode::Walking if delta.x.abs() > deadzone => Vec2::new(delta.x, 0.0),
        TraversalMode::Walking => Vec2::ZERO,
        _ if delta.length() > deadzone => delta,
        _ => Vec2::ZERO,
    }
}

fn request_path(ctx: &SteeringContext<'_>, target: Vec2, target_hull: Option<HullId>) -> SteeringPath {
    let sub: &Submarine = ctx.sub;
    let character: &Character = ctx.character;
    let tuning = ctx.tuning;
    let start_hull = character.hull;

    let start_filter = |node: &PathNode| {
        start_hull.is_none() || sub.waypoint(node.id).is_ok_and(|w| w.hull == start_hull)
    };
    let end_filter = |node: &PathNode| {
        target_hull.map_or(true, |h| sub.waypoint(node.id).is_ok_and(|w| w.hull == Some(h)))
    };
    let node_filter = |node: &PathNode| {
        character.can_climb() || sub.waypoint(node.id).is_ok_and(|w| w.ladder.is_none())
    };
    let penalty = |from: &PathNode, to: &PathNode| step_penalty(sub, character, from, to, tuning);

    let request = PathRequest::new(character.position, target, &character.name)
        .with_start_filter(&start_filter)
        .with_end_filter(&end_filter)
        .with_node_filter(&node_filter)
        .with_penalty(&penalty);
    ctx.pathfinder.find_path(&request)
}

/// Extra cost of stepping from `from` onto `to` for this character.
pub fn step_penalty(
    sub: &Submarine,
    character: &Character,
    from: &PathNode,
    to: &PathNode,
    tuning: &SteeringTuning,
) -> Option<f32> {
    let waypoint = sub.waypoint(to.id).ok()?;
    let crossing = crossing_at(sub, character, waypoint, from.position, tuning);
    let climb_aid = waypoint.ladder.is_some() || waypoint.stairs;
    let vertical_gap = to.position.y - from.position.y;
    let hazards = match waypoint.hull.and_then(|h| sub.hull(h).ok()) {
        Some(hull) => NodeHazards {
            fire_size: hull.fire_size(),
            submerged: hull.water_depth_at(to.position.y) > tuning.submerged_depth,
            lethal_pressure: hull.lethal_pressure,
            vertical_gap,
            climb_aid,
        },
        None => NodeHazards {
            submerged: true,
            vertical_gap,
            climb_aid,
            ..NodeHazards::default()
        },
    };
    node_penalty(crossing, &hazards, &character.traverser_traits(), tuning)
}

fn crossing_at(sub: &Submarine, character: &Character, waypoint: &Waypoint, from: Vec2, tuning: &SteeringTuning) -> Crossing {
    if let Some(door_id) = waypoint.door {
        let Ok(door) = sub.door(door_id) else {
            return Crossing::ClosedGap;
        };
        if door.is_passable() {
            return Crossing::Clear;
        }
        return Crossing::ClosedDoor {
            accessible: doors::can_access(character, door, from, sub.lockdown, tuning),
            breakable: character.can_break_doors(),
        };
    }
    match waypoint.opening.and_then(|i| sub.openings().get(i)) {
        Some(opening) if !opening.open => Crossing::ClosedGap,
        _ => Crossing::Clear,
    }
}
