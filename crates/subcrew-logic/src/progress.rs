//! When an agent has reached the waypoint it's heading for.
//!
//! The thresholds grow with speed so a fast-moving agent doesn't overshoot a
//! node and turn back for it.

use serde::{Deserialize, Serialize};

use crate::config::SteeringTuning;
use crate::geometry::{lerp, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TraversalMode {
    Walking,
    Climbing,
    Swimming,
}

/// The agent's body relative to the node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodySample {
    /// Feet position.
    pub position: Vec2,
    pub velocity: Vec2,
    pub collider_radius: f32,
    pub collider_height: f32,
    pub on_floor: bool,
    pub node: Vec2,
}

/// Horizontal reach while walking.
pub fn walk_margin(sample: &BodySample, tuning: &SteeringTuning) -> f32 {
    let speed = sample.velocity.x.abs() / tuning.walk_speed_reference;
    sample.collider_radius * lerp(1.0, tuning.walk_margin_max, speed)
}

/// Reach while swimming.
pub fn swim_margin(sample: &BodySample, tuning: &SteeringTuning) -> f32 {
    let speed = sample.velocity.length() / tuning.swim_speed_reference;
    sample.collider_radius * 2.0 * lerp(1.0, tuning.swim_margin_max, speed)
}

pub fn reached_node(mode: TraversalMode, sample: &BodySample, tuning: &SteeringTuning) -> bool {
    match mode {
        TraversalMode::Walking => {
            let dx = (sample.node.x - sample.position.x).abs();
            let dy = sample.node.y - sample.position.y;
            dx < walk_margin(sample, tuning) && dy > -sample.collider_height && dy < sample.collider_height
        }
        TraversalMode::Climbing => {
            let dy = sample.node.y - sample.position.y;
            // Aligned with the node, or standing on a floor at or above its level
            dy.abs() < tuning.ladder_align_tolerance
                || (sample.on_floor && dy < tuning.ladder_align_tolerance && dy > -sample.collider_height)
        }
        TraversalMode::Swimming => {
            sample.position.distance(&sample.node) < swim_margin(sample, tuning)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(position: Vec2, velocity: Vec2, node: Vec2) -> BodySample {
        BodySample {
            position,
            velocity,
            collider_radius: 0.3,
            collider_height: 1.8,
            on_floor: true,
            node,
        }
    }

    #[test]
    fn test_walking_margin_grows_with_speed() {
        let tuning = SteeringTuning::default();
        let node = Vec2::new(1.0, 0.0);
        let still = sample(Vec2::ZERO, Vec2::ZERO, node);
        assert!(!reached_node(TraversalMode::Walking, &still, &tuning));
        let fast = sample(Vec2::ZERO, Vec2::new(3.0, 0.0), node);
        assert!(reached_node(TraversalMode::Walking, &fast, &tuning));
    }

    #[test]
    fn test_walking_ignores_nodes_on_another_floor() {
        let tuning = SteeringTuning::default();
        let p = sample(Vec2::ZERO, Vec2::ZERO, Vec2::new(0.1, 4.0));
        assert!(!reached_node(TraversalMode::Walking, &p, &tuning));
    }

    #[test]
    fn test_climbing_alignment_and_floor_contact() {
        let tuning = SteeringTuning::default();
        let mut p = sample(Vec2::new(0.0, 2.9), Vec2::ZERO, Vec2::new(0.0, 3.0));
        p.on_floor = false;
        assert!(reached_node(TraversalMode::Climbing, &p, &tuning));

        p.position.y = 1.0;
        assert!(!reached_node(TraversalMode::Climbing, &p, &tuning));

        // Stepped off onto a floor slightly above the node
        p.position.y = 3.5;
        p.on_floor = true;
        assert!(reached_node(TraversalMode::Climbing, &p, &tuning));
    }

    #[test]
    fn test_swimming_radius() {
        let tuning = SteeringTuning::default();
        let slow = sample(Vec2::ZERO, Vec2::ZERO, Vec2::new(0.5, 0.3));
        assert!(reached_node(TraversalMode::Swimming, &slow, &tuning));
        let far = sample(Vec2::ZERO, Vec2::ZERO, Vec2::new(2.0, 0.0));
        assert!(!reached_node(TraversalMode::Swimming, &far, &tuning));
        let fast = sample(Vec2::ZERO, Vec2::new(5.0, 0.0), Vec2::new(2.0, 0.0));
        assert!(reached_node(TraversalMode::Swimming, &fast, &tuning));
    }
}
