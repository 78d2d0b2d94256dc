//! Tuning parameters for the crew AI.
//!
//! Every constant the behaviour code leans on lives here, grouped by
//! concern. A partial JSON document overrides only the fields it names;
//! everything else keeps its default.
//!
//! ```
//! use subcrew_logic::config::AiTuning;
//!
//! let tuning = AiTuning::from_json(r#"{ "hazard": { "safety_threshold": 50.0 } }"#).unwrap();
//! assert_eq!(tuning.hazard.safety_threshold, 50.0);
//! assert_eq!(tuning.hazard.validity_seconds, 0.5);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from loading or validating tuning.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// All AI tuning, grouped by subsystem.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AiTuning {
    /// Seed for the engine's random source (wander points, jitter, delays).
    pub seed: u64,
    pub hazard: HazardTuning,
    pub steering: SteeringTuning,
    pub objectives: ObjectiveTuning,
    pub reactions: ReactionTuning,
    pub logistics: LogisticsTuning,
}

/// Room safety scoring.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HazardTuning {
    /// Scores at or above this are safe enough to linger in.
    pub safety_threshold: f32,
    /// How long a cached score stays fresh.
    pub validity_seconds: f32,
    /// Oxygen factor when oxygen is at or below the critical level.
    pub min_oxygen_factor: f32,
    /// Water factor when the room is completely flooded.
    pub flooded_water_factor: f32,
    /// Fire weight per burning source.
    pub fire_per_source: f32,
    /// Enemy weight per visible hostile.
    pub enemy_per_hostile: f32,
    /// Factor applied when a dangerous item lies in the room.
    pub dangerous_item_factor: f32,
}

impl Default for HazardTuning {
    fn default() -> Self {
        Self {
            safety_threshold: 40.0,
            validity_seconds: 0.5,
            min_oxygen_factor: 0.25,
            flooded_water_factor: 0.2,
            fire_per_source: 0.5,
            enemy_per_hostile: 0.9,
            dangerous_item_factor: 0.1,
        }
    }
}

/// Indoor and open-water steering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SteeringTuning {
    /// Re-request interval for the least important path-finder.
    pub repath_interval_slow: f32,
    /// Re-request interval for the most important path-finder.
    pub repath_interval_fast: f32,
    /// Upper bound of the random multiplier applied to the interval.
    pub repath_jitter: f32,
    /// Target displacement (metres) that forces a fresh path.
    pub target_moved_epsilon: f32,
    /// Cost tolerance at the start of a path.
    pub reroute_tolerance_start: f32,
    /// Cost tolerance at the end of a path.
    pub reroute_tolerance_end: f32,
    /// Current node counts as stale when this many times farther than the new start.
    pub stale_start_factor: f32,
    pub door_check_cooldown: f32,
    pub button_press_cooldown: f32,
    /// How far a button panel may be from the door and still count for it.
    pub button_reach: f32,
    /// Walking arrival margin multiplier at full speed.
    pub walk_margin_max: f32,
    /// Horizontal speed at which the walking margin maxes out.
    pub walk_speed_reference: f32,
    /// Swimming arrival margin multiplier at full speed.
    pub swim_margin_max: f32,
    pub swim_speed_reference: f32,
    /// Vertical alignment tolerance while climbing.
    pub ladder_align_tolerance: f32,
    /// Horizontal tolerance for two ladders to count as one stack.
    pub ladder_stack_tolerance: f32,
    pub closed_gap_penalty: f32,
    pub fire_penalty_per_size: f32,
    pub submerged_penalty: f32,
    pub pressure_penalty: f32,
    pub vertical_penalty_per_meter: f32,
    /// Extra cost for routes through doors the agent has to break.
    pub break_door_penalty: f32,
    /// Water depth (metres) above a node before it counts as submerged.
    pub submerged_depth: f32,
    pub walk_speed: f32,
    pub run_speed: f32,
    pub swim_speed: f32,
    pub climb_speed: f32,
    /// Open-water look-ahead for hull avoidance.
    pub avoid_look_ahead: f32,
    /// Random heading change per wander step (radians).
    pub wander_turn: f32,
    /// Targets closer than this are walked to even when urgent.
    pub run_min_distance: f32,
    /// Path nodes that may be passed in a single tick.
    pub max_advance_nodes: usize,
    /// Horizontal distance from which a ladder can be grabbed.
    pub ladder_grab_distance: f32,
    /// Closer than this to the final target, stop pushing.
    pub final_approach_deadzone: f32,
}

impl Default for SteeringTuning {
    fn default() -> Self {
        Self {
            repath_interval_slow: 3.0,
            repath_interval_fast: 1.0,
            repath_jitter: 1.2,
            target_moved_epsilon: 1.0,
            reroute_tolerance_start: 0.95,
            reroute_tolerance_end: 0.0,
            stale_start_factor: 3.0,
            door_check_cooldown: 0.5,
            button_press_cooldown: 1.0,
            button_reach: 6.0,
            walk_margin_max: 10.0,
            walk_speed_reference: 5.0,
            swim_margin_max: 10.0,
            swim_speed_reference: 10.0,
            ladder_align_tolerance: 0.3,
            ladder_stack_tolerance: 0.5,
            closed_gap_penalty: 100.0,
            fire_penalty_per_size: 10.0,
            submerged_penalty: 500.0,
            pressure_penalty: 1000.0,
            vertical_penalty_per_meter: 10.0,
            break_door_penalty: 200.0,
            submerged_depth: 1.0,
            walk_speed: 1.5,
            run_speed: 3.0,
            swim_speed: 2.0,
            climb_speed: 1.5,
            avoid_look_ahead: 5.0,
            wander_turn: 0.5,
            run_min_distance: 2.0,
            max_advance_nodes: 4,
            ladder_grab_distance: 0.5,
            final_approach_deadzone: 0.1,
        }
    }
}

/// Objective priorities and the sort cadence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ObjectiveTuning {
    /// Seconds between priority sorts (problem reports run on the same cadence).
    pub sort_interval: f32,
    pub idle_priority: f32,
    pub order_priority: f32,
    /// Priority for a task loop with pending targets.
    pub loop_priority: f32,
    pub fight_intruders_priority: f32,
    pub offensive_priority: f32,
    pub defensive_priority: f32,
    pub arrest_priority: f32,
    pub retreat_priority: f32,
    /// Ceiling for the find-safety priority.
    pub max_find_safety_priority: f32,
    /// Seconds before shared targets are forgotten.
    pub shared_target_lifetime: f32,
    /// How close counts as "arrived" for go-to.
    pub arrival_distance: f32,
    /// Distance from which a tool can be used on its target.
    pub interact_distance: f32,
    pub attack_range: f32,
    /// Seconds a combat target may stay unseen before giving up.
    pub lost_target_timeout: f32,
    pub wander_interval_min: f32,
    pub wander_interval_max: f32,
    /// Health fraction under which a crew member needs rescue.
    pub rescue_health_fraction: f32,
    /// Seconds between repeated tool uses on a task target.
    pub action_interval: f32,
    /// Seconds between melee swings.
    pub attack_interval: f32,
    /// Seconds a task loop rests after failing to find its tool.
    pub equipment_retry: f32,
    pub refuge_search_interval: f32,
    /// Extinguishers work from farther away than other tools.
    pub extinguisher_reach: f32,
}

impl Default for ObjectiveTuning {
    fn default() -> Self {
        Self {
            sort_interval: 1.0,
            idle_priority: 1.0,
            order_priority: 70.0,
            loop_priority: 40.0,
            fight_intruders_priority: 60.0,
            offensive_priority: 90.0,
            defensive_priority: 85.0,
            arrest_priority: 80.0,
            retreat_priority: 95.0,
            max_find_safety_priority: 100.0,
            shared_target_lifetime: 10.0,
            arrival_distance: 0.75,
            interact_distance: 1.5,
            attack_range: 1.5,
            lost_target_timeout: 10.0,
            wander_interval_min: 3.0,
            wander_interval_max: 8.0,
            rescue_health_fraction: 0.5,
            action_interval: 0.5,
            attack_interval: 1.0,
            equipment_retry: 10.0,
            refuge_search_interval: 1.0,
            extinguisher_reach: 3.0,
        }
    }
}

/// Reactions to attacks and misconduct.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReactionTuning {
    /// Seconds between flushes of accumulated attack records.
    pub flush_interval: f32,
    /// Friendly damage below this is shrugged off.
    pub friendly_ignore_damage: f32,
    /// Friendly damage at or above this makes armed crew fight back.
    pub friendly_retaliate_damage: f32,
    /// Health fraction under which an agent retreats from enemies.
    pub retreat_health_fraction: f32,
    pub bystander_delay_min: f32,
    pub bystander_delay_max: f32,
    pub theft_warning_threshold: f32,
    pub theft_intervention_threshold: f32,
    pub sabotage_warning_threshold: f32,
    pub sabotage_intervention_threshold: f32,
    /// Violation accumulators lose this much per second.
    pub violation_decay_per_second: f32,
    /// Minimum seconds between repeats of the same spoken line.
    pub speech_repeat_interval: f32,
}

impl Default for ReactionTuning {
    fn default() -> Self {
        Self {
            flush_interval: 1.0,
            friendly_ignore_damage: 5.0,
            friendly_retaliate_damage: 20.0,
            retreat_health_fraction: 0.3,
            bystander_delay_min: 0.5,
            bystander_delay_max: 1.5,
            theft_warning_threshold: 10.0,
            theft_intervention_threshold: 50.0,
            sabotage_warning_threshold: 20.0,
            sabotage_intervention_threshold: 60.0,
            violation_decay_per_second: 0.5,
            speech_repeat_interval: 30.0,
        }
    }
}

/// Diving gear and inventory upkeep.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogisticsTuning {
    /// Seconds between logistics passes.
    pub interval: f32,
    /// Water percentage at which a room calls for diving gear.
    pub gear_water_percentage: f32,
    /// How many upcoming path nodes to check for flooding.
    pub path_lookahead_nodes: usize,
    /// Containers farther than this are ignored when stowing.
    pub stow_search_radius: f32,
}

impl Default for LogisticsTuning {
    fn default() -> Self {
        Self {
            interval: 2.0,
            gear_water_percentage: 70.0,
            path_lookahead_nodes: 5,
            stow_search_radius: 15.0,
        }
    }
}

impl AiTuning {
    /// Parse tuning from JSON and validate it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let tuning: AiTuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject values the behaviour code cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("hazard.validity_seconds", self.hazard.validity_seconds),
            ("steering.repath_interval_slow", self.steering.repath_interval_slow),
            ("steering.repath_interval_fast", self.steering.repath_interval_fast),
            ("steering.door_check_cooldown", self.steering.door_check_cooldown),
            ("steering.walk_speed_reference", self.steering.walk_speed_reference),
            ("steering.swim_speed_reference", self.steering.swim_speed_reference),
            ("objectives.sort_interval", self.objectives.sort_interval),
            ("objectives.action_interval", self.objectives.action_interval),
            ("objectives.attack_interval", self.objectives.attack_interval),
            ("objectives.refuge_search_interval", self.objectives.refuge_search_interval),
            ("reactions.flush_interval", self.reactions.flush_interval),
            ("logistics.interval", self.logistics.interval),
        ];
        for (field, value) in positive {
            if !(value > 0.0) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be positive, got {value}"),
                });
            }
        }

        if !(0.0..=100.0).contains(&self.hazard.safety_threshold) {
            return Err(ConfigError::Invalid {
                field: "hazard.safety_threshold",
                reason: format!("must be in 0..=100, got {}", self.hazard.safety_threshold),
            });
        }

        let unit = [
            ("hazard.min_oxygen_factor", self.hazard.min_oxygen_factor),
            ("hazard.flooded_water_factor", self.hazard.flooded_water_factor),
            ("hazard.dangerous_item_factor", self.hazard.dangerous_item_factor),
            ("steering.reroute_tolerance_start", self.steering.reroute_tolerance_start),
            ("steering.reroute_tolerance_end", self.steering.reroute_tolerance_end),
        ];
        for (field, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be in 0..=1, got {value}"),
                });
            }
        }

        if self.steering.repath_jitter < 1.0 {
            return Err(ConfigError::Invalid {
                field: "steering.repath_jitter",
                reason: "must be at least 1".into(),
            });
        }
        if self.steering.max_advance_nodes == 0 {
            return Err(ConfigError::Invalid {
                field: "steering.max_advance_nodes",
                reason: "must be at least 1".into(),
            });
        }
        if self.objectives.equipment_retry < 0.0 {
            return Err(ConfigError::Invalid {
                field: "objectives.equipment_retry",
                reason: format!("must not be negative, got {}", self.objectives.equipment_retry),
            });
        }
        if self.reactions.bystander_delay_max < self.reactions.bystander_delay_min {
            return Err(ConfigError::Invalid {
                field: "reactions.bystander_delay_max",
                reason: "must not be below bystander_delay_min".into(),
            });
        }
        if self.objectives.wander_interval_max < self.objectives.wander_interval_min {
            return Err(ConfigError::Invalid {
                field: "objectives.wander_interval_max",
                reason: "must not be below wander_interval_min".into(),
            });
        }
        if self.reactions.theft_intervention_threshold < self.reactions.theft_warning_threshold
            || self.reactions.sabotage_intervention_threshold
                < self.reactions.sabotage_warning_threshold
        {
            return Err(ConfigError::Invalid {
                field: "reactions",
                reason: "intervention thresholds must not be below warning thresholds".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(AiTuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = AiTuning::from_json(
            r#"{ "seed": 7, "steering": { "door_check_cooldown": 0.25 } }"#,
        )
        .unwrap();
        assert_eq!(tuning.seed, 7);
        assert_eq!(tuning.steering.door_check_cooldown, 0.25);
        assert_eq!(tuning.steering.repath_interval_slow, 3.0);
        assert_eq!(tuning.objectives, ObjectiveTuning::default());
    }

    #[test]
    fn test_empty_json_is_default() {
        assert_eq!(AiTuning::from_json("{}").unwrap(), AiTuning::default());
    }

    #[test]
    fn test_rejects_bad_json() {
        assert!(matches!(
            AiTuning::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_rejects_non_positive_interval() {
        let err = AiTuning::from_json(r#"{ "objectives": { "sort_interval": 0.0 } }"#)
            .unwrap_err();
        match err {
            ConfigError::Invalid { field, .. } => assert_eq!(field, "objectives.sort_interval"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_behaviour_timings_load_from_json() {
        let tuning = AiTuning::from_json(
            r#"{ "objectives": { "equipment_retry": 4.0, "extinguisher_reach": 2.5 },
                 "steering": { "run_min_distance": 3.0, "max_advance_nodes": 2 } }"#,
        )
        .unwrap();
        assert_eq!(tuning.objectives.equipment_retry, 4.0);
        assert_eq!(tuning.objectives.extinguisher_reach, 2.5);
        assert_eq!(tuning.objectives.action_interval, 0.5);
        assert_eq!(tuning.steering.run_min_distance, 3.0);
        assert_eq!(tuning.steering.max_advance_nodes, 2);
        assert_eq!(tuning.steering.ladder_grab_distance, 0.5);
    }

    #[test]
    fn test_rejects_zero_advance_and_negative_retry() {
        let mut tuning = AiTuning::default();
        tuning.steering.max_advance_nodes = 0;
        assert!(tuning.validate().is_err());

        let mut tuning = AiTuning::default();
        tuning.objectives.equipment_retry = -1.0;
        assert!(tuning.validate().is_err());

        let err = AiTuning::from_json(r#"{ "objectives": { "attack_interval": 0.0 } }"#)
            .unwrap_err();
        match err {
            ConfigError::Invalid { field, .. } => assert_eq!(field, "objectives.attack_interval"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rejects_threshold_out_of_range() {
        let mut tuning = AiTuning::default();
        tuning.hazard.safety_threshold = 140.0;
        assert!(tuning.validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_violation_thresholds() {
        let mut tuning = AiTuning::default();
        tuning.reactions.theft_intervention_threshold = 1.0;
        assert!(tuning.validate().is_err());
    }
}
