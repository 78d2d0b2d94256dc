//! Pure decision logic for the submarine crew AI.
//!
//! This crate holds every rule that can be expressed over plain data: room
//! safety scoring, path costs, reroute and arrival decisions, door geometry,
//! button access and threat responses. Nothing here knows about entities or
//! the world; `subcrew-core` feeds it snapshots and applies its answers.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`access`] | Door button access levels, clearances, lockdown |
//! | [`config`] | Tuning groups, JSON loading, validation |
//! | [`doors`] | Door orientation, travel direction, button sides |
//! | [`geometry`] | `Vec2`, `Rect`, lerp helpers |
//! | [`hazard`] | Room safety score from oxygen, water, fire, enemies |
//! | [`path`] | Computed routes and the cursor along them |
//! | [`pathfinding`] | `PathFinder` trait and the A* `WaypointGraph` |
//! | [`penalty`] | Extra cost (or exclusion) per path step |
//! | [`progress`] | Waypoint arrival thresholds per traversal mode |
//! | [`reroute`] | Keep-or-replace decision for fresh paths |
//! | [`threat`] | Combat responses, attack records, misconduct tallies |

pub mod access;
pub mod config;
pub mod doors;
pub mod geometry;
pub mod hazard;
pub mod path;
pub mod pathfinding;
pub mod penalty;
pub mod progress;
pub mod reroute;
pub mod threat;
