//! Whether a freshly computed path should replace the one being followed.
//!
//! Rules, first match wins:
//!
//! 1. No usable current path: replace.
//! 2. Current path flagged unreachable: replace.
//! 3. Same node sequence: keep (only the target updates).
//! 4. Target moved: replace.
//! 5. Candidate unreachable or empty: keep.
//! 6. Climbing a ladder: keep.
//! 7. Candidate cheaper than the remaining cost times a tolerance that shrinks
//!    from `reroute_tolerance_start` to `reroute_tolerance_end` along the path:
//!    replace.
//! 8. Current node much farther away than the candidate's start: replace.
//! 9. Otherwise keep.

use serde::{Deserialize, Serialize};

use crate::config::SteeringTuning;
use crate::geometry::Vec2;
use crate::path::SteeringPath;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplaceReason {
    NoUsablePath,
    Unreachable,
    TargetMoved,
    Cheaper,
    StaleStart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeepReason {
    SameRoute,
    CandidateUnusable,
    Climbing,
    NotCheaper,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RerouteDecision {
    Replace(ReplaceReason),
    Keep(KeepReason),
}

impl RerouteDecision {
    pub fn replaces(self) -> bool {
        matches!(self, RerouteDecision::Replace(_))
    }
}

/// Agent-side facts the decision depends on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RerouteContext {
    pub agent_position: Vec2,
    pub target_moved: bool,
    pub climbing: bool,
}

pub fn evaluate(
    current: Option<&SteeringPath>,
    candidate: &SteeringPath,
    ctx: &RerouteContext,
    tuning: &SteeringTuning,
) -> RerouteDecision {
    let Some(current) = current else {
        return RerouteDecision::Replace(ReplaceReason::NoUsablePath);
    };
    if current.is_unreachable() {
        return RerouteDecision::Replace(ReplaceReason::Unreachable);
    }
    let Some(current_node_pos) = current.current_position() else {
        return RerouteDecision::Replace(ReplaceReason::NoUsablePath);
    };
    if current.same_route(candidate) {
        return RerouteDecision::Keep(KeepReason::SameRoute);
    }
    if ctx.target_moved {
        return RerouteDecision::Replace(ReplaceReason::TargetMoved);
    }
    let Some(candidate_start) = candidate.first_position() else {
        return RerouteDecision::Keep(KeepReason::CandidateUnusable);
    };
    if candidate.is_unreachable() {
        return RerouteDecision::Keep(KeepReason::CandidateUnusable);
    }
    if ctx.climbing {
        return RerouteDecision::Keep(KeepReason::Climbing);
    }

    let tolerance =
        current.reroute_tolerance(tuning.reroute_tolerance_start, tuning.reroute_tolerance_end);
    if candidate.total_cost() < current.remaining_cost() * tolerance {
        return RerouteDecision::Replace(ReplaceReason::Cheaper);
    }

    let to_current = ctx.agent_position.distance_squared(&current_node_pos);
    let to_candidate = ctx.agent_position.distance(&candidate_start) * tuning.stale_start_factor;
    if to_current > to_candidate * to_candidate {
        return RerouteDecision::Replace(ReplaceReason::StaleStart);
    }

    RerouteDecision::Keep(KeepReason::NotCheaper)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight(ids: &[u32], xs: &[f32]) -> SteeringPath {
        let positions: Vec<Vec2> = xs.iter().map(|&x| Vec2::new(x, 0.0)).collect();
        let mut costs = vec![0.0];
        for w in xs.windows(2) {
            costs.push((w[1] - w[0]).abs());
        }
        SteeringPath::new(ids.to_vec(), positions, costs)
    }

    fn ctx_at(x: f32) -> RerouteContext {
        RerouteContext {
            agent_position: Vec2::new(x, 0.0),
            target_moved: false,
            climbing: false,
        }
    }

    #[test]
    fn test_missing_or_finished_path_is_replaced() {
        let tuning = SteeringTuning::default();
        let candidate = straight(&[1, 2], &[0.0, 5.0]);
        assert_eq!(
            evaluate(None, &candidate, &ctx_at(0.0), &tuning),
            RerouteDecision::Replace(ReplaceReason::NoUsablePath)
        );

        let mut done = straight(&[1], &[0.0]);
        done.skip_to_next();
        assert_eq!(
            evaluate(Some(&done), &candidate, &ctx_at(0.0), &tuning),
            RerouteDecision::Replace(ReplaceReason::NoUsablePath)
        );
    }

    #[test]
    fn test_unreachable_current_always_replaced() {
        let tuning = SteeringTuning::default();
        let mut current = straight(&[1, 2], &[0.0, 5.0]);
        current.mark_unreachable();
        let same = straight(&[1, 2], &[0.0, 5.0]);
        assert!(evaluate(Some(&current), &same, &ctx_at(0.0), &tuning).replaces());
    }

    #[test]
    fn test_same_route_kept_even_if_target_moved() {
        let tuning = SteeringTuning::default();
        let current = straight(&[1, 2, 3], &[0.0, 5.0, 10.0]);
        let same = current.clone();
        let mut ctx = ctx_at(0.0);
        ctx.target_moved = true;
        assert_eq!(
            evaluate(Some(&current), &same, &ctx, &tuning),
            RerouteDecision::Keep(KeepReason::SameRoute)
        );
    }

    #[test]
    fn test_cost_tolerance_shrinks_with_progress() {
        let tuning = SteeringTuning::default();
        // Remaining cost 20 at the start; tolerance 0.95 -> needs < 19
        let current = straight(&[1, 2, 3], &[0.0, 10.0, 20.0]);
        let slightly_cheaper = straight(&[1, 4, 3], &[0.0, 9.7, 19.5]);
        assert_eq!(
            evaluate(Some(&current), &slightly_cheaper, &ctx_at(0.0), &tuning),
            RerouteDecision::Keep(KeepReason::NotCheaper)
        );
        let much_cheaper = straight(&[1, 5], &[0.0, 15.0]);
        assert_eq!(
            evaluate(Some(&current), &much_cheaper, &ctx_at(0.0), &tuning),
            RerouteDecision::Replace(ReplaceReason::Cheaper)
        );
    }

    #[test]
    fn test_climbing_keeps_path() {
        let tuning = SteeringTuning::default();
        let current = straight(&[1, 2, 3], &[0.0, 10.0, 20.0]);
        let cheaper = straight(&[1, 5], &[0.0, 2.0]);
        let mut ctx = ctx_at(0.0);
        ctx.climbing = true;
        assert_eq!(
            evaluate(Some(&current), &cheaper, &ctx, &tuning),
            RerouteDecision::Keep(KeepReason::Climbing)
        );
    }

    #[test]
    fn test_stale_start_replaced() {
        let tuning = SteeringTuning::default();
        // Agent drifted to x = 30; current node is back at 0, candidate starts at 29
        // and costs more than what's left of the current path
        let current = straight(&[1, 2], &[0.0, 40.0]);
        let candidate = straight(&[7, 8], &[29.0, 80.0]);
        assert_eq!(
            evaluate(Some(&current), &candidate, &ctx_at(30.0), &tuning),
            RerouteDecision::Replace(ReplaceReason::StaleStart)
        );
    }

    #[test]
    fn test_target_moved_replaces_different_route() {
        let tuning = SteeringTuning::default();
        let current = straight(&[1, 2], &[0.0, 10.0]);
        let candidate = straight(&[1, 3], &[0.0, 12.0]);
        let mut ctx = ctx_at(0.0);
        ctx.target_moved = true;
        assert_eq!(
            evaluate(Some(&current), &candidate, &ctx, &tuning),
            RerouteDecision::Replace(ReplaceReason::TargetMoved)
        );
    }
}
