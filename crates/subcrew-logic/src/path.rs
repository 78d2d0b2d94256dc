//! A computed route and the agent's progress along it.

use serde::{Deserialize, Serialize};

use crate::geometry::{lerp, Vec2};

pub type NodeId = u32;

/// An ordered list of waypoints plus a cursor.
///
/// `segment_costs[i]` is the cost of reaching node `i` from the previous one
/// (for `i == 0`, from the request's start position). A path can be flagged
/// [`unreachable`](Self::is_unreachable) at any time; consumers treat that as
/// "give up on this route".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SteeringPath {
    nodes: Vec<NodeId>,
    positions: Vec<Vec2>,
    segment_costs: Vec<f32>,
    cursor: usize,
    unreachable: bool,
}

impl SteeringPath {
    pub fn new(nodes: Vec<NodeId>, positions: Vec<Vec2>, segment_costs: Vec<f32>) -> Self {
        debug_assert_eq!(nodes.len(), positions.len());
        debug_assert_eq!(nodes.len(), segment_costs.len());
        Self {
            nodes,
            positions,
            segment_costs,
            cursor: 0,
            unreachable: false,
        }
    }

    /// A path that can't be followed.
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    pub fn is_unreachable(&self) -> bool {
        self.unreachable
    }

    pub fn mark_unreachable(&mut self) {
        self.unreachable = true;
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn finished(&self) -> bool {
        self.cursor >= self.nodes.len()
    }

    pub fn current_node(&self) -> Option<NodeId> {
        self.nodes.get(self.cursor).copied()
    }

    pub fn current_position(&self) -> Option<Vec2> {
        self.positions.get(self.cursor).copied()
    }

    pub fn next_node(&self) -> Option<NodeId> {
        self.nodes.get(self.cursor + 1).copied()
    }

    pub fn next_position(&self) -> Option<Vec2> {
        self.positions.get(self.cursor + 1).copied()
    }

    pub fn node_at(&self, index: usize) -> Option<(NodeId, Vec2)> {
        Some((*self.nodes.get(index)?, *self.positions.get(index)?))
    }

    pub fn first_position(&self) -> Option<Vec2> {
        self.positions.first().copied()
    }

    pub fn last_position(&self) -> Option<Vec2> {
        self.positions.last().copied()
    }

    pub fn skip_to_next(&mut self) {
        if self.cursor < self.nodes.len() {
            self.cursor += 1;
        }
    }

    pub fn total_cost(&self) -> f32 {
        self.segment_costs.iter().sum()
    }

    /// Cost of the part not yet walked, including the segment into the current node.
    pub fn remaining_cost(&self) -> f32 {
        self.segment_costs.iter().skip(self.cursor).sum()
    }

    /// `cursor / (len - 1)`, or zero for paths of fewer than two nodes.
    pub fn progress(&self) -> f32 {
        if self.nodes.len() < 2 {
            return 0.0;
        }
        (self.cursor as f32 / (self.nodes.len() - 1) as f32).min(1.0)
    }

    /// How much cheaper a replacement must be, as a fraction of the remaining
    /// cost: `start` at the beginning of the path, `end` at the end.
    pub fn reroute_tolerance(&self, start: f32, end: f32) -> f32 {
        lerp(start, end, self.progress())
    }

    /// Same node sequence as `other`.
    pub fn same_route(&self, other: &SteeringPath) -> bool {
        self.nodes == other.nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_nodes() -> SteeringPath {
        SteeringPath::new(
            vec![1, 2, 3],
            vec![Vec2::new(0.0, 0.0), Vec2::new(5.0, 0.0), Vec2::new(10.0, 0.0)],
            vec![1.0, 5.0, 5.0],
        )
    }

    #[test]
    fn test_cursor_walk() {
        let mut path = three_nodes();
        assert_eq!(path.current_node(), Some(1));
        assert_eq!(path.next_node(), Some(2));
        path.skip_to_next();
        path.skip_to_next();
        assert_eq!(path.current_node(), Some(3));
        assert_eq!(path.next_node(), None);
        path.skip_to_next();
        assert!(path.finished());
        path.skip_to_next();
        assert_eq!(path.cursor(), 3);
    }

    #[test]
    fn test_costs_and_progress() {
        let mut path = three_nodes();
        assert_eq!(path.total_cost(), 11.0);
        assert_eq!(path.remaining_cost(), 11.0);
        assert_eq!(path.progress(), 0.0);
        path.skip_to_next();
        assert_eq!(path.remaining_cost(), 10.0);
        assert_eq!(path.progress(), 0.5);
        assert!((path.reroute_tolerance(0.95, 0.0) - 0.475).abs() < 1e-6);
    }

    #[test]
    fn test_unreachable_path() {
        let path = SteeringPath::unreachable();
        assert!(path.is_unreachable());
        assert!(path.finished());
        assert_eq!(path.current_node(), None);
    }
}
