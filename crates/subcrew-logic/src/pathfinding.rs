//! Waypoint path-finding.
//!
//! [`PathFinder`] is the seam the steering code talks to. [`WaypointGraph`]
//! is the reference implementation: an A* search over a graph of linked
//! waypoints where each step costs its length plus whatever the request's
//! penalty callback adds (or is skipped when the callback says `None`).

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use serde::{Deserialize, Serialize};

use crate::geometry::Vec2;
use crate::path::{NodeId, SteeringPath};

/// A waypoint as the path-finder sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathNode {
    pub id: NodeId,
    pub position: Vec2,
    pub links: Vec<NodeId>,
}

pub type NodeFilter<'a> = &'a dyn Fn(&PathNode) -> bool;
pub type StepPenalty<'a> = &'a dyn Fn(&PathNode, &PathNode) -> Option<f32>;
pub type Visibility<'a> = &'a dyn Fn(Vec2, &PathNode) -> bool;

/// One path query.
///
/// `context` is a free-form tag for logging. Filters restrict which nodes may
/// start, end, or appear anywhere in the path. `penalty` is called for each
/// step `(from, to)`. With `check_visibility`, start and end nodes must also
/// pass `visibility` from the start/goal position.
#[derive(Clone, Copy)]
pub struct PathRequest<'a> {
    pub start: Vec2,
    pub goal: Vec2,
    pub context: &'a str,
    pub start_filter: Option<NodeFilter<'a>>,
    pub end_filter: Option<NodeFilter<'a>>,
    pub node_filter: Option<NodeFilter<'a>>,
    pub penalty: Option<StepPenalty<'a>>,
    pub check_visibility: bool,
    pub visibility: Option<Visibility<'a>>,
}

impl<'a> PathRequest<'a> {
    pub fn new(start: Vec2, goal: Vec2, context: &'a str) -> Self {
        Self {
            start,
            goal,
            context,
            start_filter: None,
            end_filter: None,
            node_filter: None,
            penalty: None,
            check_visibility: false,
            visibility: None,
        }
    }

    pub fn with_start_filter(mut self, filter: NodeFilter<'a>) -> Self {
        self.start_filter = Some(filter);
        self
    }

    pub fn with_end_filter(mut self, filter: NodeFilter<'a>) -> Self {
        self.end_filter = Some(filter);
        self
    }

    pub fn with_node_filter(mut self, filter: NodeFilter<'a>) -> Self {
        self.node_filter = Some(filter);
        self
    }

    pub fn with_penalty(mut self, penalty: StepPenalty<'a>) -> Self {
        self.penalty = Some(penalty);
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility<'a>) -> Self {
        self.check_visibility = true;
        self.visibility = Some(visibility);
        self
    }

    fn passes(&self, node: &PathNode) -> bool {
        self.node_filter.map_or(true, |f| f(node))
    }

    fn can_start(&self, node: &PathNode) -> bool {
        self.passes(node)
            && self.start_filter.map_or(true, |f| f(node))
            && self.visible_from(self.start, node)
    }

    fn can_end(&self, node: &PathNode) -> bool {
        self.passes(node)
            && self.end_filter.map_or(true, |f| f(node))
            && self.visible_from(self.goal, node)
    }

    fn visible_from(&self, from: Vec2, node: &PathNode) -> bool {
        if !self.check_visibility {
            return true;
        }
        self.visibility.map_or(true, |v| v(from, node))
    }
}

impl std::fmt::Debug for PathRequest<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathRequest")
            .field("start", &self.start)
            .field("goal", &self.goal)
            .field("context", &self.context)
            .field("check_visibility", &self.check_visibility)
            .finish_non_exhaustive()
    }
}

/// Anything that can answer path queries.
pub trait PathFinder {
    /// Always returns a path; failures come back flagged unreachable.
    fn find_path(&self, request: &PathRequest<'_>) -> SteeringPath;
}

/// Linked waypoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WaypointGraph {
    nodes: Vec<PathNode>,
    index: HashMap<NodeId, usize>,
}

#[derive(Debug, Clone, Copy)]
struct Frontier {
    estimate: f32,
    node: NodeId,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.estimate.total_cmp(&other.estimate) == Ordering::Equal && self.node == other.node
    }
}

impl Eq for Frontier {}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap on estimate, ties broken by node id for determinism
        other
            .estimate
            .total_cmp(&self.estimate)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl WaypointGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, replacing any existing node with the same id.
    pub fn add_node(&mut self, id: NodeId, position: Vec2) {
        if let Some(&i) = self.index.get(&id) {
            self.nodes[i].position = position;
            return;
        }
        self.index.insert(id, self.nodes.len());
        self.nodes.push(PathNode {
            id,
            position,
            links: Vec::new(),
        });
    }

    /// Link two nodes both ways. Unknown ids are ignored.
    pub fn link(&mut self, a: NodeId, b: NodeId) {
        let (Some(&ia), Some(&ib)) = (self.index.get(&a), self.index.get(&b)) else {
            return;
        };
        if !self.nodes[ia].links.contains(&b) {
            self.nodes[ia].links.push(b);
        }
        if !self.nodes[ib].links.contains(&a) {
            self.nodes[ib].links.push(a);
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&PathNode> {
        self.index.get(&id).map(|&i| &self.nodes[i])
    }

    pub fn nodes(&self) -> &[PathNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn closest(&self, point: Vec2, accept: impl Fn(&PathNode) -> bool) -> Option<&PathNode> {
        self.nodes
            .iter()
            .filter(|n| accept(n))
            .min_by(|a, b| {
                a.position
                    .distance_squared(&point)
                    .total_cmp(&b.position.distance_squared(&point))
            })
    }

    fn build_path(
        &self,
        start_pos: Vec2,
        end: NodeId,
        came_from: &HashMap<NodeId, (NodeId, f32)>,
        start: &PathNode,
    ) -> SteeringPath {
        let mut ids = vec![end];
        let mut costs = Vec::new();
        let mut cur = end;
        while let Some(&(prev, step)) = came_from.get(&cur) {
            costs.push(step);
            ids.push(prev);
            cur = prev;
        }
        costs.push(start.position.distance(&start_pos));
        ids.reverse();
        costs.reverse();
        let positions = ids
            .iter()
            .filter_map(|id| self.node(*id).map(|n| n.position))
            .collect();
        SteeringPath::new(ids, positions, costs)
    }
}

impl PathFinder for WaypointGraph {
    fn find_path(&self, request: &PathRequest<'_>) -> SteeringPath {
        let Some(start) = self.closest(request.start, |n| request.can_start(n)) else {
            return SteeringPath::unreachable();
        };
        let Some(end) = self.closest(request.goal, |n| request.can_end(n)) else {
            return SteeringPath::unreachable();
        };
        let goal_pos = end.position;

        let mut best: HashMap<NodeId, f32> = HashMap::new();
        let mut came_from: HashMap<NodeId, (NodeId, f32)> = HashMap::new();
        let mut open = BinaryHeap::new();
        best.insert(start.id, 0.0);
        open.push(Frontier {
            estimate: start.position.distance(&goal_pos),
            node: start.id,
        });

        while let Some(Frontier { node, .. }) = open.pop() {
            if node == end.id {
                return self.build_path(request.start, end.id, &came_from, start);
            }
            let Some(current) = self.node(node) else {
                continue;
            };
            let cost_here = best.get(&node).copied().unwrap_or(f32::INFINITY);

            for &next_id in &current.links {
                let Some(next) = self.node(next_id) else {
                    continue;
                };
                if !request.passes(next) {
                    continue;
                }
                let penalty = match request.penalty {
                    Some(penalty) => match penalty(current, next) {
                        Some(p) => p,
                        None => continue,
                    },
                    None => 0.0,
                };
                let step = current.position.distance(&next.position) + penalty;
                let candidate = cost_here + step;
                if candidate < best.get(&next_id).copied().unwrap_or(f32::INFINITY) {
                    best.insert(next_id, candidate);
                    came_from.insert(next_id, (node, step));
                    open.push(Frontier {
                        estimate: candidate + next.position.distance(&goal_pos),
                        node: next_id,
                    });
                }
            }
        }

        SteeringPath::unreachable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 1 -- 2 -- 3 along the floor, with a detour 1 -- 4 -- 3 above.
    fn diamond() -> WaypointGraph {
        let mut g = WaypointGraph::new();
        g.add_node(1, Vec2::new(0.0, 0.0));
        g.add_node(2, Vec2::new(5.0, 0.0));
        g.add_node(3, Vec2::new(10.0, 0.0));
        g.add_node(4, Vec2::new(5.0, 4.0));
        g.link(1, 2);
        g.link(2, 3);
        g.link(1, 4);
        g.link(4, 3);
        g
    }

    #[test]
    fn test_shortest_route() {
        let g = diamond();
        let path = g.find_path(&PathRequest::new(
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            "test",
        ));
        assert!(!path.is_unreachable());
        assert_eq!(path.nodes(), &[1, 2, 3]);
        assert!((path.total_cost() - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_penalty_forces_detour() {
        let g = diamond();
        let avoid_two = |_: &PathNode, to: &PathNode| if to.id == 2 { None } else { Some(0.0_f32) };
        let path = g.find_path(
            &PathRequest::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), "test")
                .with_penalty(&avoid_two),
        );
        assert_eq!(path.nodes(), &[1, 4, 3]);
    }

    #[test]
    fn test_disconnected_goal_is_unreachable() {
        let mut g = diamond();
        g.add_node(9, Vec2::new(50.0, 0.0));
        let path = g.find_path(&PathRequest::new(
            Vec2::new(0.0, 0.0),
            Vec2::new(50.0, 0.0),
            "test",
        ));
        assert!(path.is_unreachable());
    }

    #[test]
    fn test_start_filter_and_first_segment_cost() {
        let g = diamond();
        let not_one = |n: &PathNode| n.id != 1;
        let path = g.find_path(
            &PathRequest::new(Vec2::new(1.0, 0.0), Vec2::new(10.0, 0.0), "test")
                .with_start_filter(&not_one),
        );
        assert_eq!(path.nodes(), &[2, 3]);
        assert!((path.total_cost() - 9.0).abs() < 1e-4);
    }

    #[test]
    fn test_visibility_rejects_hidden_start() {
        let g = diamond();
        let nothing_visible = |_: Vec2, _: &PathNode| false;
        let path = g.find_path(
            &PathRequest::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), "test")
                .with_visibility(&nothing_visible),
        );
        assert!(path.is_unreachable());
    }

    #[test]
    fn test_same_start_and_end_node() {
        let g = diamond();
        let path = g.find_path(&PathRequest::new(
            Vec2::new(9.0, 0.0),
            Vec2::new(10.5, 0.0),
            "test",
        ));
        assert_eq!(path.nodes(), &[3]);
    }
}
