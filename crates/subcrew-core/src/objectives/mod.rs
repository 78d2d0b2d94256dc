//! Objective trees and their priority-ordered manager.
//!
//! Each agent carries an [`ObjectiveManager`] component. Root objectives are
//! re-prioritised and stably sorted on a timer; the highest one becomes
//! current and only its deepest active sub-objective is acted on each tick.
//! Finished objectives are removed together with their sub-trees and leave an
//! [`ObjectiveEvent`] behind for whoever tracks orders.

mod behavior;
mod kinds;
mod targets;

pub use behavior::{combat_priority, ObjectiveContext, Step};
pub use kinds::*;
pub use targets::*;

use hecs::Entity;
use log::{debug, info};
use subcrew_logic::hazard::Suppression;
use subcrew_logic::threat::CombatMode;

use crate::error::AiError;

/// Generational handle into a manager's objective arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectiveId {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectiveState {
    Active,
    Completed,
    Abandoned,
}

#[derive(Debug, Clone)]
pub struct ObjectiveNode {
    pub kind: ObjectiveKind,
    pub priority: f32,
    /// Set for orders and forced objectives; skips priority evaluation.
    pub fixed_priority: Option<f32>,
    pub from_order: bool,
    /// Fixed priority of a standing root before an order took it over.
    /// `Some` means dismissing the order hands the root back instead of dropping it.
    standing: Option<Option<f32>>,
    pub state: ObjectiveState,
    parent: Option<ObjectiveId>,
    children: Vec<ObjectiveId>,
    /// How the last sub-objective ended, consumed on the next act.
    child_outcome: Option<ObjectiveState>,
}

impl ObjectiveNode {
    fn new(kind: ObjectiveKind, parent: Option<ObjectiveId>) -> Self {
        Self {
            kind,
            priority: 0.0,
            fixed_priority: None,
            from_order: false,
            standing: None,
            state: ObjectiveState::Active,
            parent,
            children: Vec::new(),
            child_outcome: None,
        }
    }

    pub fn parent(&self) -> Option<ObjectiveId> {
        self.parent
    }

    pub fn children(&self) -> &[ObjectiveId] {
        &self.children
    }
}

/// Emitted whenever an objective completes or is abandoned.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectiveEvent {
    pub id: ObjectiveId,
    pub name: &'static str,
    pub state: ObjectiveState,
    pub from_order: bool,
}

/// Result of asking for a combat objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatOutcome {
    Added(ObjectiveId),
    /// Existing objective against the same target switched mode.
    Updated(ObjectiveId),
    /// Existing objective kept its mode.
    Kept(ObjectiveId),
    Ignored,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<ObjectiveNode>,
}

/// Component: an agent's objectives.
#[derive(Debug, Clone, Default)]
pub struct ObjectiveManager {
    slots: Vec<Slot>,
    free: Vec<u32>,
    roots: Vec<ObjectiveId>,
    current: Option<ObjectiveId>,
    sort_timer: f32,
    events: Vec<ObjectiveEvent>,
}

impl ObjectiveManager {
    pub fn new() -> Self {
        Self::default()
    }

    // --- arena ---

    fn insert(&mut self, node: ObjectiveNode) -> ObjectiveId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation += 1;
            slot.node = Some(node);
            ObjectiveId {
                index,
                generation: slot.generation,
            }
        } else {
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            ObjectiveId {
                index: (self.slots.len() - 1) as u32,
                generation: 0,
            }
        }
    }

    pub fn get(&self, id: ObjectiveId) -> Option<&ObjectiveNode> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_ref())
    }

    pub fn get_mut(&mut self, id: ObjectiveId) -> Option<&mut ObjectiveNode> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_mut())
    }

    fn node_mut(&mut self, id: ObjectiveId) -> Result<&mut ObjectiveNode, AiError> {
        self.get_mut(id).ok_or(AiError::StaleObjective(id.index))
    }

    /// Free a node and everything under it.
    fn release(&mut self, id: ObjectiveId) -> Option<ObjectiveNode> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let node = slot.node.take()?;
        self.free.push(id.index);
        for &child in &node.children {
            self.release(child);
        }
        Some(node)
    }

    /// Live objectives, roots and sub-objectives alike.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // --- adding ---

    fn find_root(&self, kind: &ObjectiveKind) -> Option<ObjectiveId> {
        self.roots
            .iter()
            .copied()
            .find(|&id| self.get(id).is_some_and(|n| n.kind.same_duty(kind)))
    }

    /// Queue a root objective. An existing root doing the same job is reused.
    pub fn add_objective(&mut self, kind: ObjectiveKind) -> ObjectiveId {
        if let Some(existing) = self.find_root(&kind) {
            return existing;
        }
        let name = kind.name();
        let id = self.insert(ObjectiveNode::new(kind, None));
        self.roots.push(id);
        if self.current.is_none() {
            self.current = Some(id);
        }
        debug!("objective added: {name}");
        id
    }

    /// Queue a root objective with a priority that never gets re-evaluated.
    pub fn add_objective_with_priority(&mut self, kind: ObjectiveKind, priority: f32) -> ObjectiveId {
        let id = self.add_objective(kind);
        if let Some(node) = self.get_mut(id) {
            node.fixed_priority = Some(priority);
            node.priority = priority;
        }
        id
    }

    /// Replace any previous order with this one.
    ///
    /// An order for a duty the agent already has takes over that root; it is
    /// handed back when the order is dismissed.
    pub fn add_order(&mut self, kind: ObjectiveKind, priority: f32) -> ObjectiveId {
        self.dismiss_orders();
        let standing = self
            .find_root(&kind)
            .and_then(|id| self.get(id))
            .map(|n| n.fixed_priority);
        let id = self.add_objective_with_priority(kind, priority);
        if let Some(node) = self.get_mut(id) {
            node.from_order = true;
            node.standing = standing;
        }
        id
    }

    /// Drop every objective that came from an order. Standing duties an
    /// order took over go back to their own priority.
    pub fn dismiss_orders(&mut self) {
        let orders: Vec<ObjectiveId> = self
            .roots
            .iter()
            .copied()
            .filter(|&id| self.get(id).is_some_and(|n| n.from_order))
            .collect();
        for id in orders {
            if let Some(node) = self.get_mut(id) {
                if let Some(fixed) = node.standing.take() {
                    node.from_order = false;
                    node.fixed_priority = fixed;
                    if let Some(priority) = fixed {
                        node.priority = priority;
                    }
                    debug!("order released {}", node.kind.name());
                    continue;
                }
            }
            if let Err(err) = self.abandon(id) {
                debug!("dismissing order: {err}");
            }
        }
    }

    pub fn add_sub_objective(&mut self, parent: ObjectiveId, kind: ObjectiveKind) -> Result<ObjectiveId, AiError> {
        self.node_mut(parent)?;
        let id = self.insert(ObjectiveNode::new(kind, Some(parent)));
        self.node_mut(parent)?.children.push(id);
        Ok(id)
    }

    /// Start or update a combat objective against `target`.
    ///
    /// An offensive objective is never downgraded to another mode.
    pub fn add_combat_objective(&mut self, target: Entity, mode: CombatMode) -> CombatOutcome {
        if mode == CombatMode::Ignore {
            return CombatOutcome::Ignored;
        }
        let wanted = ObjectiveKind::combat(target, mode);
        if let Some(id) = self.find_root(&wanted) {
            let Some(ObjectiveKind::Combat(state)) = self.get_mut(id).map(|n| &mut n.kind) else {
                return CombatOutcome::Ignored;
            };
            if state.mode == mode || (state.mode.is_protected() && mode != CombatMode::Offensive) {
                return CombatOutcome::Kept(id);
            }
            state.mode = mode;
            info!("combat against {target:?} switched to {mode:?}");
            return CombatOutcome::Updated(id);
        }
        CombatOutcome::Added(self.add_objective(wanted))
    }

    pub fn has_offensive_against(&self, target: Entity) -> bool {
        self.roots.iter().any(|&id| {
            self.get(id)
                .and_then(|n| n.kind.combat_state())
                .is_some_and(|c| c.target == target && c.mode == CombatMode::Offensive)
        })
    }

    /// Mode of the combat objective against `target`, if any.
    pub fn combat_mode(&self, target: Entity) -> Option<CombatMode> {
        self.roots
            .iter()
            .filter_map(|&id| self.get(id).and_then(|n| n.kind.combat_state()))
            .find(|c| c.target == target)
            .map(|c| c.mode)
    }

    /// Abandon every combat objective aimed at `target`.
    pub fn forget_target(&mut self, target: Entity) {
        let aimed: Vec<ObjectiveId> = self
            .roots
            .iter()
            .copied()
            .filter(|&id| {
                self.get(id)
                    .and_then(|n| n.kind.combat_state())
                    .is_some_and(|c| c.target == target)
            })
            .collect();
        for id in aimed {
            if let Err(err) = self.abandon(id) {
                debug!("forgetting target: {err}");
            }
        }
    }

    // --- lifecycle ---

    pub fn complete(&mut self, id: ObjectiveId) -> Result<(), AiError> {
        self.finish(id, ObjectiveState::Completed)
    }

    pub fn abandon(&mut self, id: ObjectiveId) -> Result<(), AiError> {
        self.finish(id, ObjectiveState::Abandoned)
    }

    fn finish(&mut self, id: ObjectiveId, state: ObjectiveState) -> Result<(), AiError> {
        let mut node = self.release(id).ok_or(AiError::StaleObjective(id.index))?;
        node.state = state;
        match node.parent {
            Some(parent) => {
                if let Some(p) = self.get_mut(parent) {
                    p.children.retain(|&c| c != id);
                    p.child_outcome = Some(state);
                }
            }
            None => self.roots.retain(|&r| r != id),
        }
        debug!("objective {} {:?}", node.kind.name(), state);
        self.events.push(ObjectiveEvent {
            id,
            name: node.kind.name(),
            state,
            from_order: node.from_order,
        });
        if self.current == Some(id) {
            self.current = self.roots.first().copied();
        }
        Ok(())
    }

    // --- ordering ---

    pub fn roots(&self) -> &[ObjectiveId] {
        &self.roots
    }

    pub fn current(&self) -> Option<ObjectiveId> {
        self.current
    }

    pub fn current_kind(&self) -> Option<&ObjectiveKind> {
        self.current.and_then(|id| self.get(id)).map(|n| &n.kind)
    }

    /// Deepest active descendant of `id` (the most recently pushed child at each level).
    pub fn active_leaf(&self, id: ObjectiveId) -> ObjectiveId {
        let mut leaf = id;
        while let Some(&child) = self.get(leaf).and_then(|n| n.children.last()) {
            leaf = child;
        }
        leaf
    }

    /// Count down to the next sort; returns `true` when one is due.
    pub fn tick_sort_timer(&mut self, dt: f32, interval: f32) -> bool {
        self.sort_timer -= dt;
        if self.sort_timer <= 0.0 {
            self.sort_timer = interval;
            return true;
        }
        false
    }

    pub fn update_priorities(&mut self, ctx: &mut ObjectiveContext<'_>) {
        for id in self.roots.clone() {
            let Some(node) = self.get_mut(id) else { continue };
            node.priority = match node.fixed_priority {
                Some(p) => p,
                None => behavior::priority(&node.kind, ctx),
            };
        }
    }

    /// Stable sort by priority, highest first, and pick the current objective.
    /// Returns whether the current objective changed.
    ///
    /// A current offensive combat objective is never displaced by another
    /// combat objective, whatever its priority; other kinds still can.
    pub fn sort(&mut self) -> bool {
        let held = self
            .current
            .and_then(|id| self.get(id).map(|n| (id, n)))
            .filter(|(_, n)| n.kind.combat_state().is_some_and(|c| c.mode.is_protected()))
            .map(|(id, n)| (id, n.priority));
        let mut keyed: Vec<(ObjectiveId, f32)> = self
            .roots
            .iter()
            .map(|&id| {
                let node = self.get(id);
                let mut priority = node.map_or(0.0, |n| n.priority);
                if let Some((held_id, held_priority)) = held {
                    if id != held_id && node.is_some_and(|n| n.kind.combat_state().is_some()) {
                        priority = priority.min(held_priority);
                    }
                }
                (id, priority)
            })
            .collect();
        keyed.sort_by(|a, b| {
            b.1.total_cmp(&a.1).then_with(|| {
                let a_held = held.is_some_and(|(h, _)| h == a.0);
                let b_held = held.is_some_and(|(h, _)| h == b.0);
                b_held.cmp(&a_held)
            })
        });
        self.roots = keyed.into_iter().map(|(id, _)| id).collect();

        let previous = self.current;
        self.current = self.roots.first().copied();
        if previous != self.current {
            if let Some(node) = self.current.and_then(|id| self.get(id)) {
                info!("switched to {} ({:.0})", node.kind.name(), node.priority);
            }
            return true;
        }
        false
    }

    /// Act on the current objective's active leaf.
    pub fn run_current(&mut self, ctx: &mut ObjectiveContext<'_>) -> Result<(), AiError> {
        let Some(root) = self.current else {
            return Ok(());
        };
        let leaf = self.active_leaf(root);
        let step = {
            let node = self.node_mut(leaf)?;
            let child = node.child_outcome.take();
            behavior::act(&mut node.kind, child, ctx)
        };
        match step {
            Step::Running => Ok(()),
            Step::Completed => self.complete(leaf),
            Step::Abandoned => self.abandon(leaf),
            Step::Push(kind) => self.add_sub_objective(leaf, kind).map(|_| ()),
        }
    }

    /// Hazards the current objective tells the safety scorer to ignore.
    pub fn suppression(&self) -> Suppression {
        self.current_kind()
            .map(ObjectiveKind::suppression)
            .unwrap_or_default()
    }

    pub fn drain_events(&mut self) -> Vec<ObjectiveEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hecs::World;

    #[test]
    fn test_fixed_priority_wins_first_sort() {
        let mut manager = ObjectiveManager::new();
        let idle = manager.add_objective(ObjectiveKind::idle());
        manager.get_mut(idle).unwrap().priority = 1.0;
        let safety = manager.add_objective_with_priority(ObjectiveKind::find_safety(), 9.0);
        assert_eq!(manager.current(), Some(idle));
        assert!(manager.sort());
        assert_eq!(manager.current(), Some(safety));
        assert_eq!(manager.roots(), &[safety, idle]);
    }

    #[test]
    fn test_sort_is_stable_for_ties() {
        let mut manager = ObjectiveManager::new();
        let a = manager.add_objective_with_priority(ObjectiveKind::task_loop(LoopTask::FixLeaks), 5.0);
        let b = manager.add_objective_with_priority(ObjectiveKind::task_loop(LoopTask::ExtinguishFires), 5.0);
        manager.sort();
        assert_eq!(manager.roots(), &[a, b]);
    }

    #[test]
    fn test_duplicate_roots_are_reused() {
        let mut manager = ObjectiveManager::new();
        let a = manager.add_objective(ObjectiveKind::idle());
        let b = manager.add_objective(ObjectiveKind::idle());
        assert_eq!(a, b);
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_offensive_is_never_downgraded() {
        let mut world = World::new();
        let raider = world.spawn((0u8,));
        let mut manager = ObjectiveManager::new();
        let id = match manager.add_combat_objective(raider, CombatMode::Offensive) {
            CombatOutcome::Added(id) => id,
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(manager.add_combat_objective(raider, CombatMode::Retreat), CombatOutcome::Kept(id));
        assert_eq!(manager.combat_mode(raider), Some(CombatMode::Offensive));
        assert_eq!(manager.add_combat_objective(raider, CombatMode::Ignore), CombatOutcome::Ignored);
    }

    #[test]
    fn test_defensive_can_escalate() {
        let mut world = World::new();
        let raider = world.spawn((0u8,));
        let mut manager = ObjectiveManager::new();
        manager.add_combat_objective(raider, CombatMode::Defensive);
        assert!(matches!(
            manager.add_combat_objective(raider, CombatMode::Offensive),
            CombatOutcome::Updated(_)
        ));
        assert!(manager.has_offensive_against(raider));
    }

    #[test]
    fn test_current_offensive_holds_against_other_combat() {
        let mut world = World::new();
        let raider = world.spawn((0u8,));
        let diver = world.spawn((0u8,));
        let mut manager = ObjectiveManager::new();
        let attack = match manager.add_combat_objective(raider, CombatMode::Offensive) {
            CombatOutcome::Added(id) => id,
            other => panic!("unexpected {other:?}"),
        };
        manager.get_mut(attack).unwrap().priority = 90.0;
        manager.sort();
        assert_eq!(manager.current(), Some(attack));

        let flee = match manager.add_combat_objective(diver, CombatMode::Retreat) {
            CombatOutcome::Added(id) => id,
            other => panic!("unexpected {other:?}"),
        };
        manager.get_mut(flee).unwrap().priority = 95.0;
        assert!(!manager.sort());
        assert_eq!(manager.current(), Some(attack));

        let safety = manager.add_objective_with_priority(ObjectiveKind::find_safety(), 100.0);
        assert!(manager.sort());
        assert_eq!(manager.current(), Some(safety));
    }

    #[test]
    fn test_finishing_removes_subtree_and_reports() {
        let mut manager = ObjectiveManager::new();
        let root = manager.add_objective(ObjectiveKind::task_loop(LoopTask::ExtinguishFires));
        let child = manager
            .add_sub_objective(root, ObjectiveKind::fetch(crate::components::ItemKind::Extinguisher))
            .unwrap();
        let grandchild = manager.add_sub_objective(child, ObjectiveKind::go_to(Default::default(), 1.0)).unwrap();
        assert_eq!(manager.active_leaf(root), grandchild);

        manager.abandon(child).unwrap();
        assert!(manager.get(grandchild).is_none());
        assert_eq!(manager.active_leaf(root), root);
        assert_eq!(manager.get(root).unwrap().child_outcome, Some(ObjectiveState::Abandoned));

        let events = manager.drain_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].state, ObjectiveState::Abandoned);
        assert!(manager.abandon(child).is_err());
    }

    #[test]
    fn test_stale_ids_do_not_alias_new_objectives() {
        let mut manager = ObjectiveManager::new();
        let old = manager.add_objective(ObjectiveKind::go_to(Default::default(), 1.0));
        manager.complete(old).unwrap();
        let new = manager.add_objective(ObjectiveKind::idle());
        assert_ne!(old, new);
        assert!(manager.get(old).is_none());
        assert!(manager.get(new).is_some());
    }

    #[test]
    fn test_orders_replace_each_other() {
        let mut manager = ObjectiveManager::new();
        manager.add_objective(ObjectiveKind::idle());
        let first = manager.add_order(ObjectiveKind::task_loop(LoopTask::FixLeaks), 70.0);
        let second = manager.add_order(ObjectiveKind::task_loop(LoopTask::RepairDevices), 70.0);
        assert!(manager.get(first).is_none());
        assert!(manager.get(second).unwrap().from_order);
        let events = manager.drain_events();
        assert!(events.iter().any(|e| e.from_order && e.state == ObjectiveState::Abandoned));
    }

    #[test]
    fn test_dismissed_order_hands_back_standing_duty() {
        let mut manager = ObjectiveManager::new();
        manager.add_objective_with_priority(ObjectiveKind::idle(), 1.0);
        let repair = manager.add_objective(ObjectiveKind::task_loop(LoopTask::RepairDevices));

        let order = manager.add_order(ObjectiveKind::task_loop(LoopTask::RepairDevices), 70.0);
        assert_eq!(order, repair);
        assert!(manager.get(repair).unwrap().from_order);
        assert_eq!(manager.get(repair).unwrap().fixed_priority, Some(70.0));

        manager.dismiss_orders();
        let node = manager.get(repair).expect("standing duty was dropped");
        assert!(!node.from_order);
        assert_eq!(node.fixed_priority, None);
        assert_eq!(manager.roots().len(), 2);
        assert!(manager.drain_events().is_empty());

        // A fresh order still goes away on dismissal.
        let goto = manager.add_order(ObjectiveKind::go_to(Default::default(), 1.0), 70.0);
        manager.dismiss_orders();
        assert!(manager.get(goto).is_none());
        assert!(manager.get(repair).is_some());
    }

    #[test]
    fn test_forgetting_target_drops_its_combat() {
        let mut world = World::new();
        let raider = world.spawn((0u8,));
        let mut manager = ObjectiveManager::new();
        manager.add_combat_objective(raider, CombatMode::Defensive);
        manager.forget_target(raider);
        assert_eq!(manager.combat_mode(raider), None);
        manager.forget_target(raider);
        assert!(manager.is_empty());
    }

    #[test]
    fn test_current_falls_back_when_finished() {
        let mut manager = ObjectiveManager::new();
        let goto = manager.add_objective_with_priority(ObjectiveKind::go_to(Default::default(), 1.0), 70.0);
        let idle = manager.add_objective_with_priority(ObjectiveKind::idle(), 1.0);
        manager.sort();
        assert_eq!(manager.current(), Some(goto));
        manager.abandon(goto).unwrap();
        assert_eq!(manager.current(), Some(idle));
    }
}
