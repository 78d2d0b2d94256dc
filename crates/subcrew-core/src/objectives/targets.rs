//! Crew-wide problem board.
//!
//! Agents post what they see (fires, leaks, broken devices, injured crew,
//! intruders) per team and task. Task loops pick their work from here, so
//! a fire spotted by one crew member is known to all of them. The board is
//! wiped periodically; anything still there is re-posted by whoever sees it.

use std::collections::HashMap;

use hecs::Entity;
use serde::{Deserialize, Serialize};
use subcrew_logic::geometry::Vec2;

use crate::components::{DeviceId, HullId, ItemKind, Submarine, Team};
use crate::crew::CrewSnapshot;
use crate::events::AgentAction;

/// Standing duties that loop over shared targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoopTask {
    ExtinguishFires,
    FixLeaks,
    RescueCrew,
    RepairDevices,
    FightIntruders,
}

impl LoopTask {
    pub const ALL: [LoopTask; 5] = [
        LoopTask::ExtinguishFires,
        LoopTask::FixLeaks,
        LoopTask::RescueCrew,
        LoopTask::RepairDevices,
        LoopTask::FightIntruders,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LoopTask::ExtinguishFires => "extinguish fires",
            LoopTask::FixLeaks => "fix leaks",
            LoopTask::RescueCrew => "rescue crew",
            LoopTask::RepairDevices => "repair devices",
            LoopTask::FightIntruders => "fight intruders",
        }
    }

    /// Item needed to work on a target.
    pub fn tool(self) -> Option<ItemKind> {
        match self {
            LoopTask::ExtinguishFires => Some(ItemKind::Extinguisher),
            LoopTask::FixLeaks => Some(ItemKind::WeldingTool),
            LoopTask::RescueCrew => Some(ItemKind::MedKit),
            LoopTask::RepairDevices => Some(ItemKind::Wrench),
            LoopTask::FightIntruders => None,
        }
    }

    /// Whether agents run to these targets.
    pub fn urgent(self) -> bool {
        !matches!(self, LoopTask::RepairDevices)
    }
}

/// One thing that needs doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetRef {
    Fire(HullId),
    Breach { hull: HullId, index: usize },
    Character(Entity),
    Device(DeviceId),
}

impl TargetRef {
    /// Whether the problem still exists for this task.
    pub fn is_valid(self, task: LoopTask, team: Team, sub: &Submarine, crew: &CrewSnapshot, rescue_fraction: f32) -> bool {
        match self {
            TargetRef::Fire(hull) => sub.hull(hull).is_ok_and(|h| h.has_fire()),
            TargetRef::Breach { hull, index } => sub
                .hull(hull)
                .ok()
                .and_then(|h| h.breaches.get(index))
                .is_some_and(|b| b.open > 0.0),
            TargetRef::Device(device) => sub.device(device).is_ok_and(|d| d.needs_repair()),
            TargetRef::Character(entity) => {
                let Some(member) = crew.get(entity) else { return false };
                match task {
                    LoopTask::FightIntruders => member.active && !team.is_friendly(member.team),
                    _ => {
                        team.is_friendly(member.team)
                            && member.health_fraction > 0.0
                            && (member.incapacitated || member.health_fraction < rescue_fraction)
                    }
                }
            }
        }
    }

    /// The action that works on this target, for tasks that act directly.
    pub fn action(self, sub: &Submarine, from: Vec2) -> Option<AgentAction> {
        match self {
            TargetRef::Fire(hull) => {
                let h = sub.hull(hull).ok()?;
                let fire = h
                    .fires
                    .iter()
                    .min_by(|a, b| a.position.distance(&from).total_cmp(&b.position.distance(&from)))?;
                Some(AgentAction::Extinguish {
                    hull,
                    position: fire.position,
                })
            }
            TargetRef::Breach { hull, index } => Some(AgentAction::Weld { hull, breach: index }),
            TargetRef::Device(device) => Some(AgentAction::Repair { device }),
            TargetRef::Character(patient) => Some(AgentAction::Treat { patient }),
        }
    }
}

/// Shared targets per team and task.
#[derive(Debug, Clone, Default)]
pub struct SharedTargets {
    board: HashMap<(Team, LoopTask), Vec<TargetRef>>,
    age: f32,
}

impl SharedTargets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Post a target. Returns `true` when it wasn't already known.
    pub fn report(&mut self, team: Team, task: LoopTask, target: TargetRef) -> bool {
        let list = self.board.entry((team, task)).or_default();
        if list.contains(&target) {
            return false;
        }
        list.push(target);
        true
    }

    pub fn targets(&self, team: Team, task: LoopTask) -> &[TargetRef] {
        self.board.get(&(team, task)).map_or(&[], Vec::as_slice)
    }

    pub fn remove(&mut self, team: Team, task: LoopTask, target: TargetRef) {
        if let Some(list) = self.board.get_mut(&(team, task)) {
            list.retain(|t| *t != target);
        }
    }

    /// Forget every target that refers to `entity`.
    pub fn forget_character(&mut self, entity: Entity) {
        for list in self.board.values_mut() {
            list.retain(|t| *t != TargetRef::Character(entity));
        }
    }

    /// Age the board; everything is cleared once `lifetime` elapses.
    pub fn tick(&mut self, dt: f32, lifetime: f32) {
        self.age += dt;
        if self.age >= lifetime {
            self.clear();
        }
    }

    pub fn clear(&mut self) {
        self.board.clear();
        self.age = 0.0;
    }

    pub fn is_empty(&self) -> bool {
        self.board.values().all(Vec::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use subcrew_logic::geometry::Rect;
    use subcrew_logic::hazard::FireSource;

    #[test]
    fn test_reports_are_deduplicated_per_team() {
        let mut board = SharedTargets::new();
        assert!(board.report(Team::Crew, LoopTask::ExtinguishFires, TargetRef::Fire(2)));
        assert!(!board.report(Team::Crew, LoopTask::ExtinguishFires, TargetRef::Fire(2)));
        assert!(board.report(Team::Raiders, LoopTask::ExtinguishFires, TargetRef::Fire(2)));
        assert_eq!(board.targets(Team::Crew, LoopTask::ExtinguishFires).len(), 1);
        assert!(board.targets(Team::Crew, LoopTask::FixLeaks).is_empty());
    }

    #[test]
    fn test_board_clears_after_lifetime() {
        let mut board = SharedTargets::new();
        board.report(Team::Crew, LoopTask::RepairDevices, TargetRef::Device(0));
        board.tick(4.0, 10.0);
        assert!(!board.is_empty());
        board.tick(6.0, 10.0);
        assert!(board.is_empty());
    }

    #[test]
    fn test_fire_target_validity_and_action() {
        let mut sub = Submarine::new();
        let hull = sub.add_hull("Galley", Rect::new(0.0, 0.0, 10.0, 3.0));
        let crew = CrewSnapshot::default();
        let fire = TargetRef::Fire(hull);
        assert!(!fire.is_valid(LoopTask::ExtinguishFires, Team::Crew, &sub, &crew, 0.5));

        sub.add_fire(hull, FireSource { position: Vec2::new(8.0, 0.0), size: 1.0 }).unwrap();
        assert!(fire.is_valid(LoopTask::ExtinguishFires, Team::Crew, &sub, &crew, 0.5));
        assert_eq!(
            fire.action(&sub, Vec2::new(1.0, 0.0)),
            Some(AgentAction::Extinguish {
                hull,
                position: Vec2::new(8.0, 0.0)
            })
        );
    }
}
