//! What an objective is, plus the scratch state each kind carries between ticks.

use hecs::Entity;
use subcrew_logic::geometry::Vec2;
use subcrew_logic::hazard::Suppression;
use subcrew_logic::threat::CombatMode;

use super::targets::{LoopTask, TargetRef};
use crate::components::{ContainerId, DeviceId, HullId, ItemId, ItemKind};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdleState {
    pub(crate) timer: f32,
    pub(crate) target: Option<Vec2>,
    pub(crate) target_hull: Option<HullId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindSafetyState {
    pub(crate) target: Option<HullId>,
    pub(crate) unreachable: Vec<HullId>,
    pub(crate) search_timer: f32,
    /// Diving gear kinds already asked for.
    pub(crate) gear_attempts: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CombatState {
    pub target: Entity,
    pub mode: CombatMode,
    pub(crate) lost_timer: f32,
    pub(crate) action_timer: f32,
    pub(crate) last_seen: Option<(Vec2, Option<HullId>)>,
    pub(crate) refuge: Option<HullId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoopState {
    pub task: LoopTask,
    pub(crate) current: Option<TargetRef>,
    pub(crate) skipped: Vec<TargetRef>,
    pub(crate) action_timer: f32,
    /// Engine time before which the loop stays quiet after failing to find its tool.
    pub(crate) retry_at: f64,
    pub(crate) fetching: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GoToState {
    pub destination: Vec2,
    pub close_enough: f32,
    pub run: bool,
}

/// Where a fetch will pick its item up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemSource {
    Container(ContainerId),
    Floor(ItemId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchItemState {
    pub kind: ItemKind,
    pub(crate) source: Option<ItemSource>,
    pub(crate) tried: Vec<ItemSource>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StowItemState {
    pub item: ItemId,
    pub(crate) container: Option<ContainerId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperateState {
    pub device: DeviceId,
    pub(crate) action_timer: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectiveKind {
    /// Wander about. Always queued, lowest priority.
    Idle(IdleState),
    /// Get out of a dangerous hull. Priority follows how bad the current hull is.
    FindSafety(FindSafetyState),
    Combat(CombatState),
    /// Standing duty working through shared targets.
    Loop(LoopState),
    GoTo(GoToState),
    FetchItem(FetchItemState),
    StowItem(StowItemState),
    OperateDevice(OperateState),
}

impl ObjectiveKind {
    pub fn idle() -> Self {
        ObjectiveKind::Idle(IdleState::default())
    }

    pub fn find_safety() -> Self {
        ObjectiveKind::FindSafety(FindSafetyState::default())
    }

    pub fn combat(target: Entity, mode: CombatMode) -> Self {
        ObjectiveKind::Combat(CombatState {
            target,
            mode,
            lost_timer: 0.0,
            action_timer: 0.0,
            last_seen: None,
            refuge: None,
        })
    }

    pub fn task_loop(task: LoopTask) -> Self {
        ObjectiveKind::Loop(LoopState {
            task,
            current: None,
            skipped: Vec::new(),
            action_timer: 0.0,
            retry_at: 0.0,
            fetching: false,
        })
    }

    pub fn go_to(destination: Vec2, close_enough: f32) -> Self {
        ObjectiveKind::GoTo(GoToState {
            destination,
            close_enough,
            run: false,
        })
    }

    pub fn fetch(kind: ItemKind) -> Self {
        ObjectiveKind::FetchItem(FetchItemState {
            kind,
            source: None,
            tried: Vec::new(),
        })
    }

    pub fn stow(item: ItemId) -> Self {
        ObjectiveKind::StowItem(StowItemState { item, container: None })
    }

    pub fn operate(device: DeviceId) -> Self {
        ObjectiveKind::OperateDevice(OperateState {
            device,
            action_timer: 0.0,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            ObjectiveKind::Idle(_) => "idle",
            ObjectiveKind::FindSafety(_) => "find safety",
            ObjectiveKind::Combat(_) => "combat",
            ObjectiveKind::Loop(l) => l.task.name(),
            ObjectiveKind::GoTo(_) => "go to",
            ObjectiveKind::FetchItem(_) => "fetch item",
            ObjectiveKind::StowItem(_) => "stow item",
            ObjectiveKind::OperateDevice(_) => "operate device",
        }
    }

    /// Two objectives doing the same job; the manager keeps only one of them.
    pub fn same_duty(&self, other: &ObjectiveKind) -> bool {
        use ObjectiveKind::*;
        match (self, other) {
            (Idle(_), Idle(_)) | (FindSafety(_), FindSafety(_)) => true,
            (Combat(a), Combat(b)) => a.target == b.target,
            (Loop(a), Loop(b)) => a.task == b.task,
            (FetchItem(a), FetchItem(b)) => a.kind == b.kind,
            (StowItem(a), StowItem(b)) => a.item == b.item,
            (OperateDevice(a), OperateDevice(b)) => a.device == b.device,
            (GoTo(a), GoTo(b)) => a.destination == b.destination,
            _ => false,
        }
    }

    /// Hazards this objective is prepared to face.
    pub fn suppression(&self) -> Suppression {
        match self {
            ObjectiveKind::Combat(c) if c.mode != CombatMode::Retreat => Suppression {
                ignore_enemies: true,
                ..Suppression::default()
            },
            ObjectiveKind::Loop(l) if l.task == LoopTask::FightIntruders => Suppression {
                ignore_enemies: true,
                ..Suppression::default()
            },
            ObjectiveKind::Loop(l) if l.task == LoopTask::ExtinguishFires => Suppression {
                ignore_fire: true,
                ..Suppression::default()
            },
            _ => Suppression::default(),
        }
    }

    pub fn combat_state(&self) -> Option<&CombatState> {
        match self {
            ObjectiveKind::Combat(c) => Some(c),
            _ => None,
        }
    }
}
