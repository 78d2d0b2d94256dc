//! Delayed reactions.
//!
//! Bystanders don't react to what they witness on the same frame; their
//! responses are queued here with a short random delay and applied by the
//! engine once due.

use hecs::Entity;
use subcrew_logic::threat::CombatMode;

#[derive(Debug, Clone, PartialEq)]
pub enum ScheduledAction {
    Combat {
        agent: Entity,
        target: Entity,
        mode: CombatMode,
    },
    Speak {
        agent: Entity,
        identifier: String,
        line: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
struct Pending {
    remaining: f32,
    action: ScheduledAction,
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    pending: Vec<Pending>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, delay: f32, action: ScheduledAction) {
        self.pending.push(Pending {
            remaining: delay.max(0.0),
            action,
        });
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Advance time and hand back everything that came due, in scheduling order.
    pub fn advance(&mut self, dt: f32) -> Vec<ScheduledAction> {
        let mut due = Vec::new();
        let mut waiting = Vec::with_capacity(self.pending.len());
        for mut p in self.pending.drain(..) {
            p.remaining -= dt;
            if p.remaining <= 0.0 {
                due.push(p.action);
            } else {
                waiting.push(p);
            }
        }
        self.pending = waiting;
        due
    }

    /// Drop everything queued for or against `entity`.
    pub fn forget(&mut self, entity: Entity) {
        self.pending.retain(|p| match &p.action {
            ScheduledAction::Combat { agent, target, .. } => *agent != entity && *target != entity,
            ScheduledAction::Speak { agent, .. } => *agent != entity,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hecs::World;

    #[test]
    fn test_actions_fire_in_order_once_due() {
        let mut world = World::new();
        let a = world.spawn((0u8,));
        let b = world.spawn((0u8,));
        let mut scheduler = Scheduler::new();
        scheduler.schedule(1.0, ScheduledAction::Combat { agent: a, target: b, mode: CombatMode::Retreat });
        scheduler.schedule(0.5, ScheduledAction::Speak {
            agent: a,
            identifier: "help".into(),
            line: "Help!".into(),
        });

        assert!(scheduler.advance(0.4).is_empty());
        let due = scheduler.advance(0.2);
        assert_eq!(due.len(), 1);
        assert!(matches!(due[0], ScheduledAction::Speak { .. }));
        let due = scheduler.advance(0.5);
        assert_eq!(due.len(), 1);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_forget_removes_both_roles() {
        let mut world = World::new();
        let a = world.spawn((0u8,));
        let b = world.spawn((0u8,));
        let c = world.spawn((0u8,));
        let mut scheduler = Scheduler::new();
        scheduler.schedule(1.0, ScheduledAction::Combat { agent: a, target: b, mode: CombatMode::Arrest });
        scheduler.schedule(1.0, ScheduledAction::Combat { agent: c, target: a, mode: CombatMode::Arrest });
        scheduler.schedule(1.0, ScheduledAction::Combat { agent: c, target: b, mode: CombatMode::Arrest });
        scheduler.forget(a);
        assert_eq!(scheduler.len(), 1);
    }
}
