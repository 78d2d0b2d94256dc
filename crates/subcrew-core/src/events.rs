//! Outbound notifications: speech, order broadcasts, agent actions and
//! reputation hits. The engine only records them; presentation layers and
//! game systems drain the log.

use std::collections::HashMap;

use hecs::Entity;
use serde::{Deserialize, Serialize};
use subcrew_logic::geometry::Vec2;
use subcrew_logic::threat::CombatMode;

use crate::components::{DeviceId, DoorId, HullId};

/// Directives one character can give another.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OrderKind {
    /// Drop the current order.
    Dismiss,
    ExtinguishFires,
    FixLeaks,
    RescueCrew,
    RepairDevices,
    FightIntruders,
    Operate(DeviceId),
    GoTo(Vec2),
}

impl OrderKind {
    pub fn name(&self) -> &'static str {
        match self {
            OrderKind::Dismiss => "dismiss",
            OrderKind::ExtinguishFires => "extinguishfires",
            OrderKind::FixLeaks => "fixleaks",
            OrderKind::RescueCrew => "rescue",
            OrderKind::RepairDevices => "repairsystems",
            OrderKind::FightIntruders => "fightintruders",
            OrderKind::Operate(_) => "operate",
            OrderKind::GoTo(_) => "goto",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub kind: OrderKind,
    pub issuer: Option<Entity>,
}

/// Something an agent does to the world. Effects are applied by whoever
/// consumes the event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AgentAction {
    Attack { target: Entity },
    Arrest { target: Entity },
    Extinguish { hull: HullId, position: Vec2 },
    Weld { hull: HullId, breach: usize },
    Repair { device: DeviceId },
    Treat { patient: Entity },
    Operate { device: DeviceId },
    BreakDoor { door: DoorId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HostileAct {
    Assault,
    Theft,
    Sabotage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AiEvent {
    Speak {
        speaker: Entity,
        identifier: String,
        line: String,
    },
    /// Ask everyone in earshot to act on an order. `key` deduplicates repeats.
    BroadcastOrder {
        issuer: Entity,
        order: OrderKind,
        key: String,
    },
    Action {
        agent: Entity,
        action: AgentAction,
    },
    DoorInteraction {
        agent: Entity,
        door: DoorId,
        open: bool,
    },
    CombatStarted {
        agent: Entity,
        target: Entity,
        mode: CombatMode,
    },
    Reputation {
        violator: Entity,
        act: HostileAct,
        magnitude: f32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedEvent {
    pub time: f64,
    pub event: AiEvent,
}

#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<TimedEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, time: f64, event: AiEvent) {
        self.events.push(TimedEvent { time, event });
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[TimedEvent] {
        &self.events
    }

    /// Events recorded at or after `index`.
    pub fn since(&self, index: usize) -> &[TimedEvent] {
        self.events.get(index..).unwrap_or(&[])
    }

    pub fn drain(&mut self) -> Vec<TimedEvent> {
        std::mem::take(&mut self.events)
    }
}

/// When each line was last spoken, so nobody repeats themselves too often.
#[derive(Debug, Clone, Default)]
pub struct SpeechMemory {
    last_spoken: HashMap<String, f64>,
}

impl SpeechMemory {
    pub fn can_speak(&self, identifier: &str, now: f64, min_interval: f32) -> bool {
        self.last_spoken
            .get(identifier)
            .map_or(true, |&t| now - t >= min_interval as f64)
    }

    /// Record the line if allowed and report whether it went out.
    pub fn speak(
        &mut self,
        log: &mut EventLog,
        now: f64,
        speaker: Entity,
        identifier: &str,
        line: &str,
        min_interval: f32,
    ) -> bool {
        if !self.can_speak(identifier, now, min_interval) {
            return false;
        }
        self.last_spoken.insert(identifier.to_string(), now);
        log.push(
            now,
            AiEvent::Speak {
                speaker,
                identifier: identifier.to_string(),
                line: line.to_string(),
            },
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hecs::World;

    #[test]
    fn test_speech_respects_repeat_interval() {
        let mut world = World::new();
        let speaker = world.spawn((0u8,));
        let mut log = EventLog::new();
        let mut memory = SpeechMemory::default();

        assert!(memory.speak(&mut log, 0.0, speaker, "fire", "Fire!", 10.0));
        assert!(!memory.speak(&mut log, 5.0, speaker, "fire", "Fire!", 10.0));
        assert!(memory.speak(&mut log, 5.0, speaker, "leak", "Leak!", 10.0));
        assert!(memory.speak(&mut log, 10.0, speaker, "fire", "Fire!", 10.0));
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_log_since_and_drain() {
        let mut world = World::new();
        let agent = world.spawn((0u8,));
        let mut log = EventLog::new();
        log.push(
            1.0,
            AiEvent::Action {
                agent,
                action: AgentAction::Repair { device: 0 },
            },
        );
        let mark = log.len();
        log.push(
            2.0,
            AiEvent::DoorInteraction {
                agent,
                door: 3,
                open: true,
            },
        );
        assert_eq!(log.since(mark).len(), 1);
        assert_eq!(log.since(10).len(), 0);
        assert_eq!(log.drain().len(), 2);
        assert!(log.is_empty());
    }
}
