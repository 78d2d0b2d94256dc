//! Stand-in effects for what agents do to the world.
//!
//! Agents only announce actions as events. Games with their own damage,
//! welding and medical models consume those events themselves; the engine
//! applies these simple effects so a headless run still changes state.

use hecs::{Entity, World};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use subcrew_logic::threat::AfflictionKind;

use crate::components::{BodyKind, Character, Submarine};
use crate::events::{AgentAction, AiEvent, TimedEvent};

/// Below this health fraction a character passes out.
const KNOCKOUT_FRACTION: f32 = 0.1;

/// How much one action event does.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionEffects {
    /// Metres of fire put out.
    pub extinguish: f32,
    /// Breach openness sealed.
    pub weld: f32,
    /// Device condition restored.
    pub repair: f32,
    /// Health restored.
    pub treat: f32,
    /// Health removed per blow.
    pub attack: f32,
    /// Door integrity removed per blow.
    pub break_door: f32,
}

impl Default for ActionEffects {
    fn default() -> Self {
        Self {
            extinguish: 0.5,
            weld: 0.25,
            repair: 10.0,
            treat: 10.0,
            attack: 10.0,
            break_door: 25.0,
        }
    }
}

/// One blow that landed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub attacker: Entity,
    pub victim: Entity,
    pub kind: AfflictionKind,
    pub damage: f32,
    /// The blow knocked the victim out.
    pub incapacitated: bool,
}

/// Apply every action in `events`. Returns the blows that landed.
pub fn apply_actions(world: &mut World, sub: &mut Submarine, events: &[TimedEvent], effects: &ActionEffects) -> Vec<Hit> {
    let mut hits = Vec::new();
    for event in events {
        let (agent, action) = match &event.event {
            AiEvent::Action { agent, action } => (*agent, *action),
            _ => continue,
        };
        let result = match action {
            AgentAction::Extinguish { hull, .. } => sub.extinguish(hull, effects.extinguish),
            AgentAction::Weld { hull, breach } => sub.weld_breach(hull, breach, effects.weld),
            AgentAction::Repair { device } => sub.device_mut(device).map(|d| {
                d.condition = (d.condition + effects.repair).min(100.0);
            }),
            AgentAction::BreakDoor { door } => sub.door_mut(door).map(|d| {
                if d.damage(effects.break_door) {
                    debug!("door {door} broken by {agent:?}");
                }
            }),
            AgentAction::Treat { patient } => {
                treat(world, patient, effects.treat);
                Ok(())
            }
            AgentAction::Arrest { target } => {
                if let Ok(mut character) = world.get::<&mut Character>(target) {
                    character.handcuffed = true;
                    debug!("{} restrained by {agent:?}", character.name);
                }
                Ok(())
            }
            AgentAction::Attack { target } => {
                hits.extend(attack(world, agent, target, effects.attack));
                Ok(())
            }
            AgentAction::Operate { .. } => Ok(()),
        };
        if let Err(err) = result {
            warn!("action {action:?} by {agent:?} skipped: {err}");
        }
    }
    hits
}

fn treat(world: &mut World, patient: Entity, amount: f32) {
    let Ok(mut character) = world.get::<&mut Character>(patient) else {
        return;
    };
    let vitals = &mut character.vitals;
    if vitals.is_dead() {
        return;
    }
    vitals.health = (vitals.health + amount).min(vitals.max_health);
    if vitals.health_fraction() >= KNOCKOUT_FRACTION {
        vitals.conscious = true;
    }
}

fn attack(world: &mut World, attacker: Entity, victim: Entity, amount: f32) -> Option<Hit> {
    let kind = {
        let character = world.get::<&Character>(attacker).ok()?;
        if character.body == BodyKind::Creature {
            AfflictionKind::Cut
        } else if character.inventory.has_weapon() {
            AfflictionKind::Gunshot
        } else {
            AfflictionKind::Blunt
        }
    };
    let mut character = world.get::<&mut Character>(victim).ok()?;
    let was_down = character.vitals.is_incapacitated();
    let vitals = &mut character.vitals;
    vitals.health = (vitals.health - amount).max(0.0);
    if vitals.health_fraction() < KNOCKOUT_FRACTION {
        vitals.conscious = false;
    }
    Some(Hit {
        attacker,
        victim,
        kind,
        damage: amount,
        incapacitated: !was_down && character.vitals.is_incapacitated(),
    })
}
