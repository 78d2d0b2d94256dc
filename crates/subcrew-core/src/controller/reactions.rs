//! Reacting to being hurt.
//!
//! Hits are not answered one by one. They pile up per attacker in a
//! [`ThreatMemory`] and get turned into combat objectives when the
//! controller flushes them, so a burst of blows becomes a single decision.

use hecs::Entity;
use log::info;
use subcrew_logic::config::ReactionTuning;
use subcrew_logic::threat::{derive_response, AfflictionKind, AttackRecord, ResponseInput};

use crate::components::{Character, Team};
use crate::crew::CrewSnapshot;
use crate::events::{AiEvent, EventLog};
use crate::objectives::{CombatOutcome, ObjectiveManager};

/// Damage taken since the last flush, per attacker.
#[derive(Debug, Clone, Default)]
pub struct ThreatMemory {
    pending: Vec<(Entity, AttackRecord)>,
}

impl ThreatMemory {
    pub fn record(&mut self, attacker: Entity, kind: AfflictionKind, amount: f32, deliberate: bool) {
        match self.pending.iter_mut().find(|(a, _)| *a == attacker) {
            Some((_, record)) => record.merge(kind, amount, deliberate),
            None => {
                let mut record = AttackRecord::default();
                record.merge(kind, amount, deliberate);
                self.pending.push((attacker, record));
            }
        }
    }

    /// Weighted damage `attacker` has done since the last flush.
    pub fn damage_by(&self, attacker: Entity) -> f32 {
        self.pending
            .iter()
            .find(|(a, _)| *a == attacker)
            .map_or(0.0, |(_, r)| r.damage())
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn take(&mut self) -> Vec<(Entity, AttackRecord)> {
        std::mem::take(&mut self.pending)
    }

    pub fn forget(&mut self, entity: Entity) {
        self.pending.retain(|(a, _)| *a != entity);
    }
}

/// Crew-wide consequence of one agent's reaction.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// `attacker` deliberately hurt a friend.
    FriendlyFire {
        attacker: Entity,
        victim: Entity,
        damage: f32,
    },
    /// A hostile attacked a member of `team`.
    Intruder { team: Team, intruder: Entity },
}

/// Everything a reaction reads besides the victim.
pub struct ReactionContext<'a> {
    pub crew: &'a CrewSnapshot,
    pub tuning: &'a ReactionTuning,
    pub events: &'a mut EventLog,
    pub now: f64,
}

/// Decide a stance toward one attacker and queue the matching combat objective.
pub fn respond_to_attack(
    victim: Entity,
    character: &Character,
    objectives: &mut ObjectiveManager,
    attacker: Entity,
    record: &AttackRecord,
    ctx: &mut ReactionContext<'_>,
) -> Option<Alert> {
    let attacker_team = ctx.crew.get(attacker)?.team;
    let friendly = character.team.is_friendly(attacker_team);
    let input = ResponseInput {
        attacker_friendly: friendly,
        damage: record.damage(),
        deliberate: record.deliberate,
        observer_is_security: character.is_security(),
        observer_armed: character.is_armed(),
        observer_health_fraction: character.vitals.health_fraction(),
        already_offensive: objectives.has_offensive_against(attacker),
    };
    let mode = derive_response(&input, ctx.tuning);
    match objectives.add_combat_objective(attacker, mode) {
        CombatOutcome::Added(_) | CombatOutcome::Updated(_) => {
            info!("{} responds to {attacker:?} with {mode:?}", character.name);
            ctx.events.push(
                ctx.now,
                AiEvent::CombatStarted {
                    agent: victim,
                    target: attacker,
                    mode,
                },
            );
        }
        CombatOutcome::Kept(_) | CombatOutcome::Ignored => {}
    }

    if !friendly {
        return Some(Alert::Intruder {
            team: character.team,
            intruder: attacker,
        });
    }
    (record.deliberate && input.damage >= ctx.tuning.friendly_ignore_damage).then_some(Alert::FriendlyFire {
        attacker,
        victim,
        damage: input.damage,
    })
}

/// Turn everything remembered into responses and clear the memory.
pub fn flush_reactions(
    victim: Entity,
    character: &Character,
    objectives: &mut ObjectiveManager,
    memory: &mut ThreatMemory,
    ctx: &mut ReactionContext<'_>,
) -> Vec<Alert> {
    memory
        .take()
        .into_iter()
        .filter_map(|(attacker, record)| respond_to_attack(victim, character, objectives, attacker, &record, ctx))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hecs::World;
    use subcrew_logic::access::Department;
    use subcrew_logic::threat::CombatMode;

    use crate::components::{Item, ItemKind};

    #[test]
    fn test_hits_merge_per_attacker() {
        let mut world = World::new();
        let a = world.spawn((0u8,));
        let b = world.spawn((0u8,));
        let mut memory = ThreatMemory::default();
        memory.record(a, AfflictionKind::Cut, 5.0, true);
        memory.record(a, AfflictionKind::Cut, 5.0, false);
        memory.record(b, AfflictionKind::Stun, 10.0, false);
        assert_eq!(memory.len(), 2);
        assert_eq!(memory.damage_by(a), 10.0);
        assert!((memory.damage_by(b) - 1.0).abs() < 1e-5);
        assert_eq!(memory.take().len(), 2);
        assert!(memory.is_empty());
    }

    #[test]
    fn test_armed_crew_fights_intruder() {
        let mut world = World::new();
        let mut guard = Character::crew("Guard", Department::Security, 1);
        guard.inventory.add(Item::new(1, ItemKind::Weapon)).unwrap();
        let victim = world.spawn((guard.clone(),));
        let raider = world.spawn((Character::raider("Raider"),));
        let crew = CrewSnapshot::capture(&world);

        let mut objectives = ObjectiveManager::new();
        let mut memory = ThreatMemory::default();
        memory.record(raider, AfflictionKind::Gunshot, 15.0, true);
        let mut events = EventLog::new();
        let tuning = ReactionTuning::default();
        let mut ctx = ReactionContext {
            crew: &crew,
            tuning: &tuning,
            events: &mut events,
            now: 1.0,
        };
        let alerts = flush_reactions(victim, &guard, &mut objectives, &mut memory, &mut ctx);

        assert_eq!(
            alerts,
            vec![Alert::Intruder {
                team: Team::Crew,
                intruder: raider
            }]
        );
        assert_eq!(objectives.combat_mode(raider), Some(CombatMode::Offensive));
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_accidental_friendly_hit_is_ignored() {
        let mut world = World::new();
        let mate = Character::crew("Mate", Department::Operations, 1);
        let victim = world.spawn((mate.clone(),));
        let clumsy = world.spawn((Character::crew("Clumsy", Department::Engineering, 1),));
        let crew = CrewSnapshot::capture(&world);

        let mut objectives = ObjectiveManager::new();
        let mut record = AttackRecord::default();
        record.merge(AfflictionKind::Blunt, 30.0, false);
        let mut events = EventLog::new();
        let tuning = ReactionTuning::default();
        let mut ctx = ReactionContext {
            crew: &crew,
            tuning: &tuning,
            events: &mut events,
            now: 0.0,
        };
        let alert = respond_to_attack(victim, &mate, &mut objectives, clumsy, &record, &mut ctx);
        assert_eq!(alert, None);
        assert!(objectives.is_empty());
        assert!(events.is_empty());
    }

    #[test]
    fn test_deliberate_friendly_fire_raises_alert() {
        let mut world = World::new();
        let mate = Character::crew("Mate", Department::Operations, 1);
        let victim = world.spawn((mate.clone(),));
        let brute = world.spawn((Character::crew("Brute", Department::Engineering, 1),));
        let crew = CrewSnapshot::capture(&world);

        let mut objectives = ObjectiveManager::new();
        let mut record = AttackRecord::default();
        record.merge(AfflictionKind::Blunt, 25.0, true);
        let mut events = EventLog::new();
        let tuning = ReactionTuning::default();
        let mut ctx = ReactionContext {
            crew: &crew,
            tuning: &tuning,
            events: &mut events,
            now: 0.0,
        };
        let alert = respond_to_attack(victim, &mate, &mut objectives, brute, &record, &mut ctx);
        assert_eq!(
            alert,
            Some(Alert::FriendlyFire {
                attacker: brute,
                victim,
                damage: 25.0
            })
        );
        assert_eq!(objectives.combat_mode(brute), Some(CombatMode::Retreat));
    }
}
