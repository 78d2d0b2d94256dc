//! Simulation engine - main entry point for running the crew AI

use hecs::{Entity, World};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use subcrew_logic::access::Department;
use subcrew_logic::config::{AiTuning, ConfigError};
use subcrew_logic::geometry::Vec2;
use subcrew_logic::pathfinding::PathFinder;
use subcrew_logic::threat::{bystander_response, AfflictionKind, CombatMode};

use crate::components::*;
use crate::controller::*;
use crate::crew::CrewSnapshot;
use crate::error::AiError;
use crate::events::{AiEvent, EventLog, HostileAct, Order, OrderKind, TimedEvent};
use crate::hazard_cache::{propagate_hull_safety, HazardCache, SafetyContext};
use crate::objectives::{CombatOutcome, LoopTask, ObjectiveKind, ObjectiveManager, SharedTargets, TargetRef};
use crate::scheduler::{ScheduledAction, Scheduler};
use crate::steering::Steering;
use crate::systems::*;
use crate::violations::{Escalation, ViolationLedger};

/// Main simulation engine
pub struct SimulationEngine {
    /// ECS world holding every character
    pub world: World,
    /// The submarine the crew lives in
    pub sub: Submarine,
    pathfinder: Box<dyn PathFinder>,
    tuning: AiTuning,
    effects: ActionEffects,
    rng: StdRng,
    events: EventLog,
    targets: SharedTargets,
    scheduler: Scheduler,
    violations: ViolationLedger,
    /// Simulation time in seconds since start
    time: f64,
}

impl SimulationEngine {
    /// Create an engine for `sub`, routing over its waypoints.
    pub fn new(sub: Submarine, tuning: AiTuning) -> Result<Self, ConfigError> {
        tuning.validate()?;
        let pathfinder = Box::new(sub.waypoint_graph());
        Ok(Self {
            world: World::new(),
            sub,
            pathfinder,
            rng: StdRng::seed_from_u64(tuning.seed),
            tuning,
            effects: ActionEffects::default(),
            events: EventLog::new(),
            targets: SharedTargets::new(),
            scheduler: Scheduler::new(),
            violations: ViolationLedger::new(),
            time: 0.0,
        })
    }

    /// Route with something other than the submarine's waypoint graph.
    pub fn with_pathfinder(mut self, pathfinder: Box<dyn PathFinder>) -> Self {
        self.pathfinder = pathfinder;
        self
    }

    /// Rebuild the waypoint graph after the submarine's waypoints changed.
    pub fn rebuild_waypoints(&mut self) {
        self.pathfinder = Box::new(self.sub.waypoint_graph());
    }

    pub fn set_action_effects(&mut self, effects: ActionEffects) {
        self.effects = effects;
    }

    // --- agents ---

    /// Add a character to the world. Their hull is worked out from where they stand.
    pub fn spawn_character(&mut self, mut character: Character) -> Entity {
        if character.hull.is_none() {
            character.hull = self.sub.hull_at_feet(character.position);
        }
        let hull = character.hull;
        if let Some(h) = hull.and_then(|h| self.sub.hull(h).ok()) {
            character.in_water = h.water_depth_at(character.position.y) > self.tuning.steering.submerged_depth;
        } else {
            character.in_water = true;
        }
        self.world.spawn((character,))
    }

    /// Hand a character over to the AI with its standing duties queued.
    pub fn attach_ai(&mut self, entity: Entity) -> Result<(), AiError> {
        if self.world.get::<&AiController>(entity).is_ok() {
            return Err(AiError::AlreadyAttached(entity));
        }
        let objectives = {
            let character = self
                .world
                .get::<&Character>(entity)
                .map_err(|_| AiError::NotACharacter(entity))?;
            info!("AI attached to {}", character.name);
            standing_objectives(&character)
        };
        let components = (
            AiController::default(),
            objectives,
            HazardCache::new(self.tuning.hazard.validity_seconds),
            Steering::default(),
        );
        self.world
            .insert(entity, components)
            .map_err(|_| AiError::NotACharacter(entity))
    }

    /// Take the AI off a character, e.g. when a player takes control.
    pub fn detach_ai(&mut self, entity: Entity) -> Result<(), AiError> {
        self.world
            .remove::<(AiController, ObjectiveManager, HazardCache, Steering)>(entity)
            .map_err(|_| AiError::NoAi(entity))?;
        if let Ok(mut character) = self.world.get::<&mut Character>(entity) {
            character.desired_velocity = Vec2::ZERO;
            info!("AI detached from {}", character.name);
        }
        self.scheduler.forget(entity);
        Ok(())
    }

    /// Remove a character from the simulation altogether.
    pub fn remove_character(&mut self, entity: Entity) -> Result<(), AiError> {
        self.world
            .despawn(entity)
            .map_err(|_| AiError::NotACharacter(entity))?;
        self.scheduler.forget(entity);
        self.targets.forget_character(entity);
        self.violations.forget(entity);
        for (_, (objectives, controller)) in self
            .world
            .query_mut::<(&mut ObjectiveManager, &mut AiController)>()
        {
            objectives.forget_target(entity);
            controller.threats.forget(entity);
        }
        Ok(())
    }

    /// Entities currently driven by the AI.
    pub fn agents(&self) -> Vec<Entity> {
        self.world
            .query::<&AiController>()
            .iter()
            .map(|(entity, _)| entity)
            .collect()
    }

    // --- inputs ---

    /// Set an agent's current directive. A new order replaces the previous one.
    pub fn give_order(&mut self, agent: Entity, order: Order) -> Result<(), AiError> {
        let (objectives, controller) = self
            .world
            .query_one_mut::<(&mut ObjectiveManager, &mut AiController)>(agent)
            .map_err(|_| AiError::NoAi(agent))?;
        let priority = self.tuning.objectives.order_priority;
        let kind = match order.kind {
            OrderKind::Dismiss => {
                objectives.dismiss_orders();
                return Ok(());
            }
            OrderKind::ExtinguishFires => ObjectiveKind::task_loop(LoopTask::ExtinguishFires),
            OrderKind::FixLeaks => ObjectiveKind::task_loop(LoopTask::FixLeaks),
            OrderKind::RescueCrew => ObjectiveKind::task_loop(LoopTask::RescueCrew),
            OrderKind::RepairDevices => ObjectiveKind::task_loop(LoopTask::RepairDevices),
            OrderKind::FightIntruders => ObjectiveKind::task_loop(LoopTask::FightIntruders),
            OrderKind::Operate(device) => {
                self.sub.device(device)?;
                ObjectiveKind::operate(device)
            }
            OrderKind::GoTo(position) => ObjectiveKind::go_to(position, self.tuning.objectives.arrival_distance),
        };
        debug!("order {} given to {agent:?} by {:?}", order.kind.name(), order.issuer);
        objectives.add_order(kind, priority);
        controller.speech.speak(
            &mut self.events,
            self.time,
            agent,
            &format!("order.{}", order.kind.name()),
            "Aye.",
            self.tuning.reactions.speech_repeat_interval,
        );
        Ok(())
    }

    /// Tell `victim` they were hurt. Reactions are batched; they only fire
    /// right away when the victim can no longer run their own tick.
    pub fn on_attacked(
        &mut self,
        victim: Entity,
        attacker: Entity,
        kind: AfflictionKind,
        amount: f32,
        deliberate: bool,
    ) -> Result<(), AiError> {
        let incapacitated = {
            let (character, controller) = self
                .world
                .query_one_mut::<(&Character, &mut AiController)>(victim)
                .map_err(|_| AiError::NoAi(victim))?;
            controller.threats.record(attacker, kind, amount, deliberate);
            character.vitals.is_incapacitated()
        };
        if incapacitated {
            let crew = CrewSnapshot::capture(&self.world);
            let alerts = self.flush_now(victim, &crew);
            self.raise_alerts(alerts, &crew);
        }
        Ok(())
    }

    pub fn report_theft(&mut self, violator: Entity, value: f32) {
        self.report_violation(violator, HostileAct::Theft, value);
    }

    pub fn report_sabotage(&mut self, violator: Entity, damage: f32) {
        self.report_violation(violator, HostileAct::Sabotage, damage);
    }

    fn report_violation(&mut self, violator: Entity, act: HostileAct, magnitude: f32) {
        self.events.push(
            self.time,
            AiEvent::Reputation {
                violator,
                act,
                magnitude,
            },
        );
        let escalations = self
            .violations
            .record(violator, act, magnitude, &self.tuning.reactions);
        if escalations.is_empty() {
            return;
        }
        let crew = CrewSnapshot::capture(&self.world);
        for escalation in escalations {
            match escalation {
                Escalation::Warning => self.warn_violator(violator, act, &crew),
                Escalation::Intervention => self.send_security(violator, &crew),
            }
        }
    }

    /// Someone who saw it tells the violator off, security first.
    fn warn_violator(&mut self, violator: Entity, act: HostileAct, crew: &CrewSnapshot) {
        let Some(team) = crew.get(violator).map(|m| m.team) else {
            return;
        };
        let witness = crew
            .members()
            .iter()
            .filter(|m| m.has_ai && m.active && m.entity != violator && m.team.is_friendly(team))
            .filter(|m| crew.can_perceive(&self.sub, m.entity, violator))
            .max_by_key(|m| m.security)
            .map(|m| m.entity);
        let Some(witness) = witness else { return };
        let line = match act {
            HostileAct::Theft => "Put that back!",
            _ => "Stop that!",
        };
        if let Ok(mut controller) = self.world.get::<&mut AiController>(witness) {
            controller.speech.speak(
                &mut self.events,
                self.time,
                witness,
                &format!("warn.{violator:?}"),
                line,
                self.tuning.reactions.speech_repeat_interval,
            );
        }
    }

    /// Every free security agent on the violator's side goes to arrest them.
    fn send_security(&mut self, violator: Entity, crew: &CrewSnapshot) {
        let Some(team) = crew.get(violator).map(|m| m.team) else {
            return;
        };
        let guards: Vec<Entity> = crew
            .members()
            .iter()
            .filter(|m| m.has_ai && m.active && m.security && m.entity != violator && m.team.is_friendly(team))
            .map(|m| m.entity)
            .collect();
        info!("{} security agents sent after {violator:?}", guards.len());
        for guard in guards {
            self.start_combat(guard, violator, CombatMode::Arrest);
        }
    }

    fn start_combat(&mut self, agent: Entity, target: Entity, mode: CombatMode) {
        let Ok(objectives) = self.world.query_one_mut::<&mut ObjectiveManager>(agent) else {
            return;
        };
        if let CombatOutcome::Added(_) | CombatOutcome::Updated(_) = objectives.add_combat_objective(target, mode) {
            self.events
                .push(self.time, AiEvent::CombatStarted { agent, target, mode });
        }
    }

    // --- update ---

    /// Advance the simulation by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        self.time += dt as f64;

        // Delayed reactions
        for action in self.scheduler.advance(dt) {
            self.run_scheduled(action);
        }

        self.targets
            .tick(dt, self.tuning.objectives.shared_target_lifetime);
        self.violations.decay(dt, &self.tuning.reactions);

        // Agents
        let crew = CrewSnapshot::capture(&self.world);
        let mark = self.events.len();
        let mut alerts = Vec::new();
        for entity in self.agents() {
            let result = {
                let mut env = TickEnv {
                    sub: &mut self.sub,
                    pathfinder: self.pathfinder.as_ref(),
                    crew: &crew,
                    targets: &mut self.targets,
                    tuning: &self.tuning,
                    rng: &mut self.rng,
                    events: &mut self.events,
                    now: self.time,
                    dt,
                };
                update_agent(&mut self.world, entity, &mut env)
            };
            match result {
                Ok(outcome) => {
                    if let Some((team, hull)) = outcome.propagate {
                        let ctx = SafetyContext {
                            sub: &self.sub,
                            crew: &crew,
                            tuning: &self.tuning.hazard,
                        };
                        propagate_hull_safety(&mut self.world, &ctx, team, hull);
                    }
                    alerts.extend(outcome.alerts);
                }
                Err(err) => warn!("agent {entity:?} skipped: {err}"),
            }
        }
        self.raise_alerts(alerts, &crew);

        // World
        let actions: Vec<TimedEvent> = self.events.since(mark).to_vec();
        let hits = apply_actions(&mut self.world, &mut self.sub, &actions, &self.effects);
        for hit in hits {
            if let Err(err) = self.on_attacked(hit.victim, hit.attacker, hit.kind, hit.damage, true) {
                debug!("hit on {:?} not tracked: {err}", hit.victim);
            }
        }
        kinematics_system(&mut self.world, &self.sub, &self.tuning.steering, dt);
        self.sub.update_doors(dt);
    }

    fn run_scheduled(&mut self, action: ScheduledAction) {
        match action {
            ScheduledAction::Combat { agent, target, mode } => self.start_combat(agent, target, mode),
            ScheduledAction::Speak {
                agent,
                identifier,
                line,
            } => {
                if let Ok(mut controller) = self.world.get::<&mut AiController>(agent) {
                    controller.speech.speak(
                        &mut self.events,
                        self.time,
                        agent,
                        &identifier,
                        &line,
                        self.tuning.reactions.speech_repeat_interval,
                    );
                }
            }
        }
    }

    /// Flush a victim's reactions outside their own tick.
    fn flush_now(&mut self, victim: Entity, crew: &CrewSnapshot) -> Vec<Alert> {
        let Ok((character, controller, objectives)) = self
            .world
            .query_one_mut::<(&Character, &mut AiController, &mut ObjectiveManager)>(victim)
        else {
            return Vec::new();
        };
        let mut ctx = ReactionContext {
            crew,
            tuning: &self.tuning.reactions,
            events: &mut self.events,
            now: self.time,
        };
        flush_reactions(victim, character, objectives, &mut controller.threats, &mut ctx)
    }

    fn raise_alerts(&mut self, alerts: Vec<Alert>, crew: &CrewSnapshot) {
        for alert in alerts {
            match alert {
                Alert::Intruder { team, intruder } => {
                    self.targets
                        .report(team, LoopTask::FightIntruders, TargetRef::Character(intruder));
                }
                Alert::FriendlyFire {
                    attacker,
                    victim,
                    damage,
                } => self.friendly_fire(attacker, victim, damage, crew),
            }
        }
    }

    /// Security reacts at once; bystanders who saw it react after a moment.
    fn friendly_fire(&mut self, attacker: Entity, victim: Entity, damage: f32, crew: &CrewSnapshot) {
        let Some(team) = crew.get(victim).map(|m| m.team) else {
            return;
        };
        info!("{attacker:?} attacked {victim:?} ({damage:.1})");
        let witnesses: Vec<(Entity, bool)> = crew
            .members()
            .iter()
            .filter(|m| m.has_ai && m.active && m.team.is_friendly(team))
            .filter(|m| m.entity != attacker && m.entity != victim)
            .map(|m| (m.entity, m.security))
            .collect();
        let tuning = self.tuning.reactions.clone();
        for (witness, security) in witnesses {
            let mode = bystander_response(damage, security, &tuning);
            if security {
                self.start_combat(witness, attacker, mode);
                continue;
            }
            let saw = crew.can_perceive(&self.sub, witness, victim) || crew.can_perceive(&self.sub, witness, attacker);
            if !saw || mode == CombatMode::Ignore {
                continue;
            }
            let delay = self
                .rng
                .gen_range(tuning.bystander_delay_min..=tuning.bystander_delay_max);
            self.scheduler.schedule(
                delay,
                ScheduledAction::Combat {
                    agent: witness,
                    target: attacker,
                    mode,
                },
            );
        }
    }

    // --- output ---

    /// Take every event recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<TimedEvent> {
        self.events.drain()
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn tuning(&self) -> &AiTuning {
        &self.tuning
    }

    pub fn targets(&self) -> &SharedTargets {
        &self.targets
    }

    pub fn violations(&self) -> &ViolationLedger {
        &self.violations
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }
}

/// Idle and self-preservation for everyone, plus the duties of their post.
fn standing_objectives(character: &Character) -> ObjectiveManager {
    let mut objectives = ObjectiveManager::new();
    objectives.add_objective(ObjectiveKind::idle());
    if character.body == BodyKind::Creature {
        objectives.add_objective(ObjectiveKind::task_loop(LoopTask::FightIntruders));
        return objectives;
    }
    objectives.add_objective(ObjectiveKind::find_safety());
    if !character.clearance.is_crew {
        objectives.add_objective(ObjectiveKind::task_loop(LoopTask::FightIntruders));
        return objectives;
    }
    let duties: &[LoopTask] = match character.clearance.department {
        Some(Department::Engineering) => &[LoopTask::RepairDevices, LoopTask::FixLeaks, LoopTask::ExtinguishFires],
        Some(Department::Medical) => &[LoopTask::RescueCrew],
        Some(Department::Security) => &[LoopTask::FightIntruders, LoopTask::ExtinguishFires],
        Some(Department::Operations) => &[LoopTask::ExtinguishFires, LoopTask::FixLeaks],
        Some(Department::Command) | None => &[LoopTask::ExtinguishFires],
    };
    for &task in duties {
        objectives.add_objective(ObjectiveKind::task_loop(task));
    }
    objectives
}
