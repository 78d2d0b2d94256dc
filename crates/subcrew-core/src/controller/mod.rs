//! The per-agent tick.
//!
//! Every AI-driven character runs the same fixed sequence each frame:
//!
//! 1. flush queued attack reactions (throttled)
//! 2. refresh the safety score of the hull they stand in
//! 3. report problems they can see and re-sort objectives (throttled)
//! 4. act on the current objective, which writes a movement intent
//! 5. steer towards the intent and pick a speed
//! 6. equipment logistics (throttled)
//!
//! Anything that affects other agents (hazard propagation, alerts) is
//! returned in [`TickOutcome`] for the engine to apply once the agent's own
//! components are released.

mod logistics;
mod reactions;

pub use logistics::*;
pub use reactions::*;

use hecs::{Entity, World};
use log::{debug, warn};
use rand::rngs::StdRng;
use subcrew_logic::config::{AiTuning, SteeringTuning};
use subcrew_logic::geometry::Vec2;
use subcrew_logic::pathfinding::PathFinder;
use subcrew_logic::progress::TraversalMode;

use crate::components::{BodyKind, Character, HullId, Submarine, Team};
use crate::crew::CrewSnapshot;
use crate::error::AiError;
use crate::events::{AiEvent, EventLog, OrderKind, SpeechMemory};
use crate::hazard_cache::{get_hull_safety, HazardCache, SafetyContext};
use crate::objectives::{LoopTask, ObjectiveContext, ObjectiveManager, ObjectiveState, SharedTargets, TargetRef};
use crate::steering::{MovementIntent, Steering, SteeringContext};

/// Component: controller state of an AI-driven character.
#[derive(Debug, Clone, Default)]
pub struct AiController {
    pub intent: MovementIntent,
    pub threats: ThreatMemory,
    pub speech: SpeechMemory,
    reaction_timer: f32,
    logistics_timer: f32,
    /// The agent's own hull scored unsafe at the last refresh.
    hull_unsafe: bool,
}

/// Shared state one agent's tick reads and writes.
pub struct TickEnv<'a> {
    pub sub: &'a mut Submarine,
    pub pathfinder: &'a dyn PathFinder,
    pub crew: &'a CrewSnapshot,
    pub targets: &'a mut SharedTargets,
    pub tuning: &'a AiTuning,
    pub rng: &'a mut StdRng,
    pub events: &'a mut EventLog,
    pub now: f64,
    pub dt: f32,
}

/// Effects of one agent's tick on everybody else.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutcome {
    /// The agent's hull just turned unsafe; friends who can see it should know.
    pub propagate: Option<(Team, HullId)>,
    pub alerts: Vec<Alert>,
}

/// Run one tick for `entity`. Characters without AI components are an error;
/// incapacitated ones just stop moving.
pub fn update_agent(world: &mut World, entity: Entity, env: &mut TickEnv<'_>) -> Result<TickOutcome, AiError> {
    let (character, controller, objectives, hazards, steering) = world
        .query_one_mut::<(
            &mut Character,
            &mut AiController,
            &mut ObjectiveManager,
            &mut HazardCache,
            &mut Steering,
        )>(entity)
        .map_err(|_| AiError::NoAi(entity))?;

    let mut outcome = TickOutcome::default();
    let tuning = env.tuning;
    let dt = env.dt;

    if !character.is_active() {
        character.desired_velocity = Vec2::ZERO;
        steering.reset();
        return Ok(outcome);
    }

    // Reactions
    controller.reaction_timer -= dt;
    if controller.reaction_timer <= 0.0 {
        controller.reaction_timer = tuning.reactions.flush_interval;
        if !controller.threats.is_empty() {
            let mut ctx = ReactionContext {
                crew: env.crew,
                tuning: &tuning.reactions,
                events: &mut *env.events,
                now: env.now,
            };
            outcome.alerts = flush_reactions(entity, character, objectives, &mut controller.threats, &mut ctx);
        }
    }

    // Hazards
    hazards.tick(dt);
    if let Some(hull) = character.hull.filter(|&h| hazards.is_stale(h)) {
        let ctx = SafetyContext {
            sub: &*env.sub,
            crew: env.crew,
            tuning: &tuning.hazard,
        };
        match get_hull_safety(hazards, &ctx, character, objectives.suppression(), hull) {
            Ok(safety) => {
                let unsafe_now = safety < tuning.hazard.safety_threshold;
                if unsafe_now && !controller.hull_unsafe {
                    outcome.propagate = Some((character.team, hull));
                }
                controller.hull_unsafe = unsafe_now;
            }
            Err(err) => warn!("{}: {err}", character.name),
        }
    }

    // Objectives
    controller.intent.clear();
    let sort_due = objectives.tick_sort_timer(dt, tuning.objectives.sort_interval);
    if sort_due {
        report_problems(entity, character, &mut controller.speech, env, &mut outcome.alerts);
    }
    {
        let mut ctx = ObjectiveContext {
            entity,
            character: &mut *character,
            sub: &mut *env.sub,
            crew: env.crew,
            hazards: &mut *hazards,
            targets: &*env.targets,
            tuning,
            rng: &mut *env.rng,
            events: &mut *env.events,
            navigation: steering.status(),
            intent: &mut controller.intent,
            suppression: objectives.suppression(),
            dt,
            now: env.now,
        };
        if sort_due {
            objectives.update_priorities(&mut ctx);
            objectives.sort();
            ctx.suppression = objectives.suppression();
        }
        if let Err(err) = objectives.run_current(&mut ctx) {
            warn!("{}: objective update skipped: {err}", ctx.character.name);
        }
    }
    for event in objectives.drain_events() {
        if !event.from_order {
            continue;
        }
        let (identifier, line) = match event.state {
            ObjectiveState::Completed => ("order.completed", "Done."),
            _ => ("order.abandoned", "Can't do that."),
        };
        controller.speech.speak(
            env.events,
            env.now,
            entity,
            identifier,
            line,
            tuning.reactions.speech_repeat_interval,
        );
    }

    // Steering
    steering.select(character.hull.is_some());
    let direction = {
        let mut ctx = SteeringContext {
            entity,
            character: &mut *character,
            sub: &mut *env.sub,
            pathfinder: env.pathfinder,
            tuning: &tuning.steering,
            rng: &mut *env.rng,
            events: &mut *env.events,
            dt,
            now: env.now,
        };
        steering.steer(&mut ctx, &controller.intent)
    };
    let speed = movement_speed(character, &controller.intent, &tuning.steering);
    character.desired_velocity = direction * speed;
    if direction.x.abs() > 0.1 {
        character.facing = direction.x.signum();
    }

    // Logistics
    controller.logistics_timer -= dt;
    if controller.logistics_timer <= 0.0 {
        controller.logistics_timer = tuning.logistics.interval;
        let safety = character.hull.and_then(|h| hazards.peek(h));
        update_equipment(character, objectives, steering.indoor.path(), safety, env.sub, tuning);
    }

    Ok(outcome)
}

/// Walk, run, climb or swim.
pub fn movement_speed(character: &Character, intent: &MovementIntent, tuning: &SteeringTuning) -> f32 {
    match character.traversal_mode() {
        TraversalMode::Climbing => tuning.climb_speed,
        TraversalMode::Swimming => tuning.swim_speed,
        TraversalMode::Walking => {
            let far = intent
                .target
                .is_some_and(|t| t.distance(&character.position) > tuning.run_min_distance);
            if intent.run && far {
                tuning.run_speed
            } else {
                tuning.walk_speed
            }
        }
    }
}

/// Post what the agent can see to the team's problem board, calling out
/// anything new.
fn report_problems(
    entity: Entity,
    character: &Character,
    speech: &mut SpeechMemory,
    env: &mut TickEnv<'_>,
    alerts: &mut Vec<Alert>,
) {
    let Some(own) = character.hull else { return };
    let team = character.team;
    let humanoid = character.body == BodyKind::Humanoid;
    let visible = env.sub.visible_hulls(own);
    let rescue_fraction = env.tuning.objectives.rescue_health_fraction;
    let mut found: Vec<(LoopTask, TargetRef)> = Vec::new();

    if humanoid {
        for &hull_id in &visible {
            let Ok(hull) = env.sub.hull(hull_id) else { continue };
            if hull.has_fire() {
                found.push((LoopTask::ExtinguishFires, TargetRef::Fire(hull_id)));
            }
            for (index, _) in hull.open_breaches() {
                found.push((
                    LoopTask::FixLeaks,
                    TargetRef::Breach {
                        hull: hull_id,
                        index,
                    },
                ));
            }
        }
        for device in env.sub.devices() {
            if visible.contains(&device.hull) && device.needs_repair() {
                found.push((LoopTask::RepairDevices, TargetRef::Device(device.id)));
            }
        }
    }
    for member in env.crew.members() {
        if member.entity == entity || !env.crew.can_perceive(env.sub, entity, member.entity) {
            continue;
        }
        if !team.is_friendly(member.team) {
            if member.active {
                found.push((LoopTask::FightIntruders, TargetRef::Character(member.entity)));
            }
        } else if humanoid
            && member.health_fraction > 0.0
            && (member.incapacitated || member.health_fraction < rescue_fraction)
        {
            found.push((LoopTask::RescueCrew, TargetRef::Character(member.entity)));
        }
    }

    let interval = env.tuning.reactions.speech_repeat_interval;
    for (task, target) in found {
        if !env.targets.report(team, task, target) {
            continue;
        }
        debug!("{} reports {target:?} for {}", character.name, task.name());
        let (identifier, line) = match target {
            TargetRef::Fire(hull) => (format!("fire.{hull}"), "Fire!".to_string()),
            TargetRef::Breach { hull, index } => (format!("leak.{hull}.{index}"), "We've got a leak!".to_string()),
            TargetRef::Device(device) => (format!("repair.{device}"), "Something's broken here.".to_string()),
            TargetRef::Character(other) if task == LoopTask::FightIntruders => {
                alerts.push(Alert::Intruder {
                    team,
                    intruder: other,
                });
                (format!("intruder.{other:?}"), "Intruder!".to_string())
            }
            TargetRef::Character(other) => (format!("medic.{other:?}"), "Man down!".to_string()),
        };
        if !humanoid {
            continue;
        }
        if speech.speak(env.events, env.now, entity, &identifier, &line, interval)
            && task == LoopTask::FightIntruders
        {
            env.events.push(
                env.now,
                AiEvent::BroadcastOrder {
                    issuer: entity,
                    order: OrderKind::FightIntruders,
                    key: identifier,
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use subcrew_logic::access::Department;
    use subcrew_logic::geometry::Rect;
    use subcrew_logic::hazard::FireSource;

    use crate::objectives::ObjectiveKind;

    struct Fixture {
        world: World,
        sub: Submarine,
        crew: CrewSnapshot,
        targets: SharedTargets,
        tuning: AiTuning,
        rng: StdRng,
        events: EventLog,
    }

    impl Fixture {
        fn new(sub: Submarine) -> Self {
            Self {
                world: World::new(),
                sub,
                crew: CrewSnapshot::default(),
                targets: SharedTargets::new(),
                tuning: AiTuning::default(),
                rng: StdRng::seed_from_u64(7),
                events: EventLog::new(),
            }
        }

        fn spawn_agent(&mut self, character: Character) -> Entity {
            let mut objectives = ObjectiveManager::new();
            objectives.add_objective(ObjectiveKind::idle());
            self.world.spawn((
                character,
                AiController::default(),
                objectives,
                HazardCache::new(self.tuning.hazard.validity_seconds),
                Steering::default(),
            ))
        }

        fn tick(&mut self, entity: Entity) -> Result<TickOutcome, AiError> {
            self.crew = CrewSnapshot::capture(&self.world);
            let graph = self.sub.waypoint_graph();
            let mut env = TickEnv {
                sub: &mut self.sub,
                pathfinder: &graph,
                crew: &self.crew,
                targets: &mut self.targets,
                tuning: &self.tuning,
                rng: &mut self.rng,
                events: &mut self.events,
                now: 0.0,
                dt: 0.1,
            };
            update_agent(&mut self.world, entity, &mut env)
        }
    }

    fn one_room() -> (Submarine, HullId) {
        let mut sub = Submarine::new();
        let hull = sub.add_hull("Mess", Rect::new(0.0, 0.0, 10.0, 3.0));
        (sub, hull)
    }

    #[test]
    fn test_character_without_ai_is_an_error() {
        let (sub, _) = one_room();
        let mut fx = Fixture::new(sub);
        let plain = fx.world.spawn((Character::crew("Mate", Department::Operations, 1),));
        assert_eq!(fx.tick(plain), Err(AiError::NoAi(plain)));
    }

    #[test]
    fn test_fire_is_reported_and_propagated() {
        let (mut sub, hull) = one_room();
        sub.add_fire(
            hull,
            FireSource {
                position: Vec2::new(8.0, 0.0),
                size: 3.0,
            },
        )
        .unwrap();
        let mut fx = Fixture::new(sub);
        let mut mate = Character::crew("Mate", Department::Operations, 1).at(Vec2::new(2.0, 0.0));
        mate.hull = Some(hull);
        let agent = fx.spawn_agent(mate);

        let outcome = fx.tick(agent).unwrap();
        assert_eq!(fx.targets.targets(Team::Crew, LoopTask::ExtinguishFires), &[TargetRef::Fire(hull)]);
        assert!(fx
            .events
            .events()
            .iter()
            .any(|e| matches!(&e.event, AiEvent::Speak { identifier, .. } if identifier == "fire.0")));
        assert_eq!(outcome.propagate, Some((Team::Crew, hull)));

        let outcome = fx.tick(agent).unwrap();
        assert_eq!(outcome.propagate, None);
    }

    #[test]
    fn test_incapacitated_agent_stops() {
        let (sub, hull) = one_room();
        let mut fx = Fixture::new(sub);
        let mut mate = Character::crew("Mate", Department::Operations, 1);
        mate.hull = Some(hull);
        mate.desired_velocity = Vec2::new(1.0, 0.0);
        mate.vitals.conscious = false;
        let agent = fx.spawn_agent(mate);
        fx.tick(agent).unwrap();
        let character = fx.world.get::<&Character>(agent).unwrap();
        assert_eq!(character.desired_velocity, Vec2::ZERO);
    }

    #[test]
    fn test_run_only_over_distance() {
        let tuning = SteeringTuning::default();
        let mate = Character::crew("Mate", Department::Operations, 1);
        let mut intent = MovementIntent::default();
        intent.go_to(Vec2::new(10.0, 0.0), None, true);
        assert_eq!(movement_speed(&mate, &intent, &tuning), tuning.swim_speed);

        let mut inside = mate.clone();
        inside.hull = Some(0);
        assert_eq!(movement_speed(&inside, &intent, &tuning), tuning.run_speed);
        intent.go_to(Vec2::new(1.0, 0.0), None, true);
        assert_eq!(movement_speed(&inside, &intent, &tuning), tuning.walk_speed);
    }
}
