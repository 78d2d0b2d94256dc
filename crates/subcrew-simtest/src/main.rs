//! SubCrew Headless Scenario Harness
//!
//! Builds small synthetic submarines and runs crew AI scenarios in-process.
//! No rendering, no physics engine, no networking.
//!
//! Usage:
//!   cargo run -p subcrew-simtest
//!   cargo run -p subcrew-simtest -- --verbose

use hecs::Entity;
use subcrew_core::hazard_cache::HazardCache;
use subcrew_core::objectives::{ObjectiveKind, ObjectiveManager};
use subcrew_core::prelude::*;
use subcrew_logic::access::Department;
use subcrew_logic::config::{AiTuning, HazardTuning, SteeringTuning};
use subcrew_logic::doors::Passage;
use subcrew_logic::geometry::{Rect, Vec2};
use subcrew_logic::hazard::{hull_safety, FireSource, HullConditions, SafetyInput};
use subcrew_logic::path::SteeringPath;
use subcrew_logic::pathfinding::{PathFinder, PathRequest, WaypointGraph};
use subcrew_logic::reroute::{evaluate, RerouteContext};
use subcrew_logic::threat::ThresholdAccumulator;

const STEP: f32 = 0.05;

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== SubCrew Scenario Harness ===\n");

    let mut results = Vec::new();

    // 1. Tuning data
    results.extend(validate_tuning(verbose));

    // 2. Hazard scoring sweep
    results.extend(validate_hazard_scoring(verbose));

    // 3. Scenario A: a hostile walks in
    results.extend(scenario_hostile_room(verbose));

    // 4. Scenario B: a dead door in the way
    results.extend(scenario_dead_door(verbose));

    // 5. Scenario C: objective ordering
    results.extend(scenario_objective_order(verbose));

    // 6. Hazard propagation between friends
    results.extend(validate_propagation(verbose));

    // 7. Re-route policy sweep
    results.extend(validate_reroute(verbose));

    // 8. Path search on synthetic graphs
    results.extend(validate_pathfinding(verbose));

    // 9. Misconduct thresholds
    results.extend(validate_misconduct(verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── Fixtures ────────────────────────────────────────────────────────────

/// Galley and bridge side by side, one door between them, three waypoints.
fn two_rooms(door_powered: bool, door_open: bool) -> Submarine {
    let mut sub = Submarine::new();
    let galley = sub.add_hull("Galley", Rect::new(0.0, 0.0, 10.0, 3.0));
    let bridge = sub.add_hull("Bridge", Rect::new(10.0, 0.0, 10.0, 3.0));
    let door = sub.add_door(Vec2::new(10.0, 0.0), Passage::Horizontal, [Some(galley), Some(bridge)]);
    if let Ok(d) = sub.door_mut(door) {
        d.operate(door_open);
        d.powered = door_powered;
    }
    let west = sub.add_waypoint(Vec2::new(5.0, 0.0));
    let east = sub.add_waypoint(Vec2::new(15.0, 0.0));
    if let Ok(middle) = sub.add_door_waypoint(door) {
        let _ = sub.link_waypoints(west, middle);
        let _ = sub.link_waypoints(middle, east);
    }
    sub
}

fn engine_for(sub: Submarine) -> Option<SimulationEngine> {
    SimulationEngine::new(sub, AiTuning::default()).ok()
}

fn run(engine: &mut SimulationEngine, seconds: f32) {
    for _ in 0..(seconds / STEP).round() as usize {
        engine.update(STEP);
    }
}

fn cached(engine: &SimulationEngine, agent: Entity, hull: HullId) -> Option<f32> {
    engine
        .world
        .get::<&HazardCache>(agent)
        .ok()
        .and_then(|c| c.peek(hull))
}

fn setup_failed(name: &str) -> TestResult {
    TestResult {
        name: name.into(),
        passed: false,
        detail: "scenario setup failed".into(),
    }
}

// ── 1. Tuning ───────────────────────────────────────────────────────────

fn validate_tuning(verbose: bool) -> Vec<TestResult> {
    println!("--- Tuning ---");
    let mut results = Vec::new();

    let defaults = AiTuning::default();
    results.push(TestResult {
        name: "tuning_defaults_valid".into(),
        passed: defaults.validate().is_ok(),
        detail: format!(
            "safety threshold {}, cache {}s, sort {}s",
            defaults.hazard.safety_threshold,
            defaults.hazard.validity_seconds,
            defaults.objectives.sort_interval
        ),
    });

    let round_trip = serde_json::to_string(&defaults)
        .ok()
        .and_then(|json| AiTuning::from_json(&json).ok());
    results.push(TestResult {
        name: "tuning_json_round_trip".into(),
        passed: round_trip.as_ref() == Some(&defaults),
        detail: "defaults survive JSON".into(),
    });

    let partial = AiTuning::from_json(r#"{ "objectives": { "sort_interval": 0.5 } }"#);
    results.push(TestResult {
        name: "tuning_partial_override".into(),
        passed: partial
            .as_ref()
            .is_ok_and(|t| t.objectives.sort_interval == 0.5 && t.hazard == defaults.hazard),
        detail: "one field overridden, rest default".into(),
    });

    let rejected = AiTuning::from_json(r#"{ "reactions": { "flush_interval": -1.0 } }"#);
    if verbose {
        if let Err(e) = &rejected {
            println!("    rejected: {}", e);
        }
    }
    results.push(TestResult {
        name: "tuning_rejects_negative_interval".into(),
        passed: rejected.is_err(),
        detail: "negative flush interval refused".into(),
    });

    results
}

// ── 2. Hazard scoring ───────────────────────────────────────────────────

fn validate_hazard_scoring(verbose: bool) -> Vec<TestResult> {
    println!("--- Hazard Scoring ---");
    let mut results = Vec::new();
    let tuning = HazardTuning::default();

    let calm = HullConditions::breathable(10.0);
    let calm_score = hull_safety(&SafetyInput::new(&calm), &tuning);
    results.push(TestResult {
        name: "hazard_calm_room".into(),
        passed: (calm_score - 100.0).abs() < 1e-3,
        detail: format!("calm room scores {:.1}", calm_score),
    });

    // Fire sweep: monotonically non-increasing, always within [0, 100]
    let mut previous = f32::MAX;
    let mut monotonic = true;
    for size in [0.25, 0.5, 1.0, 2.0, 4.0, 8.0, 16.0] {
        let fires = [FireSource {
            position: Vec2::new(5.0, 0.0),
            size,
        }];
        let room = HullConditions {
            fires: &fires,
            ..HullConditions::breathable(10.0)
        };
        let score = hull_safety(&SafetyInput::new(&room), &tuning);
        if verbose {
            println!("    fire {:>5.2} → {:.1}", size, score);
        }
        if score > previous || !(0.0..=100.0).contains(&score) {
            monotonic = false;
        }
        previous = score;
    }
    results.push(TestResult {
        name: "hazard_fire_monotonic".into(),
        passed: monotonic,
        detail: "bigger fires never score safer".into(),
    });

    let mut hostile = SafetyInput::new(&calm);
    hostile.hostiles = 1;
    let threatened = hull_safety(&hostile, &tuning);
    results.push(TestResult {
        name: "hazard_single_hostile".into(),
        passed: threatened < tuning.safety_threshold,
        detail: format!("one hostile → {:.1}", threatened),
    });

    results
}

// ── 3. Scenario A ───────────────────────────────────────────────────────

fn scenario_hostile_room(_verbose: bool) -> Vec<TestResult> {
    println!("--- Scenario A: Hostile Room ---");
    let mut results = Vec::new();

    let Some(mut engine) = engine_for(two_rooms(true, false)) else {
        return vec![setup_failed("scenario_a_setup")];
    };
    let mate = engine.spawn_character(Character::crew("Mate", Department::Operations, 1).at(Vec2::new(2.0, 0.0)));
    engine.spawn_character(Character::raider("Raider").at(Vec2::new(6.0, 0.0)));
    if engine.attach_ai(mate).is_err() {
        return vec![setup_failed("scenario_a_setup")];
    }

    engine.update(STEP);
    let threshold = engine.tuning().hazard.safety_threshold;
    let safety = cached(&engine, mate, 0);
    results.push(TestResult {
        name: "scenario_a_hull_unsafe".into(),
        passed: safety.is_some_and(|s| s < threshold),
        detail: format!("galley safety {:?} (threshold {})", safety, threshold),
    });

    results
}

// ── 4. Scenario B ───────────────────────────────────────────────────────

fn scenario_dead_door(_verbose: bool) -> Vec<TestResult> {
    println!("--- Scenario B: Dead Door ---");
    let mut results = Vec::new();

    let Some(mut engine) = engine_for(two_rooms(false, false)) else {
        return vec![setup_failed("scenario_b_setup")];
    };
    let mate = engine.spawn_character(Character::crew("Mate", Department::Operations, 1).at(Vec2::new(2.0, 0.0)));
    let order = Order {
        kind: OrderKind::GoTo(Vec2::new(15.0, 0.0)),
        issuer: None,
    };
    if engine.attach_ai(mate).is_err() || engine.give_order(mate, order).is_err() {
        return vec![setup_failed("scenario_b_setup")];
    }

    run(&mut engine, 5.0);

    let position = engine.world.get::<&Character>(mate).map(|c| c.position).ok();
    results.push(TestResult {
        name: "scenario_b_stays_put".into(),
        passed: position.is_some_and(|p| p.x < 10.0),
        detail: format!("agent at {:?}", position),
    });

    let gave_up = engine.drain_events().iter().any(|e| {
        matches!(&e.event, AiEvent::Speak { speaker, identifier, .. }
            if *speaker == mate && identifier == "order.abandoned")
    });
    results.push(TestResult {
        name: "scenario_b_order_abandoned".into(),
        passed: gave_up,
        detail: "unreachable order reported, no panic".into(),
    });

    results
}

// ── 5. Scenario C ───────────────────────────────────────────────────────

fn scenario_objective_order(_verbose: bool) -> Vec<TestResult> {
    println!("--- Scenario C: Objective Order ---");
    let mut results = Vec::new();

    let mut objectives = ObjectiveManager::new();
    objectives.add_objective_with_priority(ObjectiveKind::idle(), 1.0);
    let flee = objectives.add_objective_with_priority(ObjectiveKind::find_safety(), 9.0);
    let switched = objectives.sort();
    results.push(TestResult {
        name: "scenario_c_find_safety_first".into(),
        passed: switched && objectives.current() == Some(flee),
        detail: format!(
            "current = {:?}",
            objectives.current_kind().map(|k| k.name())
        ),
    });

    let stable = !objectives.sort() && objectives.current() == Some(flee);
    results.push(TestResult {
        name: "scenario_c_sort_stable".into(),
        passed: stable,
        detail: "re-sorting keeps the current objective".into(),
    });

    results
}

// ── 6. Propagation ──────────────────────────────────────────────────────

fn validate_propagation(_verbose: bool) -> Vec<TestResult> {
    println!("--- Hazard Propagation ---");
    let mut results = Vec::new();

    let Some(mut engine) = engine_for(two_rooms(true, true)) else {
        return vec![setup_failed("propagation_setup")];
    };
    let mate = engine.spawn_character(Character::crew("Mate", Department::Operations, 1).at(Vec2::new(2.0, 0.0)));
    let pilot = engine.spawn_character(Character::crew("Pilot", Department::Command, 2).at(Vec2::new(15.0, 0.0)));
    let stranger = engine.spawn_character(Character::raider("Diver").at(Vec2::new(45.0, 0.0)));
    engine.spawn_character(Character::raider("Raider").at(Vec2::new(6.0, 0.0)));
    let attached = [mate, pilot].iter().all(|&a| engine.attach_ai(a).is_ok());
    if !attached {
        return vec![setup_failed("propagation_setup")];
    }
    let _ = engine.attach_ai(stranger);

    engine.update(STEP);
    let threshold = engine.tuning().hazard.safety_threshold;
    let seen = cached(&engine, pilot, 0);
    results.push(TestResult {
        name: "propagation_friend_informed".into(),
        passed: seen.is_some_and(|s| s < threshold),
        detail: format!("pilot's galley score {:?}", seen),
    });

    let foreign = cached(&engine, stranger, 0);
    results.push(TestResult {
        name: "propagation_skips_other_teams".into(),
        passed: foreign.is_none(),
        detail: "outside diver has no galley score".into(),
    });

    results
}

// ── 7. Re-route ─────────────────────────────────────────────────────────

fn validate_reroute(verbose: bool) -> Vec<TestResult> {
    println!("--- Re-route Policy ---");
    let mut results = Vec::new();
    let tuning = SteeringTuning::default();

    // Ten one-metre segments; at each cursor offer paths just under and
    // just over the replacement threshold.
    let corridor = || {
        SteeringPath::new(
            (0..11).collect(),
            (0..11).map(|x| Vec2::new(x as f32, 0.0)).collect(),
            std::iter::once(0.0).chain(std::iter::repeat(1.0).take(10)).collect(),
        )
    };
    let offer = |from: f32, cost: f32| {
        SteeringPath::new(
            vec![0, 100, 10],
            vec![Vec2::new(from, 0.0), Vec2::new(5.0, 2.0), Vec2::new(10.0, 0.0)],
            vec![0.0, cost / 2.0, cost / 2.0],
        )
    };

    let mut current = corridor();
    let mut violations = Vec::new();
    for cursor in 0..10 {
        let at = Vec2::new(cursor as f32, 0.0);
        let ctx = RerouteContext {
            agent_position: at,
            target_moved: false,
            climbing: false,
        };
        let threshold = current.remaining_cost()
            * current.reroute_tolerance(tuning.reroute_tolerance_start, tuning.reroute_tolerance_end);
        let cheaper = evaluate(Some(&current), &offer(at.x, threshold * 0.9), &ctx, &tuning).replaces();
        let dearer = evaluate(Some(&current), &offer(at.x, threshold * 1.1 + 0.01), &ctx, &tuning).replaces();
        if verbose {
            println!(
                "    cursor {:>2}: threshold {:>5.2} cheaper {} dearer {}",
                cursor, threshold, cheaper, dearer
            );
        }
        if (threshold > 0.0 && !cheaper) || dearer {
            violations.push(cursor);
        }
        current.skip_to_next();
    }
    results.push(TestResult {
        name: "reroute_threshold_sweep".into(),
        passed: violations.is_empty(),
        detail: if violations.is_empty() {
            "replacement follows remaining cost × tolerance".into()
        } else {
            format!("wrong decision at cursors {:?}", violations)
        },
    });

    let mut broken = corridor();
    broken.mark_unreachable();
    let ctx = RerouteContext {
        agent_position: Vec2::ZERO,
        target_moved: false,
        climbing: false,
    };
    results.push(TestResult {
        name: "reroute_unreachable_replaced".into(),
        passed: evaluate(Some(&broken), &offer(0.0, 1000.0), &ctx, &tuning).replaces(),
        detail: "any path beats an unreachable one".into(),
    });

    results
}

// ── 8. Path search ──────────────────────────────────────────────────────

fn validate_pathfinding(_verbose: bool) -> Vec<TestResult> {
    println!("--- Path Search ---");
    let mut results = Vec::new();

    let mut graph = WaypointGraph::new();
    for i in 0..1000u32 {
        graph.add_node(i, Vec2::new(i as f32, 0.0));
        if i > 0 {
            graph.link(i - 1, i);
        }
    }
    let long = graph.find_path(&PathRequest::new(Vec2::ZERO, Vec2::new(999.0, 0.0), "harness"));
    results.push(TestResult {
        name: "pathfind_1000_nodes".into(),
        passed: !long.is_unreachable() && long.len() == 1000,
        detail: format!("{} nodes, cost {:.0}", long.len(), long.total_cost()),
    });

    let mut split = WaypointGraph::new();
    split.add_node(1, Vec2::new(0.0, 0.0));
    split.add_node(2, Vec2::new(5.0, 0.0));
    split.add_node(3, Vec2::new(20.0, 0.0));
    split.add_node(4, Vec2::new(25.0, 0.0));
    split.link(1, 2);
    split.link(3, 4);
    let only_far = |n: &subcrew_logic::pathfinding::PathNode| n.id == 4;
    let gap = split.find_path(
        &PathRequest::new(Vec2::ZERO, Vec2::new(25.0, 0.0), "harness").with_end_filter(&only_far),
    );
    results.push(TestResult {
        name: "pathfind_disconnected".into(),
        passed: gap.is_unreachable(),
        detail: "disconnected graph → unreachable path".into(),
    });

    let engine_graph = two_rooms(true, false).waypoint_graph();
    let through = engine_graph.find_path(&PathRequest::new(Vec2::new(2.0, 0.0), Vec2::new(15.0, 0.0), "harness"));
    results.push(TestResult {
        name: "pathfind_through_door".into(),
        passed: through.len() == 3,
        detail: format!("route {:?}", through.nodes()),
    });

    results
}

// ── 9. Misconduct ───────────────────────────────────────────────────────

fn validate_misconduct(_verbose: bool) -> Vec<TestResult> {
    println!("--- Misconduct ---");
    let mut results = Vec::new();
    let reactions = AiTuning::default().reactions;
    let lines = [reactions.theft_warning_threshold, reactions.theft_intervention_threshold];

    let mut tally = ThresholdAccumulator::default();
    let mut crossings = Vec::new();
    for _ in 0..60 {
        crossings.extend(tally.add(1.0, &lines));
    }
    results.push(TestResult {
        name: "misconduct_edge_triggered".into(),
        passed: crossings == lines.to_vec(),
        detail: format!("crossings {:?}", crossings),
    });

    let Some(mut engine) = engine_for(two_rooms(true, false)) else {
        return vec![setup_failed("misconduct_setup")];
    };
    let guard = engine.spawn_character(Character::crew("Guard", Department::Security, 1).at(Vec2::new(2.0, 0.0)));
    let thief = engine.spawn_character(Character::crew("Thief", Department::Operations, 1).at(Vec2::new(4.0, 0.0)));
    if engine.attach_ai(guard).is_err() {
        return vec![setup_failed("misconduct_setup")];
    }
    engine.report_theft(thief, reactions.theft_intervention_threshold);
    let mode = engine
        .world
        .get::<&ObjectiveManager>(guard)
        .ok()
        .and_then(|o| o.combat_mode(thief));
    results.push(TestResult {
        name: "misconduct_security_sent".into(),
        passed: mode.is_some(),
        detail: format!("guard's response {:?}", mode),
    });

    results
}
