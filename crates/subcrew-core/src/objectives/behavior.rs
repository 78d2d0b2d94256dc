//! Priorities and per-tick behaviour of each objective kind.
//!
//! Objectives never move the body themselves. They read the world, write a
//! [`MovementIntent`] for the steering layer, and post actions to the event
//! log. Whether the last intent turned out unreachable comes back through
//! [`NavigationStatus`] on the following tick.

use hecs::Entity;
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::Rng;
use subcrew_logic::config::AiTuning;
use subcrew_logic::geometry::Vec2;
use subcrew_logic::hazard::{oxygen, Suppression};
use subcrew_logic::threat::CombatMode;

use super::kinds::*;
use super::targets::{LoopTask, SharedTargets, TargetRef};
use super::ObjectiveState;
use crate::components::{Character, HullId, ItemKind, Submarine};
use crate::crew::{CrewMember, CrewSnapshot};
use crate::events::{AgentAction, AiEvent, EventLog};
use crate::hazard_cache::{get_hull_safety, HazardCache, SafetyContext};
use crate::steering::{MovementIntent, NavigationStatus};

/// Chance an idle agent wanders into a neighbouring hull.
const WANDER_NEIGHBOUR_CHANCE: f64 = 0.3;

/// One result of acting on an objective.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Running,
    Completed,
    Abandoned,
    /// Queue a sub-objective and work on it first.
    Push(ObjectiveKind),
}

/// Everything an objective may look at or touch during one agent's tick.
pub struct ObjectiveContext<'a> {
    pub entity: Entity,
    pub character: &'a mut Character,
    pub sub: &'a mut Submarine,
    pub crew: &'a CrewSnapshot,
    pub hazards: &'a mut HazardCache,
    pub targets: &'a SharedTargets,
    pub tuning: &'a AiTuning,
    pub rng: &'a mut StdRng,
    pub events: &'a mut EventLog,
    pub navigation: NavigationStatus,
    pub intent: &'a mut MovementIntent,
    /// Hazards the current objective ignores.
    pub suppression: Suppression,
    pub dt: f32,
    pub now: f64,
}

impl ObjectiveContext<'_> {
    /// Cached safety of a hull for this agent; unknown hulls score zero.
    pub fn hull_safety(&mut self, hull: HullId) -> f32 {
        self.hull_safety_with(hull, self.suppression)
    }

    fn hull_safety_with(&mut self, hull: HullId, suppression: Suppression) -> f32 {
        let ctx = SafetyContext {
            sub: &*self.sub,
            crew: self.crew,
            tuning: &self.tuning.hazard,
        };
        match get_hull_safety(self.hazards, &ctx, &*self.character, suppression, hull) {
            Ok(value) => value,
            Err(err) => {
                warn!("{}: {err}", self.character.name);
                0.0
            }
        }
    }

    fn emit(&mut self, action: AgentAction) {
        self.events.push(
            self.now,
            AiEvent::Action {
                agent: self.entity,
                action,
            },
        );
    }

    fn unreachable(&self, target: Vec2) -> bool {
        self.navigation
            .unreachable_for(target, self.tuning.steering.target_moved_epsilon)
    }

    /// Within `reach` horizontally and about the same height.
    fn within_reach(&self, point: Vec2, reach: f32) -> bool {
        (point.x - self.character.position.x).abs() <= reach
            && (point.y - self.character.position.y).abs() <= self.character.collider_height
    }

    fn face(&mut self, point: Vec2) {
        let dx = point.x - self.character.position.x;
        if dx.abs() > 0.01 {
            self.character.facing = dx.signum();
        }
    }

    /// Walking target on the floor of the hull containing `point`.
    fn floor_point(&self, point: Vec2) -> (Vec2, Option<HullId>) {
        match self.sub.hull_at(point).and_then(|h| self.sub.hull(h).ok()) {
            Some(h) => (Vec2::new(point.x, h.rect.min_y()), Some(h.id)),
            None => (point, None),
        }
    }
}

/// Priority of a root objective this sort.
pub fn priority(kind: &ObjectiveKind, ctx: &mut ObjectiveContext<'_>) -> f32 {
    let tuning = ctx.tuning;
    let t = &tuning.objectives;
    match kind {
        ObjectiveKind::Idle(_) => t.idle_priority,
        ObjectiveKind::FindSafety(_) => find_safety_priority(ctx),
        ObjectiveKind::Combat(c) => combat_priority(c.mode, ctx.tuning),
        ObjectiveKind::Loop(l) => loop_priority(l, ctx),
        ObjectiveKind::GoTo(_)
        | ObjectiveKind::FetchItem(_)
        | ObjectiveKind::StowItem(_)
        | ObjectiveKind::OperateDevice(_) => t.order_priority,
    }
}

pub fn combat_priority(mode: CombatMode, tuning: &AiTuning) -> f32 {
    let t = &tuning.objectives;
    match mode {
        CombatMode::Offensive => t.offensive_priority,
        CombatMode::Defensive => t.defensive_priority,
        CombatMode::Arrest => t.arrest_priority,
        CombatMode::Retreat => t.retreat_priority,
        CombatMode::Ignore => 0.0,
    }
}

fn find_safety_priority(ctx: &mut ObjectiveContext<'_>) -> f32 {
    let max = ctx.tuning.objectives.max_find_safety_priority;
    let Some(hull) = ctx.character.hull else {
        return if ctx.character.protection().breathing { 0.0 } else { max };
    };
    let mut suppression = ctx.suppression;
    // Armed security stand their ground against intruders
    if ctx.character.is_security() && ctx.character.is_armed() {
        suppression.ignore_enemies = true;
    }
    let safety = ctx.hull_safety_with(hull, suppression);
    if safety >= ctx.tuning.hazard.safety_threshold {
        0.0
    } else {
        (100.0 - safety).min(max)
    }
}

fn loop_priority(state: &LoopState, ctx: &mut ObjectiveContext<'_>) -> f32 {
    if ctx.now < state.retry_at {
        return 0.0;
    }
    if state.task == LoopTask::FightIntruders && !ctx.character.is_armed() {
        return 0.0;
    }
    let has_work = state.current.is_some() || next_target(state, ctx).is_some();
    if !has_work {
        return 0.0;
    }
    match state.task {
        LoopTask::FightIntruders => ctx.tuning.objectives.fight_intruders_priority,
        _ => ctx.tuning.objectives.loop_priority,
    }
}

/// Advance an objective by one tick.
pub fn act(kind: &mut ObjectiveKind, child: Option<ObjectiveState>, ctx: &mut ObjectiveContext<'_>) -> Step {
    match kind {
        ObjectiveKind::Idle(s) => act_idle(s, ctx),
        ObjectiveKind::FindSafety(s) => act_find_safety(s, child, ctx),
        ObjectiveKind::Combat(s) => act_combat(s, ctx),
        ObjectiveKind::Loop(s) => act_loop(s, child, ctx),
        ObjectiveKind::GoTo(s) => act_go_to(s, ctx),
        ObjectiveKind::FetchItem(s) => act_fetch(s, ctx),
        ObjectiveKind::StowItem(s) => act_stow(s, ctx),
        ObjectiveKind::OperateDevice(s) => act_operate(s, ctx),
    }
}

// --- idle ---

fn act_idle(state: &mut IdleState, ctx: &mut ObjectiveContext<'_>) -> Step {
    let tuning = ctx.tuning;
    let t = &tuning.objectives;
    state.timer -= ctx.dt;

    if let Some(target) = state.target {
        if ctx.unreachable(target) || ctx.within_reach(target, t.arrival_distance) {
            state.target = None;
        }
    }

    if state.timer <= 0.0 {
        let (min, max) = (t.wander_interval_min, t.wander_interval_max);
        state.timer = if max > min { ctx.rng.gen_range(min..max) } else { min };
        if let Some((point, hull)) = wander_point(ctx) {
            state.target = Some(point);
            state.target_hull = Some(hull);
        }
    }

    match (ctx.character.hull, state.target) {
        (None, _) => ctx.intent.wander = true,
        (Some(_), Some(target)) => ctx.intent.go_to(target, state.target_hull, false),
        _ => {}
    }
    Step::Running
}

fn wander_point(ctx: &mut ObjectiveContext<'_>) -> Option<(Vec2, HullId)> {
    let own = ctx.character.hull?;
    let neighbours: Vec<HullId> = ctx
        .sub
        .visible_hulls(own)
        .into_iter()
        .filter(|&h| h != own)
        .collect();
    let hull = if !neighbours.is_empty() && ctx.rng.gen_bool(WANDER_NEIGHBOUR_CHANCE) {
        neighbours[ctx.rng.gen_range(0..neighbours.len())]
    } else {
        own
    };
    let rect = ctx.sub.hull(hull).ok()?.rect;
    let (lo, hi) = (rect.min_x() + 0.5, rect.max_x() - 0.5);
    let x = if hi > lo { ctx.rng.gen_range(lo..hi) } else { rect.center().x };
    Some((Vec2::new(x, rect.min_y()), hull))
}

// --- find safety ---

fn needs_diving_gear(ctx: &ObjectiveContext<'_>) -> bool {
    let Some(hull) = ctx.character.hull.and_then(|h| ctx.sub.hull(h).ok()) else {
        return true;
    };
    hull.water_percentage >= ctx.tuning.logistics.gear_water_percentage
        || hull.oxygen < oxygen::LOW
        || hull.lethal_pressure
}

fn act_find_safety(state: &mut FindSafetyState, child: Option<ObjectiveState>, ctx: &mut ObjectiveContext<'_>) -> Step {
    let threshold = ctx.tuning.hazard.safety_threshold;
    let current_safety = match ctx.character.hull {
        Some(hull) => ctx.hull_safety(hull),
        None => 0.0,
    };
    if ctx.character.hull.is_some() && current_safety >= threshold {
        state.target = None;
        state.gear_attempts = 0;
        return Step::Running;
    }

    if child == Some(ObjectiveState::Completed) {
        state.gear_attempts = 2;
    }
    if state.gear_attempts < 2 && needs_diving_gear(ctx) && !ctx.character.protection().breathing {
        let kind = if state.gear_attempts == 0 {
            ItemKind::DivingSuit
        } else {
            ItemKind::DivingMask
        };
        state.gear_attempts += 1;
        return Step::Push(ObjectiveKind::fetch(kind));
    }

    state.search_timer -= ctx.dt;
    if state.target.is_none() || state.search_timer <= 0.0 {
        state.search_timer = ctx.tuning.objectives.refuge_search_interval;
        state.target = best_refuge(state, current_safety, ctx);
    }
    let Some(refuge) = state.target else {
        return Step::Running;
    };
    if ctx.character.hull == Some(refuge) {
        return Step::Running;
    }
    let Ok(dest) = ctx.sub.hull(refuge).map(|h| h.rect.floor_center()) else {
        state.target = None;
        return Step::Running;
    };
    ctx.intent.go_to(dest, Some(refuge), true);
    if ctx.unreachable(dest) {
        debug!("{} can't reach refuge {refuge}", ctx.character.name);
        state.unreachable.push(refuge);
        state.target = None;
    }
    Step::Running
}

/// Safest other hull that beats the current one; ties go to the nearest.
fn best_refuge(state: &FindSafetyState, current: f32, ctx: &mut ObjectiveContext<'_>) -> Option<HullId> {
    let candidates: Vec<(HullId, Vec2)> = ctx
        .sub
        .hulls()
        .iter()
        .filter(|h| Some(h.id) != ctx.character.hull && !state.unreachable.contains(&h.id))
        .map(|h| (h.id, h.rect.floor_center()))
        .collect();
    let position = ctx.character.position;
    let mut best: Option<(HullId, f32, f32)> = None;
    for (hull, center) in candidates {
        let safety = ctx.hull_safety(hull);
        if safety <= current {
            continue;
        }
        let distance = center.distance(&position);
        let better = match best {
            None => true,
            Some((_, s, d)) => safety > s || (safety == s && distance < d),
        };
        if better {
            best = Some((hull, safety, distance));
        }
    }
    best.map(|(hull, _, _)| hull)
}

// --- combat ---

fn act_combat(state: &mut CombatState, ctx: &mut ObjectiveContext<'_>) -> Step {
    if state.mode == CombatMode::Ignore {
        return Step::Completed;
    }
    let Some(target) = ctx.crew.get(state.target).cloned() else {
        return Step::Completed;
    };
    if target.incapacitated || (target.handcuffed && state.mode != CombatMode::Retreat) {
        return Step::Completed;
    }

    let visible = ctx.crew.can_perceive(ctx.sub, ctx.entity, state.target);
    if visible {
        state.lost_timer = 0.0;
        state.last_seen = Some((target.position, target.hull));
    } else {
        state.lost_timer += ctx.dt;
        if state.lost_timer >= ctx.tuning.objectives.lost_target_timeout {
            return match state.mode {
                CombatMode::Retreat => Step::Completed,
                _ => Step::Abandoned,
            };
        }
    }
    state.action_timer -= ctx.dt;

    if state.mode == CombatMode::Retreat {
        retreat(state, &target, ctx);
        return Step::Running;
    }

    let range = ctx.tuning.objectives.attack_range;
    if visible && ctx.character.position.distance(&target.position) <= range {
        ctx.face(target.position);
        if state.action_timer <= 0.0 {
            state.action_timer = ctx.tuning.objectives.attack_interval;
            let action = match state.mode {
                CombatMode::Arrest => AgentAction::Arrest { target: state.target },
                _ => AgentAction::Attack { target: state.target },
            };
            ctx.emit(action);
        }
        return Step::Running;
    }

    if state.mode == CombatMode::Defensive && !visible {
        return Step::Running;
    }
    let Some((position, hull)) = state.last_seen else {
        return Step::Running;
    };
    ctx.intent.go_to(position, hull, true);
    if ctx.unreachable(position) {
        return if state.mode == CombatMode::Defensive {
            Step::Running
        } else {
            Step::Abandoned
        };
    }
    Step::Running
}

fn retreat(state: &mut CombatState, threat: &CrewMember, ctx: &mut ObjectiveContext<'_>) {
    let exposed: Vec<HullId> = threat
        .hull
        .map(|h| ctx.sub.visible_hulls(h))
        .unwrap_or_default();
    if state.refuge.is_some_and(|r| exposed.contains(&r)) {
        state.refuge = None;
    }
    if state.refuge.is_none() {
        let candidates: Vec<(HullId, Vec2)> = ctx
            .sub
            .hulls()
            .iter()
            .filter(|h| !exposed.contains(&h.id))
            .map(|h| (h.id, h.rect.floor_center()))
            .collect();
        let threshold = ctx.tuning.hazard.safety_threshold;
        let mut best: Option<(HullId, f32)> = None;
        for (hull, center) in candidates {
            if ctx.hull_safety(hull) < threshold {
                continue;
            }
            let distance = center.distance(&threat.position);
            if best.map_or(true, |(_, d)| distance > d) {
                best = Some((hull, distance));
            }
        }
        state.refuge = best.map(|(hull, _)| hull);
    }

    match state.refuge.and_then(|r| ctx.sub.hull(r).ok().map(|h| (r, h.rect.floor_center()))) {
        Some((refuge, dest)) => {
            ctx.intent.go_to(dest, Some(refuge), true);
            if ctx.unreachable(dest) {
                state.refuge = None;
            }
        }
        None => {
            // Nowhere to hide: back away inside the current hull
            let away = (ctx.character.position.x - threat.position.x).signum();
            let mut dest = ctx.character.position + Vec2::new(away * 5.0, 0.0);
            if let Some(rect) = ctx.character.hull.and_then(|h| ctx.sub.hull(h).ok()).map(|h| h.rect) {
                dest = rect.clamp(dest, 0.5);
            }
            ctx.intent.go_to(dest, ctx.character.hull, true);
        }
    }
}

// --- task loops ---

fn target_valid(task: LoopTask, target: TargetRef, ctx: &ObjectiveContext<'_>) -> bool {
    if target == TargetRef::Character(ctx.entity) {
        return false;
    }
    target.is_valid(
        task,
        ctx.character.team,
        ctx.sub,
        ctx.crew,
        ctx.tuning.objectives.rescue_health_fraction,
    )
}

/// Where to stand to work on a target.
fn target_spot(target: TargetRef, ctx: &ObjectiveContext<'_>) -> Option<(Vec2, Option<HullId>)> {
    let from = ctx.character.position;
    match target {
        TargetRef::Fire(hull) => {
            let h = ctx.sub.hull(hull).ok()?;
            let fire = h
                .fires
                .iter()
                .min_by(|a, b| a.position.distance(&from).total_cmp(&b.position.distance(&from)))?;
            Some((Vec2::new(fire.position.x, h.rect.min_y()), Some(hull)))
        }
        TargetRef::Breach { hull, index } => {
            let h = ctx.sub.hull(hull).ok()?;
            let breach = h.breaches.get(index)?;
            Some((Vec2::new(breach.position.x, h.rect.min_y()), Some(hull)))
        }
        TargetRef::Device(device) => {
            let d = ctx.sub.device(device).ok()?;
            Some((d.position, Some(d.hull)))
        }
        TargetRef::Character(entity) => {
            let member = ctx.crew.get(entity)?;
            Some((member.position, member.hull))
        }
    }
}

fn next_target(state: &LoopState, ctx: &ObjectiveContext<'_>) -> Option<TargetRef> {
    let from = ctx.character.position;
    ctx.targets
        .targets(ctx.character.team, state.task)
        .iter()
        .copied()
        .filter(|t| !state.skipped.contains(t))
        .filter(|&t| target_valid(state.task, t, ctx))
        .filter_map(|t| target_spot(t, ctx).map(|(p, _)| (t, p.distance(&from))))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(t, _)| t)
}

fn act_loop(state: &mut LoopState, child: Option<ObjectiveState>, ctx: &mut ObjectiveContext<'_>) -> Step {
    state.action_timer -= ctx.dt;
    if child.is_some() && state.fetching {
        state.fetching = false;
        if child == Some(ObjectiveState::Abandoned) {
            debug!("{} found no tool for {}", ctx.character.name, state.task.name());
            state.retry_at = ctx.now + f64::from(ctx.tuning.objectives.equipment_retry);
        }
    }
    if ctx.now < state.retry_at {
        return Step::Running;
    }

    if state.current.is_some_and(|t| !target_valid(state.task, t, ctx)) {
        state.current = None;
    }
    if state.current.is_none() {
        state.current = next_target(state, ctx);
        if state.current.is_none() {
            state.skipped.clear();
            return Step::Running;
        }
    }
    let Some(target) = state.current else {
        return Step::Running;
    };

    if let TargetRef::Character(intruder) = target {
        if state.task == LoopTask::FightIntruders {
            state.current = None;
            return Step::Push(ObjectiveKind::combat(intruder, CombatMode::Offensive));
        }
    }

    if let Some(tool) = state.task.tool() {
        if !ctx.character.inventory.has(tool) {
            state.fetching = true;
            return Step::Push(ObjectiveKind::fetch(tool));
        }
    }

    let Some((spot, hull)) = target_spot(target, ctx) else {
        state.current = None;
        return Step::Running;
    };
    let reach = match state.task {
        LoopTask::ExtinguishFires => ctx.tuning.objectives.extinguisher_reach,
        _ => ctx.tuning.objectives.interact_distance,
    };
    if ctx.within_reach(spot, reach) {
        ctx.face(spot);
        if state.action_timer <= 0.0 {
            state.action_timer = ctx.tuning.objectives.action_interval;
            if let Some(action) = target.action(ctx.sub, ctx.character.position) {
                ctx.emit(action);
            }
        }
        return Step::Running;
    }

    ctx.intent.go_to(spot, hull, state.task.urgent());
    if ctx.unreachable(spot) {
        debug!("{} skipping unreachable {:?}", ctx.character.name, target);
        state.skipped.push(target);
        state.current = None;
    }
    Step::Running
}

// --- go to ---

fn act_go_to(state: &mut GoToState, ctx: &mut ObjectiveContext<'_>) -> Step {
    if ctx.within_reach(state.destination, state.close_enough) {
        return Step::Completed;
    }
    let (dest, hull) = ctx.floor_point(state.destination);
    ctx.intent.go_to(dest, hull, state.run);
    if ctx.unreachable(dest) {
        return Step::Abandoned;
    }
    Step::Running
}

// --- items ---

fn source_spot(source: ItemSource, ctx: &ObjectiveContext<'_>) -> Option<(Vec2, Option<HullId>)> {
    match source {
        ItemSource::Container(id) => ctx.sub.container(id).ok().map(|c| (c.position, Some(c.hull))),
        ItemSource::Floor(id) => ctx
            .sub
            .floor_items
            .iter()
            .find(|f| f.item.id == id)
            .map(|f| (f.position, f.hull)),
    }
}

fn find_source(state: &FetchItemState, ctx: &ObjectiveContext<'_>) -> Option<ItemSource> {
    let from = ctx.character.position;
    let containers = ctx
        .sub
        .containers()
        .iter()
        .filter(|c| c.holds(state.kind))
        .map(|c| (ItemSource::Container(c.id), c.position));
    let floor = ctx
        .sub
        .floor_items
        .iter()
        .filter(|f| f.item.kind == state.kind)
        .map(|f| (ItemSource::Floor(f.item.id), f.position));
    containers
        .chain(floor)
        .filter(|(s, _)| !state.tried.contains(s))
        .min_by(|a, b| a.1.distance(&from).total_cmp(&b.1.distance(&from)))
        .map(|(s, _)| s)
}

fn act_fetch(state: &mut FetchItemState, ctx: &mut ObjectiveContext<'_>) -> Step {
    if ctx.character.inventory.has(state.kind) {
        return Step::Completed;
    }
    if state.source.is_none() {
        state.source = find_source(state, ctx);
    }
    let Some(source) = state.source else {
        return Step::Abandoned;
    };
    let Some((spot, hull)) = source_spot(source, ctx) else {
        state.tried.push(source);
        state.source = None;
        return Step::Running;
    };

    if !ctx.within_reach(spot, ctx.tuning.objectives.interact_distance) {
        ctx.intent.go_to(spot, hull, true);
        if ctx.unreachable(spot) {
            state.tried.push(source);
            state.source = None;
        }
        return Step::Running;
    }

    let item = match source {
        ItemSource::Container(id) => ctx.sub.container_mut(id).ok().and_then(|c| c.take(state.kind)),
        ItemSource::Floor(id) => ctx
            .sub
            .floor_items
            .iter()
            .position(|f| f.item.id == id)
            .map(|i| ctx.sub.floor_items.remove(i).item),
    };
    let Some(item) = item else {
        state.tried.push(source);
        state.source = None;
        return Step::Running;
    };
    match ctx.character.inventory.add(item) {
        Ok(()) => {
            debug!("{} picked up {:?}", ctx.character.name, state.kind);
            Step::Completed
        }
        Err(item) => {
            ctx.sub.drop_item(item, ctx.character.position);
            Step::Abandoned
        }
    }
}

fn act_stow(state: &mut StowItemState, ctx: &mut ObjectiveContext<'_>) -> Step {
    if !ctx.character.inventory.items().any(|i| i.id == state.item) {
        return Step::Completed;
    }
    let from = ctx.character.position;
    if state.container.is_none() {
        let radius = ctx.tuning.logistics.stow_search_radius;
        state.container = ctx
            .sub
            .containers()
            .iter()
            .filter(|c| c.has_room() && c.position.distance(&from) <= radius)
            .min_by(|a, b| a.position.distance(&from).total_cmp(&b.position.distance(&from)))
            .map(|c| c.id);
    }
    let spot = state
        .container
        .and_then(|id| ctx.sub.container(id).ok())
        .map(|c| (c.id, c.position, c.hull));
    let Some((container, position, hull)) = spot else {
        drop_carried(state, ctx);
        return Step::Completed;
    };

    if !ctx.within_reach(position, ctx.tuning.objectives.interact_distance) {
        ctx.intent.go_to(position, Some(hull), false);
        if ctx.unreachable(position) {
            drop_carried(state, ctx);
            return Step::Completed;
        }
        return Step::Running;
    }

    if let Some(item) = ctx.character.inventory.take(state.item) {
        let stored = match ctx.sub.container_mut(container) {
            Ok(c) => c.put(item),
            Err(_) => Err(item),
        };
        if let Err(item) = stored {
            ctx.sub.drop_item(item, ctx.character.position);
        }
    }
    Step::Completed
}

fn drop_carried(state: &StowItemState, ctx: &mut ObjectiveContext<'_>) {
    if let Some(item) = ctx.character.inventory.take(state.item) {
        debug!("{} dropped item {} for lack of storage", ctx.character.name, item.id);
        ctx.sub.drop_item(item, ctx.character.position);
    }
}

// --- devices ---

fn act_operate(state: &mut OperateState, ctx: &mut ObjectiveContext<'_>) -> Step {
    let Ok((position, hull)) = ctx.sub.device(state.device).map(|d| (d.position, d.hull)) else {
        return Step::Abandoned;
    };
    state.action_timer -= ctx.dt;
    if ctx.within_reach(position, ctx.tuning.objectives.interact_distance) {
        ctx.face(position);
        if state.action_timer <= 0.0 {
            state.action_timer = ctx.tuning.objectives.action_interval * 4.0;
            ctx.emit(AgentAction::Operate { device: state.device });
        }
        return Step::Running;
    }
    ctx.intent.go_to(position, Some(hull), false);
    if ctx.unreachable(position) {
        return Step::Abandoned;
    }
    Step::Running
}
