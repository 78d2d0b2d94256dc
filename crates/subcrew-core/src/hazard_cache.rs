//! Per-agent memory of how safe each hull is.
//!
//! Scores are expensive enough (they look at every visible hull and count
//! hostiles) that each agent keeps them for a short validity window. When
//! one agent notices a hull turning dangerous, friendly agents who can see
//! that hull get their entries refreshed on the spot.

use std::collections::HashMap;

use hecs::World;
use log::{debug, warn};
use subcrew_logic::config::HazardTuning;
use subcrew_logic::hazard::{hull_safety, HullConditions, SafetyInput, Suppression};

use crate::components::{Character, HullId, Submarine, Team};
use crate::crew::CrewSnapshot;
use crate::error::AiError;
use crate::objectives::ObjectiveManager;

#[derive(Debug, Clone, Copy, PartialEq)]
struct CachedSafety {
    value: f32,
    age: f32,
}

/// Component: cached safety scores keyed by hull.
#[derive(Debug, Clone)]
pub struct HazardCache {
    entries: HashMap<HullId, CachedSafety>,
    validity: f32,
}

impl HazardCache {
    pub fn new(validity_seconds: f32) -> Self {
        Self {
            entries: HashMap::new(),
            validity: validity_seconds,
        }
    }

    /// Fresh score for the hull, if there is one.
    pub fn get(&self, hull: HullId) -> Option<f32> {
        self.entries
            .get(&hull)
            .filter(|e| e.age < self.validity)
            .map(|e| e.value)
    }

    /// Last known score, fresh or not.
    pub fn peek(&self, hull: HullId) -> Option<f32> {
        self.entries.get(&hull).map(|e| e.value)
    }

    pub fn is_stale(&self, hull: HullId) -> bool {
        self.get(hull).is_none()
    }

    pub fn store(&mut self, hull: HullId, value: f32) {
        self.entries.insert(hull, CachedSafety { value, age: 0.0 });
    }

    pub fn tick(&mut self, dt: f32) {
        for entry in self.entries.values_mut() {
            entry.age += dt;
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// What scoring a hull reads besides the character itself.
#[derive(Clone, Copy)]
pub struct SafetyContext<'a> {
    pub sub: &'a Submarine,
    pub crew: &'a CrewSnapshot,
    pub tuning: &'a HazardTuning,
}

/// Score a hull from scratch for this character.
pub fn evaluate_hull_safety(
    ctx: &SafetyContext<'_>,
    character: &Character,
    suppression: Suppression,
    hull: HullId,
) -> Result<f32, AiError> {
    let target = ctx.sub.hull_conditions(hull)?;
    let visible_ids = ctx.sub.visible_hulls(hull);
    let visible = visible_ids
        .iter()
        .map(|&h| ctx.sub.hull_conditions(h))
        .collect::<Result<Vec<HullConditions<'_>>, _>>()?;
    let input = SafetyInput {
        target: &target,
        visible: &visible,
        hostiles: ctx.crew.hostiles_in(character.team, &visible_ids),
        protection: character.protection(),
        suppression,
    };
    Ok(hull_safety(&input, ctx.tuning))
}

/// Cached score, recomputed when stale.
pub fn get_hull_safety(
    cache: &mut HazardCache,
    ctx: &SafetyContext<'_>,
    character: &Character,
    suppression: Suppression,
    hull: HullId,
) -> Result<f32, AiError> {
    if let Some(value) = cache.get(hull) {
        return Ok(value);
    }
    let value = evaluate_hull_safety(ctx, character, suppression, hull)?;
    cache.store(hull, value);
    Ok(value)
}

/// Refresh the score of `hull` for every active agent of `team` who can
/// see it. Returns how many caches were updated.
pub fn propagate_hull_safety(world: &mut World, ctx: &SafetyContext<'_>, team: Team, hull: HullId) -> usize {
    let mut refreshed = 0;
    for (entity, (character, cache, objectives)) in
        world.query_mut::<(&Character, &mut HazardCache, &ObjectiveManager)>()
    {
        if !character.team.is_friendly(team) || !character.is_active() {
            continue;
        }
        let Some(own) = character.hull else { continue };
        if !ctx.sub.visible_hulls(own).contains(&hull) {
            continue;
        }
        match evaluate_hull_safety(ctx, character, objectives.suppression(), hull) {
            Ok(value) => {
                cache.store(hull, value);
                refreshed += 1;
            }
            Err(err) => warn!("hazard propagation skipped {entity:?}: {err}"),
        }
    }
    if refreshed > 0 {
        debug!("hull {hull} safety shared with {refreshed} agents");
    }
    refreshed
}

#[cfg(test)]
mod tests {
    use super::*;
    use subcrew_logic::access::Department;
    use subcrew_logic::geometry::{Rect, Vec2};
    use subcrew_logic::hazard::FireSource;

    #[test]
    fn test_entries_expire() {
        let mut cache = HazardCache::new(0.5);
        assert!(cache.is_stale(3));
        cache.store(3, 80.0);
        assert_eq!(cache.get(3), Some(80.0));
        cache.tick(0.3);
        assert_eq!(cache.get(3), Some(80.0));
        cache.tick(0.3);
        assert_eq!(cache.get(3), None);
        assert_eq!(cache.peek(3), Some(80.0));
    }

    #[test]
    fn test_fire_lowers_score_and_cache_holds_it() {
        let mut sub = Submarine::new();
        let hull = sub.add_hull("Reactor", Rect::new(0.0, 0.0, 10.0, 3.0));
        let crew = CrewSnapshot::default();
        let tuning = HazardTuning::default();
        let ctx = SafetyContext {
            sub: &sub,
            crew: &crew,
            tuning: &tuning,
        };
        let engineer = Character::crew("Engineer", Department::Engineering, 1);
        let calm = evaluate_hull_safety(&ctx, &engineer, Suppression::default(), hull).unwrap();
        assert!((calm - 100.0).abs() < 1e-3);

        sub.add_fire(hull, FireSource { position: Vec2::new(5.0, 0.0), size: 5.0 }).unwrap();
        let ctx = SafetyContext {
            sub: &sub,
            crew: &crew,
            tuning: &tuning,
        };
        let burning = evaluate_hull_safety(&ctx, &engineer, Suppression::default(), hull).unwrap();
        assert!(burning < calm);

        let mut cache = HazardCache::new(0.5);
        cache.store(hull, 42.0);
        let cached = get_hull_safety(&mut cache, &ctx, &engineer, Suppression::default(), hull).unwrap();
        assert_eq!(cached, 42.0);
        assert!(evaluate_hull_safety(&ctx, &engineer, Suppression::default(), 99).is_err());
    }
}
