//! Equipment upkeep: diving gear on and off, tools back in their lockers.

use log::debug;
use subcrew_logic::config::AiTuning;
use subcrew_logic::hazard::oxygen;
use subcrew_logic::path::SteeringPath;

use crate::components::{Character, ItemKind, Submarine};
use crate::objectives::{ObjectiveKind, ObjectiveManager};

/// Whether the agent's surroundings call for breathing gear.
pub fn gear_needed_here(character: &Character, sub: &Submarine, tuning: &AiTuning) -> bool {
    let Some(hull) = character.hull.and_then(|h| sub.hull(h).ok()) else {
        return true;
    };
    hull.water_percentage >= tuning.logistics.gear_water_percentage || hull.oxygen < oxygen::LOW || hull.lethal_pressure
}

/// Whether any of the next few nodes on `path` are flooded, airless or outside.
pub fn path_needs_gear(path: Option<&SteeringPath>, sub: &Submarine, tuning: &AiTuning) -> bool {
    let Some(path) = path else { return false };
    if path.is_unreachable() {
        return false;
    }
    let start = path.cursor();
    let end = (start + tuning.logistics.path_lookahead_nodes).min(path.len());
    path.nodes()[start.min(end)..end].iter().any(|&node| {
        let Ok(waypoint) = sub.waypoint(node) else {
            return false;
        };
        match waypoint.hull.and_then(|h| sub.hull(h).ok()) {
            Some(hull) => {
                hull.water_percentage >= tuning.logistics.gear_water_percentage
                    || hull.oxygen < oxygen::LOW
                    || hull.lethal_pressure
            }
            None => true,
        }
    })
}

/// Put on carried gear if there is some. Returns whether anything was equipped.
fn equip_carried_gear(character: &mut Character) -> bool {
    if character.inventory.worn.is_some() {
        return false;
    }
    let carried = character
        .inventory
        .hands
        .iter()
        .chain(character.inventory.pockets.iter())
        .filter(|i| i.kind.is_diving_gear())
        .max_by_key(|i| i.kind.provides_pressure_protection())
        .map(|i| i.id);
    let Some(item) = carried.and_then(|id| character.inventory.take(id)) else {
        return false;
    };
    debug!("{} puts on {:?}", character.name, item.kind);
    character.inventory.worn = Some(item);
    true
}

/// One logistics pass: gear on when needed, gear off when safe, loose tools away when idle.
///
/// `hull_safety` is the agent's cached score for the hull they stand in.
pub fn update_equipment(
    character: &mut Character,
    objectives: &mut ObjectiveManager,
    path: Option<&SteeringPath>,
    hull_safety: Option<f32>,
    sub: &Submarine,
    tuning: &AiTuning,
) {
    let needs_gear = gear_needed_here(character, sub, tuning) || path_needs_gear(path, sub, tuning);
    let protected = character.protection().breathing;

    if needs_gear {
        if !protected && !equip_carried_gear(character) {
            let pressure = character
                .hull
                .and_then(|h| sub.hull(h).ok())
                .map_or(true, |h| h.lethal_pressure);
            let kind = if pressure {
                ItemKind::DivingSuit
            } else {
                ItemKind::DivingMask
            };
            objectives.add_objective(ObjectiveKind::fetch(kind));
        }
        return;
    }

    let safe = hull_safety.is_some_and(|s| s >= tuning.hazard.safety_threshold);
    if let Some(worn) = character.inventory.worn.as_ref() {
        if safe {
            debug!("{} takes off {:?}", character.name, worn.kind);
            objectives.add_objective(ObjectiveKind::stow(worn.id));
        }
        return;
    }

    if !matches!(objectives.current_kind(), Some(ObjectiveKind::Idle(_))) {
        return;
    }
    let loose = character
        .inventory
        .hands
        .iter()
        .find(|i| i.kind != ItemKind::Weapon && !i.kind.is_diving_gear())
        .map(|i| i.id);
    if let Some(item) = loose {
        objectives.add_objective(ObjectiveKind::stow(item));
    }
}
