//! Room safety scoring.
//!
//! A room's safety is a number in `[0, 100]`: the product of independent
//! factors for oxygen, water, fire, enemies and dangerous items, each in
//! `[0, 1]`, scaled by 100. Lethal pressure short-circuits everything to
//! zero unless the character is protected against it.
//!
//! Fire is aggregated over every room visible from the scored room, because
//! smoke and flames next door are as much a reason to leave as flames here.
//!
//! ```
//! use subcrew_logic::config::HazardTuning;
//! use subcrew_logic::hazard::{hull_safety, HullConditions, SafetyInput};
//!
//! let room = HullConditions::breathable(10.0);
//! let input = SafetyInput::new(&room);
//! assert_eq!(hull_safety(&input, &HazardTuning::default()), 100.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::config::HazardTuning;
use crate::geometry::{inverse_lerp, lerp, Vec2};

/// Oxygen fraction constants.
pub mod oxygen {
    /// Normal oxygen fraction.
    pub const NORMAL: f32 = 0.21;
    /// Below this the air starts to hurt.
    pub const LOW: f32 = 0.16;
    /// At or below this the oxygen factor bottoms out.
    pub const CRITICAL: f32 = 0.10;
}

/// A single burning fire source.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FireSource {
    pub position: Vec2,
    /// Horizontal extent in metres.
    pub size: f32,
}

/// Conditions of one room as seen by the scorer.
#[derive(Debug, Clone, Copy)]
pub struct HullConditions<'a> {
    /// Oxygen fraction (0.21 is normal air).
    pub oxygen: f32,
    /// 0..=100.
    pub water_percentage: f32,
    /// Room width in metres (fire size is measured against it).
    pub width: f32,
    pub fires: &'a [FireSource],
    pub lethal_pressure: bool,
    pub dangerous_item: bool,
}

impl<'a> HullConditions<'a> {
    /// A dry, fire-free room with normal air.
    pub fn breathable(width: f32) -> Self {
        Self {
            oxygen: oxygen::NORMAL,
            water_percentage: 0.0,
            width,
            fires: &[],
            lethal_pressure: false,
            dangerous_item: false,
        }
    }
}

/// What the character carries that changes how the room affects them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Protection {
    /// Has its own air (mask or suit, or doesn't breathe).
    pub breathing: bool,
    /// Survives lethal pressure (pressure suit).
    pub pressure: bool,
}

/// Factors the current objective tells the scorer to ignore.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suppression {
    pub ignore_oxygen: bool,
    pub ignore_water: bool,
    pub ignore_fire: bool,
    pub ignore_enemies: bool,
}

/// Everything needed to score one room for one character.
#[derive(Debug, Clone, Copy)]
pub struct SafetyInput<'a> {
    pub target: &'a HullConditions<'a>,
    /// Rooms visible from the target (may include the target itself).
    /// Empty means "just the target".
    pub visible: &'a [HullConditions<'a>],
    /// Active, unrestrained hostiles in the visible rooms.
    pub hostiles: u32,
    pub protection: Protection,
    pub suppression: Suppression,
}

impl<'a> SafetyInput<'a> {
    pub fn new(target: &'a HullConditions<'a>) -> Self {
        Self {
            target,
            visible: &[],
            hostiles: 0,
            protection: Protection::default(),
            suppression: Suppression::default(),
        }
    }
}

/// Per-factor breakdown, handy for logging why a room was judged unsafe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SafetyFactors {
    pub oxygen: f32,
    pub water: f32,
    pub fire: f32,
    pub enemy: f32,
    pub dangerous_item: f32,
}

impl SafetyFactors {
    pub fn product(&self) -> f32 {
        self.oxygen * self.water * self.fire * self.enemy * self.dangerous_item
    }
}

/// Oxygen factor: 1 at or above the low mark, falling to the floor at critical.
pub fn oxygen_factor(oxygen_fraction: f32, tuning: &HazardTuning) -> f32 {
    lerp(
        tuning.min_oxygen_factor,
        1.0,
        inverse_lerp(oxygen::CRITICAL, oxygen::LOW, oxygen_fraction),
    )
}

/// Water factor: 1 when dry, `flooded_water_factor` when full.
pub fn water_factor(water_percentage: f32, tuning: &HazardTuning) -> f32 {
    lerp(1.0, tuning.flooded_water_factor, water_percentage / 100.0)
}

/// Fire factor over a set of rooms.
///
/// Each room contributes `sources * fire_per_source + total_size / width`;
/// the sum (clamped to 1) drives the factor from 1 down to 0.
pub fn fire_factor(rooms: &[HullConditions<'_>], tuning: &HazardTuning) -> f32 {
    let mut fire = 0.0;
    for room in rooms {
        if room.fires.is_empty() {
            continue;
        }
        let size: f32 = room.fires.iter().map(|f| f.size).sum();
        fire += room.fires.len() as f32 * tuning.fire_per_source + size / room.width.max(1.0);
    }
    lerp(1.0, 0.0, fire)
}

/// Enemy factor: a single hostile already knocks it down to `1 - enemy_per_hostile`.
pub fn enemy_factor(hostiles: u32, tuning: &HazardTuning) -> f32 {
    lerp(1.0, 0.0, hostiles as f32 * tuning.enemy_per_hostile)
}

/// Compute the factor breakdown. `None` means lethal pressure without protection.
pub fn safety_factors(input: &SafetyInput<'_>, tuning: &HazardTuning) -> Option<SafetyFactors> {
    let target = input.target;
    if target.lethal_pressure && !input.protection.pressure {
        return None;
    }

    let ignore_air = input.protection.breathing || input.suppression.ignore_oxygen;
    let oxygen = if ignore_air {
        1.0
    } else {
        oxygen_factor(target.oxygen, tuning)
    };

    let water = if input.protection.breathing || input.suppression.ignore_water {
        1.0
    } else {
        water_factor(target.water_percentage, tuning)
    };

    let fire = if input.suppression.ignore_fire {
        1.0
    } else if input.visible.is_empty() {
        fire_factor(std::slice::from_ref(target), tuning)
    } else {
        fire_factor(input.visible, tuning)
    };

    let enemy = if input.suppression.ignore_enemies {
        1.0
    } else {
        enemy_factor(input.hostiles, tuning)
    };

    let dangerous_item = if target.dangerous_item {
        tuning.dangerous_item_factor
    } else {
        1.0
    };

    Some(SafetyFactors {
        oxygen,
        water,
        fire,
        enemy,
        dangerous_item,
    })
}

/// Safety score in `[0, 100]`.
pub fn hull_safety(input: &SafetyInput<'_>, tuning: &HazardTuning) -> f32 {
    match safety_factors(input, tuning) {
        Some(factors) => (factors.product() * 100.0).clamp(0.0, 100.0),
        None => 0.0,
    }
}

/// Whether a score is good enough to stay put.
pub fn is_safe(safety: f32, tuning: &HazardTuning) -> bool {
    safety >= tuning.safety_threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuning() -> HazardTuning {
        HazardTuning::default()
    }

    #[test]
    fn test_clean_room_is_fully_safe() {
        let room = HullConditions::breathable(8.0);
        assert_eq!(hull_safety(&SafetyInput::new(&room), &tuning()), 100.0);
    }

    #[test]
    fn test_lethal_pressure_without_protection_is_zero() {
        let room = HullConditions {
            lethal_pressure: true,
            ..HullConditions::breathable(8.0)
        };
        let mut input = SafetyInput::new(&room);
        assert_eq!(hull_safety(&input, &tuning()), 0.0);

        input.protection.pressure = true;
        assert_eq!(hull_safety(&input, &tuning()), 100.0);
    }

    #[test]
    fn test_single_hostile_drops_safety_below_threshold() {
        let room = HullConditions::breathable(8.0);
        let mut input = SafetyInput::new(&room);
        input.hostiles = 1;
        let safety = hull_safety(&input, &tuning());
        assert!((safety - 10.0).abs() < 1e-3);
        assert!(!is_safe(safety, &tuning()));

        input.suppression.ignore_enemies = true;
        assert_eq!(hull_safety(&input, &tuning()), 100.0);
    }

    #[test]
    fn test_low_oxygen_scales_between_floor_and_one() {
        let t = tuning();
        assert_eq!(oxygen_factor(oxygen::NORMAL, &t), 1.0);
        assert_eq!(oxygen_factor(oxygen::CRITICAL, &t), t.min_oxygen_factor);
        let mid = oxygen_factor(0.13, &t);
        assert!(mid > t.min_oxygen_factor && mid < 1.0);
    }

    #[test]
    fn test_breathing_gear_ignores_air_and_water() {
        let room = HullConditions {
            oxygen: 0.0,
            water_percentage: 100.0,
            ..HullConditions::breathable(8.0)
        };
        let mut input = SafetyInput::new(&room);
        let bare = hull_safety(&input, &tuning());
        assert!(bare < 10.0);

        input.protection.breathing = true;
        assert_eq!(hull_safety(&input, &tuning()), 100.0);
    }

    #[test]
    fn test_fire_in_visible_room_counts() {
        let fires = [FireSource {
            position: Vec2::new(15.0, 0.0),
            size: 2.0,
        }];
        let target = HullConditions::breathable(10.0);
        let neighbour = HullConditions {
            fires: &fires,
            ..HullConditions::breathable(10.0)
        };
        let visible = [target, neighbour];
        let mut input = SafetyInput::new(&target);
        input.visible = &visible;

        // 1 * 0.5 + 2 / 10 = 0.7 -> factor 0.3
        let safety = hull_safety(&input, &tuning());
        assert!((safety - 30.0).abs() < 1e-3);

        input.suppression.ignore_fire = true;
        assert_eq!(hull_safety(&input, &tuning()), 100.0);
    }

    #[test]
    fn test_water_factor_bounds() {
        let t = tuning();
        assert_eq!(water_factor(0.0, &t), 1.0);
        assert!((water_factor(100.0, &t) - t.flooded_water_factor).abs() < 1e-6);
    }

    #[test]
    fn test_dangerous_item_factor() {
        let room = HullConditions {
            dangerous_item: true,
            ..HullConditions::breathable(8.0)
        };
        let safety = hull_safety(&SafetyInput::new(&room), &tuning());
        assert!((safety - 10.0).abs() < 1e-3);
    }
}
