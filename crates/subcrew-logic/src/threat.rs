//! Threat assessment: how to respond to being attacked, and misconduct
//! accumulators that fire once per threshold crossing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::ReactionTuning;

/// Combat stance toward a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatMode {
    Offensive,
    Defensive,
    Arrest,
    Retreat,
    /// No combat response.
    Ignore,
}

impl CombatMode {
    /// Whether an existing objective in this mode must survive a request for
    /// a different mode.
    pub fn is_protected(self) -> bool {
        self == CombatMode::Offensive
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AfflictionKind {
    Blunt,
    Cut,
    Gunshot,
    Burn,
    Bleeding,
    Poison,
    Stun,
}

impl AfflictionKind {
    /// Non-lethal afflictions weigh less when judging intent.
    pub fn weight(self) -> f32 {
        match self {
            AfflictionKind::Stun => 0.1,
            AfflictionKind::Bleeding | AfflictionKind::Poison => 0.5,
            _ => 1.0,
        }
    }
}

/// Everything one attacker did to one victim since the last flush.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttackRecord {
    pub amounts: BTreeMap<AfflictionKind, f32>,
    /// Whether any hit in this record came with hostile intent (not an accident).
    pub deliberate: bool,
}

impl AttackRecord {
    /// Merge another hit in, summing per affliction.
    pub fn merge(&mut self, kind: AfflictionKind, amount: f32, deliberate: bool) {
        *self.amounts.entry(kind).or_insert(0.0) += amount;
        self.deliberate |= deliberate;
    }

    /// Weighted total damage.
    pub fn damage(&self) -> f32 {
        self.amounts.iter().map(|(k, v)| k.weight() * v).sum()
    }
}

/// Inputs for deciding how an agent responds to an attacker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResponseInput {
    pub attacker_friendly: bool,
    /// Weighted damage in this batch.
    pub damage: f32,
    pub deliberate: bool,
    pub observer_is_security: bool,
    pub observer_armed: bool,
    pub observer_health_fraction: f32,
    /// The observer already holds an offensive combat objective.
    pub already_offensive: bool,
}

/// Pick a combat response.
pub fn derive_response(input: &ResponseInput, tuning: &ReactionTuning) -> CombatMode {
    if input.already_offensive {
        return CombatMode::Offensive;
    }

    if input.attacker_friendly {
        if input.damage < tuning.friendly_ignore_damage || !input.deliberate {
            return CombatMode::Ignore;
        }
        if input.observer_is_security {
            return CombatMode::Arrest;
        }
        if input.damage >= tuning.friendly_retaliate_damage
            && input.observer_armed
            && input.observer_health_fraction >= tuning.retreat_health_fraction
        {
            return CombatMode::Defensive;
        }
        return CombatMode::Retreat;
    }

    if input.observer_health_fraction < tuning.retreat_health_fraction {
        return CombatMode::Retreat;
    }
    if input.observer_armed || input.observer_is_security {
        CombatMode::Offensive
    } else {
        CombatMode::Retreat
    }
}

/// How a bystander responds when they witness friendly fire.
pub fn bystander_response(
    damage: f32,
    observer_is_security: bool,
    tuning: &ReactionTuning,
) -> CombatMode {
    if observer_is_security {
        CombatMode::Arrest
    } else if damage >= tuning.friendly_retaliate_damage {
        CombatMode::Retreat
    } else {
        CombatMode::Ignore
    }
}

/// Whether `threshold` was crossed going up between two readings.
pub fn crossed_upward(previous: f32, current: f32, threshold: f32) -> bool {
    previous < threshold && current >= threshold
}

/// A decaying misconduct tally.
///
/// [`add`](Self::add) reports each threshold the tally crosses on the way
/// up. Staying above a threshold never re-reports it; the tally has to decay
/// below it and climb back over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ThresholdAccumulator {
    value: f32,
}

impl ThresholdAccumulator {
    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn add(&mut self, amount: f32, thresholds: &[f32]) -> Vec<f32> {
        let previous = self.value;
        self.value = (self.value + amount.max(0.0)).max(0.0);
        thresholds
            .iter()
            .copied()
            .filter(|&t| crossed_upward(previous, self.value, t))
            .collect()
    }

    pub fn decay(&mut self, amount: f32) {
        self.value = (self.value - amount).max(0.0);
    }

    pub fn is_empty(&self) -> bool {
        self.value <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> ResponseInput {
        ResponseInput {
            attacker_friendly: false,
            damage: 10.0,
            deliberate: true,
            observer_is_security: false,
            observer_armed: true,
            observer_health_fraction: 1.0,
            already_offensive: false,
        }
    }

    #[test]
    fn test_enemy_attack_triggers_offense_when_armed() {
        let t = ReactionTuning::default();
        assert_eq!(derive_response(&input(), &t), CombatMode::Offensive);
        let unarmed = ResponseInput {
            observer_armed: false,
            ..input()
        };
        assert_eq!(derive_response(&unarmed, &t), CombatMode::Retreat);
        let hurt = ResponseInput {
            observer_health_fraction: 0.1,
            ..input()
        };
        assert_eq!(derive_response(&hurt, &t), CombatMode::Retreat);
    }

    #[test]
    fn test_friendly_fire_grades() {
        let t = ReactionTuning::default();
        let scratch = ResponseInput {
            attacker_friendly: true,
            damage: 1.0,
            ..input()
        };
        assert_eq!(derive_response(&scratch, &t), CombatMode::Ignore);

        let accident = ResponseInput {
            attacker_friendly: true,
            damage: 50.0,
            deliberate: false,
            ..input()
        };
        assert_eq!(derive_response(&accident, &t), CombatMode::Ignore);

        let assault = ResponseInput {
            attacker_friendly: true,
            damage: 30.0,
            ..input()
        };
        assert_eq!(derive_response(&assault, &t), CombatMode::Defensive);

        let guard = ResponseInput {
            observer_is_security: true,
            ..assault
        };
        assert_eq!(derive_response(&guard, &t), CombatMode::Arrest);
    }

    #[test]
    fn test_offensive_is_sticky() {
        let t = ReactionTuning::default();
        let friendly_scratch = ResponseInput {
            attacker_friendly: true,
            damage: 0.5,
            already_offensive: true,
            ..input()
        };
        assert_eq!(derive_response(&friendly_scratch, &t), CombatMode::Offensive);
        assert!(CombatMode::Offensive.is_protected());
        assert!(!CombatMode::Arrest.is_protected());
    }

    #[test]
    fn test_attack_record_merges_per_affliction() {
        let mut record = AttackRecord::default();
        record.merge(AfflictionKind::Blunt, 4.0, false);
        record.merge(AfflictionKind::Blunt, 6.0, true);
        record.merge(AfflictionKind::Stun, 10.0, false);
        assert_eq!(record.amounts.len(), 2);
        assert_eq!(record.amounts[&AfflictionKind::Blunt], 10.0);
        assert!(record.deliberate);
        assert!((record.damage() - 11.0).abs() < 1e-5);
    }

    #[test]
    fn test_threshold_crossing_is_edge_triggered() {
        let thresholds = [10.0, 50.0];
        let mut acc = ThresholdAccumulator::default();
        assert!(acc.add(5.0, &thresholds).is_empty());
        assert_eq!(acc.add(5.0, &thresholds), vec![10.0]);
        // Above the first threshold: no repeat
        assert!(acc.add(5.0, &thresholds).is_empty());
        // Jumping over both at once reports the remaining one
        assert_eq!(acc.add(100.0, &thresholds), vec![50.0]);

        acc.decay(200.0);
        assert!(acc.is_empty());
        assert_eq!(acc.add(60.0, &thresholds), vec![10.0, 50.0]);
    }

    #[test]
    fn test_crossed_upward() {
        assert!(crossed_upward(9.0, 10.0, 10.0));
        assert!(!crossed_upward(10.0, 12.0, 10.0));
        assert!(!crossed_upward(12.0, 8.0, 10.0));
    }

    #[test]
    fn test_bystander_response() {
        let t = ReactionTuning::default();
        assert_eq!(bystander_response(1.0, true, &t), CombatMode::Arrest);
        assert_eq!(bystander_response(40.0, false, &t), CombatMode::Retreat);
        assert_eq!(bystander_response(5.0, false, &t), CombatMode::Ignore);
    }
}
