//! Theft and sabotage tallies.
//!
//! Every reported act adds to a decaying per-violator tally. Crossing the
//! warning line gets the violator told off; crossing the intervention line
//! sends security after them. Each line fires once per crossing.

use std::collections::HashMap;

use hecs::Entity;
use log::info;
use subcrew_logic::config::ReactionTuning;
use subcrew_logic::threat::ThresholdAccumulator;

use crate::events::HostileAct;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escalation {
    Warning,
    Intervention,
}

fn thresholds(act: HostileAct, tuning: &ReactionTuning) -> Option<(f32, f32)> {
    match act {
        HostileAct::Theft => Some((tuning.theft_warning_threshold, tuning.theft_intervention_threshold)),
        HostileAct::Sabotage => Some((
            tuning.sabotage_warning_threshold,
            tuning.sabotage_intervention_threshold,
        )),
        HostileAct::Assault => None,
    }
}

#[derive(Debug, Clone, Default)]
pub struct ViolationLedger {
    tallies: HashMap<(Entity, HostileAct), ThresholdAccumulator>,
}

impl ViolationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `amount` to the violator's tally and report the lines it crossed.
    pub fn record(&mut self, violator: Entity, act: HostileAct, amount: f32, tuning: &ReactionTuning) -> Vec<Escalation> {
        let Some((warning, intervention)) = thresholds(act, tuning) else {
            return Vec::new();
        };
        let tally = self.tallies.entry((violator, act)).or_default();
        let crossed = tally.add(amount, &[warning, intervention]);
        let escalations: Vec<Escalation> = crossed
            .into_iter()
            .map(|t| {
                if t == intervention {
                    Escalation::Intervention
                } else {
                    Escalation::Warning
                }
            })
            .collect();
        for escalation in &escalations {
            info!("{act:?} by {violator:?} reached {escalation:?} ({:.1})", tally.value());
        }
        escalations
    }

    pub fn value(&self, violator: Entity, act: HostileAct) -> f32 {
        self.tallies
            .get(&(violator, act))
            .map_or(0.0, ThresholdAccumulator::value)
    }

    pub fn decay(&mut self, dt: f32, tuning: &ReactionTuning) {
        let amount = tuning.violation_decay_per_second * dt;
        for tally in self.tallies.values_mut() {
            tally.decay(amount);
        }
        self.tallies.retain(|_, t| !t.is_empty());
    }

    pub fn forget(&mut self, entity: Entity) {
        self.tallies.retain(|(violator, _), _| *violator != entity);
    }

    pub fn is_empty(&self) -> bool {
        self.tallies.is_empty()
    }
}
