//! Evolution engine - incremental, irreversible trait mutation
//!
//! Each check rolls every trait independently. A successful roll makes the
//! trait more likely to mutate again and pushes its magnitude toward its cap.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::config::EvolutionConfig;
use crate::evolution::traits::{TraitKind, TraitTable};
use crate::horde::state::StatBlock;

/// One trait mutation produced by a check
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mutation {
    pub kind: TraitKind,
    pub previous: f64,
    pub value: f64,
    /// Evolution strength bonus in percent at the time of mutation
    pub strength_bonus: f64,
}

impl Mutation {
    /// Human-readable announcement
    pub fn describe(&self) -> String {
        format!(
            "A horde's {} has improved by {}%.",
            self.kind.name(),
            self.strength_bonus
        )
    }
}

#[derive(Debug, Clone)]
pub struct EvolutionEngine {
    predisposition_strength: f64,
}

impl EvolutionEngine {
    pub fn new(config: &EvolutionConfig) -> Self {
        Self {
            predisposition_strength: config.predisposition_strength,
        }
    }

    /// Advance the horde's evolution clock by `elapsed` seconds
    ///
    /// Runs a check once the clock passes the current evolution-rate
    /// interval, then restarts the clock.
    pub fn tick<R: Rng + ?Sized>(
        &self,
        table: &mut TraitTable,
        elapsed: f64,
        rng: &mut R,
    ) -> Vec<Mutation> {
        table.clock += elapsed.max(0.0);
        if table.clock <= table.check_interval() {
            return Vec::new();
        }

        table.clock = 0.0;
        self.check(table, rng)
    }

    /// Roll every trait once
    pub fn check<R: Rng + ?Sized>(&self, table: &mut TraitTable, rng: &mut R) -> Vec<Mutation> {
        let mut mutations = Vec::new();

        for kind in TraitKind::ALL {
            let roll: f64 = rng.gen();
            let state = *table.get(kind);
            if roll >= state.acquisition_chance || state.is_saturated(kind.is_rate()) {
                continue;
            }

            let value = if kind.is_rate() {
                rate_step(state.magnitude, state.cap)
            } else {
                (state.magnitude * table.strength()).min(state.cap)
            };

            let entry = table.get_mut(kind);
            entry.acquisition_chance *= self.predisposition_strength;
            entry.magnitude = value;

            mutations.push(Mutation {
                kind,
                previous: state.magnitude,
                value,
                strength_bonus: round2(table.strength() * 100.0 - 100.0),
            });
        }

        mutations
    }
}

/// Write stat-driving mutations into the horde's stat block
pub fn apply_mutations(stats: &mut StatBlock, mutations: &[Mutation]) {
    for mutation in mutations {
        mutation.kind.apply(stats, mutation.value);
    }
}

/// A rate mutation divides the magnitude by itself, floored at the cap
fn rate_step(magnitude: f64, cap: f64) -> f64 {
    if magnitude > 0.0 {
        (magnitude / magnitude).max(cap)
    } else {
        cap
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
