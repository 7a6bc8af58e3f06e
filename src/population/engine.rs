//! Population engine - one Markov step per horde per tick
//!
//! Looks up the transition row for the horde's current population, weights
//! it by the owner's resources, and samples the next population level.

use rand::Rng;

use crate::core::config::PopulationConfig;
use crate::horde::state::HordeState;
use crate::population::matrix::normalize;
use crate::population::resource::{decline_weight, growth_weight};

/// Result of one population step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopulationStep {
    pub from: u32,
    pub to: u32,
    pub new_total_health: f64,
}

impl PopulationStep {
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

#[derive(Debug, Clone)]
pub struct PopulationEngine {
    config: PopulationConfig,
}

impl PopulationEngine {
    pub fn new(config: PopulationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PopulationConfig {
        &self.config
    }

    /// Advance the horde one tick and return its new total health
    ///
    /// Must not be called while the horde is fighting; the tick driver is
    /// responsible for suspending it.
    pub fn advance<R: Rng + ?Sized>(
        &self,
        state: &mut HordeState,
        resource_available: f64,
        rng: &mut R,
    ) -> f64 {
        self.step(state, resource_available, rng).new_total_health
    }

    /// Advance the horde one tick, reporting the population transition
    pub fn step<R: Rng + ?Sized>(
        &self,
        state: &mut HordeState,
        resource_available: f64,
        rng: &mut R,
    ) -> PopulationStep {
        let alive = state.alive_units();
        if alive > state.population_peak() {
            state.raise_peak(alive, &self.config);
        }

        let probabilities = self.weighted_row(state, alive, resource_available);
        let center = state.transition_matrix().center();
        let selected = sample_index(&probabilities, rng);

        let next = (alive as i64 + selected as i64 - center as i64).max(0);
        let new_total_health = next as f64 * state.stats.health_per_unit;
        state.set_total_health(new_total_health);

        PopulationStep {
            from: alive,
            to: next as u32,
            new_total_health: state.total_health(),
        }
    }

    /// Transition row for `alive` scaled by resource availability and re-normalized
    ///
    /// Works on a copy; the stored matrix rows always sum to 1.
    pub fn weighted_row(&self, state: &HordeState, alive: u32, resource_available: f64) -> Vec<f64> {
        let matrix = state.transition_matrix();
        let center = matrix.center();
        let mut row = match matrix.row(alive) {
            Some(row) => row.to_vec(),
            None => {
                tracing::warn!(
                    "No transition row for population {} (peak {}), holding steady",
                    alive,
                    state.population_peak()
                );
                let mut stay = vec![0.0; matrix.width()];
                stay[center] = 1.0;
                return stay;
            }
        };

        let growth = growth_weight(resource_available, alive);
        let decline = decline_weight(resource_available, alive);
        for (i, p) in row.iter_mut().enumerate() {
            if i > center {
                *p *= growth;
            } else if i < center {
                *p *= decline;
            }
        }

        normalize(&mut row);
        row
    }
}

/// Sample an index from a discrete distribution via its CDF
///
/// Draws uniformly in `[0, total)` and returns the smallest index whose
/// cumulative value is at least the draw.
pub fn sample_index<R: Rng + ?Sized>(probabilities: &[f64], rng: &mut R) -> usize {
    if probabilities.is_empty() {
        return 0;
    }

    let mut cumulative = 0.0;
    let cdf: Vec<f64> = probabilities
        .iter()
        .map(|p| {
            cumulative += p;
            cumulative
        })
        .collect();

    let draw = rng.gen::<f64>() * cumulative;
    let idx = cdf.partition_point(|&c| c < draw);
    idx.min(probabilities.len() - 1)
}
