//! Transition matrix for the population Markov chain
//!
//! Row `i` describes population level `i + 1`. Each row has
//! `2 * max_growth + 1` entries: index `max_growth` is "no change",
//! index `max_growth + k` is growth by `k` and index `max_growth - k` is
//! decline by `k`.

use serde::{Deserialize, Serialize};

use crate::core::config::PopulationConfig;
use crate::horde::state::StatBlock;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionMatrix {
    rows: Vec<Vec<f64>>,
    max_growth: usize,
}

impl TransitionMatrix {
    /// Build rows for population levels `1..=peak`
    pub fn generate(peak: u32, stats: &StatBlock, config: &PopulationConfig) -> Self {
        let max_growth = config.max_growth_per_tick.max(1) as usize;
        let weights = rescaled_weights(max_growth);
        let rows = (1..=peak)
            .map(|population| build_row(population, stats, config, &weights))
            .collect();

        Self { rows, max_growth }
    }

    /// Append rows until the matrix covers `peak` levels
    pub fn extend_to(&mut self, peak: u32, stats: &StatBlock, config: &PopulationConfig) {
        let weights = rescaled_weights(self.max_growth);
        while (self.rows.len() as u32) < peak {
            let population = self.rows.len() as u32 + 1;
            self.rows.push(build_row(population, stats, config, &weights));
        }
    }

    /// Probabilities for the given population level (1-based)
    pub fn row(&self, population: u32) -> Option<&[f64]> {
        let idx = (population as usize).checked_sub(1)?;
        self.rows.get(idx).map(Vec::as_slice)
    }

    /// Index of the "no change" entry in each row
    pub fn center(&self) -> usize {
        self.max_growth
    }

    /// Number of entries per row
    pub fn width(&self) -> usize {
        self.max_growth * 2 + 1
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.rows.iter().map(Vec::as_slice)
    }
}

/// Weights for each step size, largest for the smallest step, min-max rescaled to [0, 1]
///
/// With a single step size every weight is 1.
pub fn rescaled_weights(max_growth: usize) -> Vec<f64> {
    let raw: Vec<usize> = (1..=max_growth).rev().collect();
    let w_min = raw.iter().copied().min().unwrap_or(1);
    let w_max = raw.iter().copied().max().unwrap_or(1);

    raw.iter()
        .map(|&w| {
            if w_min == w_max {
                1.0
            } else {
                (w - w_min) as f64 / (w_max - w_min) as f64
            }
        })
        .collect()
}

/// Growth probability for a step with weight `weight` at `population`
///
/// Tapers off as population approaches the soft maximum.
pub fn growth_probability(birth_rate: f64, weight: f64, population: u32, pop_max: u32) -> f64 {
    birth_rate * weight * taper(population, pop_max)
}

/// Decline probability for a step with weight `weight` at `population`
pub fn decline_probability(death_rate: f64, weight: f64, population: u32, pop_max: u32) -> f64 {
    death_rate * weight * taper(population, pop_max)
}

fn taper(population: u32, pop_max: u32) -> f64 {
    pop_max as f64 / (population as f64 + pop_max as f64)
}

fn build_row(population: u32, stats: &StatBlock, config: &PopulationConfig, weights: &[f64]) -> Vec<f64> {
    let max_growth = weights.len();
    let mut row = vec![0.0; max_growth * 2 + 1];
    let mut delta = 0.0;

    for (j, &w) in weights.iter().enumerate() {
        let alpha = growth_probability(stats.birth_rate, w, population, config.pop_max);
        row[max_growth + j + 1] = alpha;
        delta += alpha;

        let beta = decline_probability(stats.death_rate, w, population, config.pop_max);
        row[max_growth - j - 1] = beta;
        delta += beta;
    }

    row[max_growth] = (1.0 - delta).max(0.0);
    normalize(&mut row);
    row
}

/// Scale a row so it sums to exactly 1. All-zero rows become "no change".
pub fn normalize(row: &mut [f64]) {
    let sum: f64 = row.iter().sum();
    if sum > 0.0 {
        let ratio = 1.0 / sum;
        for p in row.iter_mut() {
            *p *= ratio;
        }
    } else if !row.is_empty() {
        let center = row.len() / 2;
        row.fill(0.0);
        row[center] = 1.0;
    }
}
