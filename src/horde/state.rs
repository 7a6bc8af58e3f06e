//! HordeState - the per-horde record every engine reads and writes
//!
//! A horde is a single health pool. The alive-unit count is derived from
//! it on demand and never stored, so health changes from combat, population
//! and abilities can never disagree about how many units exist.

use serde::{Deserialize, Serialize};

use crate::core::config::PopulationConfig;
use crate::core::types::PlayerId;
use crate::population::matrix::TransitionMatrix;

/// Combat and growth statistics of a horde
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatBlock {
    /// Base per-tick birth probability
    pub birth_rate: f64,
    /// Base per-tick death probability
    pub death_rate: f64,
    /// Health carried by one unit
    pub health_per_unit: f64,
    /// Damage dealt per tick to the engaged enemy
    pub damage: f64,
    /// Evolved damage divisor
    pub defense: f64,
    /// Ability-controlled damage divisor
    pub damage_reduction_mult: f64,
}

impl StatBlock {
    pub fn from_config(config: &PopulationConfig) -> Self {
        Self {
            birth_rate: config.birth_rate,
            death_rate: config.death_rate,
            health_per_unit: config.health_per_unit,
            damage: config.damage,
            defense: config.defense,
            damage_reduction_mult: config.damage_reduction_mult,
        }
    }

    /// Damage actually removed from this horde's pool for `raw` incoming damage
    pub fn mitigate(&self, raw: f64) -> f64 {
        let divisor = self.defense * self.damage_reduction_mult;
        if divisor > 0.0 {
            raw / divisor
        } else {
            raw
        }
    }
}

/// Per-horde simulation record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HordeState {
    total_health: f64,
    owner: PlayerId,
    pub stats: StatBlock,
    population_peak: u32,
    transition_matrix: TransitionMatrix,
    highest_health: f64,
}

impl HordeState {
    /// Spawn a horde with `config.initial_population` units
    pub fn new(owner: PlayerId, stats: StatBlock, config: &PopulationConfig) -> Self {
        Self::with_population(owner, stats, config, config.initial_population)
    }

    /// Spawn a horde with a specific unit count
    ///
    /// The transition matrix always covers at least the initial population,
    /// so small hordes produced by splitting share the same starting rows.
    pub fn with_population(
        owner: PlayerId,
        stats: StatBlock,
        config: &PopulationConfig,
        units: u32,
    ) -> Self {
        let peak = units.max(config.initial_population).max(1);
        let transition_matrix = TransitionMatrix::generate(peak, &stats, config);
        let total_health = units as f64 * stats.health_per_unit;

        Self {
            total_health,
            owner,
            stats,
            population_peak: peak,
            transition_matrix,
            highest_health: total_health,
        }
    }

    pub fn owner(&self) -> PlayerId {
        self.owner
    }

    pub fn total_health(&self) -> f64 {
        self.total_health
    }

    /// Set the health pool, clamped at zero
    pub fn set_total_health(&mut self, health: f64) {
        self.total_health = health.max(0.0);
        self.highest_health = self.highest_health.max(self.total_health);
    }

    /// Number of living units, never less than one
    pub fn alive_units(&self) -> u32 {
        if self.stats.health_per_unit <= 0.0 {
            return 1;
        }
        let units = (self.total_health / self.stats.health_per_unit).ceil();
        (units as u32).max(1)
    }

    /// Apply incoming damage after mitigation, returning the health actually lost
    pub fn take_damage(&mut self, raw: f64) -> f64 {
        let before = self.total_health;
        self.set_total_health(before - self.stats.mitigate(raw));
        before - self.total_health
    }

    /// Highest unit count this horde has reached
    pub fn population_peak(&self) -> u32 {
        self.population_peak
    }

    /// Highest total health this horde has reached
    pub fn highest_health(&self) -> f64 {
        self.highest_health
    }

    pub fn transition_matrix(&self) -> &TransitionMatrix {
        &self.transition_matrix
    }

    /// Raise the peak to `population`, appending matrix rows for each new level
    ///
    /// Existing rows are never recomputed; new rows use the current rates.
    /// Shrink to `units` after a split
    ///
    /// The peak and highest health carry over; the transition matrix is
    /// rebuilt from the current stats at the same peak.
    pub(crate) fn shrink_for_split(&mut self, units: u32, config: &PopulationConfig) {
        self.transition_matrix = TransitionMatrix::generate(self.population_peak, &self.stats, config);
        self.set_total_health(units as f64 * self.stats.health_per_unit);
    }

    pub(crate) fn raise_peak(&mut self, population: u32, config: &PopulationConfig) {
        if population <= self.population_peak {
            return;
        }
        self.transition_matrix
            .extend_to(population, &self.stats, config);
        self.population_peak = population;
    }
}
