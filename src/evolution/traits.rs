//! Evolvable traits and their per-horde state

use serde::{Deserialize, Serialize};

use crate::core::config::{EvolutionConfig, TraitConfig};
use crate::horde::state::StatBlock;

/// A named stat dimension that mutates independently
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TraitKind {
    Attack,
    Health,
    Defense,
    /// Seconds between evolution checks
    EvolutionRate,
    /// Multiplier applied when other traits mutate
    EvolutionStrength,
    BirthRate,
}

impl TraitKind {
    /// Check order. Strength mutates before birth rate within the same check.
    pub const ALL: [TraitKind; 6] = [
        TraitKind::Attack,
        TraitKind::Health,
        TraitKind::Defense,
        TraitKind::EvolutionRate,
        TraitKind::EvolutionStrength,
        TraitKind::BirthRate,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TraitKind::Attack => "attack",
            TraitKind::Health => "health",
            TraitKind::Defense => "defense",
            TraitKind::EvolutionRate => "evolution rate",
            TraitKind::EvolutionStrength => "evolution strength",
            TraitKind::BirthRate => "birth rate",
        }
    }

    /// Rate-style traits trend down toward their cap instead of up
    pub fn is_rate(&self) -> bool {
        matches!(self, TraitKind::EvolutionRate)
    }

    /// The stat block field this trait drives, if any
    pub fn stat_value(&self, stats: &StatBlock) -> Option<f64> {
        match self {
            TraitKind::Attack => Some(stats.damage),
            TraitKind::Health => Some(stats.health_per_unit),
            TraitKind::Defense => Some(stats.defense),
            TraitKind::BirthRate => Some(stats.birth_rate),
            TraitKind::EvolutionRate | TraitKind::EvolutionStrength => None,
        }
    }

    /// Write a mutated magnitude back into the stat block
    pub fn apply(&self, stats: &mut StatBlock, value: f64) {
        match self {
            TraitKind::Attack => stats.damage = value,
            TraitKind::Health => stats.health_per_unit = value,
            TraitKind::Defense => stats.defense = value,
            TraitKind::BirthRate => stats.birth_rate = value,
            TraitKind::EvolutionRate | TraitKind::EvolutionStrength => {}
        }
    }

    fn config<'a>(&self, config: &'a EvolutionConfig) -> &'a TraitConfig {
        match self {
            TraitKind::Attack => &config.attack,
            TraitKind::Health => &config.health,
            TraitKind::Defense => &config.defense,
            TraitKind::EvolutionRate => &config.evolution_rate,
            TraitKind::EvolutionStrength => &config.evolution_strength,
            TraitKind::BirthRate => &config.birth_rate,
        }
    }
}

impl std::fmt::Display for TraitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Acquisition chance, current magnitude and cap of one trait
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraitState {
    pub acquisition_chance: f64,
    pub magnitude: f64,
    pub cap: f64,
}

impl TraitState {
    pub fn new(acquisition_chance: f64, magnitude: f64, cap: f64) -> Self {
        Self {
            acquisition_chance,
            magnitude,
            cap,
        }
    }

    /// Whether the magnitude has reached its cap
    pub fn is_saturated(&self, rate: bool) -> bool {
        if rate {
            self.magnitude <= self.cap
        } else {
            self.magnitude >= self.cap
        }
    }
}

/// Every trait of one horde plus its evolution clock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraitTable {
    traits: [TraitState; 6],
    /// Seconds since the last check
    pub(crate) clock: f64,
}

impl TraitTable {
    /// Seed traits from config, reading stat-driven magnitudes from `stats`
    pub fn new(config: &EvolutionConfig, stats: &StatBlock) -> Self {
        let traits = TraitKind::ALL.map(|kind| {
            let cfg = kind.config(config);
            let magnitude = cfg
                .initial
                .or_else(|| kind.stat_value(stats))
                .unwrap_or(1.0);
            TraitState::new(cfg.chance, magnitude, cfg.cap)
        });

        Self { traits, clock: 0.0 }
    }

    pub fn get(&self, kind: TraitKind) -> &TraitState {
        &self.traits[Self::index(kind)]
    }

    pub fn get_mut(&mut self, kind: TraitKind) -> &mut TraitState {
        &mut self.traits[Self::index(kind)]
    }

    /// Seconds between checks
    pub fn check_interval(&self) -> f64 {
        self.get(TraitKind::EvolutionRate).magnitude
    }

    /// Current multiplier for non-rate mutations
    pub fn strength(&self) -> f64 {
        self.get(TraitKind::EvolutionStrength).magnitude
    }

    pub fn clock(&self) -> f64 {
        self.clock
    }

    /// Copy for a newly split horde; the clock starts over
    pub fn offspring(&self) -> Self {
        Self {
            traits: self.traits,
            clock: 0.0,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (TraitKind, &TraitState)> {
        TraitKind::ALL.iter().copied().zip(self.traits.iter())
    }

    fn index(kind: TraitKind) -> usize {
        match kind {
            TraitKind::Attack => 0,
            TraitKind::Health => 1,
            TraitKind::Defense => 2,
            TraitKind::EvolutionRate => 3,
            TraitKind::EvolutionStrength => 4,
            TraitKind::BirthRate => 5,
        }
    }
}
