//! Simulation configuration with documented constants
//!
//! All magic numbers are collected here with explanations of their purpose
//! and how they interact with each other. The config is loaded once by the
//! driver and handed to each engine explicitly.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{HordeError, Result};

/// Configuration for the simulation systems
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seed for the world RNG. Per-horde streams are derived from it.
    pub seed: u64,

    /// Simulated seconds covered by one tick
    ///
    /// Only the evolution clock and ability durations are measured in
    /// seconds; population and combat advance once per tick regardless.
    pub seconds_per_tick: f64,

    /// Minimum horde count before population advance runs in parallel
    ///
    /// Below this threshold, thread overhead exceeds benefits.
    pub parallel_threshold: usize,

    pub population: PopulationConfig,
    pub evolution: EvolutionConfig,
    pub combat: CombatConfig,
    pub ability: PlagueConfig,
    pub player: PlayerConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 12345,
            seconds_per_tick: 1.0 / 60.0,
            parallel_threshold: 256,
            population: PopulationConfig::default(),
            evolution: EvolutionConfig::default(),
            combat: CombatConfig::default(),
            ability: PlagueConfig::default(),
            player: PlayerConfig::default(),
        }
    }
}

/// Population engine tuning and starting stats for new hordes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    /// Units a freshly spawned horde starts with. Also the split floor.
    pub initial_population: u32,

    /// Soft population limit
    ///
    /// Growth and decline probabilities are scaled by
    /// `pop_max / (pop + pop_max)`, so a horde at `pop_max` units only
    /// grows at half its base rate.
    pub pop_max: u32,

    /// Largest population change a single tick can produce
    pub max_growth_per_tick: u32,

    /// Base per-tick birth probability
    pub birth_rate: f64,

    /// Base per-tick death probability
    pub death_rate: f64,

    /// Health carried by one unit
    pub health_per_unit: f64,

    /// Damage dealt per tick to the engaged enemy
    pub damage: f64,

    /// Evolved damage divisor (1.0 = no reduction)
    pub defense: f64,

    /// Ability-controlled damage divisor (1.0 = unaffected)
    pub damage_reduction_mult: f64,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            initial_population: 5,
            pop_max: 1000,
            max_growth_per_tick: 1,
            birth_rate: 0.01,
            death_rate: 0.005,
            health_per_unit: 5.0,
            damage: 0.5,
            defense: 1.0,
            damage_reduction_mult: 1.0,
        }
    }
}

/// Starting values for a single evolvable trait
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TraitConfig {
    /// Starting acquisition chance per check
    pub chance: f64,
    /// Magnitude ceiling (a floor for the rate-style traits)
    pub cap: f64,
    /// Starting magnitude. `None` reads it from the horde's stat block.
    #[serde(default)]
    pub initial: Option<f64>,
}

impl TraitConfig {
    pub fn new(chance: f64, cap: f64, initial: Option<f64>) -> Self {
        Self { chance, cap, initial }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    /// Multiplier applied to a trait's acquisition chance each time it mutates
    ///
    /// At 1.01 a trait that has mutated 70 times is roughly twice as likely
    /// to mutate again as it was at spawn.
    pub predisposition_strength: f64,

    pub attack: TraitConfig,
    pub health: TraitConfig,
    pub defense: TraitConfig,
    /// Seconds between evolution checks. Trends down toward its cap.
    pub evolution_rate: TraitConfig,
    /// Multiplier applied to other traits when they mutate
    pub evolution_strength: TraitConfig,
    pub birth_rate: TraitConfig,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            predisposition_strength: 1.01,
            attack: TraitConfig::new(0.05, 2.0, None),
            health: TraitConfig::new(0.05, 20.0, None),
            defense: TraitConfig::new(0.05, 2.5, None),
            evolution_rate: TraitConfig::new(0.025, 0.5, Some(2.0)),
            evolution_strength: TraitConfig::new(0.03, 1.3, Some(1.02)),
            birth_rate: TraitConfig::new(0.02, 0.1, None),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Fraction of join-time health below which a horde retreats
    pub retreat_fraction: f64,

    /// Maximum distinct players in one session
    pub max_participants: usize,

    /// Maximum hordes a single player can commit to one session
    pub max_hordes_per_participant: usize,

    /// Footprint radius of a single unit (world units)
    ///
    /// A horde's footprint radius is `unit_radius * sqrt(alive_units)`;
    /// two hordes exchange damage when their footprints touch.
    pub unit_radius: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            retreat_fraction: 0.2,
            max_participants: 6,
            max_hordes_per_participant: 5,
            unit_radius: 0.5,
        }
    }
}

/// The plague ability: a debuff on nearby enemies paid for with own health
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlagueConfig {
    /// Range around the caster (world units)
    pub radius: f32,
    /// Multiplier applied to each affected enemy's damage reduction
    pub enemy_multiplier: f64,
    /// Fraction of the caster's health kept after casting
    pub caster_health_fraction: f64,
    /// Seconds until the debuff wears off
    pub duration_secs: f64,
}

impl Default for PlagueConfig {
    fn default() -> Self {
        Self {
            radius: 5.0,
            enemy_multiplier: 0.7,
            caster_health_fraction: 0.7,
            duration_secs: 30.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Resources a player starts with
    pub starting_resources: f64,
    /// Resources gained per tick
    pub resource_income: f64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            starting_resources: 10.0,
            resource_income: 0.05,
        }
    }
}

impl SimulationConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML. Missing sections fall back to defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a TOML file on disk
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let p = &self.population;
        if p.initial_population == 0 {
            return Err(HordeError::InvalidConfig(
                "initial_population must be at least 1".into(),
            ));
        }
        if p.max_growth_per_tick == 0 {
            return Err(HordeError::InvalidConfig(
                "max_growth_per_tick must be at least 1".into(),
            ));
        }
        if p.health_per_unit <= 0.0 {
            return Err(HordeError::InvalidConfig(format!(
                "health_per_unit ({}) must be positive",
                p.health_per_unit
            )));
        }
        if p.defense <= 0.0 || p.damage_reduction_mult <= 0.0 {
            return Err(HordeError::InvalidConfig(
                "defense and damage_reduction_mult must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&p.birth_rate) || !(0.0..=1.0).contains(&p.death_rate) {
            return Err(HordeError::InvalidConfig(
                "birth_rate and death_rate must be probabilities".into(),
            ));
        }

        if self.evolution.predisposition_strength < 1.0 {
            return Err(HordeError::InvalidConfig(format!(
                "predisposition_strength ({}) must be >= 1.0",
                self.evolution.predisposition_strength
            )));
        }

        let c = &self.combat;
        if !(0.0..1.0).contains(&c.retreat_fraction) {
            return Err(HordeError::InvalidConfig(format!(
                "retreat_fraction ({}) must be in [0, 1)",
                c.retreat_fraction
            )));
        }
        if c.max_participants < 2 || c.max_hordes_per_participant == 0 {
            return Err(HordeError::InvalidConfig(
                "combat needs room for two players with at least one horde each".into(),
            ));
        }

        if self.ability.enemy_multiplier <= 0.0 {
            return Err(HordeError::InvalidConfig(
                "enemy_multiplier must be positive so the debuff can be reverted".into(),
            ));
        }

        if self.seconds_per_tick <= 0.0 {
            return Err(HordeError::InvalidConfig(
                "seconds_per_tick must be positive".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let toml = r#"
            seed = 7

            [population]
            birth_rate = 0.02

            [evolution.attack]
            chance = 0.1
            cap = 3.0
        "#;
        let config = SimulationConfig::from_toml_str(toml).expect("valid config");
        assert_eq!(config.seed, 7);
        assert_eq!(config.population.birth_rate, 0.02);
        assert_eq!(config.population.death_rate, 0.005);
        assert_eq!(config.evolution.attack.cap, 3.0);
        assert!(config.evolution.attack.initial.is_none());
        assert_eq!(config.combat.max_participants, 6);
    }

    #[test]
    fn test_invalid_retreat_fraction_rejected() {
        let toml = r#"
            [combat]
            retreat_fraction = 1.5
        "#;
        let err = SimulationConfig::from_toml_str(toml).unwrap_err();
        assert!(matches!(err, HordeError::InvalidConfig(_)));
    }

    #[test]
    fn test_malformed_toml_is_error() {
        let err = SimulationConfig::from_toml_str("seed = [").unwrap_err();
        assert!(matches!(err, HordeError::TomlError(_)));
    }
}
