//! Property-based tests for the population chain and the combat arbiter.

use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use horde_sim::combat::{CombatSession, EntityView};
use horde_sim::core::config::{PopulationConfig, SimulationConfig};
use horde_sim::core::types::{HordeId, PlayerId, SessionId, Vec2};
use horde_sim::horde::{Horde, HordeState, StatBlock};
use horde_sim::population::{PopulationEngine, TransitionMatrix};
use std::collections::BTreeMap;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Every row of every generated matrix is a probability distribution.
    #[test]
    fn prop_rows_sum_to_one(
        birth in 0.0f64..1.0,
        death in 0.0f64..1.0,
        max_growth in 1u32..4,
        peak in 1u32..300,
    ) {
        let config = PopulationConfig {
            birth_rate: birth,
            death_rate: death,
            max_growth_per_tick: max_growth,
            ..PopulationConfig::default()
        };
        let stats = StatBlock::from_config(&config);
        let matrix = TransitionMatrix::generate(peak, &stats, &config);

        prop_assert_eq!(matrix.len(), peak as usize);
        for row in matrix.rows() {
            prop_assert_eq!(row.len(), (max_growth * 2 + 1) as usize);
            prop_assert!(row.iter().all(|&p| p >= 0.0));
            let sum: f64 = row.iter().sum();
            prop_assert!((sum - 1.0).abs() < 1e-9, "row sums to {}", sum);
        }
    }

    /// Health stays non-negative, at least one unit is alive, the peak never drops.
    #[test]
    fn prop_population_steps_keep_invariants(
        seed in any::<u64>(),
        resource in 0.0f64..500.0,
        start in 1u32..60,
    ) {
        let config = PopulationConfig {
            birth_rate: 0.2,
            death_rate: 0.2,
            ..PopulationConfig::default()
        };
        let engine = PopulationEngine::new(config.clone());
        let stats = StatBlock::from_config(&config);
        let mut state = HordeState::with_population(PlayerId(0), stats, &config, start);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let mut peak = state.population_peak();
        for _ in 0..200 {
            let step = engine.step(&mut state, resource, &mut rng);
            prop_assert!(step.from.abs_diff(step.to) <= config.max_growth_per_tick);
            prop_assert!(state.total_health() >= 0.0);
            prop_assert!(state.alive_units() >= 1);
            prop_assert!(state.population_peak() >= peak);
            prop_assert_eq!(state.transition_matrix().len(), state.population_peak() as usize);
            peak = state.population_peak();
        }
    }

    /// A resolution step never takes a session from N > 0 players to zero.
    #[test]
    fn prop_resolution_never_empties_session(
        healths in prop::collection::vec((0u32..4, 0.0f64..100.0), 2..12),
    ) {
        let config = SimulationConfig::default();
        let mut hordes = BTreeMap::new();
        let mut session = CombatSession::new(SessionId(0), &config.combat);

        for (i, &(owner, _)) in healths.iter().enumerate() {
            let id = HordeId(i as u32);
            let horde = Horde::new(id, PlayerId(owner), Vec2::default(), Vec2::default(), &config);
            let _ = session.add_participant(id, PlayerId(owner), 100.0, i == 0);
            hordes.insert(id, horde);
        }
        for (i, &(_, health)) in healths.iter().enumerate() {
            if let Some(h) = hordes.get_mut(&HordeId(i as u32)) {
                h.state.set_total_health(health);
            }
        }

        let objectives = BTreeMap::new();
        let view = EntityView { hordes: &hordes, objectives: &objectives };
        let before = session.player_count();
        match session.resolve(&view) {
            Ok(resolution) => {
                prop_assert!(before == 0 || session.player_count() > 0 || resolution.outcome.is_some());
                if resolution.outcome.is_some() {
                    prop_assert!(session.is_empty());
                }
            }
            Err(e) => {
                prop_assert!(e.is_fatal());
                prop_assert_eq!(session.player_count(), before);
            }
        }
    }
}
