//! Evolution integration tests
//!
//! Trait checks over long runs: chances compound, magnitudes saturate,
//! stat blocks follow mutations and humans hear about them.

use horde_sim::core::config::{EvolutionConfig, PopulationConfig, SimulationConfig, TraitConfig};
use horde_sim::core::types::{Color, Vec2};
use horde_sim::evolution::{apply_mutations, EvolutionEngine, TraitKind, TraitState, TraitTable};
use horde_sim::horde::StatBlock;
use horde_sim::notify::SharedLog;
use horde_sim::player::PlayerKind;
use horde_sim::simulation::{run_simulation_tick, SimulationEvent, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn certain(cap: f64, initial: Option<f64>) -> TraitConfig {
    TraitConfig::new(1.0, cap, initial)
}

#[test]
fn test_attack_mutation_compounds_chance_and_respects_cap() {
    // chance 0.05, magnitude 0.5, cap 2.0
    let stats = StatBlock::from_config(&PopulationConfig::default());
    let mut table = TraitTable::new(&EvolutionConfig::default(), &stats);
    *table.get_mut(TraitKind::Attack) = TraitState::new(0.05, 0.5, 2.0);
    let engine = EvolutionEngine::new(&EvolutionConfig::default());
    let mut rng = ChaCha8Rng::seed_from_u64(99);

    let mut first = None;
    for _ in 0..10_000 {
        let before = *table.get(TraitKind::Attack);
        let mutations = engine.check(&mut table, &mut rng);
        let after = *table.get(TraitKind::Attack);

        assert!(after.acquisition_chance >= before.acquisition_chance);
        assert!(after.magnitude <= 2.0);
        if first.is_none() && mutations.iter().any(|m| m.kind == TraitKind::Attack) {
            first = Some((before, after));
        }
    }

    let (before, after) = first.expect("attack should mutate at least once");
    assert!((before.acquisition_chance - 0.05).abs() < 1e-12);
    assert!((after.acquisition_chance - 0.0505).abs() < 1e-12);
    assert!(after.magnitude > before.magnitude);
    assert_eq!(table.get(TraitKind::Attack).magnitude, 2.0);
}

#[test]
fn test_evolution_rate_mutation_resets_interval_to_one() {
    let config = EvolutionConfig {
        evolution_rate: certain(0.5, Some(2.0)),
        evolution_strength: certain(1.3, Some(1.2)),
        ..EvolutionConfig::default()
    };
    let stats = StatBlock::from_config(&PopulationConfig::default());
    let mut table = TraitTable::new(&config, &stats);
    let engine = EvolutionEngine::new(&config);
    let mut rng = ChaCha8Rng::seed_from_u64(5);

    let mut intervals = vec![table.check_interval()];
    for _ in 0..30 {
        engine.check(&mut table, &mut rng);
        intervals.push(table.check_interval());
    }

    assert_eq!(intervals[0], 2.0);
    assert!(intervals[1..].iter().all(|&i| i == 1.0));
}

#[test]
fn test_mutations_flow_into_stat_block() {
    let config = EvolutionConfig {
        defense: certain(2.5, None),
        ..EvolutionConfig::default()
    };
    let mut stats = StatBlock::from_config(&PopulationConfig::default());
    let mut table = TraitTable::new(&config, &stats);
    let engine = EvolutionEngine::new(&config);
    let mut rng = ChaCha8Rng::seed_from_u64(1);

    let mutations = engine.check(&mut table, &mut rng);
    apply_mutations(&mut stats, &mutations);

    let defense = mutations
        .iter()
        .find(|m| m.kind == TraitKind::Defense)
        .expect("certain trait always mutates");
    assert_eq!(stats.defense, defense.value);
    assert!(stats.defense > 1.0);
}

#[test]
fn test_human_players_hear_about_mutations() {
    let mut config = SimulationConfig::default();
    config.evolution.attack = certain(2.0, None);
    config.evolution.evolution_rate = TraitConfig::new(0.0, 0.5, Some(0.05));

    let log = SharedLog::default();
    let mut world = World::new(config).with_sink(log.clone());
    let human = world.add_player(PlayerKind::Human, Color::GREEN, Vec2::default());
    let bot = world.add_player(PlayerKind::Bot, Color::RED, Vec2::new(100.0, 0.0));
    let h = world.spawn_horde(human, Vec2::default()).unwrap();
    world.spawn_horde(bot, Vec2::new(100.0, 0.0)).unwrap();

    let mut mutated = 0;
    for _ in 0..30 {
        for event in run_simulation_tick(&mut world) {
            if let SimulationEvent::Mutated { mutation, .. } = event {
                if mutation.kind == TraitKind::Attack {
                    mutated += 1;
                }
            }
        }
    }

    assert!(mutated >= 2, "both hordes should have mutated attack");
    let entries = log.lock().unwrap().drain();
    assert_eq!(entries[0].message, "A horde's attack has improved by 2%.");
    assert_eq!(entries[0].color, Color::GREEN);
    assert!(entries.iter().all(|n| n.color == Color::GREEN));
    assert!(entries.iter().all(|n| n.message.starts_with("A horde's ")));
    assert!(world.horde(h).unwrap().state.stats.damage > 0.5);
}
