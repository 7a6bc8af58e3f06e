//! Benchmarks for the population step and whole-world ticks.

#![allow(missing_docs)]

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use horde_sim::core::config::SimulationConfig;
use horde_sim::core::types::{Color, PlayerId, Vec2};
use horde_sim::horde::{HordeState, StatBlock};
use horde_sim::player::PlayerKind;
use horde_sim::population::PopulationEngine;
use horde_sim::simulation::{run_simulation_tick, World};

fn bench_population_step(c: &mut Criterion) {
    let config = SimulationConfig::default().population;
    let engine = PopulationEngine::new(config.clone());
    let stats = StatBlock::from_config(&config);
    let mut state = HordeState::with_population(PlayerId(0), stats, &config, 200);
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    c.bench_function("population_step_200_units", |b| {
        b.iter(|| black_box(engine.step(&mut state, black_box(100.0), &mut rng)));
    });
}

fn skirmish(hordes_per_player: u32) -> World {
    let mut world = World::new(SimulationConfig::default());
    for i in 0..4 {
        let base = Vec2::new(i as f32 * 100.0, 0.0);
        let player = world.add_player(PlayerKind::Bot, Color::RED, base);
        for j in 0..hordes_per_player {
            let _ = world.spawn_horde(player, base + Vec2::new(0.0, j as f32 * 5.0));
        }
    }
    world
}

fn bench_world_tick(c: &mut Criterion) {
    // Below and at the default parallel threshold
    for hordes in [8u32, 64] {
        let mut world = skirmish(hordes);
        c.bench_function(&format!("world_tick_{}_hordes", hordes * 4), |b| {
            b.iter(|| black_box(run_simulation_tick(&mut world)));
        });
    }
}

criterion_group!(benches, bench_population_step, bench_world_tick);
criterion_main!(benches);
