//! Headless skirmish runner
//!
//! Spawns a few bot-controlled players with hordes and objectives, drives
//! them with a simple decision loop and prints a summary at the end.

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use rand::Rng;
use tracing_subscriber::EnvFilter;

use horde_sim::ability::cast_plague;
use horde_sim::core::error::Result;
use horde_sim::core::types::{Color, HordeId, PlayerId, Vec2};
use horde_sim::core::SimulationConfig;
use horde_sim::horde::split_horde;
use horde_sim::player::PlayerKind;
use horde_sim::simulation::{run_simulation_tick, SimulationStats, SimulationSummary, World};

/// Headless horde skirmish
#[derive(Parser, Debug)]
#[command(name = "horde-sim")]
#[command(about = "Run a seeded horde skirmish and print the outcome")]
struct Args {
    /// TOML config file (defaults are used for anything missing)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Ticks to simulate
    #[arg(long, default_value_t = 36_000)]
    ticks: u64,

    /// Override the config seed
    #[arg(long)]
    seed: Option<u64>,

    /// Number of players (the first one is human)
    #[arg(long, default_value_t = 3)]
    players: u32,

    /// Hordes spawned for each player
    #[arg(long, default_value_t = 3)]
    hordes_per_player: u32,

    /// Print the full summary as JSON
    #[arg(long)]
    json: bool,
}

/// Ticks between bot decisions
const DECISION_INTERVAL: u64 = 300;

/// World units a horde covers per tick
const MOVE_SPEED: f32 = 0.05;

/// Distance between player bases and the map center
const BASE_DISTANCE: f32 = 40.0;

/// Log filter used when RUST_LOG is unset or unparseable
const DEFAULT_LOG_FILTER: &str = "horde_sim=info";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    config.validate()?;

    tracing::info!(
        "Horde skirmish: {} players x {} hordes, {} ticks, seed {}",
        args.players,
        args.hordes_per_player,
        args.ticks,
        config.seed
    );

    let mut world = World::new(config);
    setup_skirmish(&mut world, args.players.max(2), args.hordes_per_player.max(1))?;

    let mut stats = SimulationStats::default();
    let start = Instant::now();
    for _ in 0..args.ticks {
        if world.current_tick % DECISION_INTERVAL == 0 {
            decide(&mut world);
        }
        move_hordes(&mut world);
        let events = run_simulation_tick(&mut world);
        stats.record(&events);
    }

    let summary = SimulationSummary::new(&world, stats, start.elapsed());
    if args.json {
        println!("{}", summary.to_json());
    } else {
        println!("{}", summary.summary());
        for player in &summary.players {
            println!(
                "  {:?}: {} hordes, {} units, {:.1} resources",
                player.id, player.hordes, player.units, player.resources
            );
        }
    }
    Ok(())
}

fn log_filter(env: Option<&str>) -> EnvFilter {
    env.and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Players on a circle around a contested center objective, each with a home objective
fn setup_skirmish(world: &mut World, players: u32, hordes_per_player: u32) -> Result<()> {
    world.add_objective(Vec2::default(), None);

    for i in 0..players {
        let angle = i as f32 / players as f32 * std::f32::consts::TAU;
        let base = Vec2::new(angle.cos(), angle.sin()) * BASE_DISTANCE;
        let (kind, color) = if i == 0 {
            (PlayerKind::Human, Color::GREEN)
        } else {
            (PlayerKind::Bot, Color::RED)
        };

        let player = world.add_player(kind, color, base);
        let home = world.add_objective(base, Some(player));
        for _ in 0..hordes_per_player {
            let offset = Vec2::new(world.rng.gen_range(-3.0..3.0), world.rng.gen_range(-3.0..3.0));
            let horde = world.spawn_horde(player, base + offset)?;
            world.station(horde, home)?;
        }
    }
    Ok(())
}

/// Every player's idle hordes pick something to do
fn decide(world: &mut World) {
    let players: Vec<PlayerId> = world.players().map(|p| p.id).collect();

    for player in players {
        for horde in world.player_hordes(player) {
            if world.in_combat(horde).is_some() {
                if world.rng.gen_bool(0.05) {
                    log_failure(horde, "plague", cast_plague(world, horde).map(|_| ()));
                }
                continue;
            }

            let roll: f64 = world.rng.gen();
            let result = if roll < 0.1 {
                split_horde(world, horde, 0.5).map(|_| ())
            } else if roll < 0.4 {
                match nearest_enemy_objective(world, horde) {
                    Some(objective) => world.attack_objective(horde, objective).map(|_| ()),
                    None => Ok(()),
                }
            } else if roll < 0.6 {
                match nearest_enemy_horde(world, horde) {
                    Some(target) => world.attack_horde(horde, target).map(|_| ()),
                    None => Ok(()),
                }
            } else {
                Ok(())
            };
            log_failure(horde, "decision", result);
        }
    }
}

fn log_failure(horde: HordeId, what: &str, result: Result<()>) {
    if let Err(e) = result {
        tracing::debug!("Horde {:?} {} skipped: {}", horde, what, e);
    }
}

fn nearest_enemy_horde(world: &World, horde: HordeId) -> Option<HordeId> {
    let me = world.horde(horde)?;
    world
        .hordes()
        .filter(|h| h.owner() != me.owner())
        .min_by(|a, b| {
            let da = a.position.distance_squared(&me.position);
            let db = b.position.distance_squared(&me.position);
            da.total_cmp(&db)
        })
        .map(|h| h.id)
}

fn nearest_enemy_objective(world: &World, horde: HordeId) -> Option<horde_sim::core::ObjectiveId> {
    let me = world.horde(horde)?;
    world
        .objectives()
        .filter(|o| o.controller() != Some(me.owner()))
        .min_by(|a, b| {
            let da = a.position.distance_squared(&me.position);
            let db = b.position.distance_squared(&me.position);
            da.total_cmp(&db)
        })
        .map(|o| o.id)
}

/// Stand-in for the movement layer: walk every horde toward its target
fn move_hordes(world: &mut World) {
    let ids: Vec<HordeId> = world.hordes().map(|h| h.id).collect();
    for id in ids {
        if let Some(horde) = world.horde_mut(id) {
            let to_target = horde.target_location - horde.position;
            if to_target.length() <= MOVE_SPEED {
                horde.position = horde.target_location;
            } else {
                horde.position = horde.position + to_target.normalize() * MOVE_SPEED;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rust_log_overrides_default_filter() {
        assert_eq!(log_filter(Some("horde_sim=debug")).to_string(), "horde_sim=debug");
        assert_eq!(log_filter(None).to_string(), DEFAULT_LOG_FILTER);
    }
}
