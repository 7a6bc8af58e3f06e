//! Tick system - orchestrates simulation updates
//!
//! combat (engagement, then resolution) -> population -> evolution ->
//! effect expiry -> player income
//!
//! Hordes that are fighting skip the population step, and every phase only
//! touches entities this process is authoritative for. Uses rayon for the
//! population pass once there are enough hordes to pay for it.

use ahash::{AHashMap, AHashSet};
use rayon::prelude::*;

use crate::ability::expire_effects;
use crate::combat::{exchange_damage, CombatPhase, EntityView};
use crate::command::EntityRef;
use crate::core::types::{Color, HordeId, PlayerId, SessionId};
use crate::evolution::apply_mutations;
use crate::horde::Horde;
use crate::player::ResourceProvider;
use crate::population::PopulationStep;
use crate::simulation::events::SimulationEvent;
use crate::simulation::world::World;

/// Run a single simulation tick
///
/// Returns everything that happened since the previous tick, including
/// events from operations invoked between ticks.
pub fn run_simulation_tick(world: &mut World) -> Vec<SimulationEvent> {
    run_combat(world);
    advance_populations(world);
    advance_evolution(world);
    expire_effects(world);
    accrue_resources(world);

    world.tick();
    world.drain_events()
}

/// Exchange damage and resolve every open session, then drop closed ones
fn run_combat(world: &mut World) {
    let unit_radius = world.config.combat.unit_radius;
    let session_ids: Vec<SessionId> = world.sessions.keys().copied().collect();

    for id in session_ids {
        let commands = match world.sessions.get(&id) {
            Some(session) if session.phase() == CombatPhase::Active => {
                exchange_damage(session, &world.view(), unit_radius)
            }
            _ => continue,
        };
        world.dispatch_all(commands);

        let view = EntityView {
            hordes: &world.hordes,
            objectives: &world.objectives,
        };
        let Some(session) = world.sessions.get_mut(&id) else {
            continue;
        };

        match session.resolve(&view) {
            Ok(resolution) => {
                for &horde in &resolution.retreated {
                    world
                        .events
                        .push(SimulationEvent::HordeRetreated { horde, session: id });
                }
                for &player in &resolution.eliminated {
                    world
                        .events
                        .push(SimulationEvent::PlayerEliminated { player, session: id });
                }
                if let Some(outcome) = resolution.outcome {
                    if let (true, Some(objective)) = (outcome.captured, outcome.objective) {
                        world.events.push(SimulationEvent::ObjectiveCaptured {
                            objective,
                            player: outcome.winner,
                        });
                    }
                    world
                        .events
                        .push(SimulationEvent::CombatEnded { session: id, outcome });
                }
                world.dispatch_all(resolution.commands);
            }
            Err(e) => {
                tracing::error!("Combat {:?} failed to resolve: {}", id, e);
                world.events.push(SimulationEvent::Fatal {
                    tick: world.current_tick,
                    message: e.to_string(),
                });
            }
        }
    }

    world
        .sessions
        .retain(|_, session| session.phase() != CombatPhase::Closed);
}

/// One Markov step for every local horde that is not fighting (PARALLEL when beneficial)
fn advance_populations(world: &mut World) {
    let fighting: AHashSet<HordeId> = world
        .sessions
        .values()
        .flat_map(|s| s.hordes().map(|(_, h)| h))
        .collect();
    let resources: AHashMap<PlayerId, f64> = world
        .players
        .values()
        .map(|p| (p.id, p.current_resource_amount()))
        .collect();
    let threshold = world.config.parallel_threshold;
    let authority = &world.authority;
    let engine = &world.population;

    let mut batch: Vec<(&mut Horde, f64)> = world
        .hordes
        .values_mut()
        .filter(|h| !fighting.contains(&h.id))
        .filter(|h| authority.is_local(EntityRef::Horde(h.id), Some(h.owner())))
        .map(|h| {
            let resource = resources.get(&h.owner()).copied().unwrap_or(0.0);
            (h, resource)
        })
        .collect();

    let step = |(horde, resource): &mut (&mut Horde, f64)| -> (HordeId, PopulationStep) {
        let h = &mut **horde;
        (h.id, engine.step(&mut h.state, *resource, &mut h.rng))
    };

    let steps: Vec<(HordeId, PopulationStep)> = if batch.len() >= threshold {
        batch.par_iter_mut().map(step).collect()
    } else {
        batch.iter_mut().map(step).collect()
    };

    for (horde, step) in steps.into_iter().filter(|(_, s)| s.changed()) {
        tracing::trace!("Horde {:?}: {} -> {} units", horde, step.from, step.to);
        world.events.push(SimulationEvent::PopulationChanged {
            horde,
            from: step.from,
            to: step.to,
        });
    }
}

/// Advance every local horde's evolution clock and apply mutations
fn advance_evolution(world: &mut World) {
    let elapsed = world.config.seconds_per_tick;
    let mut announcements: Vec<(PlayerId, String)> = Vec::new();

    for horde in world.hordes.values_mut() {
        if !world
            .authority
            .is_local(EntityRef::Horde(horde.id), Some(horde.owner()))
        {
            continue;
        }

        let mutations = world
            .evolution
            .tick(&mut horde.traits, elapsed, &mut horde.rng);
        if mutations.is_empty() {
            continue;
        }
        apply_mutations(&mut horde.state.stats, &mutations);

        for mutation in mutations {
            tracing::debug!(
                "Horde {:?} {}: {:.3} -> {:.3}",
                horde.id,
                mutation.kind,
                mutation.previous,
                mutation.value
            );
            announcements.push((horde.owner(), mutation.describe()));
            world.events.push(SimulationEvent::Mutated {
                horde: horde.id,
                mutation,
            });
        }
    }

    // Announced in the horde's own color
    for (owner, message) in announcements {
        let color = world
            .players
            .get(&owner)
            .map_or(Color::WHITE, |p| p.color);
        world.notify(owner, &message, color);
    }
}

fn accrue_resources(world: &mut World) {
    for player in world.players.values_mut() {
        if world
            .authority
            .is_local(EntityRef::Player(player.id), Some(player.id))
        {
            player.accrue();
        }
    }
}
