//! Splitting one horde into two

use crate::core::error::{HordeError, Result};
use crate::core::types::HordeId;
use crate::horde::state::HordeState;
use crate::horde::Horde;
use crate::simulation::events::SimulationEvent;
use crate::simulation::world::World;

/// Split off `fraction` of a horde's units into a new horde
///
/// Both halves keep the stat block and trait table, get fresh transition
/// matrices, and hold at least the initial population. The parent keeps its
/// population peak and highest health. Hordes in combat cannot split.
pub fn split_horde(world: &mut World, horde: HordeId, fraction: f64) -> Result<HordeId> {
    if !(fraction > 0.0 && fraction < 1.0) {
        return Err(HordeError::InvalidSplit(fraction));
    }
    if world.in_combat(horde).is_some() {
        return Err(HordeError::AlreadyInCombat(horde));
    }

    let config = world.config.population.clone();
    let seed = world.config.seed;
    let floor = config.initial_population;

    let parent = world.horde(horde).ok_or(HordeError::HordeNotFound(horde))?;
    let alive = parent.state.alive_units();
    if alive < floor * 2 {
        return Err(HordeError::HordeTooSmall {
            alive,
            minimum: floor * 2,
        });
    }

    let split_off = ((alive as f64 * fraction) as u32).clamp(floor, alive - floor);
    let kept = alive - split_off;

    let owner = parent.owner();
    let stats = parent.state.stats;
    let traits = parent.traits.offspring();
    let (position, rally) = (parent.position, parent.rally_point);

    let child_id = world.next_horde_id();
    let child = Horde::from_parts(
        child_id,
        HordeState::with_population(owner, stats, &config, split_off),
        traits,
        position,
        rally,
        seed,
    );

    if let Some(parent) = world.horde_mut(horde) {
        parent.state.shrink_for_split(kept, &config);
    }
    world.insert_horde(child);

    tracing::info!(
        "Horde {:?} split: {} units stay, {} form horde {:?}",
        horde,
        kept,
        split_off,
        child_id
    );
    world.push_event(SimulationEvent::HordeSplit {
        parent: horde,
        child: child_id,
    });
    Ok(child_id)
}
