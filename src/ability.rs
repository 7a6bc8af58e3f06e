//! Plague - a timed damage-reduction debuff on nearby enemies
//!
//! The caster pays for it with part of its own health. Each affected horde
//! gets an `ActiveEffect` that undoes the debuff when it runs out.

use serde::{Deserialize, Serialize};

use crate::command::Command;
use crate::core::error::{HordeError, Result};
use crate::core::types::{Color, HordeId, Tick};
use crate::simulation::events::SimulationEvent;
use crate::simulation::world::World;

/// A pending reversal of a damage-reduction change
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveEffect {
    pub horde: HordeId,
    /// Multiplier that was applied; expiry divides it back out
    pub factor: f64,
    pub expires_at: Tick,
}

/// Cast the plague from `caster`, returning the hordes it hit
pub fn cast_plague(world: &mut World, caster: HordeId) -> Result<Vec<HordeId>> {
    let plague = world.config.ability.clone();
    let (owner, center) = {
        let horde = world.horde(caster).ok_or(HordeError::HordeNotFound(caster))?;
        (horde.owner(), horde.position)
    };

    let affected: Vec<HordeId> = world
        .hordes()
        .filter(|h| h.owner() != owner && h.position.distance(&center) <= plague.radius)
        .map(|h| h.id)
        .collect();

    if affected.is_empty() {
        world.notify(owner, "No enemy hordes nearby!", Color::RED);
        return Ok(affected);
    }

    let duration = (plague.duration_secs / world.config.seconds_per_tick).round().max(1.0) as Tick;
    let expires_at = world.current_tick + duration;
    for &horde in &affected {
        world.dispatch(Command::ScaleDamageReduction {
            horde,
            factor: plague.enemy_multiplier,
        })?;
        world.effects.push(ActiveEffect {
            horde,
            factor: plague.enemy_multiplier,
            expires_at,
        });
    }

    if let Some(horde) = world.horde_mut(caster) {
        let state = &mut horde.state;
        let remaining = (state.alive_units() as f64
            * state.stats.health_per_unit
            * plague.caster_health_fraction)
            .ceil();
        state.set_total_health(remaining);
    }

    tracing::info!("Horde {:?} cast plague on {} hordes", caster, affected.len());
    world.push_event(SimulationEvent::PlagueCast {
        caster,
        affected: affected.clone(),
    });
    Ok(affected)
}

/// Revert every effect whose time is up
pub fn expire_effects(world: &mut World) {
    let now = world.current_tick;
    let (expired, active): (Vec<_>, Vec<_>) = world
        .effects
        .drain(..)
        .partition(|e| e.expires_at <= now);
    world.effects = active;

    for effect in expired {
        let revert = Command::ScaleDamageReduction {
            horde: effect.horde,
            factor: 1.0 / effect.factor,
        };
        match world.dispatch(revert) {
            Ok(()) => world.push_event(SimulationEvent::EffectExpired { horde: effect.horde }),
            Err(e) => tracing::warn!("Could not revert effect on {:?}: {}", effect.horde, e),
        }
    }
}
