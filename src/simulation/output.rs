//! Simulation output and serialization

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::types::{HordeId, ObjectiveId, PlayerId, Tick};
use crate::player::ResourceProvider;
use crate::simulation::events::SimulationEvent;
use crate::simulation::world::World;

/// Complete run output
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub hordes: Vec<HordeSnapshot>,
    pub players: Vec<PlayerSnapshot>,
    pub objectives: Vec<ObjectiveSnapshot>,
    pub statistics: SimulationStats,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HordeSnapshot {
    pub id: HordeId,
    pub owner: PlayerId,
    pub alive_units: u32,
    pub total_health: f64,
    pub highest_health: f64,
    pub population_peak: u32,
    pub damage: f64,
    pub defense: f64,
    pub birth_rate: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub resources: f64,
    pub hordes: usize,
    pub units: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ObjectiveSnapshot {
    pub id: ObjectiveId,
    pub controller: Option<PlayerId>,
    pub garrison: usize,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SimulationStats {
    pub ticks_simulated: Tick,
    pub simulation_time_ms: u64,
    pub total_events: u32,
    pub population_changes: u32,
    pub mutations: u32,
    pub combats_started: u32,
    pub combats_ended: u32,
    pub retreats: u32,
    pub captures: u32,
    pub fatal_errors: u32,
}

impl SimulationStats {
    pub fn record(&mut self, events: &[SimulationEvent]) {
        self.total_events += events.len() as u32;
        for event in events {
            match event {
                SimulationEvent::PopulationChanged { .. } => self.population_changes += 1,
                SimulationEvent::Mutated { .. } => self.mutations += 1,
                SimulationEvent::CombatStarted { .. } => self.combats_started += 1,
                SimulationEvent::CombatEnded { .. } => self.combats_ended += 1,
                SimulationEvent::HordeRetreated { .. } => self.retreats += 1,
                SimulationEvent::ObjectiveCaptured { .. } => self.captures += 1,
                SimulationEvent::Fatal { .. } => self.fatal_errors += 1,
                _ => {}
            }
        }
    }
}

impl SimulationSummary {
    pub fn new(world: &World, mut statistics: SimulationStats, elapsed: Duration) -> Self {
        statistics.ticks_simulated = world.current_tick;
        statistics.simulation_time_ms = elapsed.as_millis() as u64;

        let hordes = world
            .hordes()
            .map(|h| HordeSnapshot {
                id: h.id,
                owner: h.owner(),
                alive_units: h.state.alive_units(),
                total_health: h.state.total_health(),
                highest_health: h.state.highest_health(),
                population_peak: h.state.population_peak(),
                damage: h.state.stats.damage,
                defense: h.state.stats.defense,
                birth_rate: h.state.stats.birth_rate,
            })
            .collect::<Vec<_>>();

        let players = world
            .players()
            .map(|p| {
                let owned = hordes.iter().filter(|h| h.owner == p.id);
                PlayerSnapshot {
                    id: p.id,
                    resources: p.current_resource_amount(),
                    hordes: owned.clone().count(),
                    units: owned.map(|h| h.alive_units).sum(),
                }
            })
            .collect();

        let objectives = world
            .objectives()
            .map(|o| ObjectiveSnapshot {
                id: o.id,
                controller: o.controller(),
                garrison: o.stationed_hordes().len(),
            })
            .collect();

        Self {
            hordes,
            players,
            objectives,
            statistics,
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn summary(&self) -> String {
        let units: u32 = self.hordes.iter().map(|h| h.alive_units).sum();
        format!(
            "Simulated {} ticks in {}ms\n{} hordes ({} units), {} mutations, {} combats ({} finished), {} captures",
            self.statistics.ticks_simulated,
            self.statistics.simulation_time_ms,
            self.hordes.len(),
            units,
            self.statistics.mutations,
            self.statistics.combats_started,
            self.statistics.combats_ended,
            self.statistics.captures,
        )
    }
}
