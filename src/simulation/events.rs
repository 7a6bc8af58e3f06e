//! Events produced by the tick driver and world operations
//!
//! Returned from `run_simulation_tick` for logs, UIs and the run summary.

use serde::{Deserialize, Serialize};

use crate::combat::CombatOutcome;
use crate::command::Command;
use crate::core::types::{HordeId, ObjectiveId, PlayerId, SessionId, Tick};
use crate::evolution::Mutation;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimulationEvent {
    /// A horde's alive unit count moved between levels
    PopulationChanged { horde: HordeId, from: u32, to: u32 },
    /// A horde gained a trait improvement
    Mutated { horde: HordeId, mutation: Mutation },
    CombatStarted { session: SessionId, initiator: PlayerId },
    HordeRetreated { horde: HordeId, session: SessionId },
    PlayerEliminated { player: PlayerId, session: SessionId },
    CombatEnded { session: SessionId, outcome: CombatOutcome },
    ObjectiveCaptured { objective: ObjectiveId, player: PlayerId },
    HordeSplit { parent: HordeId, child: HordeId },
    PlagueCast { caster: HordeId, affected: Vec<HordeId> },
    /// A temporary debuff on `horde` ran out
    EffectExpired { horde: HordeId },
    /// Command handed to a remote authority
    CommandForwarded { command: Command },
    /// Arbiter detected a desynchronized state
    Fatal { tick: Tick, message: String },
}
