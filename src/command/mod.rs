//! Cross-authority commands
//!
//! Anything that mutates an entity the caller does not own is expressed as a
//! command addressed to that entity. The executor applies commands whose
//! target is locally authoritative and hands the rest to the replication
//! substrate through the `Authority` seam.

pub mod authority;
pub mod executor;

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::core::types::{HordeId, ObjectiveId, PlayerId, SessionId, Vec2};

pub use authority::{Authority, LocalAuthority, PlayerAuthority};
pub use executor::CommandExecutor;

/// The entity a command is delivered to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityRef {
    Horde(HordeId),
    Player(PlayerId),
    Objective(ObjectiveId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Remove health from a horde (mitigated by its defense)
    DealDamage { target: HordeId, amount: f64 },
    /// Fall back to the rally point and stop attacking
    Retreat { horde: HordeId },
    /// Change where a horde is heading
    MoveTo { horde: HordeId, target: Vec2 },
    /// Record which enemy a horde is hitting (None clears it)
    SetBeingDamaged { horde: HordeId, enemy: Option<HordeId> },
    /// Horde was pulled into a fight it did not choose
    UnderAttack { horde: HordeId, session: SessionId },
    /// Horde's side won its fight
    Victory { horde: HordeId, session: SessionId },
    /// Player is no longer fighting in any session
    LeaveCombat { player: PlayerId },
    /// Fight over an objective has been resolved
    NotifyCombatEnded { objective: ObjectiveId },
    ChangeController { objective: ObjectiveId, player: PlayerId },
    StationAt { horde: HordeId, objective: ObjectiveId },
    UnstationAt { horde: HordeId },
    /// Multiply a horde's damage reduction (ability debuffs and their reversal)
    ScaleDamageReduction { horde: HordeId, factor: f64 },
}

impl Command {
    /// Entity whose authority must execute this command
    pub fn target(&self) -> EntityRef {
        match *self {
            Command::DealDamage { target, .. } => EntityRef::Horde(target),
            Command::Retreat { horde }
            | Command::MoveTo { horde, .. }
            | Command::SetBeingDamaged { horde, .. }
            | Command::UnderAttack { horde, .. }
            | Command::Victory { horde, .. }
            | Command::StationAt { horde, .. }
            | Command::UnstationAt { horde }
            | Command::ScaleDamageReduction { horde, .. } => EntityRef::Horde(horde),
            Command::LeaveCombat { player } => EntityRef::Player(player),
            Command::NotifyCombatEnded { objective }
            | Command::ChangeController { objective, .. } => EntityRef::Objective(objective),
        }
    }
}

/// FIFO of commands awaiting delivery
#[derive(Debug, Default, Clone)]
pub struct CommandQueue {
    pending: VecDeque<Command>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: Command) {
        self.pending.push_back(command);
    }

    pub fn pop(&mut self) -> Option<Command> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Extend<Command> for CommandQueue {
    fn extend<T: IntoIterator<Item = Command>>(&mut self, iter: T) {
        self.pending.extend(iter);
    }
}
