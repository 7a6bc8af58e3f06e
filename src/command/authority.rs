//! Replication/authority seam
//!
//! The substrate decides which participant may mutate an entity. This crate
//! only asks and, for remote targets, hands commands over for delivery.

use crate::command::{Command, CommandQueue, EntityRef};
use crate::core::types::PlayerId;

pub trait Authority: Send + Sync {
    /// Whether this process may mutate `entity`, owned by `owner`
    fn is_local(&self, entity: EntityRef, owner: Option<PlayerId>) -> bool;

    /// Hand a command for a remote entity to the substrate
    fn forward(&mut self, command: Command);
}

/// Single-process authority over every entity
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalAuthority;

impl Authority for LocalAuthority {
    fn is_local(&self, _entity: EntityRef, _owner: Option<PlayerId>) -> bool {
        true
    }

    fn forward(&mut self, command: Command) {
        tracing::warn!("Local authority asked to forward {:?}; dropping", command);
    }
}

/// Authority for one participant: owns its player's entities and anything
/// unowned, forwards the rest into an outbox
#[derive(Debug, Clone)]
pub struct PlayerAuthority {
    pub local: PlayerId,
    outbox: CommandQueue,
}

impl PlayerAuthority {
    pub fn new(local: PlayerId) -> Self {
        Self {
            local,
            outbox: CommandQueue::new(),
        }
    }

    pub fn outbox(&self) -> &CommandQueue {
        &self.outbox
    }

    /// Commands awaiting delivery, oldest first
    pub fn take_outbox(&mut self) -> Vec<Command> {
        std::iter::from_fn(|| self.outbox.pop()).collect()
    }
}

impl Authority for PlayerAuthority {
    fn is_local(&self, _entity: EntityRef, owner: Option<PlayerId>) -> bool {
        owner.map_or(true, |owner| owner == self.local)
    }

    fn forward(&mut self, command: Command) {
        self.outbox.push(command);
    }
}
