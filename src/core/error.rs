use thiserror::Error;

use crate::core::types::{HordeId, ObjectiveId, PlayerId, SessionId};

#[derive(Error, Debug)]
pub enum HordeError {
    #[error("Horde not found: {0:?}")]
    HordeNotFound(HordeId),

    #[error("Player not found: {0:?}")]
    PlayerNotFound(PlayerId),

    #[error("Objective not found: {0:?}")]
    ObjectiveNotFound(ObjectiveId),

    #[error("Combat session not found: {0:?}")]
    SessionNotFound(SessionId),

    #[error("Capacity exceeded: {what} holds at most {capacity}")]
    CapacityExceeded { what: &'static str, capacity: usize },

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Horde {0:?} is not stationed anywhere")]
    NotStationed(HordeId),

    #[error("Horde {0:?} is already in combat")]
    AlreadyInCombat(HordeId),

    #[error("Horde {0:?} cannot attack its own side")]
    FriendlyTarget(HordeId),

    #[error("Horde too small to split: {alive} units, need at least {minimum}")]
    HordeTooSmall { alive: u32, minimum: u32 },

    #[error("Invalid split fraction: {0}")]
    InvalidSplit(f64),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

impl HordeError {
    /// Fatal errors mean participants have desynchronized and cannot be repaired locally
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            HordeError::InvariantViolation(_) | HordeError::NotStationed(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, HordeError>;
