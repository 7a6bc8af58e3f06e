//! One player's side in a combat session

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::error::{HordeError, Result};
use crate::core::types::{HordeId, PlayerId};

/// A player and the hordes it has committed to a fight
///
/// Every horde in `hordes` has exactly one `voluntary` flag and one
/// starting-health snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatParticipant {
    player: PlayerId,
    hordes: Vec<HordeId>,
    /// Whether each horde chose to fight (false if it was attacked)
    voluntary: AHashMap<HordeId, bool>,
    /// Health at join time; the retreat baseline
    starting_health: AHashMap<HordeId, f64>,
    capacity: usize,
}

impl CombatParticipant {
    pub fn new(
        player: PlayerId,
        horde: HordeId,
        health: f64,
        voluntary: bool,
        capacity: usize,
    ) -> Self {
        let mut participant = Self {
            player,
            hordes: Vec::with_capacity(capacity),
            voluntary: AHashMap::new(),
            starting_health: AHashMap::new(),
            capacity: capacity.max(1),
        };
        participant.insert(horde, health, voluntary);
        participant
    }

    pub fn player(&self) -> PlayerId {
        self.player
    }

    /// Commit another horde, snapshotting its current health
    pub fn add_horde(&mut self, horde: HordeId, health: f64, voluntary: bool) -> Result<()> {
        if self.contains(horde) {
            return Err(HordeError::AlreadyInCombat(horde));
        }
        if self.hordes.len() >= self.capacity {
            return Err(HordeError::CapacityExceeded {
                what: "combat participant hordes",
                capacity: self.capacity,
            });
        }
        self.insert(horde, health, voluntary);
        Ok(())
    }

    pub fn remove_horde(&mut self, horde: HordeId) -> bool {
        let Some(idx) = self.hordes.iter().position(|&h| h == horde) else {
            return false;
        };
        self.hordes.remove(idx);
        self.voluntary.remove(&horde);
        self.starting_health.remove(&horde);
        true
    }

    pub fn contains(&self, horde: HordeId) -> bool {
        self.hordes.contains(&horde)
    }

    /// Hordes in join order
    pub fn hordes(&self) -> &[HordeId] {
        &self.hordes
    }

    pub fn is_voluntary(&self, horde: HordeId) -> Option<bool> {
        self.voluntary.get(&horde).copied()
    }

    pub fn starting_health(&self, horde: HordeId) -> Option<f64> {
        self.starting_health.get(&horde).copied()
    }

    /// Health at or below which `horde` retreats
    pub fn retreat_threshold(&self, horde: HordeId, fraction: f64) -> Option<f64> {
        self.starting_health(horde).map(|h| h * fraction)
    }

    pub fn len(&self) -> usize {
        self.hordes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hordes.is_empty()
    }

    fn insert(&mut self, horde: HordeId, health: f64, voluntary: bool) {
        self.hordes.push(horde);
        self.voluntary.insert(horde, voluntary);
        self.starting_health.insert(horde, health);
    }
}
