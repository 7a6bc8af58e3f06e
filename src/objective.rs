//! Capturable objectives (points of interest)
//!
//! An objective has at most one controlling player and a garrison of
//! stationed hordes. Combat over an objective ends with a possible change
//! of controller.

use serde::{Deserialize, Serialize};

use crate::core::error::{HordeError, Result};
use crate::core::types::{HordeId, ObjectiveId, PlayerId, Vec2};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Objective {
    pub id: ObjectiveId,
    pub position: Vec2,
    controller: Option<PlayerId>,
    stationed: Vec<HordeId>,
    combats_ended: u32,
}

impl Objective {
    pub fn new(id: ObjectiveId, position: Vec2, controller: Option<PlayerId>) -> Self {
        Self {
            id,
            position,
            controller,
            stationed: Vec::new(),
            combats_ended: 0,
        }
    }

    pub fn controller(&self) -> Option<PlayerId> {
        self.controller
    }

    /// Hand the objective to `player`
    ///
    /// Returns the previous garrison, which no longer belongs here.
    pub fn change_controller(&mut self, player: PlayerId) -> Vec<HordeId> {
        if self.controller == Some(player) {
            return Vec::new();
        }
        tracing::info!(
            "Objective {:?} changes hands: {:?} -> {:?}",
            self.id,
            self.controller,
            player
        );
        self.controller = Some(player);
        std::mem::take(&mut self.stationed)
    }

    pub fn notify_combat_ended(&mut self) {
        self.combats_ended += 1;
    }

    /// Number of fights resolved over this objective
    pub fn combats_ended(&self) -> u32 {
        self.combats_ended
    }

    pub fn station_horde(&mut self, horde: HordeId) {
        if !self.stationed.contains(&horde) {
            self.stationed.push(horde);
        }
    }

    pub fn unstation_horde(&mut self, horde: HordeId) -> Result<()> {
        let idx = self
            .stationed
            .iter()
            .position(|&h| h == horde)
            .ok_or(HordeError::NotStationed(horde))?;
        self.stationed.remove(idx);
        Ok(())
    }

    pub fn stationed_hordes(&self) -> &[HordeId] {
        &self.stationed
    }

    pub fn is_stationed(&self, horde: HordeId) -> bool {
        self.stationed.contains(&horde)
    }
}
