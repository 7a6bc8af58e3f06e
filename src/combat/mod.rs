//! Combat arbitration between hordes of different players

pub mod engagement;
pub mod participant;
pub mod session;

use std::collections::BTreeMap;

use crate::core::types::{HordeId, ObjectiveId, PlayerId};
use crate::horde::Horde;
use crate::objective::Objective;

pub use engagement::exchange_damage;
pub use participant::CombatParticipant;
pub use session::{CombatOutcome, CombatPhase, CombatSession, Resolution};

/// Read-only access to the entities a session arbitrates over
pub trait CombatView {
    fn horde(&self, id: HordeId) -> Option<&Horde>;
    fn objective_controller(&self, id: ObjectiveId) -> Option<PlayerId>;
}

/// Borrowed view over world entity tables
pub struct EntityView<'a> {
    pub hordes: &'a BTreeMap<HordeId, Horde>,
    pub objectives: &'a BTreeMap<ObjectiveId, Objective>,
}

impl CombatView for EntityView<'_> {
    fn horde(&self, id: HordeId) -> Option<&Horde> {
        self.hordes.get(&id)
    }

    fn objective_controller(&self, id: ObjectiveId) -> Option<PlayerId> {
        self.objectives.get(&id).and_then(|o| o.controller())
    }
}
