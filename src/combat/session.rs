//! Combat session - the arbiter state machine for one fight
//!
//! Forming (first horde joins) -> Active (two or more players) ->
//! Resolving (per-tick removals) -> Active | Closed (one player left).
//!
//! The session never touches hordes, players or objectives directly. It
//! reads them through a `CombatView` and emits commands for their
//! authorities.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::combat::participant::CombatParticipant;
use crate::combat::CombatView;
use crate::command::Command;
use crate::core::config::CombatConfig;
use crate::core::error::{HordeError, Result};
use crate::core::types::{HordeId, ObjectiveId, PlayerId, SessionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatPhase {
    Forming,
    Active,
    Resolving,
    Closed,
}

/// Terminal result of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatOutcome {
    pub winner: PlayerId,
    /// The winner's hordes still in the fight at the end
    pub victors: Vec<HordeId>,
    pub objective: Option<ObjectiveId>,
    /// True if the objective changed hands
    pub captured: bool,
}

/// Everything one resolution step decided
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    pub retreated: Vec<HordeId>,
    pub eliminated: Vec<PlayerId>,
    pub outcome: Option<CombatOutcome>,
    pub commands: Vec<Command>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatSession {
    id: SessionId,
    initiator: Option<PlayerId>,
    /// Participants in join order
    participants: Vec<CombatParticipant>,
    contested_objective: Option<ObjectiveId>,
    phase: CombatPhase,
    retreat_fraction: f64,
    max_participants: usize,
    max_hordes_per_participant: usize,
}

impl CombatSession {
    pub fn new(id: SessionId, config: &CombatConfig) -> Self {
        Self {
            id,
            initiator: None,
            participants: Vec::new(),
            contested_objective: None,
            phase: CombatPhase::Forming,
            retreat_fraction: config.retreat_fraction,
            max_participants: config.max_participants,
            max_hordes_per_participant: config.max_hordes_per_participant,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn initiator(&self) -> Option<PlayerId> {
        self.initiator
    }

    pub fn phase(&self) -> CombatPhase {
        self.phase
    }

    pub fn contested_objective(&self) -> Option<ObjectiveId> {
        self.contested_objective
    }

    pub fn set_contested_objective(&mut self, objective: ObjectiveId) {
        self.contested_objective = Some(objective);
    }

    pub fn participants(&self) -> &[CombatParticipant] {
        &self.participants
    }

    pub fn participant(&self, player: PlayerId) -> Option<&CombatParticipant> {
        self.participants.iter().find(|p| p.player() == player)
    }

    fn participant_mut(&mut self, player: PlayerId) -> Option<&mut CombatParticipant> {
        self.participants.iter_mut().find(|p| p.player() == player)
    }

    pub fn player_count(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Every (owner, horde) pair in join order
    pub fn hordes(&self) -> impl Iterator<Item = (PlayerId, HordeId)> + '_ {
        self.participants
            .iter()
            .flat_map(|p| p.hordes().iter().map(move |&h| (p.player(), h)))
    }

    /// Commit a horde to this fight
    ///
    /// Returns commands for the joining horde's authority: an involuntary
    /// horde whose owner was not yet fighting is told it is under attack.
    pub fn add_participant(
        &mut self,
        horde: HordeId,
        owner: PlayerId,
        health: f64,
        voluntary: bool,
    ) -> Result<Vec<Command>> {
        if self.contains_horde(horde) {
            return Err(HordeError::AlreadyInCombat(horde));
        }

        let mut commands = Vec::new();
        let was_empty = self.participants.is_empty();

        match self.participant_mut(owner) {
            Some(participant) => participant.add_horde(horde, health, voluntary)?,
            None => {
                if self.participants.len() >= self.max_participants {
                    return Err(HordeError::CapacityExceeded {
                        what: "combat session players",
                        capacity: self.max_participants,
                    });
                }
                self.participants.push(CombatParticipant::new(
                    owner,
                    horde,
                    health,
                    voluntary,
                    self.max_hordes_per_participant,
                ));
                if !voluntary {
                    commands.push(Command::UnderAttack {
                        horde,
                        session: self.id,
                    });
                }
            }
        }

        if was_empty {
            self.initiator = Some(owner);
            self.phase = CombatPhase::Forming;
        }
        if self.phase == CombatPhase::Forming && self.participants.len() >= 2 {
            tracing::info!(
                "Combat {:?} active: {} players",
                self.id,
                self.participants.len()
            );
            self.phase = CombatPhase::Active;
        }

        Ok(commands)
    }

    /// Check that every `(horde, owner)` could join without hitting a limit
    ///
    /// Hordes already in this session are ignored. Nothing is changed, so a
    /// caller adding several hordes can reject the whole batch up front.
    pub fn check_admission(&self, joiners: &[(HordeId, PlayerId)]) -> Result<()> {
        let mut pending: BTreeMap<PlayerId, BTreeSet<HordeId>> = BTreeMap::new();
        for &(horde, owner) in joiners {
            if !self.contains_horde(horde) {
                pending.entry(owner).or_default().insert(horde);
            }
        }

        let newcomers = pending
            .keys()
            .filter(|&&owner| !self.contains_player(owner))
            .count();
        if self.participants.len() + newcomers > self.max_participants {
            return Err(HordeError::CapacityExceeded {
                what: "combat session players",
                capacity: self.max_participants,
            });
        }

        let capacity = self.max_hordes_per_participant.max(1);
        for (owner, hordes) in &pending {
            let current = self.participant(*owner).map_or(0, |p| p.len());
            if current + hordes.len() > capacity {
                return Err(HordeError::CapacityExceeded {
                    what: "combat participant hordes",
                    capacity,
                });
            }
        }
        Ok(())
    }

    /// Run one resolution step
    ///
    /// Hordes at or below their retreat threshold leave the fight; players
    /// left with no fighting hordes are eliminated. If one player remains,
    /// they win and the session closes. Eliminating every remaining player
    /// at once is a fatal invariant violation and leaves the session as it
    /// was.
    pub fn resolve<V: CombatView + ?Sized>(&mut self, view: &V) -> Result<Resolution> {
        if self.phase != CombatPhase::Active {
            return Ok(Resolution::default());
        }
        self.phase = CombatPhase::Resolving;

        let mut retreating: Vec<(PlayerId, HordeId)> = Vec::new();
        let mut missing: Vec<(PlayerId, HordeId)> = Vec::new();
        let mut eliminated: Vec<PlayerId> = Vec::new();

        for participant in &self.participants {
            let mut alive = 0usize;
            for &id in participant.hordes() {
                let Some(horde) = view.horde(id) else {
                    tracing::warn!("Combat {:?}: horde {:?} not found, dropping", self.id, id);
                    missing.push((participant.player(), id));
                    continue;
                };
                let minimum = participant
                    .retreat_threshold(id, self.retreat_fraction)
                    .unwrap_or(0.0);
                if horde.state.total_health() <= minimum {
                    retreating.push((participant.player(), id));
                } else {
                    alive += 1;
                }
            }
            if alive == 0 {
                eliminated.push(participant.player());
            }
        }

        if !eliminated.is_empty() && eliminated.len() == self.participants.len() {
            self.phase = CombatPhase::Active;
            return Err(HordeError::InvariantViolation(format!(
                "combat {:?} would remove all {} players in one step",
                self.id,
                eliminated.len()
            )));
        }

        for &(player, horde) in &missing {
            if let Some(participant) = self.participant_mut(player) {
                participant.remove_horde(horde);
            }
        }

        let mut commands = Vec::new();

        for &(player, horde) in &retreating {
            if let Some(participant) = self.participant_mut(player) {
                participant.remove_horde(horde);
            }
            tracing::debug!("Combat {:?}: horde {:?} retreats", self.id, horde);
            commands.push(Command::Retreat { horde });
        }

        for &player in &eliminated {
            self.participants.retain(|p| p.player() != player);
            tracing::info!("Combat {:?}: player {:?} eliminated", self.id, player);
            commands.push(Command::LeaveCombat { player });
        }

        let outcome = if self.participants.len() == 1 {
            Some(self.finish(view, &mut commands))
        } else {
            self.phase = CombatPhase::Active;
            None
        };

        Ok(Resolution {
            retreated: retreating.into_iter().map(|(_, h)| h).collect(),
            eliminated,
            outcome,
            commands,
        })
    }

    /// Declare the last player the winner, settle the objective and clear the session
    fn finish<V: CombatView + ?Sized>(&mut self, view: &V, commands: &mut Vec<Command>) -> CombatOutcome {
        let winner = self.participants[0].player();
        let victors = self.participants[0].hordes().to_vec();

        for &horde in &victors {
            commands.push(Command::Victory {
                horde,
                session: self.id,
            });
        }
        commands.push(Command::LeaveCombat { player: winner });

        let mut captured = false;
        if let Some(objective) = self.contested_objective {
            commands.push(Command::NotifyCombatEnded { objective });
            if view.objective_controller(objective) != Some(winner) {
                commands.push(Command::ChangeController {
                    objective,
                    player: winner,
                });
                for &horde in &victors {
                    commands.push(Command::StationAt { horde, objective });
                }
                captured = true;
            } else {
                tracing::info!(
                    "Combat {:?}: {:?} defended objective {:?}",
                    self.id,
                    winner,
                    objective
                );
            }
        }

        tracing::info!("Combat {:?} won by {:?}", self.id, winner);

        let outcome = CombatOutcome {
            winner,
            victors,
            objective: self.contested_objective,
            captured,
        };
        self.clear();
        outcome
    }

    fn clear(&mut self) {
        self.participants.clear();
        self.initiator = None;
        self.contested_objective = None;
        self.phase = CombatPhase::Closed;
    }

    /// Closest enemy horde to `horde`; the first one found wins ties
    pub fn nearest_enemy<V: CombatView + ?Sized>(&self, view: &V, horde: HordeId) -> Option<HordeId> {
        let me = view.horde(horde)?;
        let owner = me.owner();

        let mut best = None;
        let mut closest = f32::INFINITY;
        for participant in self.participants.iter().filter(|p| p.player() != owner) {
            for &id in participant.hordes() {
                let Some(enemy) = view.horde(id) else {
                    continue;
                };
                let dist = me.position.distance_squared(&enemy.position);
                if dist < closest {
                    closest = dist;
                    best = Some(id);
                }
            }
        }
        best
    }

    pub fn is_voluntary(&self, horde: HordeId) -> Option<bool> {
        self.participants.iter().find_map(|p| p.is_voluntary(horde))
    }

    pub fn contains_horde(&self, horde: HordeId) -> bool {
        self.participants.iter().any(|p| p.contains(horde))
    }

    pub fn contains_player(&self, player: PlayerId) -> bool {
        self.participant(player).is_some()
    }
}
