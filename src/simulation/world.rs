//! World - entity registry plus the collaborators the engines talk to

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::ability::ActiveEffect;
use crate::combat::{CombatPhase, CombatSession, EntityView};
use crate::command::{Authority, Command, CommandExecutor, EntityRef, LocalAuthority};
use crate::core::config::SimulationConfig;
use crate::core::error::{HordeError, Result};
use crate::core::types::{Color, HordeId, ObjectiveId, PlayerId, SessionId, Tick, Vec2};
use crate::evolution::EvolutionEngine;
use crate::horde::Horde;
use crate::notify::{NotificationSink, TracingSink};
use crate::objective::Objective;
use crate::player::{Player, PlayerKind};
use crate::population::PopulationEngine;
use crate::simulation::events::SimulationEvent;

/// The game world containing all hordes, players, objectives and fights
///
/// Entity tables are ordered maps so every pass visits entities in id order
/// and a seeded run replays identically.
pub struct World {
    pub config: SimulationConfig,
    pub current_tick: Tick,
    /// World-level randomness (placement and other non-horde draws)
    pub rng: ChaCha8Rng,
    pub(crate) hordes: BTreeMap<HordeId, Horde>,
    pub(crate) players: BTreeMap<PlayerId, Player>,
    pub(crate) objectives: BTreeMap<ObjectiveId, Objective>,
    pub(crate) sessions: BTreeMap<SessionId, CombatSession>,
    pub(crate) effects: Vec<ActiveEffect>,
    pub(crate) population: PopulationEngine,
    pub(crate) evolution: EvolutionEngine,
    pub(crate) sink: Box<dyn NotificationSink>,
    pub(crate) authority: Box<dyn Authority>,
    pub(crate) events: Vec<SimulationEvent>,
    next_player: u32,
    next_horde: u32,
    next_objective: u32,
    next_session: u32,
}

impl World {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            population: PopulationEngine::new(config.population.clone()),
            evolution: EvolutionEngine::new(&config.evolution),
            config,
            current_tick: 0,
            hordes: BTreeMap::new(),
            players: BTreeMap::new(),
            objectives: BTreeMap::new(),
            sessions: BTreeMap::new(),
            effects: Vec::new(),
            sink: Box::new(TracingSink),
            authority: Box::new(LocalAuthority),
            events: Vec::new(),
            next_player: 0,
            next_horde: 0,
            next_objective: 0,
            next_session: 0,
        }
    }

    pub fn with_authority(mut self, authority: impl Authority + 'static) -> Self {
        self.authority = Box::new(authority);
        self
    }

    pub fn with_sink(mut self, sink: impl NotificationSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn tick(&mut self) {
        self.current_tick += 1;
    }

    // ---- Registry -------------------------------------------------------

    pub fn add_player(&mut self, kind: PlayerKind, color: Color, spawn_point: Vec2) -> PlayerId {
        let id = PlayerId(self.next_player);
        self.next_player += 1;
        self.players
            .insert(id, Player::new(id, kind, color, spawn_point, &self.config.player));
        id
    }

    pub fn add_objective(&mut self, position: Vec2, controller: Option<PlayerId>) -> ObjectiveId {
        let id = ObjectiveId(self.next_objective);
        self.next_objective += 1;
        self.objectives.insert(id, Objective::new(id, position, controller));
        id
    }

    /// Spawn a fresh horde for `owner`; it rallies at the owner's spawn point
    pub fn spawn_horde(&mut self, owner: PlayerId, position: Vec2) -> Result<HordeId> {
        let rally = self
            .players
            .get(&owner)
            .ok_or(HordeError::PlayerNotFound(owner))?
            .spawn_point;
        let id = self.next_horde_id();
        let horde = Horde::new(id, owner, position, rally, &self.config);
        tracing::debug!("Spawned horde {:?} for {:?}", id, owner);
        self.hordes.insert(id, horde);
        Ok(id)
    }

    pub(crate) fn next_horde_id(&mut self) -> HordeId {
        let id = HordeId(self.next_horde);
        self.next_horde += 1;
        id
    }

    pub(crate) fn insert_horde(&mut self, horde: Horde) {
        self.hordes.insert(horde.id, horde);
    }

    pub fn horde(&self, id: HordeId) -> Option<&Horde> {
        self.hordes.get(&id)
    }

    pub fn horde_mut(&mut self, id: HordeId) -> Option<&mut Horde> {
        self.hordes.get_mut(&id)
    }

    pub fn hordes(&self) -> impl Iterator<Item = &Horde> {
        self.hordes.values()
    }

    pub fn horde_count(&self) -> usize {
        self.hordes.len()
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// Hordes owned by `player`, in id order
    pub fn player_hordes(&self, player: PlayerId) -> Vec<HordeId> {
        self.hordes
            .values()
            .filter(|h| h.owner() == player)
            .map(|h| h.id)
            .collect()
    }

    pub fn objective(&self, id: ObjectiveId) -> Option<&Objective> {
        self.objectives.get(&id)
    }

    pub fn objectives(&self) -> impl Iterator<Item = &Objective> {
        self.objectives.values()
    }

    pub fn session(&self, id: SessionId) -> Option<&CombatSession> {
        self.sessions.get(&id)
    }

    pub fn sessions(&self) -> impl Iterator<Item = &CombatSession> {
        self.sessions.values()
    }

    pub fn active_effects(&self) -> &[ActiveEffect] {
        &self.effects
    }

    pub fn view(&self) -> EntityView<'_> {
        EntityView {
            hordes: &self.hordes,
            objectives: &self.objectives,
        }
    }

    /// Session `horde` is fighting in, if any
    pub fn in_combat(&self, horde: HordeId) -> Option<SessionId> {
        self.sessions
            .values()
            .find(|s| s.contains_horde(horde))
            .map(|s| s.id())
    }

    // ---- Collaborators --------------------------------------------------

    /// Current owner of an entity, for the authority check
    pub(crate) fn entity_owner(&self, entity: EntityRef) -> Result<Option<PlayerId>> {
        match entity {
            EntityRef::Horde(id) => self
                .hordes
                .get(&id)
                .map(|h| Some(h.owner()))
                .ok_or(HordeError::HordeNotFound(id)),
            EntityRef::Player(id) => self
                .players
                .get(&id)
                .map(|p| Some(p.id))
                .ok_or(HordeError::PlayerNotFound(id)),
            EntityRef::Objective(id) => self
                .objectives
                .get(&id)
                .map(|o| o.controller())
                .ok_or(HordeError::ObjectiveNotFound(id)),
        }
    }

    pub fn is_local(&self, entity: EntityRef) -> bool {
        match self.entity_owner(entity) {
            Ok(owner) => self.authority.is_local(entity, owner),
            Err(_) => false,
        }
    }

    pub fn dispatch(&mut self, command: Command) -> Result<()> {
        CommandExecutor::execute(self, command)
    }

    /// Dispatch a batch, logging failures instead of stopping
    pub fn dispatch_all(&mut self, commands: impl IntoIterator<Item = Command>) {
        for command in commands {
            if let Err(e) = self.dispatch(command) {
                if e.is_fatal() {
                    tracing::error!("Command failed: {}", e);
                } else {
                    tracing::warn!("Command failed: {}", e);
                }
            }
        }
    }

    /// Announce to `player` if a person is watching
    pub fn notify(&mut self, player: PlayerId, message: &str, color: Color) {
        if self.players.get(&player).is_some_and(|p| p.is_human()) {
            self.sink.notify(message, color);
        }
    }

    pub(crate) fn push_event(&mut self, event: SimulationEvent) {
        self.events.push(event);
    }

    pub fn drain_events(&mut self) -> Vec<SimulationEvent> {
        std::mem::take(&mut self.events)
    }

    // ---- Player operations ----------------------------------------------

    /// Send `attacker` after `target`, opening or joining a fight
    pub fn attack_horde(&mut self, attacker: HordeId, target: HordeId) -> Result<SessionId> {
        let attacker_owner = self.owner_of(attacker)?;
        let target_owner = self.owner_of(target)?;
        if attacker_owner == target_owner {
            return Err(HordeError::FriendlyTarget(target));
        }

        let (session, fresh) = self.session_between(attacker_owner, target_owner, target)?;
        let joined = self
            .check_joiners(session, &[attacker, target])
            .and_then(|_| self.enlist(session, attacker, true))
            .and_then(|_| self.enlist(session, target, false));
        if let Err(e) = joined {
            if fresh {
                self.abandon_session(session);
            }
            return Err(e);
        }

        tracing::info!("Horde {:?} attacks horde {:?}", attacker, target);
        Ok(session)
    }

    /// Send `attacker` to take an objective
    ///
    /// Free or ungarrisoned objectives are captured on the spot and `None`
    /// is returned. Otherwise the garrison is pulled into a fight over it.
    pub fn attack_objective(
        &mut self,
        attacker: HordeId,
        objective: ObjectiveId,
    ) -> Result<Option<SessionId>> {
        let owner = self.owner_of(attacker)?;
        let target = self
            .objectives
            .get(&objective)
            .ok_or(HordeError::ObjectiveNotFound(objective))?;
        let position = target.position;
        let garrison = target.stationed_hordes().to_vec();

        let defender = match target.controller() {
            Some(controller) if controller == owner => {
                self.station(attacker, objective)?;
                return Ok(None);
            }
            Some(controller) if !garrison.is_empty() => controller,
            _ => {
                tracing::info!("Objective {:?} taken unopposed by {:?}", objective, owner);
                self.dispatch(Command::ChangeController {
                    objective,
                    player: owner,
                })?;
                self.station(attacker, objective)?;
                self.push_event(SimulationEvent::ObjectiveCaptured {
                    objective,
                    player: owner,
                });
                return Ok(None);
            }
        };

        let (session, fresh) = self.session_between(owner, defender, garrison[0])?;
        let mut joiners = Vec::with_capacity(garrison.len() + 1);
        joiners.push(attacker);
        joiners.extend_from_slice(&garrison);
        let mut joined = self
            .check_joiners(session, &joiners)
            .and_then(|_| self.enlist(session, attacker, true));
        if joined.is_ok() {
            if let Some(s) = self.sessions.get_mut(&session) {
                s.set_contested_objective(objective);
            }
            for &horde in &garrison {
                joined = self.enlist(session, horde, false);
                if joined.is_err() {
                    break;
                }
            }
        }
        if let Err(e) = joined {
            if fresh {
                self.abandon_session(session);
            }
            return Err(e);
        }

        self.dispatch(Command::MoveTo {
            horde: attacker,
            target: position,
        })?;
        tracing::info!("Horde {:?} assaults objective {:?}", attacker, objective);
        Ok(Some(session))
    }

    pub fn station(&mut self, horde: HordeId, objective: ObjectiveId) -> Result<()> {
        if !self.objectives.contains_key(&objective) {
            return Err(HordeError::ObjectiveNotFound(objective));
        }
        self.dispatch(Command::StationAt { horde, objective })
    }

    pub fn unstation(&mut self, horde: HordeId) -> Result<()> {
        self.dispatch(Command::UnstationAt { horde })
    }

    fn owner_of(&self, horde: HordeId) -> Result<PlayerId> {
        self.hordes
            .get(&horde)
            .map(|h| h.owner())
            .ok_or(HordeError::HordeNotFound(horde))
    }

    /// Pick the session a fight between two players belongs in
    ///
    /// A player fights in at most one session at a time, so an existing
    /// session on either side is reused. Returns whether a new one was opened.
    fn session_between(
        &mut self,
        attacker: PlayerId,
        defender: PlayerId,
        defending_horde: HordeId,
    ) -> Result<(SessionId, bool)> {
        let attacker_session = self.open_session_of(attacker)?;
        let defender_session = self.open_session_of(defender)?;

        match (attacker_session, defender_session) {
            (Some(a), Some(d)) if a != d => Err(HordeError::AlreadyInCombat(defending_horde)),
            (Some(a), _) => Ok((a, false)),
            (None, Some(d)) => Ok((d, false)),
            (None, None) => {
                let id = SessionId(self.next_session);
                self.next_session += 1;
                self.sessions
                    .insert(id, CombatSession::new(id, &self.config.combat));
                Ok((id, true))
            }
        }
    }

    /// The player's session, if it still exists and has not closed
    fn open_session_of(&self, player: PlayerId) -> Result<Option<SessionId>> {
        let combat = self
            .players
            .get(&player)
            .ok_or(HordeError::PlayerNotFound(player))?
            .combat;
        Ok(combat.filter(|id| {
            self.sessions
                .get(id)
                .is_some_and(|s| s.phase() != CombatPhase::Closed)
        }))
    }

    fn abandon_session(&mut self, session: SessionId) {
        self.sessions.remove(&session);
        for player in self.players.values_mut() {
            if player.combat == Some(session) {
                player.combat = None;
            }
        }
    }

    /// Reject a join up front if any of `hordes` could not be enlisted
    fn check_joiners(&self, session_id: SessionId, hordes: &[HordeId]) -> Result<()> {
        let mut joiners = Vec::with_capacity(hordes.len());
        for &horde in hordes {
            let owner = self.owner_of(horde)?;
            if self.in_combat(horde).is_some_and(|s| s != session_id) {
                return Err(HordeError::AlreadyInCombat(horde));
            }
            joiners.push((horde, owner));
        }
        self.sessions
            .get(&session_id)
            .ok_or(HordeError::SessionNotFound(session_id))?
            .check_admission(&joiners)
    }

    /// Add one horde to a session and deliver the resulting commands
    fn enlist(&mut self, session_id: SessionId, horde: HordeId, voluntary: bool) -> Result<()> {
        let (owner, health) = {
            let h = self.hordes.get(&horde).ok_or(HordeError::HordeNotFound(horde))?;
            (h.owner(), h.state.total_health())
        };
        if let Some(other) = self.in_combat(horde) {
            if other != session_id {
                return Err(HordeError::AlreadyInCombat(horde));
            }
            return Ok(());
        }

        let session = self
            .sessions
            .get_mut(&session_id)
            .ok_or(HordeError::SessionNotFound(session_id))?;
        let was_forming = session.phase() == CombatPhase::Forming;
        let commands = session.add_participant(horde, owner, health, voluntary)?;
        let started = was_forming && session.phase() == CombatPhase::Active;
        let initiator = session.initiator();

        if voluntary {
            if let Some(player) = self.players.get_mut(&owner) {
                player.combat = Some(session_id);
            }
        }
        if started {
            if let Some(initiator) = initiator {
                self.push_event(SimulationEvent::CombatStarted {
                    session: session_id,
                    initiator,
                });
            }
        }
        self.dispatch_all(commands);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::PlayerAuthority;
    use crate::notify::SharedLog;

    fn world_with_two_players() -> (World, PlayerId, PlayerId) {
        let mut world = World::new(SimulationConfig::default());
        let a = world.add_player(PlayerKind::Human, Color::GREEN, Vec2::new(-20.0, 0.0));
        let b = world.add_player(PlayerKind::Bot, Color::RED, Vec2::new(20.0, 0.0));
        (world, a, b)
    }

    #[test]
    fn test_spawn_uses_owner_spawn_point_as_rally() {
        let (mut world, a, _) = world_with_two_players();
        let h = world.spawn_horde(a, Vec2::new(1.0, 1.0)).unwrap();
        let horde = world.horde(h).unwrap();
        assert_eq!(horde.rally_point, Vec2::new(-20.0, 0.0));
        assert_eq!(horde.state.alive_units(), 5);
        assert!(matches!(
            world.spawn_horde(PlayerId(99), Vec2::default()),
            Err(HordeError::PlayerNotFound(_))
        ));
    }

    #[test]
    fn test_attack_horde_opens_session() {
        let (mut world, a, b) = world_with_two_players();
        let ha = world.spawn_horde(a, Vec2::default()).unwrap();
        let hb = world.spawn_horde(b, Vec2::new(1.0, 0.0)).unwrap();

        let session = world.attack_horde(ha, hb).unwrap();
        let s = world.session(session).unwrap();
        assert_eq!(s.phase(), CombatPhase::Active);
        assert_eq!(s.initiator(), Some(a));
        assert_eq!(s.is_voluntary(hb), Some(false));
        assert_eq!(world.player(a).unwrap().combat, Some(session));
        assert_eq!(world.player(b).unwrap().combat, Some(session));
        assert_eq!(world.in_combat(hb), Some(session));

        let events = world.drain_events();
        assert!(events.contains(&SimulationEvent::CombatStarted { session, initiator: a }));
    }

    #[test]
    fn test_friendly_attack_rejected() {
        let (mut world, a, _) = world_with_two_players();
        let h1 = world.spawn_horde(a, Vec2::default()).unwrap();
        let h2 = world.spawn_horde(a, Vec2::default()).unwrap();
        assert!(matches!(
            world.attack_horde(h1, h2),
            Err(HordeError::FriendlyTarget(_))
        ));
        assert_eq!(world.sessions().count(), 0);
    }

    #[test]
    fn test_second_attack_joins_existing_session() {
        let (mut world, a, b) = world_with_two_players();
        let ha = world.spawn_horde(a, Vec2::default()).unwrap();
        let ha2 = world.spawn_horde(a, Vec2::default()).unwrap();
        let hb = world.spawn_horde(b, Vec2::default()).unwrap();

        let first = world.attack_horde(ha, hb).unwrap();
        let second = world.attack_horde(ha2, hb).unwrap();
        assert_eq!(first, second);
        assert_eq!(world.session(first).unwrap().participant(a).unwrap().len(), 2);
    }

    #[test]
    fn test_overfull_session_rejects_attack_without_changes() {
        let (mut world, a, b) = world_with_two_players();
        let ha = world.spawn_horde(a, Vec2::default()).unwrap();
        let hb = world.spawn_horde(b, Vec2::default()).unwrap();
        let session = world.attack_horde(ha, hb).unwrap();

        // Players C..F join until the session is full
        for i in 0..4 {
            let p = world.add_player(PlayerKind::Bot, Color::RED, Vec2::new(i as f32, 5.0));
            let h = world.spawn_horde(p, Vec2::default()).unwrap();
            assert_eq!(world.attack_horde(ha, h).unwrap(), session);
        }
        assert_eq!(world.session(session).unwrap().player_count(), 6);

        let g = world.add_player(PlayerKind::Bot, Color::RED, Vec2::new(0.0, 9.0));
        let hg = world.spawn_horde(g, Vec2::default()).unwrap();
        let b2 = world.spawn_horde(b, Vec2::default()).unwrap();
        world.drain_events();

        let err = world.attack_horde(b2, hg).unwrap_err();
        assert!(matches!(err, HordeError::CapacityExceeded { capacity: 6, .. }));
        assert_eq!(world.in_combat(b2), None);
        assert_eq!(world.in_combat(hg), None);
        assert_eq!(world.player(g).unwrap().combat, None);
        assert_eq!(world.session(session).unwrap().participant(b).unwrap().hordes(), &[hb]);
        assert_eq!(world.session(session).unwrap().player_count(), 6);
        assert!(world.drain_events().is_empty());
    }

    #[test]
    fn test_overfull_garrison_rejects_assault_without_changes() {
        let mut config = SimulationConfig::default();
        config.combat.max_hordes_per_participant = 2;
        let mut world = World::new(config);
        let a = world.add_player(PlayerKind::Bot, Color::GREEN, Vec2::default());
        let b = world.add_player(PlayerKind::Bot, Color::RED, Vec2::default());
        let ha = world.spawn_horde(a, Vec2::default()).unwrap();
        let hb = world.spawn_horde(b, Vec2::default()).unwrap();
        let session = world.attack_horde(ha, hb).unwrap();

        // Three defenders cannot all join b's side, which already holds one horde
        let fort = world.add_objective(Vec2::new(5.0, 0.0), Some(b));
        for _ in 0..3 {
            let h = world.spawn_horde(b, Vec2::default()).unwrap();
            world.station(h, fort).unwrap();
        }
        let ha2 = world.spawn_horde(a, Vec2::default()).unwrap();

        let err = world.attack_objective(ha2, fort).unwrap_err();
        assert!(matches!(err, HordeError::CapacityExceeded { capacity: 2, .. }));
        assert_eq!(world.in_combat(ha2), None);
        assert_eq!(world.session(session).unwrap().contested_objective(), None);
        assert_eq!(world.session(session).unwrap().participant(a).unwrap().hordes(), &[ha]);
    }

    #[test]
    fn test_unowned_objective_captured_immediately() {
        let (mut world, a, _) = world_with_two_players();
        let h = world.spawn_horde(a, Vec2::default()).unwrap();
        let obj = world.add_objective(Vec2::new(3.0, 3.0), None);

        assert_eq!(world.attack_objective(h, obj).unwrap(), None);
        let objective = world.objective(obj).unwrap();
        assert_eq!(objective.controller(), Some(a));
        assert!(objective.is_stationed(h));
        assert_eq!(world.horde(h).unwrap().stationed_at, Some(obj));
        assert_eq!(world.horde(h).unwrap().target_location, Vec2::new(3.0, 3.0));
    }

    #[test]
    fn test_garrisoned_objective_starts_contested_fight() {
        let (mut world, a, b) = world_with_two_players();
        let ha = world.spawn_horde(a, Vec2::default()).unwrap();
        let hb = world.spawn_horde(b, Vec2::default()).unwrap();
        let obj = world.add_objective(Vec2::default(), Some(b));
        world.station(hb, obj).unwrap();

        let session = world.attack_objective(ha, obj).unwrap().unwrap();
        let s = world.session(session).unwrap();
        assert_eq!(s.contested_objective(), Some(obj));
        assert!(s.contains_horde(hb));
        assert_eq!(world.objective(obj).unwrap().controller(), Some(b));
    }

    #[test]
    fn test_unstation_without_station_is_error() {
        let (mut world, a, _) = world_with_two_players();
        let h = world.spawn_horde(a, Vec2::default()).unwrap();
        let err = world.unstation(h).unwrap_err();
        assert!(matches!(err, HordeError::NotStationed(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_remote_commands_are_forwarded() {
        let (world, a, b) = world_with_two_players();
        let mut world = world.with_authority(PlayerAuthority::new(a));
        let ha = world.spawn_horde(a, Vec2::default()).unwrap();
        let hb = world.spawn_horde(b, Vec2::default()).unwrap();

        world.attack_horde(ha, hb).unwrap();
        // b's horde belongs to another participant: UnderAttack goes out, b is not marked locally
        assert_eq!(world.player(b).unwrap().combat, None);
        let events = world.drain_events();
        assert!(events.iter().any(|e| matches!(
            e,
            SimulationEvent::CommandForwarded { command: Command::UnderAttack { horde, .. } } if *horde == hb
        )));
    }

    #[test]
    fn test_notifications_only_reach_humans() {
        let log = SharedLog::default();
        let (world, a, b) = world_with_two_players();
        let mut world = world.with_sink(log.clone());

        world.notify(a, "for the human", Color::WHITE);
        world.notify(b, "for the bot", Color::WHITE);

        let entries = log.lock().unwrap().drain();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "for the human");
    }
}
