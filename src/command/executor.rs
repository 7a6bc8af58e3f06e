//! Command execution - applies commands to locally owned entities

use crate::command::Command;
use crate::core::error::{HordeError, Result};
use crate::core::types::{HordeId, ObjectiveId, PlayerId};
use crate::horde::Horde;
use crate::objective::Objective;
use crate::player::Player;
use crate::simulation::events::SimulationEvent;
use crate::simulation::world::World;

/// Routes commands to the authority that owns their target
pub struct CommandExecutor;

impl CommandExecutor {
    /// Apply `command` here if this process owns its target, otherwise
    /// forward it through the world's authority
    pub fn execute(world: &mut World, command: Command) -> Result<()> {
        let target = command.target();
        let owner = world.entity_owner(target)?;

        if !world.authority.is_local(target, owner) {
            tracing::trace!("Forwarding {:?} to {:?}", command, owner);
            world.push_event(SimulationEvent::CommandForwarded {
                command: command.clone(),
            });
            world.authority.forward(command);
            return Ok(());
        }

        Self::apply(world, command)
    }

    fn apply(world: &mut World, command: Command) -> Result<()> {
        match command {
            Command::DealDamage { target, amount } => {
                horde_mut(world, target)?.state.take_damage(amount);
            }
            Command::Retreat { horde } => {
                horde_mut(world, horde)?.retreat();
            }
            Command::MoveTo { horde, target } => {
                horde_mut(world, horde)?.move_to(target);
            }
            Command::SetBeingDamaged { horde, enemy } => {
                horde_mut(world, horde)?.being_damaged = enemy;
            }
            Command::UnderAttack { horde, session } => {
                let owner = horde_mut(world, horde)?.owner();
                player_mut(world, owner)?.combat = Some(session);
                tracing::info!("Horde {:?} is under attack (combat {:?})", horde, session);
            }
            Command::Victory { horde, session } => {
                horde_mut(world, horde)?.being_damaged = None;
                tracing::debug!("Horde {:?} victorious in combat {:?}", horde, session);
            }
            Command::LeaveCombat { player } => {
                player_mut(world, player)?.combat = None;
            }
            Command::NotifyCombatEnded { objective } => {
                objective_mut(world, objective)?.notify_combat_ended();
            }
            Command::ChangeController { objective, player } => {
                let evicted = objective_mut(world, objective)?.change_controller(player);
                for id in evicted {
                    if let Some(h) = world.hordes.get_mut(&id) {
                        if h.stationed_at == Some(objective) {
                            h.stationed_at = None;
                        }
                    }
                }
                tracing::info!("Objective {:?} now controlled by {:?}", objective, player);
            }
            Command::StationAt { horde, objective } => {
                let position = objective_mut(world, objective)?.position;
                let previous = horde_mut(world, horde)?.stationed_at;
                if let Some(prev) = previous.filter(|&p| p != objective) {
                    objective_mut(world, prev)?.unstation_horde(horde)?;
                }
                objective_mut(world, objective)?.station_horde(horde);
                let h = horde_mut(world, horde)?;
                h.stationed_at = Some(objective);
                h.move_to(position);
            }
            Command::UnstationAt { horde } => {
                let objective = horde_mut(world, horde)?
                    .stationed_at
                    .ok_or(HordeError::NotStationed(horde))?;
                objective_mut(world, objective)?.unstation_horde(horde)?;
                horde_mut(world, horde)?.stationed_at = None;
            }
            Command::ScaleDamageReduction { horde, factor } => {
                horde_mut(world, horde)?.state.stats.damage_reduction_mult *= factor;
            }
        }
        Ok(())
    }
}

fn horde_mut(world: &mut World, id: HordeId) -> Result<&mut Horde> {
    world.hordes.get_mut(&id).ok_or(HordeError::HordeNotFound(id))
}

fn player_mut(world: &mut World, id: PlayerId) -> Result<&mut Player> {
    world.players.get_mut(&id).ok_or(HordeError::PlayerNotFound(id))
}

fn objective_mut(world: &mut World, id: ObjectiveId) -> Result<&mut Objective> {
    world
        .objectives
        .get_mut(&id)
        .ok_or(HordeError::ObjectiveNotFound(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SimulationConfig;
    use crate::core::types::{Color, Vec2};
    use crate::player::PlayerKind;

    fn world() -> (World, PlayerId, HordeId) {
        let mut world = World::new(SimulationConfig::default());
        let p = world.add_player(PlayerKind::Bot, Color::WHITE, Vec2::default());
        let h = world.spawn_horde(p, Vec2::default()).unwrap();
        (world, p, h)
    }

    #[test]
    fn test_damage_is_mitigated() {
        let (mut world, _, h) = world();
        world.horde_mut(h).unwrap().state.stats.defense = 2.0;
        CommandExecutor::execute(&mut world, Command::DealDamage { target: h, amount: 4.0 }).unwrap();
        assert!((world.horde(h).unwrap().state.total_health() - 23.0).abs() < 1e-9);
    }

    #[test]
    fn test_restationing_moves_horde_between_objectives() {
        let (mut world, p, h) = world();
        let first = world.add_objective(Vec2::new(1.0, 0.0), Some(p));
        let second = world.add_objective(Vec2::new(2.0, 0.0), Some(p));

        CommandExecutor::execute(&mut world, Command::StationAt { horde: h, objective: first }).unwrap();
        CommandExecutor::execute(&mut world, Command::StationAt { horde: h, objective: second }).unwrap();

        assert!(!world.objective(first).unwrap().is_stationed(h));
        assert!(world.objective(second).unwrap().is_stationed(h));
        assert_eq!(world.horde(h).unwrap().stationed_at, Some(second));
    }

    #[test]
    fn test_controller_change_evicts_garrison() {
        let (mut world, p, h) = world();
        let obj = world.add_objective(Vec2::default(), Some(p));
        CommandExecutor::execute(&mut world, Command::StationAt { horde: h, objective: obj }).unwrap();

        CommandExecutor::execute(
            &mut world,
            Command::ChangeController { objective: obj, player: PlayerId(42) },
        )
        .unwrap();
        assert!(world.objective(obj).unwrap().stationed_hordes().is_empty());
        assert_eq!(world.horde(h).unwrap().stationed_at, None);
    }

    #[test]
    fn test_missing_target_is_an_error() {
        let (mut world, _, _) = world();
        let err = CommandExecutor::execute(&mut world, Command::Retreat { horde: HordeId(77) }).unwrap_err();
        assert!(matches!(err, HordeError::HordeNotFound(HordeId(77))));
    }
}
