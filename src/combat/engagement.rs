//! Per-tick damage exchange between hordes in a session

use crate::combat::session::CombatSession;
use crate::combat::CombatView;
use crate::command::Command;

/// Emit this tick's movement and damage commands for every horde in `session`
///
/// Hordes that chose the fight chase their nearest enemy. Any horde whose
/// footprint touches its nearest enemy deals its flat damage to it.
pub fn exchange_damage<V: CombatView + ?Sized>(
    session: &CombatSession,
    view: &V,
    unit_radius: f32,
) -> Vec<Command> {
    let mut commands = Vec::new();

    for (_, id) in session.hordes() {
        let Some(horde) = view.horde(id) else {
            continue;
        };
        let Some(enemy_id) = session.nearest_enemy(view, id) else {
            continue;
        };
        let Some(enemy) = view.horde(enemy_id) else {
            continue;
        };

        if session.is_voluntary(id) == Some(true) {
            commands.push(Command::MoveTo {
                horde: id,
                target: enemy.position,
            });
        }

        if horde.in_contact(enemy, unit_radius) {
            commands.push(Command::DealDamage {
                target: enemy_id,
                amount: horde.state.stats.damage,
            });
            commands.push(Command::SetBeingDamaged {
                horde: id,
                enemy: Some(enemy_id),
            });
        } else {
            commands.push(Command::SetBeingDamaged {
                horde: id,
                enemy: None,
            });
        }
    }

    commands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::EntityView;
    use crate::core::config::SimulationConfig;
    use crate::core::types::{HordeId, PlayerId, SessionId, Vec2};
    use crate::horde::Horde;
    use std::collections::BTreeMap;

    fn setup(b_pos: Vec2) -> (BTreeMap<HordeId, Horde>, CombatSession) {
        let config = SimulationConfig::default();
        let mut hordes = BTreeMap::new();
        hordes.insert(
            HordeId(1),
            Horde::new(HordeId(1), PlayerId(1), Vec2::new(0.0, 0.0), Vec2::default(), &config),
        );
        hordes.insert(
            HordeId(2),
            Horde::new(HordeId(2), PlayerId(2), b_pos, Vec2::default(), &config),
        );
        let mut session = CombatSession::new(SessionId(1), &config.combat);
        session.add_participant(HordeId(1), PlayerId(1), 25.0, true).unwrap();
        session.add_participant(HordeId(2), PlayerId(2), 25.0, false).unwrap();
        (hordes, session)
    }

    #[test]
    fn test_contact_deals_damage_both_ways() {
        let (hordes, session) = setup(Vec2::new(1.0, 0.0));
        let objectives = BTreeMap::new();
        let view = EntityView { hordes: &hordes, objectives: &objectives };

        let commands = exchange_damage(&session, &view, 0.5);
        assert!(commands.contains(&Command::DealDamage { target: HordeId(2), amount: 0.5 }));
        assert!(commands.contains(&Command::DealDamage { target: HordeId(1), amount: 0.5 }));
        assert!(commands.contains(&Command::SetBeingDamaged {
            horde: HordeId(1),
            enemy: Some(HordeId(2))
        }));
    }

    #[test]
    fn test_only_voluntary_hordes_chase() {
        let (hordes, session) = setup(Vec2::new(50.0, 0.0));
        let objectives = BTreeMap::new();
        let view = EntityView { hordes: &hordes, objectives: &objectives };

        let commands = exchange_damage(&session, &view, 0.5);
        assert!(commands.contains(&Command::MoveTo {
            horde: HordeId(1),
            target: Vec2::new(50.0, 0.0)
        }));
        assert!(!commands
            .iter()
            .any(|c| matches!(c, Command::MoveTo { horde: HordeId(2), .. })));
        assert!(!commands.iter().any(|c| matches!(c, Command::DealDamage { .. })));
    }
}
