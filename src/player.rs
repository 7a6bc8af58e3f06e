//! Players - horde owners and resource providers

use serde::{Deserialize, Serialize};

use crate::core::config::PlayerConfig;
use crate::core::types::{Color, PlayerId, SessionId, Vec2};

/// Read-only resource signal consumed by the population engine
pub trait ResourceProvider {
    /// Current stockpile. Never negative.
    fn current_resource_amount(&self) -> f64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerKind {
    /// Controlled from this machine; receives notifications
    Human,
    Bot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub kind: PlayerKind,
    pub color: Color,
    /// Home base; retreating hordes fall back here
    pub spawn_point: Vec2,
    resources: f64,
    resource_income: f64,
    /// Combat session this player is fighting in
    pub combat: Option<SessionId>,
}

impl Player {
    pub fn new(id: PlayerId, kind: PlayerKind, color: Color, spawn_point: Vec2, config: &PlayerConfig) -> Self {
        Self {
            id,
            kind,
            color,
            spawn_point,
            resources: config.starting_resources.max(0.0),
            resource_income: config.resource_income,
            combat: None,
        }
    }

    pub fn is_human(&self) -> bool {
        self.kind == PlayerKind::Human
    }

    pub fn in_combat(&self) -> bool {
        self.combat.is_some()
    }

    /// Collect one tick of income
    pub fn accrue(&mut self) {
        self.resources = (self.resources + self.resource_income).max(0.0);
    }

    /// Overwrite the stockpile, clamped at zero
    pub fn set_resources(&mut self, amount: f64) {
        self.resources = amount.max(0.0);
    }
}

impl ResourceProvider for Player {
    fn current_resource_amount(&self) -> f64 {
        self.resources
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player() -> Player {
        Player::new(
            PlayerId(1),
            PlayerKind::Human,
            Color::GREEN,
            Vec2::default(),
            &PlayerConfig::default(),
        )
    }

    #[test]
    fn test_accrue_income() {
        let mut p = player();
        let start = p.current_resource_amount();
        p.accrue();
        assert!((p.current_resource_amount() - start - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_resources_never_negative() {
        let mut p = player();
        p.set_resources(-5.0);
        assert_eq!(p.current_resource_amount(), 0.0);
    }
}
