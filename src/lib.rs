//! Horde Sim - population, evolution and combat for player-owned hordes

pub mod ability;
pub mod combat;
pub mod command;
pub mod core;
pub mod evolution;
pub mod horde;
pub mod notify;
pub mod objective;
pub mod player;
pub mod population;
pub mod simulation;
