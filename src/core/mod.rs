pub mod config;
pub mod error;
pub mod types;

pub use config::SimulationConfig;
pub use error::{HordeError, Result};
pub use types::{Color, HordeId, ObjectiveId, PlayerId, SessionId, Tick, Vec2};
