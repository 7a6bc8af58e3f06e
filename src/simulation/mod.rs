pub mod events;
pub mod output;
pub mod tick;
pub mod world;

pub use events::SimulationEvent;
pub use output::{SimulationStats, SimulationSummary};
pub use tick::run_simulation_tick;
pub use world::World;
