//! Population system
//!
//! Stochastic per-tick growth and decline of a horde's unit count,
//! driven by a lazily extended transition matrix and the owner's resources.

pub mod engine;
pub mod matrix;
pub mod resource;

pub use engine::{sample_index, PopulationEngine, PopulationStep};
pub use matrix::TransitionMatrix;
pub use resource::{decline_weight, growth_weight};
