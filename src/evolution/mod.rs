//! Evolution system
//!
//! Hordes gradually and irreversibly improve their stats. Acquisition
//! chance compounds with every mutation while magnitudes saturate at a cap.

pub mod engine;
pub mod traits;

pub use engine::{apply_mutations, EvolutionEngine, Mutation};
pub use traits::{TraitKind, TraitState, TraitTable};
