//! Hordes - player-owned populations represented by a single health pool

pub mod split;
pub mod state;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::core::config::SimulationConfig;
use crate::core::types::{HordeId, ObjectiveId, PlayerId, Vec2};
use crate::evolution::TraitTable;

pub use split::split_horde;
pub use state::{HordeState, StatBlock};

/// A horde entity: simulation record plus the spatial and bookkeeping
/// fields the external movement and rendering layers read
#[derive(Debug, Clone)]
pub struct Horde {
    pub id: HordeId,
    pub state: HordeState,
    pub traits: TraitTable,
    /// Current center, written by the movement collaborator
    pub position: Vec2,
    /// Where the horde wants to go
    pub target_location: Vec2,
    /// Safe spot to fall back to when retreating
    pub rally_point: Vec2,
    pub stationed_at: Option<ObjectiveId>,
    /// Enemy this horde is currently hitting
    pub being_damaged: Option<HordeId>,
    /// Per-horde random stream so draws don't depend on iteration order
    pub(crate) rng: ChaCha8Rng,
}

impl Horde {
    pub fn new(
        id: HordeId,
        owner: PlayerId,
        position: Vec2,
        rally_point: Vec2,
        config: &SimulationConfig,
    ) -> Self {
        let stats = StatBlock::from_config(&config.population);
        let state = HordeState::new(owner, stats, &config.population);
        let traits = TraitTable::new(&config.evolution, &stats);
        Self::from_parts(id, state, traits, position, rally_point, config.seed)
    }

    pub(crate) fn from_parts(
        id: HordeId,
        state: HordeState,
        traits: TraitTable,
        position: Vec2,
        rally_point: Vec2,
        world_seed: u64,
    ) -> Self {
        Self {
            id,
            state,
            traits,
            position,
            target_location: position,
            rally_point,
            stationed_at: None,
            being_damaged: None,
            rng: horde_rng(world_seed, id),
        }
    }

    pub fn owner(&self) -> PlayerId {
        self.state.owner()
    }

    /// Radius of the area the horde's units cover
    pub fn footprint_radius(&self, unit_radius: f32) -> f32 {
        unit_radius * (self.state.alive_units() as f32).sqrt()
    }

    /// Whether two hordes' footprints touch
    pub fn in_contact(&self, other: &Horde, unit_radius: f32) -> bool {
        let reach = self.footprint_radius(unit_radius) + other.footprint_radius(unit_radius);
        self.position.distance_squared(&other.position) <= reach * reach
    }

    pub fn move_to(&mut self, target: Vec2) {
        self.target_location = target;
    }

    /// Fall back to the rally point and stop attacking
    pub fn retreat(&mut self) {
        self.target_location = self.rally_point;
        self.being_damaged = None;
    }
}

/// Derive an independent stream for one horde from the world seed
pub(crate) fn horde_rng(world_seed: u64, id: HordeId) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(world_seed);
    rng.set_stream(id.0 as u64 + 1);
    rng
}
