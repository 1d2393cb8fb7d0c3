//! Deterministic random wall scattering.

use bevy::prelude::*;
use pathgrid::{Grid, GridPos};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::course::Endpoints;

pub const DEFAULT_SEED: u64 = 42;

/// The course RNG. Seeded, so a scatter with the same seed over the same
/// grid produces the same walls on every platform.
#[derive(Resource)]
pub struct RaceRng(pub ChaCha8Rng);

impl Default for RaceRng {
    fn default() -> Self {
        Self(ChaCha8Rng::seed_from_u64(DEFAULT_SEED))
    }
}

impl RaceRng {
    pub fn reseed(&mut self, seed: u64) {
        self.0 = ChaCha8Rng::seed_from_u64(seed);
    }
}

/// Walls random cells at `density` (clamped to `0.0..=1.0`), skipping
/// endpoint cells and cells that are already walls. Returns the cells that
/// changed, in scan order.
pub fn scatter_walls(
    grid: &mut Grid,
    endpoints: &Endpoints,
    density: f32,
    rng: &mut ChaCha8Rng,
) -> Vec<GridPos> {
    let density = density.clamp(0.0, 1.0);
    let mut placed = Vec::new();
    for y in 0..grid.rows() {
        for x in 0..grid.cols() {
            let pos = GridPos(x, y);
            if endpoints.occupies(pos) {
                continue;
            }
            if rng.gen::<f32>() >= density {
                continue;
            }
            if grid.is_walkable_at(pos) {
                grid.set_walkable_at(pos, false);
                placed.push(pos);
            }
        }
    }
    placed
}

pub struct ScatterPlugin;

impl Plugin for ScatterPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<RaceRng>();
    }
}
