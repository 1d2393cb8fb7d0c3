//! Compile-time defaults and the tunable settings resource.

use std::time::Duration;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Number of racers on the course.
pub const ROVER_COUNT: usize = 3;

/// Endpoint slot index of the shared goal; slots `0..ROVER_COUNT` are the
/// rover starts.
pub const GOAL_SLOT: usize = ROVER_COUNT;

/// Total endpoint slots (three starts plus the goal).
pub const ENDPOINT_SLOTS: usize = ROVER_COUNT + 1;

pub const DEFAULT_GRID_COLS: i32 = 64;
pub const DEFAULT_GRID_ROWS: i32 = 36;

/// Playback cadence: recorded search operations replayed per second.
pub const DEFAULT_OPS_PER_SECOND: u32 = 20;
pub const MIN_OPS_PER_SECOND: u32 = 1;
pub const MAX_OPS_PER_SECOND: u32 = 1000;

/// How long a front-end needs to fade one cell, in milliseconds. Deferred
/// housekeeping waits a bit longer than this so it never races a paint.
pub const DEFAULT_COLORIZE_MS: u64 = 50;

/// Settle delay = colorize duration times this factor.
pub const SETTLE_FACTOR: f64 = 1.2;

/// Grid edge clamp; keeps the centered endpoint layout collision-free.
pub const MIN_GRID_EDGE: i32 = 8;
pub const MAX_GRID_EDGE: i32 = 512;

/// How the winner set treats equal shortest lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TieMode {
    /// Every rover whose length equals the minimum positive length wins.
    #[default]
    FullTieSet,
    /// Only the lowest-indexed rover at the minimum wins.
    FirstMinimum,
}

/// Tunables a front-end may change between races.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceSettings {
    pub grid_cols: i32,
    pub grid_rows: i32,
    pub operations_per_second: u32,
    pub colorize_ms: u64,
    pub tie_mode: TieMode,
}

impl Default for RaceSettings {
    fn default() -> Self {
        Self {
            grid_cols: DEFAULT_GRID_COLS,
            grid_rows: DEFAULT_GRID_ROWS,
            operations_per_second: DEFAULT_OPS_PER_SECOND,
            colorize_ms: DEFAULT_COLORIZE_MS,
            tie_mode: TieMode::default(),
        }
    }
}

impl RaceSettings {
    /// Fixed playback tick, `1000 / operations_per_second` milliseconds.
    pub fn playback_interval(&self) -> Duration {
        let rate = self
            .operations_per_second
            .clamp(MIN_OPS_PER_SECOND, MAX_OPS_PER_SECOND);
        Duration::from_secs_f64(1.0 / f64::from(rate))
    }

    /// Delay before deferred grid housekeeping runs, slightly longer than
    /// one colorize fade.
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis((self.colorize_ms as f64 * SETTLE_FACTOR).round() as u64)
    }

    pub fn clamped_grid(cols: i32, rows: i32) -> (i32, i32) {
        (
            cols.clamp(MIN_GRID_EDGE, MAX_GRID_EDGE),
            rows.clamp(MIN_GRID_EDGE, MAX_GRID_EDGE),
        )
    }
}
