//! The race engine: one instrumented search per rover, winner selection,
//! and path equalization.
//!
//! Everything here is pure over its inputs; the ECS glue that schedules a
//! race lives in [`crate::controller`]. Each rover searches a private
//! snapshot of the master grid, so a future per-rover handicap (extra
//! walls, different costs) stays a one-line change.

use std::time::Instant;

use bevy::prelude::*;
use pathgrid::{find_path, path_length, Grid, GridPos, SearchProbe};

use crate::config::{TieMode, ROVER_COUNT};
use crate::course::Endpoints;

/// Tie comparisons on accumulated Euclidean lengths.
const LENGTH_EPSILON: f64 = 1e-9;

/// One rover's outcome.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoverResult {
    /// Full shortest path, endpoints inclusive; empty when unreachable.
    pub path: Vec<GridPos>,
    /// Euclidean length of `path`; `<= 0` exactly when `path` is empty.
    pub length: f64,
    /// What actually gets drawn: the full path for winners, a truncated
    /// prefix for losers once [`equalize_paths`] has run.
    pub drawn: Vec<GridPos>,
}

impl RoverResult {
    pub fn is_reachable(&self) -> bool {
        !self.path.is_empty()
    }

    /// Where the rover ends up after the race, if it moved at all.
    pub fn final_pos(&self) -> Option<GridPos> {
        self.drawn.last().copied()
    }
}

/// Complete result of one race computation.
#[derive(Debug, Clone, PartialEq)]
pub struct RaceGraph {
    pub rovers: [RoverResult; ROVER_COUNT],
    /// Rover indices sharing the minimum positive length; empty when no
    /// rover can reach the goal.
    pub winners: Vec<u8>,
    /// The minimum positive length; `f64::INFINITY` when `winners` is
    /// empty.
    pub win_length: f64,
    /// Operations recorded during the computation (filled in by the
    /// launch system, which owns the recorder).
    pub operation_count: usize,
    /// Engine wall time for the whole computation.
    pub time_spent_ms: f64,
}

/// The race currently being played back or displayed, if any.
#[derive(Resource, Debug, Default)]
pub struct ActiveRace(pub Option<RaceGraph>);

/// Runs the full race: snapshots the master grid once per rover, searches
/// with instrumentation flowing into `probe`, then folds the winner set.
pub fn run_race(
    master: &Grid,
    endpoints: &Endpoints,
    tie_mode: TieMode,
    probe: &mut dyn SearchProbe,
) -> RaceGraph {
    let started = Instant::now();
    let goal = endpoints.goal();
    let mut rovers: [RoverResult; ROVER_COUNT] = Default::default();
    for (index, rover) in rovers.iter_mut().enumerate() {
        let snapshot = master.clone_for(index as u8);
        let path = find_path(&snapshot, endpoints.start(index), goal, probe);
        let length = path_length(&path);
        *rover = RoverResult {
            drawn: path.clone(),
            path,
            length,
        };
    }

    let (winners, win_length) = select_winners(&rovers, tie_mode);
    RaceGraph {
        rovers,
        winners,
        win_length,
        operation_count: 0,
        time_spent_ms: started.elapsed().as_secs_f64() * 1000.0,
    }
}

/// Folds the winner set: minimum strictly positive length wins, ties kept
/// or collapsed per `tie_mode`. Unreachable rovers (length `<= 0`) never
/// win.
fn select_winners(rovers: &[RoverResult; ROVER_COUNT], tie_mode: TieMode) -> (Vec<u8>, f64) {
    let mut winners: Vec<u8> = Vec::new();
    let mut win_length = f64::INFINITY;
    for (index, rover) in rovers.iter().enumerate() {
        if rover.length <= 0.0 {
            continue;
        }
        if rover.length < win_length - LENGTH_EPSILON {
            win_length = rover.length;
            winners.clear();
            winners.push(index as u8);
        } else if (rover.length - win_length).abs() <= LENGTH_EPSILON {
            winners.push(index as u8);
        }
    }
    if tie_mode == TieMode::FirstMinimum {
        winners.truncate(1);
    }
    (winners, win_length)
}

/// Truncates every losing rover's drawn path to the smallest prefix whose
/// cumulative length reaches the winning length. Winners keep their full
/// path; with an empty winner set nothing is truncated. Never lengthens a
/// path, and running it again is a no-op.
pub fn equalize_paths(graph: &mut RaceGraph) {
    if graph.winners.is_empty() {
        return;
    }
    let target = graph.win_length;
    for (index, rover) in graph.rovers.iter_mut().enumerate() {
        if rover.path.is_empty() || graph.winners.contains(&(index as u8)) {
            continue;
        }
        rover.drawn = truncate_at_length(&rover.path, target);
    }
}

fn truncate_at_length(path: &[GridPos], target: f64) -> Vec<GridPos> {
    let mut drawn = vec![path[0]];
    let mut accumulated = 0.0;
    for pair in path.windows(2) {
        accumulated += path_length(pair);
        drawn.push(pair[1]);
        if accumulated + LENGTH_EPSILON >= target {
            break;
        }
    }
    drawn
}
