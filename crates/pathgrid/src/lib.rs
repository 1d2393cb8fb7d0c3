//! Walkability grids and instrumented A* search for grid racers.
//!
//! This crate is deliberately framework-free: it knows nothing about ECS,
//! scheduling, or rendering. Callers hand `find_path` a [`Grid`], two
//! positions, and a [`SearchProbe`]; every node the search touches is
//! reported to the probe in the order it happened, which is what makes
//! search playback possible downstream.

pub mod grid;
pub mod probe;
pub mod search;

pub use grid::{Grid, GridPos};
pub use probe::{NodeEvent, NodeOp, NullProbe, SearchProbe};
pub use search::{find_path, path_length};
