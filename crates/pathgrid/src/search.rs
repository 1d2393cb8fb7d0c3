//! Instrumented A* over a [`Grid`].

use std::cell::RefCell;

use pathfinding::prelude::astar;

use crate::grid::{Grid, GridPos};
use crate::probe::{NodeEvent, NodeOp, SearchProbe};

/// Finds a shortest 4-directional path from `start` to `goal`, reporting
/// every node touch to `probe` in the order the algorithm makes them.
///
/// Returns the full path including both endpoints, or an empty vector when
/// no path exists (including when either endpoint is blocked or outside
/// the grid). A degenerate search with `start == goal` returns the single
/// shared cell without touching the probe beyond the initial open.
pub fn find_path(
    grid: &Grid,
    start: GridPos,
    goal: GridPos,
    probe: &mut dyn SearchProbe,
) -> Vec<GridPos> {
    if !grid.is_walkable_at(start) || !grid.is_walkable_at(goal) {
        return Vec::new();
    }
    let tag = grid.tag();
    let probe = RefCell::new(probe);
    let report = |pos: GridPos, event: NodeEvent| {
        probe.borrow_mut().record(NodeOp {
            x: pos.0,
            y: pos.1,
            event,
            value: true,
            tag,
        });
    };

    report(start, NodeEvent::Opened);
    if start == goal {
        return vec![start];
    }

    let found = astar(
        &start,
        |&node| {
            report(node, NodeEvent::Closed);
            let (neighbors, count) = grid.neighbors4(node);
            let mut successors = Vec::with_capacity(count);
            for &neighbor in &neighbors[..count] {
                report(neighbor, NodeEvent::Opened);
                successors.push((neighbor, 1u32));
            }
            successors
        },
        |&node| {
            report(node, NodeEvent::Tested);
            node.manhattan(goal)
        },
        |&node| node == goal,
    );

    found.map(|(path, _cost)| path).unwrap_or_default()
}

/// Euclidean length of a path expressed as successive cell coordinates.
/// Unit for 4-directional steps; empty and single-cell paths have length
/// zero.
pub fn path_length(path: &[GridPos]) -> f64 {
    let mut length = 0.0;
    for pair in path.windows(2) {
        let dx = f64::from(pair[1].0 - pair[0].0);
        let dy = f64::from(pair[1].1 - pair[0].1);
        length += (dx * dx + dy * dy).sqrt();
    }
    length
}
