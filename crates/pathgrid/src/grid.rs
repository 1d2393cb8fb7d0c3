//! Rectangular walkability grid with per-rover snapshot support.

use serde::{Deserialize, Serialize};

/// A cell coordinate, column first. Signed so that off-grid sweeps coming
/// from a front-end can be represented and rejected instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPos(pub i32, pub i32);

impl GridPos {
    pub fn x(self) -> i32 {
        self.0
    }

    pub fn y(self) -> i32 {
        self.1
    }

    /// Manhattan distance, the admissible heuristic for 4-directional
    /// unit-cost movement.
    pub fn manhattan(self, other: GridPos) -> u32 {
        self.0.abs_diff(other.0) + self.1.abs_diff(other.1)
    }
}

/// Dense row-major walkability matrix.
///
/// The `tag` identifies which racer a snapshot belongs to; it is carried
/// into every [`crate::NodeOp`] the search emits so a recorder can keep
/// interleaved recordings apart. The master grid owned by the course uses
/// tag 0 and is never searched directly; racers search a `clone_for` copy.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    cols: i32,
    rows: i32,
    walkable: Vec<bool>,
    tag: u8,
}

impl Grid {
    /// Creates a fully walkable grid. Dimensions are clamped to at least
    /// one cell.
    pub fn new(cols: i32, rows: i32) -> Self {
        let cols = cols.max(1);
        let rows = rows.max(1);
        Self {
            cols,
            rows,
            walkable: vec![true; (cols * rows) as usize],
            tag: 0,
        }
    }

    pub fn cols(&self) -> i32 {
        self.cols
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    pub fn tag(&self) -> u8 {
        self.tag
    }

    /// Snapshot for one racer. Walls are copied; mutations to the copy
    /// never touch `self`.
    pub fn clone_for(&self, tag: u8) -> Grid {
        let mut copy = self.clone();
        copy.tag = tag;
        copy
    }

    pub fn is_inside(&self, pos: GridPos) -> bool {
        pos.0 >= 0 && pos.0 < self.cols && pos.1 >= 0 && pos.1 < self.rows
    }

    /// Inside the grid and not blocked.
    pub fn is_walkable_at(&self, pos: GridPos) -> bool {
        self.is_inside(pos) && self.walkable[self.index(pos)]
    }

    /// Returns false (and changes nothing) when `pos` is out of bounds.
    pub fn set_walkable_at(&mut self, pos: GridPos, walkable: bool) -> bool {
        if !self.is_inside(pos) {
            return false;
        }
        let idx = self.index(pos);
        self.walkable[idx] = walkable;
        true
    }

    /// Walkable 4-neighbors as a fixed array plus count, avoiding an
    /// allocation in the search hot loop.
    pub fn neighbors4(&self, pos: GridPos) -> ([GridPos; 4], usize) {
        let GridPos(x, y) = pos;
        let candidates = [
            GridPos(x, y - 1),
            GridPos(x + 1, y),
            GridPos(x, y + 1),
            GridPos(x - 1, y),
        ];
        let mut out = [GridPos(0, 0); 4];
        let mut count = 0;
        for candidate in candidates {
            if self.is_walkable_at(candidate) {
                out[count] = candidate;
                count += 1;
            }
        }
        (out, count)
    }

    pub fn clear_walls(&mut self) {
        self.walkable.fill(true);
    }

    pub fn wall_count(&self) -> usize {
        self.walkable.iter().filter(|walkable| !**walkable).count()
    }

    fn index(&self, pos: GridPos) -> usize {
        (pos.1 * self.cols + pos.0) as usize
    }
}
