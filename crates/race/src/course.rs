//! The shared course: master grid plus the four endpoint markers.

use bevy::prelude::*;
use pathgrid::{Grid, GridPos};

use crate::config::{RaceSettings, ENDPOINT_SLOTS, GOAL_SLOT, ROVER_COUNT};
use crate::view::ViewCommand;

/// The authoritative obstacle grid every racer snapshots from.
#[derive(Resource, Debug, Clone)]
pub struct MasterGrid(pub Grid);

impl Default for MasterGrid {
    fn default() -> Self {
        let settings = RaceSettings::default();
        Self(Grid::new(settings.grid_cols, settings.grid_rows))
    }
}

/// Rover start markers (slots `0..ROVER_COUNT`) and the goal marker
/// (slot [`GOAL_SLOT`]). No two slots ever share a cell and every slot
/// stays on a walkable cell; wall edits refuse endpoint cells, so both
/// invariants hold by construction.
#[derive(Resource, Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    slots: [GridPos; ENDPOINT_SLOTS],
}

impl Default for Endpoints {
    fn default() -> Self {
        let settings = RaceSettings::default();
        Self::centered(settings.grid_cols, settings.grid_rows)
    }
}

impl Endpoints {
    /// Default layout: starts stacked on the left of center, goal to the
    /// right, clamped into the grid.
    pub fn centered(cols: i32, rows: i32) -> Self {
        let cx = cols / 2;
        let cy = rows / 2;
        let clamp = |x: i32, y: i32| GridPos(x.clamp(0, cols - 1), y.clamp(0, rows - 1));
        let slots = [
            clamp(cx - 5, cy - 5),
            clamp(cx - 5, cy),
            clamp(cx - 5, cy + 5),
            clamp(cx + 5, cy),
        ];
        debug_assert!(
            !slots[..GOAL_SLOT].contains(&slots[GOAL_SLOT]),
            "goal slot collides with a start on a {cols}x{rows} grid"
        );
        Self { slots }
    }

    pub fn start(&self, rover: usize) -> GridPos {
        debug_assert!(rover < ROVER_COUNT);
        self.slots[rover]
    }

    pub fn goal(&self) -> GridPos {
        self.slots[GOAL_SLOT]
    }

    /// Which slot occupies `pos`, if any.
    pub fn slot_at(&self, pos: GridPos) -> Option<usize> {
        self.slots.iter().position(|slot| *slot == pos)
    }

    pub fn occupies(&self, pos: GridPos) -> bool {
        self.slot_at(pos).is_some()
    }

    /// Moves a slot to `to` if the cell is inside the grid, walkable, and
    /// not taken by another slot. Returns whether the marker moved.
    pub fn try_move_slot(&mut self, slot: usize, to: GridPos, grid: &Grid) -> bool {
        debug_assert!(slot < ENDPOINT_SLOTS);
        if !grid.is_walkable_at(to) || self.occupies(to) {
            return false;
        }
        self.slots[slot] = to;
        true
    }
}

/// Rebuilds the course at new dimensions: fresh wall-free grid, endpoints
/// re-centered.
pub fn rebuild_course(grid: &mut MasterGrid, endpoints: &mut Endpoints, cols: i32, rows: i32) {
    grid.0 = Grid::new(cols, rows);
    *endpoints = Endpoints::centered(cols, rows);
}

/// Applies one wall edit, refusing endpoint cells, out-of-bounds cells,
/// and edits that would not change the cell. Returns whether the grid
/// changed.
pub fn apply_wall_edit(
    grid: &mut Grid,
    endpoints: &Endpoints,
    pos: GridPos,
    blocked: bool,
) -> bool {
    if !grid.is_inside(pos) || endpoints.occupies(pos) {
        return false;
    }
    if grid.is_walkable_at(pos) != blocked {
        return false;
    }
    grid.set_walkable_at(pos, !blocked)
}

/// Emits the view commands that materialize the current course: the grid
/// itself plus all four markers.
pub fn emit_course(grid: &MasterGrid, endpoints: &Endpoints, view: &mut EventWriter<ViewCommand>) {
    view.send(ViewCommand::BuildGrid {
        cols: grid.0.cols(),
        rows: grid.0.rows(),
    });
    for rover in 0..ROVER_COUNT {
        let pos = endpoints.start(rover);
        view.send(ViewCommand::SetStartMarker {
            rover: rover as u8,
            x: pos.x(),
            y: pos.y(),
        });
    }
    let goal = endpoints.goal();
    view.send(ViewCommand::SetGoalMarker {
        x: goal.x(),
        y: goal.y(),
    });
}

fn boot_course(
    settings: Res<RaceSettings>,
    mut grid: ResMut<MasterGrid>,
    mut endpoints: ResMut<Endpoints>,
    mut view: EventWriter<ViewCommand>,
) {
    rebuild_course(
        &mut grid,
        &mut endpoints,
        settings.grid_cols,
        settings.grid_rows,
    );
    emit_course(&grid, &endpoints, &mut view);
    info!(
        "course ready: {}x{} grid, goal at ({}, {})",
        grid.0.cols(),
        grid.0.rows(),
        endpoints.goal().x(),
        endpoints.goal().y()
    );
}

pub struct CoursePlugin;

impl Plugin for CoursePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MasterGrid>()
            .init_resource::<Endpoints>()
            .add_systems(Startup, boot_course);
    }
}
