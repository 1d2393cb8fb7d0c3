//! The outward surface: everything a front-end needs to draw arrives as a
//! [`ViewCommand`] event. The core never draws; it narrates.
//!
//! A sink subscribes with an `EventReader<ViewCommand>` (usually in
//! [`crate::RaceSet::Input`] so its acknowledgements land in the same
//! frame) and answers `BuildGrid` with `RaceCommand::GridMaterialized`
//! once its surface exists.

use bevy::prelude::*;
use pathgrid::{GridPos, NodeEvent};

use crate::stats::RaceSummary;

#[derive(Event, Debug, Clone, PartialEq)]
pub enum ViewCommand {
    /// (Re)materialize the course surface at these dimensions. Implies
    /// discarding all cell attributes, walls, paths, and footprints.
    BuildGrid { cols: i32, rows: i32 },
    /// Paint one replayed search footprint.
    SetCellAttribute {
        x: i32,
        y: i32,
        event: NodeEvent,
        value: bool,
        rover: u8,
    },
    /// Paint or clear one wall cell.
    SetWall { x: i32, y: i32, blocked: bool },
    SetStartMarker { rover: u8, x: i32, y: i32 },
    SetGoalMarker { x: i32, y: i32 },
    /// Move a rover sprite to a cell.
    SetRoverPos { rover: u8, x: i32, y: i32 },
    /// Stroke one rover's (possibly truncated) path.
    DrawPath { rover: u8, path: Vec<GridPos> },
    ClearPaths,
    /// Clear replayed search footprints, leaving walls and markers.
    ClearFootprints,
    ClearWalls,
    ShowStats(RaceSummary),
}

/// Which search attributes the attached front-end can display. Playback
/// consults this and skips unsupported operations without spending a tick
/// slot on them.
#[derive(Resource, Debug, Clone)]
pub struct ViewCapabilities {
    supported: Vec<NodeEvent>,
}

impl Default for ViewCapabilities {
    fn default() -> Self {
        Self {
            supported: vec![NodeEvent::Opened, NodeEvent::Closed, NodeEvent::Tested],
        }
    }
}

impl ViewCapabilities {
    pub fn new(supported: Vec<NodeEvent>) -> Self {
        Self { supported }
    }

    /// Default set minus one attribute; handy for capability tests.
    pub fn without(event: NodeEvent) -> Self {
        let mut capabilities = Self::default();
        capabilities.supported.retain(|kept| *kept != event);
        capabilities
    }

    pub fn supports(&self, event: NodeEvent) -> bool {
        self.supported.contains(&event)
    }
}

pub struct ViewPlugin;

impl Plugin for ViewPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<ViewCommand>()
            .init_resource::<ViewCapabilities>();
    }
}
