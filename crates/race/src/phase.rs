//! Race lifecycle phases.
//!
//! The controller is a flat state machine: every phase below corresponds to
//! one row block of the transition table in [`crate::controller`]. The app
//! starts in [`RacePhase::Booting`] and only leaves it once a view sink
//! acknowledges the course with `RaceCommand::GridMaterialized`.

use bevy::prelude::*;

/// Current lifecycle phase of the race controller.
#[derive(States, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RacePhase {
    /// Waiting for a view sink to materialize the course.
    #[default]
    Booting,
    /// Idle; course editable, race can start.
    Ready,
    /// A rover start marker is being dragged (rover index in the variant).
    DraggingStart(u8),
    /// The goal marker is being dragged.
    DraggingGoal,
    /// A wall-drawing sweep is in progress.
    DrawingWalls,
    /// A wall-erasing sweep is in progress.
    ErasingWalls,
    /// Transient: the engine is computing the race.
    Starting,
    /// Playback is replaying the recorded search.
    Searching,
    /// Playback suspended; the remaining queue is preserved.
    Paused,
    /// Playback exhausted; results on display.
    Finished,
    /// Results displayed but the course was edited since.
    Modified,
    /// Transient: waiting out the footprint fade before relaunching.
    Restarting,
}

impl RacePhase {
    /// True while a drag or wall sweep owns the pointer.
    pub fn is_interacting(self) -> bool {
        matches!(
            self,
            RacePhase::DraggingStart(_)
                | RacePhase::DraggingGoal
                | RacePhase::DrawingWalls
                | RacePhase::ErasingWalls
        )
    }

    /// Stable lowercase name for logs and the shell protocol.
    pub fn label(self) -> &'static str {
        match self {
            RacePhase::Booting => "booting",
            RacePhase::Ready => "ready",
            RacePhase::DraggingStart(_) => "dragging_start",
            RacePhase::DraggingGoal => "dragging_goal",
            RacePhase::DrawingWalls => "drawing_walls",
            RacePhase::ErasingWalls => "erasing_walls",
            RacePhase::Starting => "starting",
            RacePhase::Searching => "searching",
            RacePhase::Paused => "paused",
            RacePhase::Finished => "finished",
            RacePhase::Modified => "modified",
            RacePhase::Restarting => "restarting",
        }
    }
}

pub struct PhasePlugin;

impl Plugin for PhasePlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<RacePhase>();
    }
}
