//! Queued race commands and their dispatch bookkeeping.
//!
//! Front-ends never mutate race state directly; they push a
//! [`RaceCommand`] onto the [`CommandQueue`] and the controller's
//! dispatcher applies it against the transition table next `Update`. Every
//! dispatch leaves a [`DispatchOutcome`] in the [`DispatchLog`], which is
//! what shells and tests inspect instead of scraping log output.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::phase::RacePhase;

/// Everything that can be asked of the race controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RaceCommand {
    /// Launch the race (legal from `Ready`, `Modified`, `Restarting`).
    Start,
    Pause,
    Resume,
    /// Abandon a paused race, dropping the remaining operations.
    Cancel,
    /// Re-run the same course after the footprint fade settles.
    Restart,
    /// Acknowledge the finished display and return to course editing.
    Modify,
    /// Clear drawn paths and footprints, keep walls.
    ClearPath,
    /// Clear everything except grid dimensions (deferred wall clear).
    ResetGrid,
    /// Resize the course (deferred rebuild; endpoints re-center).
    SetGridSize { cols: i32, rows: i32 },
    /// Grab a rover's start marker.
    BeginDragStart { rover: u8 },
    /// Grab the goal marker.
    BeginDragGoal,
    /// Start drawing walls at a cell (the cell is walled immediately).
    BeginDrawWall { x: i32, y: i32 },
    /// Start erasing walls at a cell (the cell is cleared immediately).
    BeginEraseWall { x: i32, y: i32 },
    /// Continue the active drag or wall sweep over a cell.
    Sweep { x: i32, y: i32 },
    /// Release the active drag or wall sweep.
    EndInteraction,
    /// Seeded random walls at the given density (never on endpoints).
    ScatterWalls { density: f32, seed: u64 },
    /// Raised by a view sink once its course surface exists.
    GridMaterialized,
    /// Raised by playback when the operation queue runs dry.
    FinishSearch,
}

impl RaceCommand {
    /// Commands the machine raises at itself rather than a user pressing
    /// something; arriving in the wrong phase they are stale, not illegal.
    pub fn is_machine_raised(&self) -> bool {
        matches!(
            self,
            RaceCommand::GridMaterialized | RaceCommand::FinishSearch
        )
    }
}

/// Who pushed a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandSource {
    /// The stdin shell or another programmatic driver.
    Console,
    /// An attached view front-end.
    View,
    /// The race machinery itself.
    Machine,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueuedCommand {
    pub source: CommandSource,
    pub command: RaceCommand,
}

/// FIFO of commands awaiting dispatch.
#[derive(Resource, Debug, Default)]
pub struct CommandQueue {
    pending: Vec<QueuedCommand>,
}

impl CommandQueue {
    pub fn push(&mut self, source: CommandSource, command: RaceCommand) {
        self.pending.push(QueuedCommand { source, command });
    }

    pub fn push_machine(&mut self, command: RaceCommand) {
        self.push(CommandSource::Machine, command);
    }

    pub fn drain(&mut self) -> Vec<QueuedCommand> {
        std::mem::take(&mut self.pending)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// How one dispatched command ended.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// Legal, side effects ran, phase moved (or re-entered) `to`.
    Applied { to: RacePhase },
    /// Legal in this phase and handled, but no phase change.
    Handled,
    /// Legal in this phase but a precondition failed (occupied cell,
    /// out-of-bounds, stale machine command); nothing changed.
    Ignored,
    /// Illegal in this phase; nothing changed.
    Rejected,
}

impl DispatchOutcome {
    pub fn changed_anything(&self) -> bool {
        matches!(
            self,
            DispatchOutcome::Applied { .. } | DispatchOutcome::Handled
        )
    }
}

const MAX_LOG_ENTRIES: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub struct DispatchRecord {
    pub source: CommandSource,
    pub command: RaceCommand,
    pub outcome: DispatchOutcome,
}

/// Ring buffer of recent dispatches, newest last.
#[derive(Resource, Debug, Default)]
pub struct DispatchLog {
    entries: Vec<DispatchRecord>,
}

impl DispatchLog {
    pub fn push(&mut self, source: CommandSource, command: RaceCommand, outcome: DispatchOutcome) {
        if self.entries.len() >= MAX_LOG_ENTRIES {
            self.entries.remove(0);
        }
        self.entries.push(DispatchRecord {
            source,
            command,
            outcome,
        });
    }

    pub fn entries(&self) -> &[DispatchRecord] {
        &self.entries
    }

    pub fn last(&self) -> Option<&DispatchRecord> {
        self.entries.last()
    }
}

/// Running dispatch counters, mostly for shells and tests.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DispatchStats {
    pub applied: u64,
    pub handled: u64,
    pub ignored: u64,
    pub rejected: u64,
}

impl DispatchStats {
    pub fn count(&mut self, outcome: &DispatchOutcome) {
        match outcome {
            DispatchOutcome::Applied { .. } => self.applied += 1,
            DispatchOutcome::Handled => self.handled += 1,
            DispatchOutcome::Ignored => self.ignored += 1,
            DispatchOutcome::Rejected => self.rejected += 1,
        }
    }
}

pub struct CommandsPlugin;

impl Plugin for CommandsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CommandQueue>()
            .init_resource::<DispatchLog>()
            .init_resource::<DispatchStats>();
    }
}
