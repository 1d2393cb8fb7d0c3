//! Wire types for the line-oriented JSON shell.
//!
//! One command object per stdin line, one response object per stdout line,
//! both internally tagged. Version negotiation is a plain integer: bump
//! [`PROTOCOL_VERSION`] on any breaking change to these types.

use serde::{Deserialize, Serialize};

use crate::commands::{DispatchStats, RaceCommand};
use crate::palette::CommandId;
use crate::scatter::DEFAULT_SEED;
use crate::stats::RaceSummary;

pub const PROTOCOL_VERSION: u32 = 1;

fn default_ticks() -> u64 {
    1
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

/// Everything a shell line can ask for. Most variants map 1:1 onto a
/// [`RaceCommand`]; the rest (`observe`, `press`, `step`, `quit`) are
/// shell-level.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum ShellCommand {
    /// Snapshot of phase, course, palette, and stats.
    Observe,
    /// Advance virtual time by `ticks` playback-resolution steps.
    Step {
        #[serde(default = "default_ticks")]
        ticks: u64,
    },
    /// Press a palette slot; fails while the slot is disabled.
    Press { id: CommandId },
    Start,
    Pause,
    Resume,
    Cancel,
    Restart,
    Modify,
    ClearPath,
    ResetGrid,
    SetGridSize { cols: i32, rows: i32 },
    DragStart { rover: u8 },
    DragGoal,
    DrawWall { x: i32, y: i32 },
    EraseWall { x: i32, y: i32 },
    Sweep { x: i32, y: i32 },
    End,
    Scatter {
        density: f32,
        #[serde(default = "default_seed")]
        seed: u64,
    },
    Quit,
}

impl ShellCommand {
    /// The race command this line queues, when it maps directly.
    pub fn to_race_command(&self) -> Option<RaceCommand> {
        match self {
            ShellCommand::Start => Some(RaceCommand::Start),
            ShellCommand::Pause => Some(RaceCommand::Pause),
            ShellCommand::Resume => Some(RaceCommand::Resume),
            ShellCommand::Cancel => Some(RaceCommand::Cancel),
            ShellCommand::Restart => Some(RaceCommand::Restart),
            ShellCommand::Modify => Some(RaceCommand::Modify),
            ShellCommand::ClearPath => Some(RaceCommand::ClearPath),
            ShellCommand::ResetGrid => Some(RaceCommand::ResetGrid),
            ShellCommand::SetGridSize { cols, rows } => Some(RaceCommand::SetGridSize {
                cols: *cols,
                rows: *rows,
            }),
            ShellCommand::DragStart { rover } => {
                Some(RaceCommand::BeginDragStart { rover: *rover })
            }
            ShellCommand::DragGoal => Some(RaceCommand::BeginDragGoal),
            ShellCommand::DrawWall { x, y } => Some(RaceCommand::BeginDrawWall { x: *x, y: *y }),
            ShellCommand::EraseWall { x, y } => Some(RaceCommand::BeginEraseWall { x: *x, y: *y }),
            ShellCommand::Sweep { x, y } => Some(RaceCommand::Sweep { x: *x, y: *y }),
            ShellCommand::End => Some(RaceCommand::EndInteraction),
            ShellCommand::Scatter { density, seed } => Some(RaceCommand::ScatterWalls {
                density: *density,
                seed: *seed,
            }),
            ShellCommand::Observe
            | ShellCommand::Step { .. }
            | ShellCommand::Press { .. }
            | ShellCommand::Quit => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaletteEntry {
    pub id: CommandId,
    pub label: String,
    pub enabled: bool,
}

/// Snapshot answered to `observe`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RaceObservation {
    pub phase: String,
    pub grid_cols: i32,
    pub grid_rows: i32,
    pub wall_count: usize,
    pub starts: Vec<[i32; 2]>,
    pub goal: [i32; 2],
    /// Operations still queued for playback.
    pub pending_operations: usize,
    pub operation_digest: u64,
    pub palette: Vec<PaletteEntry>,
    pub dispatch: DispatchStats,
    /// Present once a race has finished and is on display.
    pub summary: Option<RaceSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponsePayload {
    /// Greeting after boot.
    Ready,
    /// Command accepted and applied.
    Ok,
    /// Answer to `observe`.
    State { observation: RaceObservation },
    /// Parse failure, disabled palette slot, or rejected command.
    Error { message: String },
    /// Answer to `quit`.
    Goodbye,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShellResponse {
    pub protocol_version: u32,
    #[serde(flatten)]
    pub payload: ResponsePayload,
}

pub fn make_response(payload: ResponsePayload) -> ShellResponse {
    ShellResponse {
        protocol_version: PROTOCOL_VERSION,
        payload,
    }
}
