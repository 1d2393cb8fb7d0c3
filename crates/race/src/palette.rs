//! The command palette: which controls a front-end should offer right now.
//!
//! Four fixed slots, rebuilt on every phase change. A renderer draws the
//! labels and enabled flags verbatim; `press` turns a slot back into the
//! bound [`RaceCommand`]. Keeping this declarative means the legality
//! knowledge lives in one table instead of scattered button callbacks.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::commands::RaceCommand;
use crate::config::RaceSettings;
use crate::phase::RacePhase;

/// Stable identity of a palette slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandId {
    /// Start / restart / resume, depending on phase.
    PrimaryAction,
    /// Pause / cancel / clear-path, depending on phase.
    SecondaryAction,
    ClearWalls,
    GridSize,
}

pub const COMMAND_SLOTS: [CommandId; 4] = [
    CommandId::PrimaryAction,
    CommandId::SecondaryAction,
    CommandId::ClearWalls,
    CommandId::GridSize,
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandBinding {
    pub id: CommandId,
    pub label: &'static str,
    pub enabled: bool,
    /// What pressing the slot queues; `None` while disabled.
    pub command: Option<RaceCommand>,
}

impl CommandBinding {
    fn enabled(id: CommandId, label: &'static str, command: RaceCommand) -> Self {
        Self {
            id,
            label,
            enabled: true,
            command: Some(command),
        }
    }

    fn disabled(id: CommandId, label: &'static str) -> Self {
        Self {
            id,
            label,
            enabled: false,
            command: None,
        }
    }
}

/// The four current bindings.
#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize)]
pub struct CommandPalette {
    bindings: Vec<CommandBinding>,
}

impl CommandPalette {
    pub fn for_phase(phase: RacePhase, settings: &RaceSettings) -> Self {
        use CommandId::{ClearWalls, GridSize, PrimaryAction, SecondaryAction};

        let resize = RaceCommand::SetGridSize {
            cols: settings.grid_cols,
            rows: settings.grid_rows,
        };
        let clear_walls = CommandBinding::enabled(ClearWalls, "Clear Walls", RaceCommand::ResetGrid);
        let grid_size = CommandBinding::enabled(GridSize, "Set Grid Size", resize);

        let bindings = match phase {
            RacePhase::Booting => vec![
                CommandBinding::disabled(PrimaryAction, "Start Search"),
                CommandBinding::disabled(SecondaryAction, "Pause Search"),
                CommandBinding::disabled(ClearWalls, "Clear Walls"),
                CommandBinding::disabled(GridSize, "Set Grid Size"),
            ],
            RacePhase::Ready => vec![
                CommandBinding::enabled(PrimaryAction, "Start Search", RaceCommand::Start),
                CommandBinding::disabled(SecondaryAction, "Pause Search"),
                clear_walls,
                grid_size,
            ],
            // Pointer-owned phases: the gesture has the session.
            RacePhase::DraggingStart(_)
            | RacePhase::DraggingGoal
            | RacePhase::DrawingWalls
            | RacePhase::ErasingWalls => vec![
                CommandBinding::disabled(PrimaryAction, "Start Search"),
                CommandBinding::disabled(SecondaryAction, "Pause Search"),
                CommandBinding::disabled(ClearWalls, "Clear Walls"),
                CommandBinding::disabled(GridSize, "Set Grid Size"),
            ],
            RacePhase::Starting => vec![
                CommandBinding::disabled(PrimaryAction, "Restart Search"),
                CommandBinding::disabled(SecondaryAction, "Pause Search"),
                CommandBinding::disabled(ClearWalls, "Clear Walls"),
                CommandBinding::disabled(GridSize, "Set Grid Size"),
            ],
            RacePhase::Searching => vec![
                CommandBinding::enabled(PrimaryAction, "Restart Search", RaceCommand::Restart),
                CommandBinding::enabled(SecondaryAction, "Pause Search", RaceCommand::Pause),
                clear_walls,
                grid_size,
            ],
            RacePhase::Paused => vec![
                CommandBinding::enabled(PrimaryAction, "Resume Search", RaceCommand::Resume),
                CommandBinding::enabled(SecondaryAction, "Cancel Search", RaceCommand::Cancel),
                clear_walls,
                grid_size,
            ],
            RacePhase::Finished => vec![
                CommandBinding::enabled(PrimaryAction, "Restart Search", RaceCommand::Restart),
                CommandBinding::enabled(SecondaryAction, "Clear Path", RaceCommand::ClearPath),
                clear_walls,
                grid_size,
            ],
            RacePhase::Modified => vec![
                CommandBinding::enabled(PrimaryAction, "Start Search", RaceCommand::Start),
                CommandBinding::enabled(SecondaryAction, "Clear Path", RaceCommand::ClearPath),
                clear_walls,
                grid_size,
            ],
            RacePhase::Restarting => vec![
                CommandBinding::disabled(PrimaryAction, "Restart Search"),
                CommandBinding::disabled(SecondaryAction, "Pause Search"),
                clear_walls,
                grid_size,
            ],
        };
        Self { bindings }
    }

    pub fn bindings(&self) -> &[CommandBinding] {
        &self.bindings
    }

    pub fn binding(&self, id: CommandId) -> Option<&CommandBinding> {
        self.bindings.iter().find(|binding| binding.id == id)
    }

    /// The command a press on `id` queues, or `None` while the slot is
    /// disabled (or the palette not yet built).
    pub fn press(&self, id: CommandId) -> Option<RaceCommand> {
        self.binding(id)
            .filter(|binding| binding.enabled)
            .and_then(|binding| binding.command.clone())
    }
}

fn palette_stale(state: Res<State<RacePhase>>, settings: Res<RaceSettings>) -> bool {
    state.is_changed() || settings.is_changed()
}

fn refresh_palette(
    state: Res<State<RacePhase>>,
    settings: Res<RaceSettings>,
    mut palette: ResMut<CommandPalette>,
) {
    *palette = CommandPalette::for_phase(*state.get(), &settings);
}

pub struct PalettePlugin;

impl Plugin for PalettePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CommandPalette>().add_systems(
            Update,
            refresh_palette
                .run_if(palette_stale)
                .in_set(crate::RaceSet::Control),
        );
    }
}
