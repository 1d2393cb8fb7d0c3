//! Terminal-facing view sink.
//!
//! The race core only narrates through [`ViewCommand`] events; this plugin
//! is the shell's "front-end". It logs the interesting commands to stderr
//! (stdout belongs to the JSON protocol) and acknowledges every `BuildGrid`
//! with `GridMaterialized` so the boot and resize handshakes complete.

use bevy::prelude::*;

use race::commands::{CommandQueue, CommandSource, RaceCommand};
use race::view::ViewCommand;
use race::RaceSet;

pub struct ConsoleViewPlugin;

impl Plugin for ConsoleViewPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, relay_view_commands.in_set(RaceSet::Input));
    }
}

fn relay_view_commands(
    mut commands: EventReader<ViewCommand>,
    mut queue: ResMut<CommandQueue>,
) {
    for command in commands.read() {
        match command {
            ViewCommand::BuildGrid { cols, rows } => {
                eprintln!("view: grid {cols}x{rows} materialized");
                queue.push(CommandSource::View, RaceCommand::GridMaterialized);
            }
            // One per replayed operation; at playback rates this would
            // swamp the terminal.
            ViewCommand::SetCellAttribute { .. } => {}
            ViewCommand::DrawPath { rover, path } => {
                eprintln!("view: rover {rover} path drawn, {} cells", path.len());
            }
            ViewCommand::ShowStats(summary) => {
                eprintln!("view: {}", summary.headline());
                for line in summary.rover_lines() {
                    eprintln!("view:   {line}");
                }
            }
            other => eprintln!("view: {other:?}"),
        }
    }
}
