//! Core of the rover race: three rovers race across a shared obstacle grid
//! to a common goal, and everything the user watches is a deterministic
//! replay of the search that already happened.
//!
//! The crate is renderer-agnostic. Front-ends push [`commands::RaceCommand`]s
//! onto the [`commands::CommandQueue`] and draw whatever
//! [`view::ViewCommand`]s come back. [`RacePlugin`] wires the whole thing
//! into a Bevy app; it expects the state machinery to be present
//! (`StatesPlugin` when building on `MinimalPlugins`).

use bevy::prelude::*;

pub mod commands;
pub mod config;
pub mod controller;
pub mod course;
pub mod engine;
pub mod palette;
pub mod phase;
pub mod playback;
pub mod protocol;
pub mod recorder;
pub mod scatter;
pub mod settle;
pub mod stats;
pub mod view;

#[cfg(any(test, feature = "bench"))]
pub mod test_harness;

/// Intra-frame ordering: front-end bridges feed the queue, the controller
/// dispatches, playback drains.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RaceSet {
    /// View sinks and other bridges translating raw input into commands.
    Input,
    /// Command dispatch, deferred housekeeping, palette upkeep.
    Control,
    /// Timed replay of recorded operations.
    Playback,
}

/// The full race stack: state machine, course, engine glue, playback,
/// settle timers, palette, scatter RNG, and the view surface.
pub struct RacePlugin;

impl Plugin for RacePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<config::RaceSettings>();
        app.configure_sets(
            Update,
            (RaceSet::Input, RaceSet::Control, RaceSet::Playback).chain(),
        );
        app.add_plugins((
            phase::PhasePlugin,
            view::ViewPlugin,
            commands::CommandsPlugin,
            course::CoursePlugin,
            controller::ControllerPlugin,
            settle::SettlePlugin,
            playback::PlaybackPlugin,
            palette::PalettePlugin,
            scatter::ScatterPlugin,
        ));
    }
}
