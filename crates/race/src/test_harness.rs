//! Headless rig for driving the full race stack in tests and benchmarks.
//!
//! Builds a `MinimalPlugins` app with the race plugin, a capturing view
//! sink that acknowledges grid builds the way a real front-end would, and
//! deterministic time: every update advances the clock by exactly the
//! amount the test asked for, via `TimeUpdateStrategy::ManualDuration`.

use std::time::Duration;

use bevy::prelude::*;
use bevy::state::app::StatesPlugin;
use bevy::time::TimeUpdateStrategy;
use pathgrid::GridPos;

use crate::commands::{
    CommandQueue, CommandSource, DispatchLog, DispatchRecord, DispatchStats, RaceCommand,
};
use crate::config::RaceSettings;
use crate::course::{Endpoints, MasterGrid};
use crate::engine::{ActiveRace, RaceGraph};
use crate::palette::{CommandId, CommandPalette};
use crate::phase::RacePhase;
use crate::recorder::OperationLog;
use crate::view::ViewCommand;
use crate::{RacePlugin, RaceSet};

/// Updates needed for a command to fully cascade: dispatch, transition,
/// chained transition, settle.
const FLUSH_UPDATES: usize = 4;

/// Everything the fake view sink has been told to draw, in order.
#[derive(Resource, Debug, Default)]
pub struct CapturedView {
    pub commands: Vec<ViewCommand>,
}

/// Whether the sink acknowledges `BuildGrid` with `GridMaterialized`.
#[derive(Resource)]
struct AckGridBuilds(bool);

fn capture_view(
    ack: Res<AckGridBuilds>,
    mut seen: ResMut<CapturedView>,
    mut events: EventReader<ViewCommand>,
    mut queue: ResMut<CommandQueue>,
) {
    for command in events.read() {
        if ack.0 && matches!(command, ViewCommand::BuildGrid { .. }) {
            queue.push(CommandSource::View, RaceCommand::GridMaterialized);
        }
        seen.commands.push(command.clone());
    }
}

pub struct TestRig {
    app: App,
}

impl TestRig {
    /// Rig with default settings, booted through the view handshake into
    /// `Ready`.
    pub fn new() -> Self {
        Self::build(RaceSettings::default(), true)
    }

    pub fn with_settings(settings: RaceSettings) -> Self {
        Self::build(settings, true)
    }

    /// Rig whose view sink never acknowledges the course, so the phase
    /// stays `Booting` until the test sends `GridMaterialized` itself.
    pub fn without_view_ack() -> Self {
        Self::build(RaceSettings::default(), false)
    }

    fn build(settings: RaceSettings, ack_grid_builds: bool) -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(StatesPlugin);
        app.insert_resource(settings);
        app.add_plugins(RacePlugin);
        app.init_resource::<CapturedView>();
        app.insert_resource(AckGridBuilds(ack_grid_builds));
        app.add_systems(Update, capture_view.in_set(RaceSet::Input));
        app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::ZERO));
        // `advance` lands any jump in a single update; the virtual clock's
        // default 250 ms delta clamp would truncate it.
        app.world_mut()
            .resource_mut::<Time<Virtual>>()
            .set_max_delta(Duration::MAX);
        // No systems run in `FixedUpdate`; stretch its timestep so hour
        // jumps do not spin the fixed-main loop.
        app.world_mut()
            .resource_mut::<Time<Fixed>>()
            .set_timestep(Duration::from_secs(3600));

        let mut rig = Self { app };
        rig.flush();
        rig
    }

    /// Queues a command as the console and settles the cascade without
    /// advancing time.
    pub fn send(&mut self, command: RaceCommand) {
        self.push(command);
        self.flush();
    }

    /// Queues a command without flushing; for batching tests.
    pub fn push(&mut self, command: RaceCommand) {
        self.app
            .world_mut()
            .resource_mut::<CommandQueue>()
            .push(CommandSource::Console, command);
    }

    /// Runs enough zero-time updates for queued commands and state
    /// cascades to settle.
    pub fn flush(&mut self) {
        for _ in 0..FLUSH_UPDATES {
            self.app.update();
        }
    }

    /// Advances virtual time by exactly `ms` in a single update, then
    /// freezes the clock again.
    pub fn advance(&mut self, ms: u64) {
        self.app
            .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(ms)));
        self.app.update();
        self.app
            .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::ZERO));
    }

    pub fn advance_times(&mut self, ms: u64, times: usize) {
        for _ in 0..times {
            self.advance(ms);
        }
    }

    pub fn phase(&self) -> RacePhase {
        *self.app.world().resource::<State<RacePhase>>().get()
    }

    pub fn op_count(&self) -> usize {
        self.app.world().resource::<OperationLog>().len()
    }

    pub fn digest(&self) -> u64 {
        self.app.world().resource::<OperationLog>().digest()
    }

    pub fn race(&self) -> Option<RaceGraph> {
        self.app.world().resource::<ActiveRace>().0.clone()
    }

    pub fn endpoints(&self) -> Endpoints {
        self.app.world().resource::<Endpoints>().clone()
    }

    pub fn wall_count(&self) -> usize {
        self.app.world().resource::<MasterGrid>().0.wall_count()
    }

    pub fn walkable_at(&self, pos: GridPos) -> bool {
        self.app.world().resource::<MasterGrid>().0.is_walkable_at(pos)
    }

    pub fn settings(&self) -> RaceSettings {
        self.app.world().resource::<RaceSettings>().clone()
    }

    pub fn palette(&self) -> CommandPalette {
        self.app.world().resource::<CommandPalette>().clone()
    }

    /// Presses a palette slot like a front-end button. Returns false when
    /// the slot is disabled.
    pub fn press(&mut self, id: CommandId) -> bool {
        let Some(command) = self.palette().press(id) else {
            return false;
        };
        self.send(command);
        true
    }

    pub fn dispatch_stats(&self) -> DispatchStats {
        *self.app.world().resource::<DispatchStats>()
    }

    pub fn last_dispatch(&self) -> Option<DispatchRecord> {
        self.app.world().resource::<DispatchLog>().last().cloned()
    }

    pub fn captured(&self) -> Vec<ViewCommand> {
        self.app.world().resource::<CapturedView>().commands.clone()
    }

    pub fn clear_captured(&mut self) {
        self.app
            .world_mut()
            .resource_mut::<CapturedView>()
            .commands
            .clear();
    }

    /// Captured footprint paints since the last clear.
    pub fn footprints_painted(&self) -> usize {
        self.app
            .world()
            .resource::<CapturedView>()
            .commands
            .iter()
            .filter(|command| matches!(command, ViewCommand::SetCellAttribute { .. }))
            .count()
    }

    /// One-cell wall: begin the gesture and release it.
    pub fn draw_wall(&mut self, x: i32, y: i32) {
        self.send(RaceCommand::BeginDrawWall { x, y });
        self.send(RaceCommand::EndInteraction);
    }

    /// Vertical wall segment drawn as one gesture.
    pub fn draw_wall_column(&mut self, x: i32, y_from: i32, y_to: i32) {
        self.send(RaceCommand::BeginDrawWall { x, y: y_from });
        let step = if y_to >= y_from { 1 } else { -1 };
        let mut y = y_from;
        while y != y_to {
            y += step;
            self.send(RaceCommand::Sweep { x, y });
        }
        self.send(RaceCommand::EndInteraction);
    }

    pub fn world(&self) -> &World {
        self.app.world()
    }

    pub fn world_mut(&mut self) -> &mut World {
        self.app.world_mut()
    }
}

impl Default for TestRig {
    fn default() -> Self {
        Self::new()
    }
}
