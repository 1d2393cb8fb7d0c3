//! Deferred one-shots that wait out the footprint fade.
//!
//! Two kinds of work must not race a front-end's cell animations: the
//! relaunch after `Restart`, and grid housekeeping (wall clear, resize
//! rebuild). Both are modeled as state-scoped timers instead of detached
//! callbacks, so leaving the owning phase cancels them instead of letting
//! them fire into a world that moved on.

use std::time::Duration;

use bevy::prelude::*;

use crate::commands::{CommandQueue, RaceCommand};
use crate::config::{RaceSettings, ROVER_COUNT};
use crate::course::{emit_course, rebuild_course, Endpoints, MasterGrid};
use crate::phase::RacePhase;
use crate::recorder::OperationLog;
use crate::view::ViewCommand;

/// Timer armed on entering `Restarting`; firing repositions the rovers
/// and relaunches the race.
#[derive(Resource, Debug)]
pub struct RestartSettle {
    timer: Timer,
}

impl Default for RestartSettle {
    fn default() -> Self {
        Self {
            timer: Timer::new(RaceSettings::default().settle_delay(), TimerMode::Once),
        }
    }
}

/// Deferred grid work scheduled by the dispatcher. Applied only while the
/// phase is `Ready`; the dispatcher cancels it on any transition away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HousekeepingTask {
    /// Rebuild the course at the current settings dimensions.
    RebuildGrid,
    /// Clear walls, footprints, and paths; keep dimensions.
    ClearWalls,
}

#[derive(Resource, Debug, Default)]
pub struct PendingHousekeeping {
    task: Option<HousekeepingTask>,
    timer: Timer,
}

impl PendingHousekeeping {
    pub fn schedule(&mut self, task: HousekeepingTask, delay: Duration) {
        self.task = Some(task);
        self.timer = Timer::new(delay, TimerMode::Once);
    }

    pub fn cancel(&mut self) -> Option<HousekeepingTask> {
        self.task.take()
    }

    pub fn pending(&self) -> Option<HousekeepingTask> {
        self.task
    }
}

fn arm_restart_settle(settings: Res<RaceSettings>, mut settle: ResMut<RestartSettle>) {
    settle.timer = Timer::new(settings.settle_delay(), TimerMode::Once);
}

/// Runs while `Restarting` and no other phase is already pending this
/// frame; a reset dispatched earlier in the frame suppresses the relaunch
/// that would otherwise fire on the stale state.
fn settle_active(state: Res<State<RacePhase>>, next: Res<NextState<RacePhase>>) -> bool {
    if *state.get() != RacePhase::Restarting {
        return false;
    }
    !matches!(next.as_ref(), NextState::Pending(phase) if *phase != RacePhase::Restarting)
}

fn tick_restart_settle(
    time: Res<Time>,
    mut settle: ResMut<RestartSettle>,
    mut ops: ResMut<OperationLog>,
    endpoints: Res<Endpoints>,
    mut queue: ResMut<CommandQueue>,
    mut view: EventWriter<ViewCommand>,
) {
    settle.timer.tick(time.delta());
    if !settle.timer.just_finished() {
        return;
    }
    ops.clear();
    view.send(ViewCommand::ClearFootprints);
    view.send(ViewCommand::ClearPaths);
    for rover in 0..ROVER_COUNT {
        let pos = endpoints.start(rover);
        view.send(ViewCommand::SetRoverPos {
            rover: rover as u8,
            x: pos.x(),
            y: pos.y(),
        });
    }
    queue.push_machine(RaceCommand::Start);
}

fn run_housekeeping(
    time: Res<Time>,
    mut pending: ResMut<PendingHousekeeping>,
    settings: Res<RaceSettings>,
    mut grid: ResMut<MasterGrid>,
    mut endpoints: ResMut<Endpoints>,
    mut view: EventWriter<ViewCommand>,
) {
    let Some(task) = pending.task else {
        return;
    };
    pending.timer.tick(time.delta());
    if !pending.timer.just_finished() {
        return;
    }
    pending.task = None;
    match task {
        HousekeepingTask::RebuildGrid => {
            rebuild_course(
                &mut grid,
                &mut endpoints,
                settings.grid_cols,
                settings.grid_rows,
            );
            emit_course(&grid, &endpoints, &mut view);
            info!(
                "course rebuilt at {}x{}",
                settings.grid_cols, settings.grid_rows
            );
        }
        HousekeepingTask::ClearWalls => {
            grid.0.clear_walls();
            view.send(ViewCommand::ClearWalls);
            view.send(ViewCommand::ClearFootprints);
            view.send(ViewCommand::ClearPaths);
            info!("course walls cleared");
        }
    }
}

pub struct SettlePlugin;

impl Plugin for SettlePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<RestartSettle>()
            .init_resource::<PendingHousekeeping>()
            .add_systems(OnEnter(RacePhase::Restarting), arm_restart_settle)
            .add_systems(
                Update,
                (
                    tick_restart_settle.run_if(settle_active),
                    run_housekeeping.run_if(in_state(RacePhase::Ready)),
                )
                    .in_set(crate::RaceSet::Control)
                    .after(crate::controller::dispatch_queued_commands),
            );
    }
}
