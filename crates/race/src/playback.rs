//! Fixed-cadence replay of the recorded search.
//!
//! One operation leaves the [`OperationLog`] per playback tick. Operations
//! the attached view cannot display are skipped inside the same tick slot,
//! so an unsupported attribute never slows the replay down. When the queue
//! runs dry the scheduler raises `FinishSearch` at the controller instead
//! of transitioning anything itself.

use bevy::prelude::*;

use crate::commands::{CommandQueue, RaceCommand};
use crate::config::RaceSettings;
use crate::engine::ActiveRace;
use crate::phase::RacePhase;
use crate::recorder::OperationLog;
use crate::view::{ViewCapabilities, ViewCommand};

/// Repeating playback clock, period `1000 / operations_per_second` ms.
#[derive(Resource, Debug)]
pub struct PlaybackTimer {
    pub timer: Timer,
}

impl Default for PlaybackTimer {
    fn default() -> Self {
        Self {
            timer: Timer::new(
                RaceSettings::default().playback_interval(),
                TimerMode::Repeating,
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// One supported operation went out to the view.
    Emitted,
    /// The queue is exhausted (possibly after skipping a trailing run of
    /// unsupported operations).
    Exhausted,
}

/// Emits the next displayable operation, skipping unsupported ones without
/// consuming extra tick slots.
pub fn step_once(
    ops: &mut OperationLog,
    capabilities: &ViewCapabilities,
    view: &mut EventWriter<ViewCommand>,
) -> StepOutcome {
    loop {
        let Some(op) = ops.pop() else {
            return StepOutcome::Exhausted;
        };
        if !capabilities.supports(op.event) {
            debug!(
                "skipping unsupported {} op at ({}, {})",
                op.event.label(),
                op.x,
                op.y
            );
            continue;
        }
        view.send(ViewCommand::SetCellAttribute {
            x: op.x,
            y: op.y,
            event: op.event,
            value: op.value,
            rover: op.tag,
        });
        return StepOutcome::Emitted;
    }
}

/// `OnEnter(Searching)`: reset the clock and emit the first operation
/// immediately, on race start and on every resume, so playback never
/// stalls a full period before showing anything.
fn begin_playback(
    settings: Res<RaceSettings>,
    mut playback: ResMut<PlaybackTimer>,
    mut ops: ResMut<OperationLog>,
    capabilities: Res<ViewCapabilities>,
    mut queue: ResMut<CommandQueue>,
    mut view: EventWriter<ViewCommand>,
) {
    playback.timer = Timer::new(settings.playback_interval(), TimerMode::Repeating);
    if step_once(&mut ops, &capabilities, &mut view) == StepOutcome::Exhausted {
        queue.push_machine(RaceCommand::FinishSearch);
    }
}

/// Runs while `Searching` and no other phase is already pending this
/// frame; a pause or cancel dispatched earlier in the frame suppresses
/// the tick that would otherwise slip through on the stale state.
fn playback_active(state: Res<State<RacePhase>>, next: Res<NextState<RacePhase>>) -> bool {
    if *state.get() != RacePhase::Searching {
        return false;
    }
    !matches!(next.as_ref(), NextState::Pending(phase) if *phase != RacePhase::Searching)
}

fn drain_operations(
    time: Res<Time>,
    mut playback: ResMut<PlaybackTimer>,
    mut ops: ResMut<OperationLog>,
    capabilities: Res<ViewCapabilities>,
    race: Res<ActiveRace>,
    mut queue: ResMut<CommandQueue>,
    mut view: EventWriter<ViewCommand>,
) {
    // A cleared race with a stale Searching state must not finish anything.
    if race.0.is_none() {
        return;
    }
    playback.timer.tick(time.delta());
    for _ in 0..playback.timer.times_finished_this_tick() {
        if step_once(&mut ops, &capabilities, &mut view) == StepOutcome::Exhausted {
            queue.push_machine(RaceCommand::FinishSearch);
            break;
        }
    }
}

/// Picks up `operations_per_second` changes mid-race without restarting
/// the clock on unrelated settings edits.
fn sync_playback_rate(settings: Res<RaceSettings>, mut playback: ResMut<PlaybackTimer>) {
    if !settings.is_changed() {
        return;
    }
    let interval = settings.playback_interval();
    if playback.timer.duration() != interval {
        playback.timer.set_duration(interval);
    }
}

pub struct PlaybackPlugin;

impl Plugin for PlaybackPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PlaybackTimer>()
            .add_systems(OnEnter(RacePhase::Searching), begin_playback)
            .add_systems(
                Update,
                (
                    sync_playback_rate,
                    drain_operations.run_if(playback_active),
                )
                    .chain()
                    .in_set(crate::RaceSet::Playback),
            );
    }
}
