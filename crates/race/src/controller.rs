//! The race controller: transition table plus the command dispatcher.
//!
//! All mutation funnels through [`dispatch_queued_commands`]. It drains
//! the [`CommandQueue`] once per `Update`, checks each command against
//! [`transition_for`], performs the side effects, and records the outcome.
//! Commands queued in the same frame are applied sequentially against an
//! effective phase, so a `Pause` followed by a `Resume` nets out exactly
//! like the synchronous original.
//!
//! Race launch and finish are `OnEnter` systems here rather than inline
//! side effects: `Start` moves the phase to `Starting`, and the launch
//! system computes the race and hands the phase on to `Searching`.

use bevy::prelude::*;
use pathgrid::GridPos;

use crate::commands::{
    CommandQueue, DispatchLog, DispatchOutcome, DispatchStats, QueuedCommand, RaceCommand,
};
use crate::config::{RaceSettings, GOAL_SLOT, ROVER_COUNT};
use crate::course::{apply_wall_edit, Endpoints, MasterGrid};
use crate::engine::{equalize_paths, run_race, ActiveRace};
use crate::phase::RacePhase;
use crate::recorder::OperationLog;
use crate::scatter::{scatter_walls, RaceRng};
use crate::settle::{HousekeepingTask, PendingHousekeeping};
use crate::stats::RaceSummary;
use crate::view::ViewCommand;

/// What the transition table says about a command in a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Legal; the phase becomes the payload.
    Goto(RacePhase),
    /// Legal in this phase, but not a phase change (sweeps, scatter).
    Stay,
    /// Illegal in this phase.
    Deny,
}

/// The complete transition table. Pure, so tests can sweep every
/// phase/command pair without an app.
pub fn transition_for(phase: RacePhase, command: &RaceCommand) -> Verdict {
    use RacePhase as P;
    use Verdict::{Deny, Goto, Stay};

    match command {
        RaceCommand::GridMaterialized => match phase {
            P::Booting => Goto(P::Ready),
            _ => Deny,
        },
        RaceCommand::Start => match phase {
            P::Ready | P::Modified | P::Restarting => Goto(P::Starting),
            _ => Deny,
        },
        RaceCommand::Pause => match phase {
            P::Searching => Goto(P::Paused),
            _ => Deny,
        },
        RaceCommand::Resume => match phase {
            P::Paused => Goto(P::Searching),
            _ => Deny,
        },
        RaceCommand::Cancel => match phase {
            P::Paused => Goto(P::Ready),
            _ => Deny,
        },
        RaceCommand::FinishSearch => match phase {
            P::Searching => Goto(P::Finished),
            _ => Deny,
        },
        RaceCommand::Restart => match phase {
            P::Searching | P::Finished => Goto(P::Restarting),
            _ => Deny,
        },
        RaceCommand::Modify => match phase {
            P::Finished => Goto(P::Modified),
            _ => Deny,
        },
        RaceCommand::ClearPath => match phase {
            P::Finished | P::Modified => Goto(P::Ready),
            _ => Deny,
        },
        RaceCommand::ResetGrid | RaceCommand::SetGridSize { .. } => match phase {
            P::Booting => Deny,
            _ => Goto(P::Ready),
        },
        RaceCommand::BeginDragStart { rover } => match phase {
            P::Ready | P::Finished if (*rover as usize) < ROVER_COUNT => {
                Goto(P::DraggingStart(*rover))
            }
            _ => Deny,
        },
        RaceCommand::BeginDragGoal => match phase {
            P::Ready | P::Finished => Goto(P::DraggingGoal),
            _ => Deny,
        },
        RaceCommand::BeginDrawWall { .. } => match phase {
            P::Ready | P::Finished => Goto(P::DrawingWalls),
            _ => Deny,
        },
        RaceCommand::BeginEraseWall { .. } => match phase {
            P::Ready | P::Finished => Goto(P::ErasingWalls),
            _ => Deny,
        },
        RaceCommand::Sweep { .. } => {
            if phase.is_interacting() {
                Stay
            } else {
                Deny
            }
        }
        RaceCommand::EndInteraction => {
            if phase.is_interacting() {
                Goto(P::Ready)
            } else {
                Deny
            }
        }
        RaceCommand::ScatterWalls { .. } => match phase {
            P::Ready | P::Modified => Stay,
            _ => Deny,
        },
    }
}

#[allow(clippy::too_many_arguments)]
pub fn dispatch_queued_commands(
    mut queue: ResMut<CommandQueue>,
    state: Res<State<RacePhase>>,
    mut next: ResMut<NextState<RacePhase>>,
    mut log: ResMut<DispatchLog>,
    mut stats: ResMut<DispatchStats>,
    mut ops: ResMut<OperationLog>,
    mut race: ResMut<ActiveRace>,
    mut grid: ResMut<MasterGrid>,
    mut endpoints: ResMut<Endpoints>,
    mut settings: ResMut<RaceSettings>,
    mut pending: ResMut<PendingHousekeeping>,
    mut rng: ResMut<RaceRng>,
    mut view: EventWriter<ViewCommand>,
) {
    let queued = queue.drain();
    if queued.is_empty() {
        return;
    }
    let mut phase = *state.get();
    for item in queued {
        let outcome = match transition_for(phase, &item.command) {
            Verdict::Deny => deny(&item, phase),
            Verdict::Stay => match &item.command {
                RaceCommand::Sweep { x, y } => apply_sweep(
                    phase,
                    GridPos(*x, *y),
                    &mut grid,
                    &mut endpoints,
                    &mut view,
                ),
                RaceCommand::ScatterWalls { density, seed } => apply_scatter(
                    *density,
                    *seed,
                    &mut grid,
                    &endpoints,
                    &mut rng,
                    &mut view,
                ),
                other => {
                    debug!("no stay handler for {other:?}");
                    DispatchOutcome::Ignored
                }
            },
            Verdict::Goto(to) => {
                let applied = match &item.command {
                    RaceCommand::BeginDrawWall { x, y } => {
                        try_begin_wall(GridPos(*x, *y), true, &mut grid, &endpoints, &mut view)
                    }
                    RaceCommand::BeginEraseWall { x, y } => {
                        try_begin_wall(GridPos(*x, *y), false, &mut grid, &endpoints, &mut view)
                    }
                    RaceCommand::SetGridSize { cols, rows } => {
                        apply_set_grid_size(
                            *cols,
                            *rows,
                            &mut settings,
                            &mut ops,
                            &mut race,
                            &mut pending,
                        );
                        true
                    }
                    RaceCommand::ResetGrid => {
                        apply_reset_grid(&settings, &mut ops, &mut race, &mut pending);
                        true
                    }
                    RaceCommand::Cancel | RaceCommand::ClearPath => {
                        clear_display(&mut ops, &mut race, &mut view);
                        true
                    }
                    _ => true,
                };
                if applied {
                    if to != RacePhase::Ready {
                        // Leaving Ready invalidates any deferred grid work.
                        if let Some(task) = pending.cancel() {
                            debug!("canceled deferred {task:?}");
                        }
                    }
                    phase = to;
                    DispatchOutcome::Applied { to }
                } else {
                    DispatchOutcome::Ignored
                }
            }
        };
        stats.count(&outcome);
        log.push(item.source, item.command, outcome);
    }
    if phase != *state.get() {
        next.set(phase);
    }
}

fn deny(item: &QueuedCommand, phase: RacePhase) -> DispatchOutcome {
    if item.command.is_machine_raised() {
        // A stale ack or finish that lost a race against a user command;
        // benign by construction.
        debug!("stale {:?} in phase {}", item.command, phase.label());
        DispatchOutcome::Ignored
    } else {
        warn!(
            "rejected {:?} from {:?} in phase {}",
            item.command,
            item.source,
            phase.label()
        );
        DispatchOutcome::Rejected
    }
}

fn apply_sweep(
    phase: RacePhase,
    pos: GridPos,
    grid: &mut MasterGrid,
    endpoints: &mut Endpoints,
    view: &mut EventWriter<ViewCommand>,
) -> DispatchOutcome {
    let moved = match phase {
        RacePhase::DraggingStart(rover) => {
            if endpoints.try_move_slot(rover as usize, pos, &grid.0) {
                view.send(ViewCommand::SetStartMarker {
                    rover,
                    x: pos.x(),
                    y: pos.y(),
                });
                true
            } else {
                false
            }
        }
        RacePhase::DraggingGoal => {
            if endpoints.try_move_slot(GOAL_SLOT, pos, &grid.0) {
                view.send(ViewCommand::SetGoalMarker {
                    x: pos.x(),
                    y: pos.y(),
                });
                true
            } else {
                false
            }
        }
        RacePhase::DrawingWalls => try_begin_wall(pos, true, grid, endpoints, view),
        RacePhase::ErasingWalls => try_begin_wall(pos, false, grid, endpoints, view),
        _ => false,
    };
    if moved {
        DispatchOutcome::Handled
    } else {
        DispatchOutcome::Ignored
    }
}

/// First cell of a wall gesture, and every swept cell after it: edits the
/// grid and mirrors the change to the view. Refuses endpoints,
/// out-of-bounds cells, and cells already in the target state.
fn try_begin_wall(
    pos: GridPos,
    blocked: bool,
    grid: &mut MasterGrid,
    endpoints: &Endpoints,
    view: &mut EventWriter<ViewCommand>,
) -> bool {
    if !apply_wall_edit(&mut grid.0, endpoints, pos, blocked) {
        return false;
    }
    view.send(ViewCommand::SetWall {
        x: pos.x(),
        y: pos.y(),
        blocked,
    });
    true
}

fn apply_scatter(
    density: f32,
    seed: u64,
    grid: &mut MasterGrid,
    endpoints: &Endpoints,
    rng: &mut RaceRng,
    view: &mut EventWriter<ViewCommand>,
) -> DispatchOutcome {
    rng.reseed(seed);
    let placed = scatter_walls(&mut grid.0, endpoints, density, &mut rng.0);
    for pos in &placed {
        view.send(ViewCommand::SetWall {
            x: pos.x(),
            y: pos.y(),
            blocked: true,
        });
    }
    info!(
        "scattered {} walls (density {density:.2}, seed {seed})",
        placed.len()
    );
    DispatchOutcome::Handled
}

fn apply_set_grid_size(
    cols: i32,
    rows: i32,
    settings: &mut RaceSettings,
    ops: &mut OperationLog,
    race: &mut ActiveRace,
    pending: &mut PendingHousekeeping,
) {
    let (cols, rows) = RaceSettings::clamped_grid(cols, rows);
    settings.grid_cols = cols;
    settings.grid_rows = rows;
    ops.clear();
    race.0 = None;
    pending.schedule(HousekeepingTask::RebuildGrid, settings.settle_delay());
}

fn apply_reset_grid(
    settings: &RaceSettings,
    ops: &mut OperationLog,
    race: &mut ActiveRace,
    pending: &mut PendingHousekeeping,
) {
    ops.clear();
    race.0 = None;
    // A rebuild already starts from a wall-free grid; a reset must not
    // demote a pending resize to a plain wall clear.
    let task = match pending.pending() {
        Some(HousekeepingTask::RebuildGrid) => HousekeepingTask::RebuildGrid,
        _ => HousekeepingTask::ClearWalls,
    };
    pending.schedule(task, settings.settle_delay());
}

/// Immediate display teardown for `Cancel` and `ClearPath`.
fn clear_display(
    ops: &mut OperationLog,
    race: &mut ActiveRace,
    view: &mut EventWriter<ViewCommand>,
) {
    ops.clear();
    race.0 = None;
    view.send(ViewCommand::ClearFootprints);
    view.send(ViewCommand::ClearPaths);
}

/// `OnEnter(Starting)`: wipe the previous display, compute the whole race
/// into the recorder, then hand the phase on to `Searching`.
fn launch_race(
    grid: Res<MasterGrid>,
    endpoints: Res<Endpoints>,
    settings: Res<RaceSettings>,
    mut ops: ResMut<OperationLog>,
    mut race: ResMut<ActiveRace>,
    mut next: ResMut<NextState<RacePhase>>,
    mut view: EventWriter<ViewCommand>,
) {
    view.send(ViewCommand::ClearFootprints);
    view.send(ViewCommand::ClearPaths);
    ops.clear();
    let mut graph = run_race(&grid.0, &endpoints, settings.tie_mode, &mut *ops);
    graph.operation_count = ops.len();
    info!(
        "race computed: {} operations in {:.2} ms, winners {:?}",
        graph.operation_count, graph.time_spent_ms, graph.winners
    );
    race.0 = Some(graph);
    next.set(RacePhase::Searching);
}

/// `OnEnter(Finished)`: equalize, stroke the paths, park the rovers, and
/// publish the summary.
fn finish_race(
    mut race: ResMut<ActiveRace>,
    mut view: EventWriter<ViewCommand>,
) {
    let Some(graph) = race.0.as_mut() else {
        warn!("finished with no active race");
        return;
    };
    equalize_paths(graph);
    for (index, rover) in graph.rovers.iter().enumerate() {
        if rover.drawn.is_empty() {
            continue;
        }
        view.send(ViewCommand::DrawPath {
            rover: index as u8,
            path: rover.drawn.clone(),
        });
        if let Some(pos) = rover.final_pos() {
            view.send(ViewCommand::SetRoverPos {
                rover: index as u8,
                x: pos.x(),
                y: pos.y(),
            });
        }
    }
    let summary = RaceSummary::from_graph(graph);
    info!("{}", summary.headline());
    view.send(ViewCommand::ShowStats(summary));
}

pub struct ControllerPlugin;

impl Plugin for ControllerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<OperationLog>()
            .init_resource::<ActiveRace>()
            .add_systems(
                Update,
                dispatch_queued_commands.in_set(crate::RaceSet::Control),
            )
            .add_systems(OnEnter(RacePhase::Starting), launch_race)
            .add_systems(OnEnter(RacePhase::Finished), finish_race);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_PHASES: [RacePhase; 12] = [
        RacePhase::Booting,
        RacePhase::Ready,
        RacePhase::DraggingStart(0),
        RacePhase::DraggingGoal,
        RacePhase::DrawingWalls,
        RacePhase::ErasingWalls,
        RacePhase::Starting,
        RacePhase::Searching,
        RacePhase::Paused,
        RacePhase::Finished,
        RacePhase::Modified,
        RacePhase::Restarting,
    ];

    fn legal_from(command: RaceCommand) -> Vec<RacePhase> {
        ALL_PHASES
            .into_iter()
            .filter(|phase| transition_for(*phase, &command) != Verdict::Deny)
            .collect()
    }

    #[test]
    fn boot_handshake_only_from_booting() {
        assert_eq!(legal_from(RaceCommand::GridMaterialized), vec![RacePhase::Booting]);
        assert_eq!(
            transition_for(RacePhase::Booting, &RaceCommand::GridMaterialized),
            Verdict::Goto(RacePhase::Ready)
        );
    }

    #[test]
    fn start_is_legal_from_ready_modified_restarting() {
        assert_eq!(
            legal_from(RaceCommand::Start),
            vec![RacePhase::Ready, RacePhase::Modified, RacePhase::Restarting]
        );
    }

    #[test]
    fn playback_control_rows() {
        assert_eq!(legal_from(RaceCommand::Pause), vec![RacePhase::Searching]);
        assert_eq!(legal_from(RaceCommand::Resume), vec![RacePhase::Paused]);
        assert_eq!(legal_from(RaceCommand::Cancel), vec![RacePhase::Paused]);
        assert_eq!(
            legal_from(RaceCommand::FinishSearch),
            vec![RacePhase::Searching]
        );
        assert_eq!(
            legal_from(RaceCommand::Restart),
            vec![RacePhase::Searching, RacePhase::Finished]
        );
    }

    #[test]
    fn display_rows() {
        assert_eq!(legal_from(RaceCommand::Modify), vec![RacePhase::Finished]);
        assert_eq!(
            legal_from(RaceCommand::ClearPath),
            vec![RacePhase::Finished, RacePhase::Modified]
        );
    }

    #[test]
    fn housekeeping_is_legal_everywhere_but_booting() {
        let everywhere: Vec<RacePhase> = ALL_PHASES
            .into_iter()
            .filter(|phase| *phase != RacePhase::Booting)
            .collect();
        assert_eq!(legal_from(RaceCommand::ResetGrid), everywhere);
        assert_eq!(
            legal_from(RaceCommand::SetGridSize { cols: 10, rows: 10 }),
            everywhere
        );
    }

    #[test]
    fn interaction_rows() {
        for command in [
            RaceCommand::BeginDragStart { rover: 0 },
            RaceCommand::BeginDragGoal,
            RaceCommand::BeginDrawWall { x: 1, y: 1 },
            RaceCommand::BeginEraseWall { x: 1, y: 1 },
        ] {
            assert_eq!(
                legal_from(command.clone()),
                vec![RacePhase::Ready, RacePhase::Finished],
                "{command:?}"
            );
        }
        let interacting: Vec<RacePhase> = ALL_PHASES
            .into_iter()
            .filter(|phase| phase.is_interacting())
            .collect();
        assert_eq!(legal_from(RaceCommand::Sweep { x: 1, y: 1 }), interacting);
        assert_eq!(legal_from(RaceCommand::EndInteraction), interacting);
    }

    #[test]
    fn drag_of_a_nonexistent_rover_is_denied() {
        assert_eq!(
            transition_for(RacePhase::Ready, &RaceCommand::BeginDragStart { rover: 3 }),
            Verdict::Deny
        );
    }

    #[test]
    fn scatter_is_a_stay_in_ready_and_modified() {
        let command = RaceCommand::ScatterWalls {
            density: 0.2,
            seed: 1,
        };
        assert_eq!(transition_for(RacePhase::Ready, &command), Verdict::Stay);
        assert_eq!(transition_for(RacePhase::Modified, &command), Verdict::Stay);
        assert_eq!(transition_for(RacePhase::Searching, &command), Verdict::Deny);
    }

    #[test]
    fn sweep_never_changes_phase() {
        for phase in ALL_PHASES {
            let verdict = transition_for(phase, &RaceCommand::Sweep { x: 2, y: 2 });
            assert!(
                matches!(verdict, Verdict::Stay | Verdict::Deny),
                "{phase:?}"
            );
        }
    }

    #[test]
    fn end_interaction_always_lands_in_ready() {
        for phase in ALL_PHASES.into_iter().filter(|p| p.is_interacting()) {
            assert_eq!(
                transition_for(phase, &RaceCommand::EndInteraction),
                Verdict::Goto(RacePhase::Ready)
            );
        }
    }
}
