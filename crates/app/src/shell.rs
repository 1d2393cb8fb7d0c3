//! Blocking synchronous shell: reads JSON commands from stdin, writes JSON
//! responses to stdout.
//!
//! ## Protocol
//!
//! Each line of stdin is a JSON object with a `"cmd"` discriminator. Each
//! line of stdout is a JSON response with `"protocol_version"` and `"type"`
//! fields. See [`race::protocol`] for the full schema.
//!
//! Virtual time is frozen between lines; only `step` advances it, one
//! playback-resolution slot per tick. Everything on stderr is diagnostics.

use std::io::{BufRead, Write};
use std::time::Duration;

use bevy::prelude::*;
use bevy::state::app::StatesPlugin;
use bevy::time::TimeUpdateStrategy;

use race::commands::{
    CommandQueue, CommandSource, DispatchLog, DispatchOutcome, DispatchStats, RaceCommand,
};
use race::config::{RaceSettings, ROVER_COUNT};
use race::course::{Endpoints, MasterGrid};
use race::engine::ActiveRace;
use race::palette::CommandPalette;
use race::phase::RacePhase;
use race::protocol::{
    make_response, PaletteEntry, RaceObservation, ResponsePayload, ShellCommand, ShellResponse,
    PROTOCOL_VERSION,
};
use race::recorder::OperationLog;
use race::stats::RaceSummary;
use race::RacePlugin;

use crate::console_view::ConsoleViewPlugin;

/// Updates for a queued command to fully land: dispatch, chained
/// transitions, and the view handshake.
const SETTLE_UPDATES: usize = 4;

/// Cap on `step` ticks per line, against accidental infinite loops.
const MAX_STEP_TICKS: u64 = 10_000;

pub fn run_shell() {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.add_plugins(StatesPlugin);
    app.add_plugins(RacePlugin);
    app.add_plugins(ConsoleViewPlugin);
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::ZERO));
    // A `step` tick is one playback interval, up to a second at the lowest
    // rate; the virtual clock's default 250 ms delta clamp would eat it.
    app.world_mut()
        .resource_mut::<Time<Virtual>>()
        .set_max_delta(Duration::MAX);
    // No systems run in `FixedUpdate`; stretch its timestep so slow-rate
    // steps do not spin the fixed-main loop.
    app.world_mut()
        .resource_mut::<Time<Fixed>>()
        .set_timestep(Duration::from_secs(3600));

    // Boot handshake: course emission, grid ack, palette refresh.
    settle(&mut app);

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut stdout = stdout.lock();

    // Send the "ready" message so the driving program knows we are live.
    let ready = make_response(ResponsePayload::Ready);
    let _ = writeln!(stdout, "{}", serde_json::to_string(&ready).unwrap());
    let _ = stdout.flush();

    eprintln!("roverrace shell v{PROTOCOL_VERSION} ready, waiting for commands on stdin");

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("stdin read error: {e}");
                break;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        let command: ShellCommand = match serde_json::from_str(&line) {
            Ok(c) => c,
            Err(e) => {
                let resp = make_response(ResponsePayload::Error {
                    message: format!("parse error: {e}"),
                });
                let _ = writeln!(stdout, "{}", serde_json::to_string(&resp).unwrap());
                let _ = stdout.flush();
                continue;
            }
        };

        let response = process_command(command, &mut app);
        let is_goodbye = matches!(response.payload, ResponsePayload::Goodbye);

        let _ = writeln!(stdout, "{}", serde_json::to_string(&response).unwrap());
        let _ = stdout.flush();

        if is_goodbye {
            break;
        }
    }

    eprintln!("roverrace shell shutting down");
}

fn process_command(command: ShellCommand, app: &mut App) -> ShellResponse {
    match command {
        ShellCommand::Observe => make_response(ResponsePayload::State {
            observation: observe(app),
        }),

        ShellCommand::Step { ticks } => {
            // One tick is one playback slot of virtual time, so a race at
            // the default rate replays one operation per tick.
            let interval = app.world().resource::<RaceSettings>().playback_interval();
            app.insert_resource(TimeUpdateStrategy::ManualDuration(interval));
            for _ in 0..ticks.min(MAX_STEP_TICKS) {
                app.update();
            }
            app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::ZERO));
            settle(app);
            make_response(ResponsePayload::Ok)
        }

        ShellCommand::Press { id } => match app.world().resource::<CommandPalette>().press(id) {
            Some(pressed) => queue_and_report(pressed, app),
            None => make_response(ResponsePayload::Error {
                message: format!("{id:?} is disabled in this phase"),
            }),
        },

        ShellCommand::Quit => make_response(ResponsePayload::Goodbye),

        other => match other.to_race_command() {
            Some(race_command) => queue_and_report(race_command, app),
            None => make_response(ResponsePayload::Error {
                message: format!("{other:?} does not map to a race command"),
            }),
        },
    }
}

/// Queue one console command, settle, and translate its dispatch outcome
/// into a response.
fn queue_and_report(command: RaceCommand, app: &mut App) -> ShellResponse {
    app.world_mut()
        .resource_mut::<CommandQueue>()
        .push(CommandSource::Console, command.clone());
    settle(app);

    // Newest matching console record; machine-raised duplicates of the
    // same command land under a different source.
    let world = app.world();
    let outcome = world
        .resource::<DispatchLog>()
        .entries()
        .iter()
        .rev()
        .find(|record| record.command == command && record.source == CommandSource::Console)
        .map(|record| record.outcome.clone());

    match outcome {
        Some(DispatchOutcome::Rejected) => {
            let phase = *world.resource::<State<RacePhase>>().get();
            make_response(ResponsePayload::Error {
                message: format!("{command:?} is not legal while {}", phase.label()),
            })
        }
        Some(DispatchOutcome::Ignored) => make_response(ResponsePayload::Error {
            message: format!("{command:?} had no effect"),
        }),
        _ => make_response(ResponsePayload::Ok),
    }
}

fn observe(app: &App) -> RaceObservation {
    let world = app.world();
    let phase = *world.resource::<State<RacePhase>>().get();
    let grid = &world.resource::<MasterGrid>().0;
    let endpoints = world.resource::<Endpoints>();
    let log = world.resource::<OperationLog>();

    let starts = (0..ROVER_COUNT)
        .map(|rover| {
            let pos = endpoints.start(rover);
            [pos.x(), pos.y()]
        })
        .collect();
    let goal = endpoints.goal();

    RaceObservation {
        phase: phase.label().to_string(),
        grid_cols: grid.cols(),
        grid_rows: grid.rows(),
        wall_count: grid.wall_count(),
        starts,
        goal: [goal.x(), goal.y()],
        pending_operations: log.len(),
        operation_digest: log.digest(),
        palette: world
            .resource::<CommandPalette>()
            .bindings()
            .iter()
            .map(|binding| PaletteEntry {
                id: binding.id,
                label: binding.label.to_string(),
                enabled: binding.enabled,
            })
            .collect(),
        dispatch: *world.resource::<DispatchStats>(),
        summary: world
            .resource::<ActiveRace>()
            .0
            .as_ref()
            .map(RaceSummary::from_graph),
    }
}

fn settle(app: &mut App) {
    for _ in 0..SETTLE_UPDATES {
        app.update();
    }
}
