//! Criterion benchmarks for the race engine and the full playback stack.
//!
//! The engine group measures `run_race` alone (three instrumented searches
//! plus winner folding) on open and serpentine courses. The full-stack
//! group drives a complete restart-to-finished cycle through the headless
//! rig, which includes command dispatch, playback draining, and the view
//! event stream.
//!
//! Run with: cargo bench -p race --bench race_bench --features bench

use criterion::{criterion_group, criterion_main, Criterion};

use pathgrid::{Grid, GridPos, NullProbe};
use race::commands::RaceCommand;
use race::config::TieMode;
use race::course::Endpoints;
use race::engine::run_race;
use race::test_harness::TestRig;

/// Vertical wall stripes every `spacing` columns with a one-cell gap
/// alternating between top and bottom, so every path serpentines.
fn striped_course(cols: i32, rows: i32, spacing: i32) -> (Grid, Endpoints) {
    let endpoints = Endpoints::centered(cols, rows);
    let mut grid = Grid::new(cols, rows);
    let mut gap_at_bottom = true;
    let mut x = spacing;
    while x < cols {
        let gap = if gap_at_bottom { rows - 1 } else { 0 };
        for y in 0..rows {
            if y == gap {
                continue;
            }
            let pos = GridPos(x, y);
            if !endpoints.occupies(pos) {
                grid.set_walkable_at(pos, false);
            }
        }
        gap_at_bottom = !gap_at_bottom;
        x += spacing;
    }
    (grid, endpoints)
}

fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine");

    let open_grid = Grid::new(64, 36);
    let open_endpoints = Endpoints::centered(64, 36);
    group.bench_function("open_64x36", |b| {
        b.iter(|| {
            run_race(
                &open_grid,
                &open_endpoints,
                TieMode::FullTieSet,
                &mut NullProbe,
            )
        })
    });

    for (label, cols, rows) in [("striped_64x36", 64, 36), ("striped_128x72", 128, 72)] {
        let (grid, endpoints) = striped_course(cols, rows, 8);
        group.bench_function(label, |b| {
            b.iter(|| run_race(&grid, &endpoints, TieMode::FullTieSet, &mut NullProbe))
        });
    }

    group.finish();
}

fn bench_full_stack(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_stack");
    group.sample_size(20);

    // Steady state: every iteration goes Finished -> Restarting ->
    // Searching -> (drain everything) -> Finished.
    let mut rig = TestRig::new();
    rig.send(RaceCommand::Start);
    rig.advance(7_200_000);
    rig.flush();

    group.bench_function("restart_to_finished", |b| {
        b.iter(|| {
            rig.clear_captured();
            rig.send(RaceCommand::Restart);
            rig.advance(60);
            rig.flush();
            rig.advance(7_200_000);
            rig.flush();
        })
    });

    group.finish();
}

criterion_group!(benches, bench_engine, bench_full_stack);
criterion_main!(benches);
