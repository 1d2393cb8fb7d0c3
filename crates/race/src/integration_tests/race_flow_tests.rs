//! Whole-race scenarios: winners, ties, unreachable goals, equalization,
//! and replay determinism.

use pathgrid::path_length;

use crate::commands::RaceCommand;
use crate::config::{RaceSettings, TieMode};
use crate::engine::RaceGraph;
use crate::integration_tests::phase_transition_tests::run_to_finished;
use crate::phase::RacePhase;
use crate::test_harness::TestRig;
use crate::view::ViewCommand;

fn walls_around(rig: &mut TestRig, x: i32, y: i32) {
    for (dx, dy) in [(0, -1), (1, 0), (0, 1), (-1, 0)] {
        rig.draw_wall(x + dx, y + dy);
    }
}

fn finished_race(rig: &TestRig) -> RaceGraph {
    rig.race().expect("race should be on display")
}

#[test]
fn default_course_single_winner() {
    let mut rig = TestRig::new();
    rig.send(RaceCommand::Start);

    let graph = finished_race(&rig);
    assert_eq!(graph.winners, vec![1]);
    assert_eq!(graph.win_length, 10.0);
    assert_eq!(graph.rovers[0].length, 15.0);
    assert_eq!(graph.rovers[1].length, 10.0);
    assert_eq!(graph.rovers[2].length, 15.0);
    assert!(graph.operation_count > 0);
    // The recorder still holds everything except the immediately
    // replayed first operation.
    assert_eq!(rig.op_count(), graph.operation_count - 1);
}

#[test]
fn finishing_equalizes_the_drawn_paths() {
    let mut rig = TestRig::new();
    run_to_finished(&mut rig);

    let graph = finished_race(&rig);
    for rover in &graph.rovers {
        assert!((path_length(&rover.drawn) - graph.win_length).abs() < 1e-9);
        assert!(rover.drawn.len() <= rover.path.len());
        assert_eq!(rover.drawn[..], rover.path[..rover.drawn.len()]);
    }
    assert_eq!(
        graph.rovers[1].drawn.len(),
        graph.rovers[1].path.len(),
        "the winner keeps its full path"
    );
}

#[test]
fn finish_draws_paths_and_parks_rovers() {
    let mut rig = TestRig::new();
    rig.send(RaceCommand::Start);
    rig.clear_captured();
    rig.advance(7_200_000);
    rig.flush();

    let captured = rig.captured();
    let drawn = captured
        .iter()
        .filter(|command| matches!(command, ViewCommand::DrawPath { .. }))
        .count();
    assert_eq!(drawn, 3);
    let parked = captured
        .iter()
        .filter(|command| matches!(command, ViewCommand::SetRoverPos { .. }))
        .count();
    assert_eq!(parked, 3);
    assert!(captured
        .iter()
        .any(|command| matches!(command, ViewCommand::ShowStats(_))));
}

#[test]
fn walled_goal_finishes_with_no_winner() {
    let mut rig = TestRig::new();
    let goal = rig.endpoints().goal();
    walls_around(&mut rig, goal.x(), goal.y());
    rig.clear_captured();
    run_to_finished(&mut rig);

    let graph = finished_race(&rig);
    assert!(graph.winners.is_empty());
    for rover in &graph.rovers {
        assert!(!rover.is_reachable());
    }

    let captured = rig.captured();
    assert!(!captured
        .iter()
        .any(|command| matches!(command, ViewCommand::DrawPath { .. })));
    let headline = captured.iter().find_map(|command| match command {
        ViewCommand::ShowStats(summary) => Some(summary.headline()),
        _ => None,
    });
    assert_eq!(headline.as_deref(), Some("no rover can reach the goal"));
}

#[test]
fn symmetric_flankers_share_the_win() {
    let mut rig = TestRig::new();
    let boxed = rig.endpoints().start(1);
    walls_around(&mut rig, boxed.x(), boxed.y());
    rig.send(RaceCommand::Start);

    let graph = finished_race(&rig);
    assert_eq!(graph.winners, vec![0, 2]);
    assert_eq!(graph.win_length, 15.0);
}

#[test]
fn first_minimum_mode_keeps_the_lowest_index() {
    let settings = RaceSettings {
        tie_mode: TieMode::FirstMinimum,
        ..RaceSettings::default()
    };
    let mut rig = TestRig::with_settings(settings);
    let boxed = rig.endpoints().start(1);
    walls_around(&mut rig, boxed.x(), boxed.y());
    rig.send(RaceCommand::Start);

    assert_eq!(finished_race(&rig).winners, vec![0]);
}

#[test]
fn identical_courses_record_identical_operations() {
    let build = || {
        let mut rig = TestRig::new();
        rig.draw_wall_column(32, 10, 26);
        rig.send(RaceCommand::Start);
        rig
    };
    let first = build();
    let second = build();
    assert!(first.op_count() > 0);
    assert_eq!(first.op_count(), second.op_count());
    assert_eq!(first.digest(), second.digest());
}

#[test]
fn restart_reproduces_the_same_race() {
    let mut rig = TestRig::new();
    rig.draw_wall_column(32, 14, 22);
    rig.send(RaceCommand::Start);
    let first_digest = rig.digest();
    let first_count = rig.op_count();

    rig.send(RaceCommand::Restart);
    rig.advance(60);
    rig.flush();
    assert_eq!(rig.phase(), RacePhase::Searching);
    assert_eq!(rig.op_count(), first_count);
    assert_eq!(rig.digest(), first_digest);
}

#[test]
fn moving_the_goal_changes_the_race() {
    let mut rig = TestRig::new();
    rig.send(RaceCommand::BeginDragGoal);
    rig.send(RaceCommand::Sweep { x: 45, y: 18 });
    rig.send(RaceCommand::EndInteraction);

    rig.send(RaceCommand::Start);
    let graph = finished_race(&rig);
    assert_eq!(graph.winners, vec![1]);
    assert_eq!(graph.win_length, 18.0);
}

#[test]
fn summary_reaches_the_view_with_engine_numbers() {
    let mut rig = TestRig::new();
    run_to_finished(&mut rig);
    let graph = finished_race(&rig);

    let summary = rig
        .captured()
        .iter()
        .find_map(|command| match command {
            ViewCommand::ShowStats(summary) => Some(summary.clone()),
            _ => None,
        })
        .expect("stats should have been shown");
    assert_eq!(summary.operation_count, graph.operation_count);
    assert_eq!(summary.winners, graph.winners);
    assert!(summary.time_spent_ms >= 0.0);
    assert_eq!(summary.headline(), "rover 1 wins at length 10.00");
}
