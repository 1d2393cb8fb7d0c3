//! Lifecycle transitions through the full app, including the boot
//! handshake and rejection behavior.

use crate::commands::{DispatchOutcome, RaceCommand};
use crate::phase::RacePhase;
use crate::test_harness::TestRig;
use crate::view::ViewCommand;

/// Drains the whole recording in one jump and settles into `Finished`.
pub fn run_to_finished(rig: &mut TestRig) {
    rig.send(RaceCommand::Start);
    assert_eq!(rig.phase(), RacePhase::Searching);
    rig.advance(7_200_000);
    rig.flush();
    assert_eq!(rig.phase(), RacePhase::Finished);
}

#[test]
fn boots_through_the_view_handshake_into_ready() {
    let rig = TestRig::new();
    assert_eq!(rig.phase(), RacePhase::Ready);

    let captured = rig.captured();
    assert!(matches!(
        captured.first(),
        Some(ViewCommand::BuildGrid { cols: 64, rows: 36 })
    ));
    let markers = captured
        .iter()
        .filter(|command| matches!(command, ViewCommand::SetStartMarker { .. }))
        .count();
    assert_eq!(markers, 3);
    assert!(captured
        .iter()
        .any(|command| matches!(command, ViewCommand::SetGoalMarker { x: 37, y: 18 })));
}

#[test]
fn without_the_handshake_everything_is_rejected() {
    let mut rig = TestRig::without_view_ack();
    assert_eq!(rig.phase(), RacePhase::Booting);

    rig.send(RaceCommand::Start);
    assert_eq!(rig.phase(), RacePhase::Booting);
    rig.send(RaceCommand::ResetGrid);
    assert_eq!(rig.phase(), RacePhase::Booting);
    assert_eq!(rig.dispatch_stats().rejected, 2);

    rig.send(RaceCommand::GridMaterialized);
    assert_eq!(rig.phase(), RacePhase::Ready);
}

#[test]
fn start_pause_resume_cancel_round_trip() {
    let mut rig = TestRig::new();
    rig.send(RaceCommand::Start);
    assert_eq!(rig.phase(), RacePhase::Searching);
    assert!(rig.race().is_some());
    assert!(rig.op_count() > 0);

    rig.send(RaceCommand::Pause);
    assert_eq!(rig.phase(), RacePhase::Paused);
    rig.send(RaceCommand::Resume);
    assert_eq!(rig.phase(), RacePhase::Searching);

    rig.send(RaceCommand::Pause);
    rig.send(RaceCommand::Cancel);
    assert_eq!(rig.phase(), RacePhase::Ready);
    assert!(rig.race().is_none());
    assert_eq!(rig.op_count(), 0);
}

#[test]
fn cancel_emits_the_display_teardown() {
    let mut rig = TestRig::new();
    rig.send(RaceCommand::Start);
    rig.send(RaceCommand::Pause);
    rig.clear_captured();

    rig.send(RaceCommand::Cancel);
    let captured = rig.captured();
    assert!(captured.contains(&ViewCommand::ClearFootprints));
    assert!(captured.contains(&ViewCommand::ClearPaths));
}

#[test]
fn finished_modify_and_clear_path() {
    let mut rig = TestRig::new();
    run_to_finished(&mut rig);

    rig.send(RaceCommand::Modify);
    assert_eq!(rig.phase(), RacePhase::Modified);

    rig.send(RaceCommand::ClearPath);
    assert_eq!(rig.phase(), RacePhase::Ready);
    assert!(rig.race().is_none());
}

#[test]
fn restart_goes_through_the_settle_phase() {
    let mut rig = TestRig::new();
    run_to_finished(&mut rig);

    rig.send(RaceCommand::Restart);
    assert_eq!(rig.phase(), RacePhase::Restarting);

    rig.advance(60);
    rig.flush();
    assert_eq!(rig.phase(), RacePhase::Searching);
    assert!(rig.op_count() > 0);
}

#[test]
fn restart_is_also_legal_mid_search() {
    let mut rig = TestRig::new();
    rig.send(RaceCommand::Start);
    rig.advance_times(50, 5);

    rig.send(RaceCommand::Restart);
    assert_eq!(rig.phase(), RacePhase::Restarting);
    rig.advance(60);
    rig.flush();
    assert_eq!(rig.phase(), RacePhase::Searching);
}

#[test]
fn leaving_the_settle_phase_drops_the_relaunch() {
    let mut rig = TestRig::new();
    run_to_finished(&mut rig);
    rig.send(RaceCommand::Restart);
    assert_eq!(rig.phase(), RacePhase::Restarting);

    rig.send(RaceCommand::ResetGrid);
    assert_eq!(rig.phase(), RacePhase::Ready);

    rig.advance(1_000);
    rig.flush();
    assert_eq!(rig.phase(), RacePhase::Ready);
    assert!(rig.race().is_none());
    assert_eq!(rig.op_count(), 0);
}

#[test]
fn reset_on_the_settle_deadline_beats_the_relaunch() {
    let mut rig = TestRig::new();
    rig.draw_wall(10, 10);
    run_to_finished(&mut rig);
    rig.send(RaceCommand::Restart);
    assert_eq!(rig.phase(), RacePhase::Restarting);

    // Reset dispatched in the very frame the settle timer would expire.
    rig.advance(59);
    rig.push(RaceCommand::ResetGrid);
    rig.advance(1);
    rig.flush();
    assert_eq!(rig.phase(), RacePhase::Ready);
    assert!(rig.race().is_none());

    rig.advance(1_000);
    rig.flush();
    assert_eq!(rig.phase(), RacePhase::Ready);
    assert_eq!(rig.wall_count(), 0);
    assert_eq!(rig.op_count(), 0);
}

#[test]
fn rejected_commands_change_nothing() {
    let mut rig = TestRig::new();
    let endpoints = rig.endpoints();
    let palette = rig.palette();

    rig.send(RaceCommand::Pause);
    rig.send(RaceCommand::Resume);
    rig.send(RaceCommand::FinishSearch);

    assert_eq!(rig.phase(), RacePhase::Ready);
    assert_eq!(rig.endpoints(), endpoints);
    assert_eq!(rig.palette(), palette);
    assert_eq!(rig.wall_count(), 0);
    let stats = rig.dispatch_stats();
    // FinishSearch is machine-raised, so it lands as ignored, not rejected.
    assert_eq!(stats.rejected, 2);
    assert_eq!(stats.ignored, 1);
}

#[test]
fn stale_grid_ack_is_ignored_not_rejected() {
    let mut rig = TestRig::new();
    rig.send(RaceCommand::GridMaterialized);
    assert_eq!(rig.phase(), RacePhase::Ready);
    assert_eq!(
        rig.last_dispatch().map(|record| record.outcome),
        Some(DispatchOutcome::Ignored)
    );
}

#[test]
fn same_frame_pause_resume_nets_out() {
    let mut rig = TestRig::new();
    rig.send(RaceCommand::Start);
    let before = rig.op_count();

    rig.push(RaceCommand::Pause);
    rig.push(RaceCommand::Resume);
    rig.flush();

    assert_eq!(rig.phase(), RacePhase::Searching);
    // No re-entry: the immediate resume step did not fire again.
    assert_eq!(rig.op_count(), before);
    rig.advance(50);
    assert_eq!(rig.op_count(), before - 1);
}

#[test]
fn palette_follows_the_phase() {
    use crate::palette::CommandId;

    let mut rig = TestRig::new();
    assert_eq!(
        rig.palette().press(CommandId::PrimaryAction),
        Some(RaceCommand::Start)
    );

    rig.send(RaceCommand::Start);
    assert_eq!(
        rig.palette().press(CommandId::PrimaryAction),
        Some(RaceCommand::Restart)
    );
    assert_eq!(
        rig.palette().press(CommandId::SecondaryAction),
        Some(RaceCommand::Pause)
    );

    rig.send(RaceCommand::Pause);
    assert_eq!(
        rig.palette().press(CommandId::PrimaryAction),
        Some(RaceCommand::Resume)
    );
}

#[test]
fn pressing_palette_slots_drives_the_race() {
    use crate::palette::CommandId;

    let mut rig = TestRig::new();
    assert!(rig.press(CommandId::PrimaryAction));
    assert_eq!(rig.phase(), RacePhase::Searching);

    assert!(rig.press(CommandId::SecondaryAction));
    assert_eq!(rig.phase(), RacePhase::Paused);

    // Secondary is now Cancel.
    assert!(rig.press(CommandId::SecondaryAction));
    assert_eq!(rig.phase(), RacePhase::Ready);
}

#[test]
fn disabled_palette_slots_do_not_fire() {
    use crate::palette::CommandId;

    let mut rig = TestRig::new();
    // Secondary (pause) is disabled while ready.
    assert!(!rig.press(CommandId::SecondaryAction));
    assert_eq!(rig.phase(), RacePhase::Ready);
}
