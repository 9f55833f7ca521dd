mod common;

use common::{MemorySink, RecordingDisplay, Rig, capture_logs};
use finchgate_core::{
    Activity, CueColours, CurrentTrial, Gate, RunFlag, SessionPhase, TimeoutSlot,
};
use finchgate_experiment::{SessionController, SessionEvent, SessionSettings};
use finchgate_timing::ManualTimer;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Duration;
use tracing::Level;

const TIMEOUT: Duration = Duration::from_secs(5);

fn assert_configuring_implies_paused(rig: &Rig) {
    if rig.session.is_configuring() {
        assert!(rig.session.is_paused());
    }
}

#[test]
fn test_new_session_awaits_obstacle_setup() {
    let rig = Rig::new(1);
    let session = &rig.session;

    assert_eq!(session.phase(), SessionPhase::AwaitingObstacleSetup);
    assert!(session.awaiting_setup());
    assert!(session.is_configuring());
    assert!(session.is_paused());
    assert_eq!(session.run_flag(), RunFlag::Unset);
    assert!(session.current_trial().is_blank());
    assert_eq!(session.obstacle(), None);

    let proposed = session.proposed_obstacle().unwrap().clone();
    assert!(session.catalog().valid_obstacles().contains(&proposed));

    let display = rig.display.borrow();
    assert!(display.preview_visible);
    assert_eq!(
        display.preview,
        Some(CueColours::new(proposed.left_fg, proposed.right_fg))
    );
    assert_eq!(display.cue, Some(CueColours::pause()));
}

#[test]
fn test_confirm_cycle_starts_a_matching_trial() {
    let mut rig = Rig::new(2);
    let proposed = rig.session.proposed_obstacle().unwrap().clone();

    rig.session.toggle_obstacle();

    assert!(!rig.session.is_configuring());
    assert!(!rig.session.is_paused());
    assert_eq!(rig.session.obstacle(), Some(&proposed));
    assert!(!rig.session.awaiting_setup());

    let trial = rig.session.current_trial().definition().unwrap().clone();
    assert!(trial.obstacle().matches(&proposed));
    assert!(!rig.display.borrow().preview_visible);
    assert_eq!(rig.cue(), Some(trial.cue()));
    assert_eq!(rig.session.phase(), SessionPhase::Running);
}

#[test]
fn test_pause_cannot_be_cleared_while_configuring() {
    let mut rig = Rig::new(3);
    let updates = rig.cue_updates();

    let logs = capture_logs(|| {
        rig.session.toggle_pause(Some(false));
        rig.session.toggle_pause(None);
        rig.session.handle_event(SessionEvent::TogglePause);
    });

    assert_eq!(rig.session.activity(), Activity::ConfiguringObstacle);
    assert_configuring_implies_paused(&rig);
    assert_eq!(rig.cue_updates(), updates);
    assert_eq!(rig.cue(), Some(CueColours::pause()));
    assert_eq!(logs.at(Level::INFO).len(), 3);
}

#[test]
fn test_entrance_then_exit_completes_a_passage() {
    let mut rig = Rig::running(4);
    let before = rig.session.current_trial().trial_id();
    let updates = rig.cue_updates();

    rig.session.gate_crossed(Gate::Entrance);
    rig.advance(Duration::from_secs(2));
    assert_eq!(rig.session.crossing_state(), (true, false));
    rig.session.gate_crossed(Gate::Left);

    assert_eq!(rig.session.passages(), 1);
    assert_eq!(rig.session.crossing_state(), (false, false));
    assert_eq!(rig.pending_timers(), 0);
    assert_eq!(rig.cue_updates(), updates + 1);

    let events = rig.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].gate_id, Gate::Entrance);
    assert_eq!(events[1].gate_id, Gate::Left);
    // both halves are attributed to the trial the bird actually ran
    assert!(events.iter().all(|e| e.trial_id == before));
    assert!(events[1].epoch_time - events[0].epoch_time >= 2.0);
}

#[test]
fn test_exit_before_entrance_also_completes() {
    let mut rig = Rig::running(5);
    rig.session.gate_crossed(Gate::Right);
    assert_eq!(rig.session.crossing_state(), (false, true));
    rig.session.gate_crossed(Gate::Entrance);
    assert_eq!(rig.session.passages(), 1);
    assert_eq!(rig.session.crossing_state(), (false, false));
}

#[test]
fn test_timed_out_entrance_does_not_pair() {
    let mut rig = Rig::running(6);

    rig.session.gate_crossed(Gate::Entrance);
    rig.advance(TIMEOUT + Duration::from_millis(1));
    assert!(!rig.session.tracker().entrance_crossed());

    rig.session.gate_crossed(Gate::Left);

    assert_eq!(rig.session.passages(), 0);
    assert_eq!(rig.session.crossing_state(), (false, true));
    assert_eq!(rig.events().len(), 2);
}

#[test]
fn test_recrossing_restarts_the_timeout() {
    let mut rig = Rig::running(7);

    rig.session.gate_crossed(Gate::Entrance);
    rig.advance(Duration::from_secs(3));
    rig.session.gate_crossed(Gate::Entrance);
    assert_eq!(rig.pending_timers(), 1);

    // the first timer would have expired here
    rig.advance(Duration::from_secs(3));
    assert!(rig.session.tracker().entrance_crossed());

    rig.advance(Duration::from_secs(3));
    assert!(!rig.session.tracker().entrance_crossed());
    assert_eq!(rig.pending_timers(), 0);
}

#[test]
fn test_crossings_while_paused_are_discarded() {
    let mut rig = Rig::running(8);
    rig.session.toggle_pause(Some(true));
    let trial = rig.session.current_trial().clone();
    let updates = rig.cue_updates();

    let logs = capture_logs(|| {
        for gate in Gate::ALL {
            rig.session.gate_crossed(gate);
        }
    });

    assert!(rig.events().is_empty());
    assert_eq!(rig.session.crossing_state(), (false, false));
    assert_eq!(rig.pending_timers(), 0);
    assert_eq!(rig.session.current_trial(), &trial);
    assert_eq!(rig.cue_updates(), updates);
    let warnings = logs.at(Level::WARN);
    assert_eq!(warnings.len(), 3);
    assert!(warnings[0].contains("while paused"));
}

#[test]
fn test_crossings_during_setup_are_discarded() {
    let mut rig = Rig::new(9);
    rig.session.gate_crossed(Gate::Entrance);
    rig.session.gate_crossed(Gate::Left);
    assert!(rig.events().is_empty());
    assert_eq!(rig.session.crossing_state(), (false, false));
}

#[test]
fn test_pausing_resets_pending_crossings() {
    let mut rig = Rig::running(10);
    rig.session.gate_crossed(Gate::Entrance);
    assert_eq!(rig.pending_timers(), 1);

    rig.session.toggle_pause(None);
    assert_eq!(rig.session.crossing_state(), (false, false));
    assert_eq!(rig.pending_timers(), 0);
    assert_eq!(rig.cue(), Some(CueColours::pause()));
    assert_eq!(rig.session.phase(), SessionPhase::Paused);

    rig.session.toggle_pause(None);
    assert!(!rig.session.is_paused());
    assert_eq!(rig.cue(), rig.session.current_trial().cue());

    // a stale half from before the pause cannot complete a passage
    rig.session.gate_crossed(Gate::Left);
    assert_eq!(rig.session.passages(), 0);
}

#[test]
fn test_explicit_pause_to_same_state_is_a_no_op() {
    let mut rig = Rig::running(11);
    let updates = rig.cue_updates();
    rig.session.toggle_pause(Some(false));
    assert!(!rig.session.is_paused());
    assert_eq!(rig.cue_updates(), updates);
}

#[test]
fn test_advance_is_ignored_while_paused() {
    let mut rig = Rig::running(12);
    rig.session.toggle_pause(Some(true));
    let trial = rig.session.current_trial().clone();
    let updates = rig.cue_updates();

    let logs = capture_logs(|| rig.session.advance_trial());

    assert_eq!(rig.session.current_trial(), &trial);
    assert_eq!(rig.cue_updates(), updates);
    assert_eq!(logs.at(Level::WARN).len(), 1);
}

#[test]
fn test_advance_keeps_trials_compatible() {
    let mut rig = Rig::running(13);
    let obstacle = rig.session.obstacle().unwrap().clone();
    for _ in 0..50 {
        rig.session.handle_event(SessionEvent::AdvanceTrial);
        let trial = rig.session.current_trial().definition().unwrap();
        assert!(trial.obstacle().matches(&obstacle));
    }
}

#[test]
fn test_reconfiguring_mid_session() {
    let mut rig = Rig::running(14);
    rig.session.gate_crossed(Gate::Entrance);

    rig.session.handle_event(SessionEvent::ToggleObstacle);
    assert_eq!(rig.session.activity(), Activity::ConfiguringObstacle);
    assert_configuring_implies_paused(&rig);
    assert_eq!(rig.session.phase(), SessionPhase::Paused);
    assert_eq!(rig.session.crossing_state(), (false, false));
    assert_eq!(rig.pending_timers(), 0);
    assert_eq!(rig.cue(), Some(CueColours::pause()));
    assert!(rig.display.borrow().preview_visible);

    rig.session.gate_crossed(Gate::Left);
    assert_eq!(rig.events().len(), 1);

    let proposed = rig.session.proposed_obstacle().unwrap().clone();
    rig.session.handle_event(SessionEvent::ToggleObstacle);
    assert_eq!(rig.session.obstacle(), Some(&proposed));
    assert!(!rig.session.is_paused());
    assert!(
        rig.session
            .current_trial()
            .definition()
            .unwrap()
            .obstacle()
            .matches(&proposed)
    );
}

#[test]
fn test_timeouts_after_passage_are_benign() {
    let mut rig = Rig::running(15);
    rig.session.gate_crossed(Gate::Entrance);
    let token = rig
        .session
        .tracker()
        .pending_timer(finchgate_core::CrossingSlot::Entrance)
        .unwrap();
    rig.session.gate_crossed(Gate::Right);

    rig.session.timer_fired(token);
    rig.session.gate_crossing_timeout(TimeoutSlot::Exit);
    rig.session.gate_crossing_timeout(TimeoutSlot::All);

    assert_eq!(rig.session.crossing_state(), (false, false));
    assert_eq!(rig.session.passages(), 1);
}

#[test]
fn test_explicit_timeout_clears_named_slot() {
    let mut rig = Rig::running(16);
    rig.session.gate_crossed(Gate::Entrance);
    rig.session.gate_crossed(Gate::Entrance);
    rig.session.gate_crossing_timeout(TimeoutSlot::Entrance);
    assert_eq!(rig.session.crossing_state(), (false, false));
    assert_eq!(rig.pending_timers(), 0);
}

#[test]
fn test_exit_is_idempotent() {
    let mut rig = Rig::running(17);
    rig.session.gate_crossed(Gate::Entrance);

    rig.session.exit();
    rig.session.handle_event(SessionEvent::Exit);

    assert_eq!(rig.session.phase(), SessionPhase::Terminated);
    assert_eq!(rig.display.borrow().closed, 1);
    assert_eq!(rig.sink.borrow().closed, 1);
    assert_eq!(rig.pending_timers(), 0);

    rig.session.gate_crossed(Gate::Left);
    rig.session.toggle_pause(None);
    rig.session.toggle_obstacle();
    assert_eq!(rig.events().len(), 1);
    assert_eq!(rig.session.phase(), SessionPhase::Terminated);
}

#[test]
fn test_exit_during_setup_never_starts_trials() {
    let mut rig = Rig::new(18);
    rig.session.exit();

    assert!(!rig.session.awaiting_setup());
    assert!(!rig.session.begin_run());
    assert_eq!(rig.session.run_flag(), RunFlag::Stopped);

    rig.session.toggle_obstacle();
    assert!(rig.session.current_trial().is_blank());
    assert_eq!(rig.display.borrow().closed, 1);
}

#[test]
fn test_begin_run_waits_for_setup() {
    let mut rig = Rig::new(19);
    assert!(!rig.session.begin_run());
    assert_eq!(rig.session.run_flag(), RunFlag::Unset);

    rig.session.toggle_obstacle();
    assert!(rig.session.begin_run());
    assert_eq!(rig.session.run_flag(), RunFlag::Running);
    assert!(rig.session.begin_run());
}

#[test]
fn test_gate_events_drive_a_full_block() {
    let mut rig = Rig::running(20);
    for _ in 0..10 {
        rig.session.handle_event(SessionEvent::Gate(Gate::Entrance));
        rig.advance(Duration::from_millis(800));
        rig.session.handle_event(SessionEvent::Gate(Gate::Right));
        rig.advance(Duration::from_secs(10));
    }
    assert_eq!(rig.session.passages(), 10);
    assert_eq!(rig.events().len(), 20);
    assert!(matches!(rig.session.current_trial(), CurrentTrial::Trial(_)));
}

#[test]
fn test_launch_with_unknown_obstacle_aborts() {
    let source = r#"
valid_obstacles = [{ left_fg = "white", right_fg = "white" }]

[[trial]]
trial_id = 1
left_bg = "light"
right_bg = "dark"
left_fg = "white"
right_fg = "white"

[[trial]]
trial_id = 2
left_bg = "dark"
right_bg = "light"
left_fg = "white submitted"
right_fg = "white"
"#;
    let timer = ManualTimer::default();
    let display = RecordingDisplay::new(timer.clone());
    let sink = MemorySink::default();
    let (display_log, sink_log) = (display.log.clone(), sink.log.clone());

    let result = SessionController::launch(
        source,
        display,
        sink,
        timer,
        ChaCha8Rng::seed_from_u64(0),
        SessionSettings::default(),
    );

    assert!(result.is_err());
    let display = display_log.borrow();
    assert_eq!(display.closed, 1);
    assert_eq!(display.cue_updates, 0);
    assert!(!display.preview_visible);
    assert_eq!(sink_log.borrow().closed, 1);
}

#[test]
fn test_launch_with_builtin_catalog() {
    let timer = ManualTimer::default();
    let session = SessionController::launch(
        finchgate_experiment::DEFAULT_CATALOG,
        RecordingDisplay::new(timer.clone()),
        MemorySink::default(),
        timer,
        ChaCha8Rng::seed_from_u64(0),
        SessionSettings::default(),
    )
    .unwrap();
    assert!(session.awaiting_setup());
}
