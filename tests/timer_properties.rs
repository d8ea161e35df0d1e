use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc::{self, UnboundedReceiver};

use antiflag_chess::models::Side;
use antiflag_chess::timer::{
    Clock, FakeTime, TimerController, TimerEvent, TimerEventKind, TimerPhase,
};

fn controller(
    turn_ms: u64,
    grace_ms: u64,
) -> (
    TimerController<FakeTime>,
    UnboundedReceiver<TimerEvent>,
    FakeTime,
) {
    let time = FakeTime::new();
    let (tx, rx) = mpsc::unbounded_channel();
    let controller = TimerController::new(
        Duration::from_millis(turn_ms),
        Duration::from_millis(grace_ms),
        time.clone(),
        tx,
    );
    (controller, rx, time)
}

fn drain(rx: &mut UnboundedReceiver<TimerEvent>) -> Vec<TimerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn transitions(events: &[TimerEvent]) -> Vec<(TimerEventKind, Side)> {
    events
        .iter()
        .filter(|e| e.kind != TimerEventKind::Tick)
        .map(|e| (e.kind, e.player))
        .collect()
}

fn running_count(controller: &TimerController<FakeTime>) -> usize {
    [
        controller.clock(Side::White).is_running(),
        controller.clock(Side::Black).is_running(),
        controller.grace_clock().is_running(),
    ]
    .into_iter()
    .filter(|r| *r)
    .count()
}

#[test]
fn conservation_and_exclusivity_under_random_play() {
    let turn_ms = 10_000;
    let (mut controller, mut rx, time) = controller(turn_ms, 2000);
    let mut rng = StdRng::seed_from_u64(0xC10C);
    controller.start_game();

    for _ in 0..5000 {
        time.advance_ms(rng.gen_range(1..=250));
        controller.poll();
        for event in drain(&mut rx) {
            if event.kind == TimerEventKind::GraceExpired {
                controller.on_move_made();
            }
        }
        if rng.gen_bool(0.02) {
            controller.on_move_made();
        }

        assert!(running_count(&controller) <= 1);
        let state = controller.timer_state();
        assert!(state.white_remaining_ms <= turn_ms);
        assert!(state.black_remaining_ms <= turn_ms);
        assert!(state.grace_remaining_ms <= 2000);
        if state.is_grace_period {
            assert!(state.active_player.is_some());
        }
    }
}

#[test]
fn stop_is_idempotent() {
    let time = FakeTime::new();
    let mut clock = Clock::new(Duration::from_secs(10), time.clone());
    clock.start();
    time.advance_ms(3250);
    let first = clock.stop();
    time.advance_ms(1000);
    let second = clock.stop();
    assert_eq!(first, 6750);
    assert_eq!(first, second);
    assert_eq!(clock.remaining_ms(), first);
}

#[test]
fn reads_are_accurate_between_ticks() {
    let time = FakeTime::new();
    let mut clock = Clock::new(Duration::from_secs(10), time.clone());
    clock.start();
    time.advance_ms(1234);
    assert_eq!(clock.remaining_ms(), 8766);
}

#[test]
fn late_ticks_do_not_change_the_total() {
    let time = FakeTime::new();
    let mut steady = Clock::new(Duration::from_secs(5), time.clone());
    steady.start();
    for _ in 0..20 {
        time.advance_ms(100);
        steady.tick();
    }

    let time = FakeTime::new();
    let mut stalled = Clock::new(Duration::from_secs(5), time.clone());
    stalled.start();
    time.advance_ms(1900);
    stalled.tick();
    time.advance_ms(100);
    stalled.tick();

    assert_eq!(steady.remaining_ms(), 3000);
    assert_eq!(stalled.remaining_ms(), 3000);
}

#[test]
fn expiry_sequence_with_grace() {
    let (mut controller, mut rx, time) = controller(10_000, 2000);
    controller.start_game();

    let mut events = Vec::new();
    for _ in 0..120 {
        time.advance_ms(100);
        controller.poll();
        events.extend(drain(&mut rx));
    }
    assert_eq!(
        transitions(&events),
        vec![
            (TimerEventKind::TurnExpired, Side::White),
            (TimerEventKind::GraceStarted, Side::White),
            (TimerEventKind::GraceExpired, Side::White),
        ]
    );
    // Every tick carries a full snapshot.
    assert!(events
        .iter()
        .filter(|e| e.kind == TimerEventKind::Tick)
        .all(|e| e.state.active_player == Some(Side::White)));

    controller.on_move_made();
    assert_eq!(controller.phase(), TimerPhase::Running(Side::Black));
    assert_eq!(controller.timer_state().black_remaining_ms, 10_000);
}

#[test]
fn zero_grace_collapses_the_window() {
    let (mut with_grace, mut graced_rx, graced_time) = controller(1000, 100);
    let (mut without, mut bare_rx, bare_time) = controller(1000, 0);
    with_grace.start_game();
    without.start_game();

    let mut graced = Vec::new();
    let mut bare = Vec::new();
    for _ in 0..12 {
        graced_time.advance_ms(100);
        bare_time.advance_ms(100);
        with_grace.poll();
        without.poll();
        graced.extend(drain(&mut graced_rx));
        bare.extend(drain(&mut bare_rx));
        assert!(!without.timer_state().is_grace_period);
    }

    let mut expected = transitions(&graced);
    expected.retain(|(kind, _)| *kind != TimerEventKind::GraceStarted);
    assert_eq!(transitions(&bare), expected);
    assert!(bare
        .iter()
        .all(|e| !e.state.is_grace_period));
}

#[test]
fn move_in_grace_cancels_expiry() {
    let (mut controller, mut rx, time) = controller(1000, 2000);
    controller.start_game();
    for _ in 0..15 {
        time.advance_ms(100);
        controller.poll();
    }
    assert_eq!(controller.phase(), TimerPhase::GracePeriod(Side::White));
    controller.on_move_made();
    drain(&mut rx);

    for _ in 0..5 {
        time.advance_ms(100);
        controller.poll();
    }
    assert!(drain(&mut rx)
        .iter()
        .all(|e| e.kind != TimerEventKind::GraceExpired));
    assert!(!controller.grace_clock().is_running());
}

#[test]
fn nothing_fires_after_stop_all() {
    let (mut controller, mut rx, time) = controller(1000, 0);
    controller.start_game();
    time.advance_ms(500);
    controller.poll();
    controller.stop_all();
    drain(&mut rx);

    time.advance_ms(5000);
    controller.poll();
    controller.on_move_made();
    controller.start_game();
    assert!(drain(&mut rx).is_empty());
    assert_eq!(controller.phase(), TimerPhase::Idle);
    assert_eq!(controller.timer_state().active_player, None);
}
