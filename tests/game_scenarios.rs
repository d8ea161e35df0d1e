use std::time::Duration;

use antiflag_chess::error::GameError;
use antiflag_chess::game::{ChessPosition, GameOrchestrator, LegalMoves};
use antiflag_chess::models::{
    AutoMoveReason, GameEndReason, GameResult, GameSettings, GameStatus, PieceKind,
    ServerMessage, Side, TimeoutBehavior, Winner,
};
use antiflag_chess::timer::FakeTime;

fn settings(turn: u32, grace: u32, behavior: TimeoutBehavior) -> GameSettings {
    GameSettings {
        turn_time_seconds: turn,
        grace_period_seconds: grace,
        timeout_behavior: behavior,
        host_color: Side::White,
    }
}

fn start(settings: GameSettings) -> (GameOrchestrator<FakeTime>, FakeTime) {
    let time = FakeTime::new();
    let mut game = GameOrchestrator::new("game", "white-session", settings, time.clone())
        .with_seed(2024);
    game.join("black-session").unwrap();
    (game, time)
}

/// Advances fake time in clock-tick steps, polling after each one.
fn run_for(
    game: &mut GameOrchestrator<FakeTime>,
    time: &FakeTime,
    ms: u64,
) -> Vec<ServerMessage> {
    let mut out = Vec::new();
    for _ in 0..ms / 100 {
        time.advance(Duration::from_millis(100));
        out.extend(game.poll_timers().into_iter().map(|o| o.message));
    }
    out
}

#[test]
fn scenario_a_grace_expiry_auto_moves_a_pawn() {
    let (mut game, time) = start(settings(10, 2, TimeoutBehavior::AutoMove));

    let messages = run_for(&mut game, &time, 10_000);
    assert_eq!(messages.len(), 2);
    assert!(matches!(
        messages[0],
        ServerMessage::TurnExpired {
            player: Side::White,
            ..
        }
    ));
    let ServerMessage::GraceStarted {
        player,
        grace_time_remaining,
        timers,
        ..
    } = &messages[1]
    else {
        panic!("expected grace_started, got {:?}", messages[1]);
    };
    assert_eq!(*player, Side::White);
    assert_eq!(*grace_time_remaining, 2000);
    assert!(timers.is_grace_period);
    assert_eq!(timers.white_remaining_ms, 0);

    let messages = run_for(&mut game, &time, 2000);
    assert_eq!(messages.len(), 1);
    let ServerMessage::AutoMove {
        record,
        reason,
        timers,
        ..
    } = &messages[0]
    else {
        panic!("expected auto_move, got {:?}", messages[0]);
    };
    assert_eq!(*reason, AutoMoveReason::GraceExpired);
    assert_eq!(record.piece, PieceKind::Pawn);
    assert_eq!(record.color, Side::White);
    assert!(record.is_auto_move);
    assert_eq!(timers.active_player, Some(Side::Black));
    assert_eq!(timers.black_remaining_ms, 10_000);
    assert!(!timers.is_grace_period);

    let state = game.timer_state();
    assert_eq!(state.active_player, Some(Side::Black));
    assert_eq!(state.black_remaining_ms, 10_000);
    assert_eq!(game.moves().len(), 1);
    assert_eq!(game.status(), GameStatus::Active);
}

#[test]
fn scenario_b_resignation_stops_everything() {
    let (mut game, time) = start(GameSettings::default());
    run_for(&mut game, &time, 1500);

    let out = game.resign("white-session").unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(
        game.result(),
        Some(GameResult {
            winner: Winner::Black,
            reason: GameEndReason::Resignation
        })
    );

    let timers = game.timers();
    assert!(!timers.clock(Side::White).is_running());
    assert!(!timers.clock(Side::Black).is_running());
    assert!(!timers.grace_clock().is_running());
    assert_eq!(timers.active_player(), None);

    assert!(run_for(&mut game, &time, 120_000).is_empty());
    assert!(game.sync_snapshot().is_none());
    assert_eq!(
        game.make_move("black-session", "e7e5").unwrap_err(),
        GameError::GameNotActive
    );
}

#[test]
fn scenario_c_declined_offer_can_be_repeated() {
    let (mut game, _) = start(GameSettings::default());

    game.offer_draw("white-session").unwrap();
    let out = game.respond_draw("black-session", false).unwrap();
    assert!(out.iter().any(|o| matches!(
        o.message,
        ServerMessage::DrawDeclined {
            by: Side::Black,
            ..
        }
    )));
    assert_eq!(game.draw_offer(), None);

    game.offer_draw("white-session").unwrap();
    assert_eq!(game.draw_offer().map(|o| o.from), Some(Side::White));
    assert_eq!(game.status(), GameStatus::Active);
}

#[test]
fn scenario_d_move_hands_over_a_fresh_clock() {
    let (mut game, time) = start(settings(30, 2, TimeoutBehavior::AutoMove));

    run_for(&mut game, &time, 4000);
    game.make_move("white-session", "e2e4").unwrap();
    let state = game.timer_state();
    assert_eq!(state.active_player, Some(Side::Black));
    assert_eq!(state.black_remaining_ms, 30_000);

    run_for(&mut game, &time, 12_000);
    game.make_move("black-session", "e7e5").unwrap();
    assert_eq!(game.timer_state().white_remaining_ms, 30_000);

    run_for(&mut game, &time, 29_900);
    game.make_move("white-session", "g1f3").unwrap();
    let state = game.timer_state();
    assert_eq!(state.active_player, Some(Side::Black));
    assert_eq!(state.black_remaining_ms, 30_000);
}

#[test]
fn move_during_grace_saves_the_player() {
    let (mut game, time) = start(settings(10, 2, TimeoutBehavior::AutoMove));
    run_for(&mut game, &time, 11_000);
    assert!(game.timer_state().is_grace_period);

    game.make_move("white-session", "d2d4").unwrap();
    let state = game.timer_state();
    assert!(!state.is_grace_period);
    assert_eq!(state.active_player, Some(Side::Black));

    let later = run_for(&mut game, &time, 3000);
    assert!(later.is_empty(), "unexpected {later:?}");
    assert_eq!(game.moves().len(), 1);
    assert!(!game.moves()[0].is_auto_move);
}

#[test]
fn zero_grace_goes_straight_to_the_auto_move() {
    let (mut game, time) = start(settings(10, 0, TimeoutBehavior::AutoMove));

    let mut messages = Vec::new();
    for _ in 0..100 {
        time.advance(Duration::from_millis(100));
        messages.extend(game.poll_timers().into_iter().map(|o| o.message));
        if let Some(ServerMessage::TimerSync { timers, .. }) = game.sync_snapshot() {
            assert!(!timers.is_grace_period);
        }
    }
    assert_eq!(messages.len(), 2);
    assert!(matches!(
        messages[0],
        ServerMessage::TurnExpired {
            player: Side::White,
            ..
        }
    ));
    assert!(matches!(messages[1], ServerMessage::AutoMove { .. }));
    assert_eq!(game.timer_state().active_player, Some(Side::Black));
}

#[test]
fn zero_grace_with_lose_on_time_ends_at_expiry() {
    let (mut game, time) = start(settings(10, 0, TimeoutBehavior::LoseOnTime));
    let messages = run_for(&mut game, &time, 10_000);
    assert!(matches!(messages[0], ServerMessage::TurnExpired { .. }));
    assert!(matches!(messages[1], ServerMessage::GameOver { .. }));
    assert_eq!(game.result(), Some(GameResult::time_loss(Side::White)));
}

#[test]
fn stalled_ticker_does_not_extend_the_grace_window() {
    let (mut game, time) = start(settings(10, 2, TimeoutBehavior::AutoMove));

    // The first poll after a long stall lands past both turn and grace.
    time.advance(Duration::from_millis(13_000));
    let messages: Vec<ServerMessage> = game.poll_timers().into_iter().map(|o| o.message).collect();
    assert_eq!(messages.len(), 3, "{messages:?}");
    assert!(matches!(messages[0], ServerMessage::TurnExpired { .. }));
    assert!(matches!(
        messages[1],
        ServerMessage::GraceStarted {
            grace_time_remaining: 0,
            ..
        }
    ));
    assert!(matches!(messages[2], ServerMessage::AutoMove { .. }));
    assert_eq!(
        game.make_move("white-session", "e2e4").unwrap_err(),
        GameError::NotYourTurn(Side::Black)
    );
}

#[test]
fn grace_counts_from_the_expiry_instant() {
    let (mut game, time) = start(settings(10, 2, TimeoutBehavior::LoseOnTime));

    time.advance(Duration::from_millis(11_500));
    let messages: Vec<ServerMessage> = game.poll_timers().into_iter().map(|o| o.message).collect();
    let Some(ServerMessage::GraceStarted {
        grace_time_remaining,
        ..
    }) = messages.get(1)
    else {
        panic!("expected grace_started, got {messages:?}");
    };
    assert_eq!(*grace_time_remaining, 500);

    let messages = run_for(&mut game, &time, 500);
    assert!(matches!(messages.as_slice(), [ServerMessage::GameOver { .. }]));
    assert_eq!(game.result(), Some(GameResult::time_loss(Side::White)));
}

#[test]
fn late_move_after_auto_move_is_rejected() {
    let (mut game, time) = start(settings(10, 1, TimeoutBehavior::AutoMove));
    run_for(&mut game, &time, 11_000);
    assert_eq!(game.moves().len(), 1);

    assert_eq!(
        game.make_move("white-session", "e2e4").unwrap_err(),
        GameError::NotYourTurn(Side::Black)
    );
}

#[test]
fn auto_move_can_promote_and_mate() {
    // White to move; every pawn move promotes.
    let position = ChessPosition::from_fen("6k1/P7/6K1/8/8/8/8/8 w - - 0 1").unwrap();
    let time = FakeTime::new();
    let mut game = GameOrchestrator::new(
        "game",
        "white-session",
        settings(10, 0, TimeoutBehavior::AutoMove),
        time.clone(),
    )
    .with_seed(9)
    .with_position(position);
    game.join("black-session").unwrap();

    run_for(&mut game, &time, 10_000);
    let record = &game.moves()[0];
    assert!(record.is_auto_move);
    assert_eq!(record.from, "a7");
    assert_eq!(record.to, "a8");
    let promotion = record.promotion.unwrap();
    assert!(PieceKind::PROMOTIONS.contains(&promotion));

    // A queen or rook on a8 mates; a lone minor piece cannot.
    let expected = match promotion {
        PieceKind::Queen | PieceKind::Rook => GameResult::checkmate(Side::White),
        _ => GameResult::draw(GameEndReason::InsufficientMaterial),
    };
    assert_eq!(game.result(), Some(expected));
    assert_eq!(game.status(), GameStatus::Ended);
}

#[test]
fn auto_moves_keep_the_game_legal() {
    let (mut game, time) = start(settings(10, 0, TimeoutBehavior::AutoMove));
    for _ in 0..40 {
        if game.status() != GameStatus::Active {
            break;
        }
        let before = game.position().clone();
        let played = game.moves().len();
        run_for(&mut game, &time, 10_000);
        assert_eq!(game.moves().len(), played + 1);
        let record = &game.moves()[played];
        assert!(before.legal_moves().contains(&record.notation));
    }
}
