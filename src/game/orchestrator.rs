use std::str::FromStr;

use chess::Square;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::mpsc::{self, UnboundedReceiver};

use crate::error::GameError;
use crate::game::{end_detector, select_auto_move, AppliedMove, ChessPosition};
use crate::models::{
    AutoMoveReason, BoardSnapshot, DrawOffer, GameEndReason, GameResult, GameSettings,
    GameStatus, MoveRecord, PlayerSession, ServerMessage, Side, TimeoutBehavior, TimerState,
};
use crate::timer::{TimeSource, TimerController, TimerEvent, TimerEventKind};

/// Who a server message is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// Both players.
    Room,
    Player(Side),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub audience: Audience,
    pub message: ServerMessage,
}

impl Outbound {
    pub fn room(message: ServerMessage) -> Self {
        Self {
            audience: Audience::Room,
            message,
        }
    }

    pub fn to(side: Side, message: ServerMessage) -> Self {
        Self {
            audience: Audience::Player(side),
            message,
        }
    }
}

/// One game: position, players, history, draw offer, result and the turn
/// clocks. Every operation either fails with a [`GameError`] and changes
/// nothing, or succeeds and returns the messages to deliver.
pub struct GameOrchestrator<T: TimeSource> {
    id: String,
    settings: GameSettings,
    status: GameStatus,
    position: ChessPosition,
    moves: Vec<MoveRecord>,
    white: Option<PlayerSession>,
    black: Option<PlayerSession>,
    draw_offer: Option<DrawOffer>,
    result: Option<GameResult>,
    created_at: u64,
    started_at: Option<u64>,
    ended_at: Option<u64>,
    timers: TimerController<T>,
    timer_events: UnboundedReceiver<TimerEvent>,
    rng: StdRng,
    time: T,
}

impl<T: TimeSource> GameOrchestrator<T> {
    /// A waiting game with the host seated on `settings.host_color`.
    /// Settings are expected to be validated already.
    pub fn new(
        id: impl Into<String>,
        host_session: impl Into<String>,
        settings: GameSettings,
        time: T,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let now = time.epoch_ms();
        let host = PlayerSession::new(host_session, settings.host_color, now);
        let (white, black) = match settings.host_color {
            Side::White => (Some(host), None),
            Side::Black => (None, Some(host)),
        };
        Self {
            id: id.into(),
            settings,
            status: GameStatus::Waiting,
            position: ChessPosition::new(),
            moves: Vec::new(),
            white,
            black,
            draw_offer: None,
            result: None,
            created_at: now,
            started_at: None,
            ended_at: None,
            timers: TimerController::new(
                settings.turn_time(),
                settings.grace_period(),
                time.clone(),
                tx,
            ),
            timer_events: rx,
            rng: StdRng::from_entropy(),
            time,
        }
    }

    /// Fixes the auto-move randomness.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Starts from a custom position instead of the initial one.
    pub fn with_position(mut self, position: ChessPosition) -> Self {
        if self.status == GameStatus::Waiting {
            self.position = position;
        }
        self
    }

    pub fn join(&mut self, session_id: &str) -> Result<Vec<Outbound>, GameError> {
        if self.status == GameStatus::Ended {
            return Err(GameError::GameAlreadyStarted("Game has ended"));
        }
        if self.player_color(session_id).is_some() {
            return Err(match self.status {
                GameStatus::Active => GameError::GameAlreadyStarted("Game already started, rejoin instead"),
                _ => GameError::GameFull("Cannot join your own game"),
            });
        }
        if self.status == GameStatus::Active {
            return Err(GameError::GameFull("Game is full"));
        }

        let color = self.settings.host_color.opposite();
        let now = self.time.epoch_ms();
        *self.seat_mut(color) = Some(PlayerSession::new(session_id, color, now));
        self.status = GameStatus::Active;
        self.started_at = Some(now);
        self.timers.start_game();
        info!("game {} started, {} joined as {}", self.id, session_id, color);

        Ok(vec![
            Outbound::to(
                color,
                ServerMessage::GameJoined {
                    game_id: self.id.clone(),
                    color,
                    settings: self.settings,
                },
            ),
            Outbound::room(ServerMessage::GameStart {
                game_id: self.id.clone(),
                board: self.board(),
                timers: self.timers.timer_state(),
                white_session_id: self.session_id(Side::White).unwrap_or_default().to_string(),
                black_session_id: self.session_id(Side::Black).unwrap_or_default().to_string(),
            }),
        ])
    }

    /// Reattaches a player after a reconnect. The clock was never paused.
    pub fn rejoin(&mut self, session_id: &str) -> Result<Vec<Outbound>, GameError> {
        let color = self.player_color(session_id).ok_or(GameError::NotInGame)?;
        if self.status == GameStatus::Ended {
            return Err(GameError::GameEnded);
        }
        let now = self.time.epoch_ms();
        if let Some(player) = self.seat_mut(color) {
            player.is_connected = true;
            player.last_activity_at = now;
        }
        info!("{} rejoined game {} as {}", session_id, self.id, color);

        Ok(vec![
            Outbound::to(
                color,
                ServerMessage::Rejoined {
                    game_id: self.id.clone(),
                    board: self.board(),
                    moves: self.moves.clone(),
                    settings: self.settings,
                    status: self.status,
                    timers: self.timers.timer_state(),
                    player_color: color,
                },
            ),
            Outbound::to(
                color.opposite(),
                ServerMessage::OpponentReconnected {
                    game_id: self.id.clone(),
                    color,
                },
            ),
        ])
    }

    /// The player's clock keeps running while they are away.
    pub fn disconnect(&mut self, session_id: &str) -> Vec<Outbound> {
        let Some(color) = self.player_color(session_id) else {
            return Vec::new();
        };
        if let Some(player) = self.seat_mut(color) {
            player.is_connected = false;
        }
        if self.status == GameStatus::Ended {
            return Vec::new();
        }
        info!("{} disconnected from game {}", color, self.id);
        vec![Outbound::to(
            color.opposite(),
            ServerMessage::OpponentDisconnected {
                game_id: self.id.clone(),
                color,
            },
        )]
    }

    pub fn make_move(
        &mut self,
        session_id: &str,
        notation: &str,
    ) -> Result<Vec<Outbound>, GameError> {
        let color = self.require_active_player(session_id)?;
        let turn = self.position.turn();
        if color != turn {
            return Err(GameError::NotYourTurn(turn));
        }
        let applied = self
            .position
            .apply(notation)
            .ok_or_else(|| GameError::InvalidMove(notation.to_string()))?;
        self.touch(color);
        Ok(self.after_move(applied, false))
    }

    pub fn resign(&mut self, session_id: &str) -> Result<Vec<Outbound>, GameError> {
        let color = self.require_active_player(session_id)?;
        info!("{} resigned game {}", color, self.id);
        Ok(self.finish(GameResult::resignation(color)))
    }

    pub fn offer_draw(&mut self, session_id: &str) -> Result<Vec<Outbound>, GameError> {
        let color = self.require_active_player(session_id)?;
        if self.draw_offer.is_some() {
            return Err(GameError::DrawAlreadyOffered);
        }
        self.draw_offer = Some(DrawOffer {
            from: color,
            offered_at: self.time.epoch_ms(),
        });
        self.touch(color);
        debug!("{} offered a draw in game {}", color, self.id);
        Ok(vec![
            Outbound::to(
                color.opposite(),
                ServerMessage::DrawOffered {
                    game_id: self.id.clone(),
                    from: color,
                },
            ),
            Outbound::to(color, ServerMessage::ack("offer_draw")),
        ])
    }

    pub fn respond_draw(
        &mut self,
        session_id: &str,
        accept: bool,
    ) -> Result<Vec<Outbound>, GameError> {
        let color = self.require_active_player(session_id)?;
        let offer = self.draw_offer.ok_or(GameError::NoDrawOffer)?;
        if offer.from == color {
            return Err(GameError::CantRespondOwn);
        }
        self.draw_offer = None;
        self.touch(color);

        if accept {
            return Ok(self.finish(GameResult::draw(GameEndReason::AgreedDraw)));
        }
        debug!("{} declined the draw in game {}", color, self.id);
        Ok(vec![
            Outbound::to(
                offer.from,
                ServerMessage::DrawDeclined {
                    game_id: self.id.clone(),
                    by: color,
                },
            ),
            Outbound::to(color, ServerMessage::ack("respond_draw")),
        ])
    }

    /// Legal moves from one square, for move hints.
    pub fn get_moves(&self, session_id: &str, square: &str) -> Result<ServerMessage, GameError> {
        self.player_color(session_id).ok_or(GameError::NotInGame)?;
        let parsed = Square::from_str(&square.trim().to_lowercase())
            .map_err(|_| GameError::InvalidSquare(square.to_string()))?;
        let moves = if self.status == GameStatus::Active {
            self.position.legal_moves_from(parsed)
        } else {
            Vec::new()
        };
        Ok(ServerMessage::AvailableMoves {
            game_id: self.id.clone(),
            square: parsed.to_string(),
            moves,
        })
    }

    pub fn time_sync(&self, session_id: &str) -> Result<ServerMessage, GameError> {
        self.player_color(session_id).ok_or(GameError::NotInGame)?;
        Ok(ServerMessage::TimerSync {
            game_id: self.id.clone(),
            timers: self.timers.timer_state(),
        })
    }

    /// Advances the clocks and turns whatever they reported into messages.
    /// Runs the timeout policy when a grace window closes.
    pub fn poll_timers(&mut self) -> Vec<Outbound> {
        if self.status != GameStatus::Active {
            return Vec::new();
        }
        self.timers.poll();

        let mut out = Vec::new();
        while let Ok(event) = self.timer_events.try_recv() {
            if self.status != GameStatus::Active {
                break;
            }
            out.extend(self.on_timer_event(event));
        }
        out
    }

    /// Periodic countdown broadcast. Read-only.
    pub fn sync_snapshot(&self) -> Option<ServerMessage> {
        (self.status == GameStatus::Active).then(|| ServerMessage::TimerSync {
            game_id: self.id.clone(),
            timers: self.timers.timer_state(),
        })
    }

    /// Tells a reconnecting session which game it still has a seat in.
    pub fn active_game_found(&self, session_id: &str) -> Option<ServerMessage> {
        if self.status == GameStatus::Ended {
            return None;
        }
        let color = self.player_color(session_id)?;
        Some(ServerMessage::ActiveGameFound {
            game_id: self.id.clone(),
            player_color: color,
            status: self.status,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_ended(&self) -> bool {
        self.status == GameStatus::Ended
    }

    pub fn result(&self) -> Option<GameResult> {
        self.result
    }

    pub fn moves(&self) -> &[MoveRecord] {
        &self.moves
    }

    pub fn position(&self) -> &ChessPosition {
        &self.position
    }

    pub fn board(&self) -> BoardSnapshot {
        self.position.snapshot()
    }

    pub fn draw_offer(&self) -> Option<DrawOffer> {
        self.draw_offer
    }

    pub fn timers(&self) -> &TimerController<T> {
        &self.timers
    }

    pub fn timer_state(&self) -> TimerState {
        self.timers.timer_state()
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    pub fn started_at(&self) -> Option<u64> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<u64> {
        self.ended_at
    }

    pub fn player(&self, side: Side) -> Option<&PlayerSession> {
        match side {
            Side::White => self.white.as_ref(),
            Side::Black => self.black.as_ref(),
        }
    }

    pub fn session_id(&self, side: Side) -> Option<&str> {
        self.player(side).map(|p| p.session_id.as_str())
    }

    pub fn player_color(&self, session_id: &str) -> Option<Side> {
        Side::BOTH
            .into_iter()
            .find(|side| self.session_id(*side) == Some(session_id))
    }

    fn seat_mut(&mut self, side: Side) -> &mut Option<PlayerSession> {
        match side {
            Side::White => &mut self.white,
            Side::Black => &mut self.black,
        }
    }

    fn touch(&mut self, side: Side) {
        let now = self.time.epoch_ms();
        if let Some(player) = self.seat_mut(side) {
            player.last_activity_at = now;
        }
    }

    fn require_active_player(&self, session_id: &str) -> Result<Side, GameError> {
        if self.status != GameStatus::Active {
            return Err(GameError::GameNotActive);
        }
        self.player_color(session_id).ok_or(GameError::NotInGame)
    }

    fn after_move(&mut self, applied: AppliedMove, is_auto_move: bool) -> Vec<Outbound> {
        let mover = applied.color;
        let record = MoveRecord {
            notation: applied.notation,
            from: applied.from.to_string(),
            to: applied.to.to_string(),
            piece: applied.piece,
            captured: applied.captured,
            promotion: applied.promotion,
            is_auto_move,
            timestamp: self.time.epoch_ms(),
            color: mover,
        };
        self.moves.push(record.clone());
        self.draw_offer = None;
        self.timers.on_move_made();

        let board = self.board();
        let terminal = end_detector::detect(&board, mover);
        let timers = self.timers.timer_state();
        let message = if is_auto_move {
            info!("auto-move {} for {} in game {}", record.notation, mover, self.id);
            ServerMessage::AutoMove {
                game_id: self.id.clone(),
                record,
                board,
                timers,
                reason: AutoMoveReason::GraceExpired,
            }
        } else {
            debug!("{} played {} in game {}", mover, record.notation, self.id);
            ServerMessage::MoveMade {
                game_id: self.id.clone(),
                record,
                board,
                timers,
            }
        };

        let mut out = vec![Outbound::room(message)];
        if let Some(result) = terminal {
            out.extend(self.finish(result));
        }
        out
    }

    fn on_timer_event(&mut self, event: TimerEvent) -> Vec<Outbound> {
        match event.kind {
            TimerEventKind::Tick => Vec::new(),
            TimerEventKind::TurnExpired => {
                info!("{}'s turn expired in game {}", event.player, self.id);
                vec![Outbound::room(ServerMessage::TurnExpired {
                    game_id: self.id.clone(),
                    player: event.player,
                    timers: event.state,
                })]
            }
            TimerEventKind::GraceStarted => vec![Outbound::room(ServerMessage::GraceStarted {
                game_id: self.id.clone(),
                player: event.player,
                grace_time_remaining: event.state.grace_remaining_ms,
                timers: event.state,
            })],
            TimerEventKind::GraceExpired => self.on_grace_expired(event.player),
        }
    }

    fn on_grace_expired(&mut self, player: Side) -> Vec<Outbound> {
        if self.position.turn() != player {
            debug!("stale grace expiry for {} in game {}", player, self.id);
            return Vec::new();
        }
        info!("{}'s grace expired in game {}", player, self.id);

        match self.settings.timeout_behavior {
            TimeoutBehavior::LoseOnTime => self.finish(GameResult::time_loss(player)),
            TimeoutBehavior::AutoMove => {
                let applied = select_auto_move(&self.position, &mut self.rng)
                    .and_then(|mv| self.position.apply(&mv));
                match applied {
                    Some(applied) => self.after_move(applied, true),
                    None => {
                        warn!("no auto-move available for {} in game {}", player, self.id);
                        let result = end_detector::detect(&self.board(), player.opposite())
                            .unwrap_or_else(|| GameResult::time_loss(player));
                        self.finish(result)
                    }
                }
            }
        }
    }

    /// Stops every clock and records the result. Clocks are stopped before
    /// the `game_over` message exists, so nothing can tick after it.
    fn finish(&mut self, result: GameResult) -> Vec<Outbound> {
        if self.status == GameStatus::Ended {
            return Vec::new();
        }
        self.timers.stop_all();
        while self.timer_events.try_recv().is_ok() {}

        let now = self.time.epoch_ms();
        self.status = GameStatus::Ended;
        self.result = Some(result);
        self.ended_at = Some(now);
        self.draw_offer = None;
        info!(
            "game {} over: {:?} ({:?})",
            self.id, result.winner, result.reason
        );

        let timers = TimerState {
            white_remaining_ms: self.timers.clock(Side::White).remaining_ms(),
            black_remaining_ms: self.timers.clock(Side::Black).remaining_ms(),
            ..TimerState::idle(now)
        };
        vec![Outbound::room(ServerMessage::GameOver {
            game_id: self.id.clone(),
            result,
            board: self.board(),
            timers,
        })]
    }
}
