use actix::Message;
use serde::{Deserialize, Serialize};

use crate::error::GameError;
use crate::models::{
    BoardSnapshot, GameResult, GameSettings, GameStatus, MoveRecord, SettingsPatch, Side,
    TimerState,
};

/// Message sent from client to server
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "message_type", rename_all = "snake_case")]
pub enum ClientMessage {
    CreateGame {
        #[serde(default)]
        settings: SettingsPatch,
    },
    /// `game_id` may also be a full invite link.
    JoinGame { game_id: String },
    RejoinGame { game_id: String },
    MakeMove {
        game_id: String,
        #[serde(rename = "move")]
        notation: String,
    },
    Resign { game_id: String },
    OfferDraw { game_id: String },
    RespondDraw { game_id: String, accept: bool },
    GetMoves { game_id: String, square: String },
    TimeSync { game_id: String },
}

impl ClientMessage {
    pub fn name(&self) -> &'static str {
        match self {
            ClientMessage::CreateGame { .. } => "create_game",
            ClientMessage::JoinGame { .. } => "join_game",
            ClientMessage::RejoinGame { .. } => "rejoin_game",
            ClientMessage::MakeMove { .. } => "make_move",
            ClientMessage::Resign { .. } => "resign",
            ClientMessage::OfferDraw { .. } => "offer_draw",
            ClientMessage::RespondDraw { .. } => "respond_draw",
            ClientMessage::GetMoves { .. } => "get_moves",
            ClientMessage::TimeSync { .. } => "time_sync",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AutoMoveReason {
    GraceExpired,
}

/// Message sent from server to client
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "message_type", rename_all = "snake_case")]
pub enum ServerMessage {
    Session {
        session_id: String,
    },
    GameCreated {
        game_id: String,
        invite_link: String,
        settings: GameSettings,
        host_color: Side,
    },
    GameJoined {
        game_id: String,
        color: Side,
        settings: GameSettings,
    },
    GameStart {
        game_id: String,
        board: BoardSnapshot,
        timers: TimerState,
        white_session_id: String,
        black_session_id: String,
    },
    MoveMade {
        game_id: String,
        #[serde(rename = "move")]
        record: MoveRecord,
        board: BoardSnapshot,
        timers: TimerState,
    },
    AutoMove {
        game_id: String,
        #[serde(rename = "move")]
        record: MoveRecord,
        board: BoardSnapshot,
        timers: TimerState,
        reason: AutoMoveReason,
    },
    TimerSync {
        game_id: String,
        timers: TimerState,
    },
    TurnExpired {
        game_id: String,
        player: Side,
        timers: TimerState,
    },
    GraceStarted {
        game_id: String,
        player: Side,
        grace_time_remaining: u64,
        timers: TimerState,
    },
    GameOver {
        game_id: String,
        result: GameResult,
        board: BoardSnapshot,
        timers: TimerState,
    },
    DrawOffered {
        game_id: String,
        from: Side,
    },
    DrawDeclined {
        game_id: String,
        by: Side,
    },
    OpponentDisconnected {
        game_id: String,
        color: Side,
    },
    OpponentReconnected {
        game_id: String,
        color: Side,
    },
    Rejoined {
        game_id: String,
        board: BoardSnapshot,
        moves: Vec<MoveRecord>,
        settings: GameSettings,
        status: GameStatus,
        timers: TimerState,
        player_color: Side,
    },
    ActiveGameFound {
        game_id: String,
        player_color: Side,
        status: GameStatus,
    },
    AvailableMoves {
        game_id: String,
        square: String,
        moves: Vec<String>,
    },
    Ack {
        action: String,
    },
    MoveRejected {
        code: String,
        message: String,
    },
    Error {
        code: String,
        message: String,
    },
}

impl ServerMessage {
    pub fn error(err: &GameError) -> Self {
        ServerMessage::Error {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }

    pub fn move_rejected(err: &GameError) -> Self {
        ServerMessage::MoveRejected {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }

    pub fn ack(action: &str) -> Self {
        ServerMessage::Ack {
            action: action.to_string(),
        }
    }
}

/// Message type for WebSocket communication
#[derive(Message)]
#[rtype(result = "()")]
pub struct ChessWebSocketMessage(pub String);
