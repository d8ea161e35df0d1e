use chess::Piece;
use serde::{Deserialize, Serialize};

use crate::models::Side;

/// Lifecycle of a game.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Waiting,
    Active,
    Ended,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    White,
    Black,
    Draw,
}

impl From<Side> for Winner {
    fn from(side: Side) -> Self {
        match side {
            Side::White => Winner::White,
            Side::Black => Winner::Black,
        }
    }
}

/// Draw conditions the rules engine reports on its own.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DrawReason {
    ThreefoldRepetition,
    FiftyMoveRule,
    InsufficientMaterial,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GameEndReason {
    Checkmate,
    Stalemate,
    Resignation,
    AgreedDraw,
    TimeLoss,
    ThreefoldRepetition,
    FiftyMoveRule,
    InsufficientMaterial,
}

impl From<DrawReason> for GameEndReason {
    fn from(reason: DrawReason) -> Self {
        match reason {
            DrawReason::ThreefoldRepetition => GameEndReason::ThreefoldRepetition,
            DrawReason::FiftyMoveRule => GameEndReason::FiftyMoveRule,
            DrawReason::InsufficientMaterial => GameEndReason::InsufficientMaterial,
        }
    }
}

/// Final outcome of a game; set once.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameResult {
    pub winner: Winner,
    pub reason: GameEndReason,
}

impl GameResult {
    pub fn checkmate(winner: Side) -> Self {
        Self {
            winner: winner.into(),
            reason: GameEndReason::Checkmate,
        }
    }

    pub fn resignation(resigning: Side) -> Self {
        Self {
            winner: resigning.opposite().into(),
            reason: GameEndReason::Resignation,
        }
    }

    pub fn time_loss(losing: Side) -> Self {
        Self {
            winner: losing.opposite().into(),
            reason: GameEndReason::TimeLoss,
        }
    }

    pub fn draw(reason: GameEndReason) -> Self {
        Self {
            winner: Winner::Draw,
            reason,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawOffer {
    pub from: Side,
    pub offered_at: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    pub const PROMOTIONS: [PieceKind; 4] = [
        PieceKind::Queen,
        PieceKind::Rook,
        PieceKind::Bishop,
        PieceKind::Knight,
    ];

    /// Lowercase letter as used in UCI promotion suffixes.
    pub fn letter(self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }
}

impl From<Piece> for PieceKind {
    fn from(piece: Piece) -> Self {
        match piece {
            Piece::Pawn => PieceKind::Pawn,
            Piece::Knight => PieceKind::Knight,
            Piece::Bishop => PieceKind::Bishop,
            Piece::Rook => PieceKind::Rook,
            Piece::Queen => PieceKind::Queen,
            Piece::King => PieceKind::King,
        }
    }
}

impl From<PieceKind> for Piece {
    fn from(kind: PieceKind) -> Self {
        match kind {
            PieceKind::Pawn => Piece::Pawn,
            PieceKind::Knight => Piece::Knight,
            PieceKind::Bishop => Piece::Bishop,
            PieceKind::Rook => Piece::Rook,
            PieceKind::Queen => Piece::Queen,
            PieceKind::King => Piece::King,
        }
    }
}

/// One entry of a game's move history.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    /// UCI notation, e.g. `e2e4` or `e7e8n`.
    pub notation: String,
    pub from: String,
    pub to: String,
    pub piece: PieceKind,
    pub captured: Option<PieceKind>,
    pub promotion: Option<PieceKind>,
    pub is_auto_move: bool,
    pub timestamp: u64,
    pub color: Side,
}

/// A player's seat in a game, keyed by their session rather than their connection.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PlayerSession {
    pub session_id: String,
    pub color: Side,
    pub is_connected: bool,
    pub last_activity_at: u64,
}

impl PlayerSession {
    pub fn new(session_id: impl Into<String>, color: Side, now_ms: u64) -> Self {
        Self {
            session_id: session_id.into(),
            color,
            is_connected: true,
            last_activity_at: now_ms,
        }
    }
}

/// Rules-engine view of a position, as sent to clients.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BoardSnapshot {
    pub fen: String,
    pub turn: Side,
    pub is_check: bool,
    pub is_checkmate: bool,
    pub is_stalemate: bool,
    pub is_draw: bool,
    pub draw_reason: Option<DrawReason>,
    pub legal_moves: Vec<String>,
}
