//! Boundary with the `chess` crate. Everything else in the server sees moves
//! as UCI strings and positions as the flags on [`BoardSnapshot`].

use chess::{Board, BoardStatus, ChessMove, Color, MoveGen, Piece, Rank, Square};
use log::debug;
use std::str::FromStr;

use crate::error::RulesError;
use crate::models::{BoardSnapshot, DrawReason, PieceKind, Side};

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// A move the position accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMove {
    pub notation: String,
    pub from: Square,
    pub to: Square,
    pub piece: PieceKind,
    pub captured: Option<PieceKind>,
    pub promotion: Option<PieceKind>,
    pub color: Side,
}

/// Legal-move enumeration, as consumed by the auto-move selector.
pub trait LegalMoves {
    fn legal_moves(&self) -> Vec<String>;
    fn legal_moves_for(&self, piece: PieceKind) -> Vec<String>;
}

/// A chess position plus the bits of history the draw rules need.
#[derive(Debug, Clone)]
pub struct ChessPosition {
    board: Board,
    // Hashes since the last pawn move or capture, current position last.
    repetitions: Vec<u64>,
    halfmove_clock: u32,
    fullmove_number: u32,
}

impl Default for ChessPosition {
    fn default() -> Self {
        Self::new()
    }
}

impl ChessPosition {
    pub fn new() -> Self {
        let board = Board::default();
        Self {
            repetitions: vec![board.get_hash()],
            board,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    pub fn from_fen(fen: &str) -> Result<Self, RulesError> {
        let board =
            Board::from_str(fen).map_err(|e| RulesError::InvalidFen(format!("{fen}: {e:?}")))?;
        let mut counters = fen.split_whitespace().skip(4);
        let halfmove_clock = counters.next().and_then(|c| c.parse().ok()).unwrap_or(0);
        let fullmove_number = counters.next().and_then(|c| c.parse().ok()).unwrap_or(1);
        Ok(Self {
            repetitions: vec![board.get_hash()],
            board,
            halfmove_clock,
            fullmove_number,
        })
    }

    pub fn turn(&self) -> Side {
        self.board.side_to_move().into()
    }

    pub fn fen(&self) -> String {
        let board = self.board.to_string();
        let placement: Vec<&str> = board.split_whitespace().take(4).collect();
        format!(
            "{} {} {}",
            placement.join(" "),
            self.halfmove_clock,
            self.fullmove_number
        )
    }

    /// Legal moves starting on `square`, in UCI notation.
    pub fn legal_moves_from(&self, square: Square) -> Vec<String> {
        MoveGen::new_legal(&self.board)
            .filter(|m| m.get_source() == square)
            .map(uci)
            .collect()
    }

    /// Resolves UCI (with or without a promotion suffix) or SAN to a move
    /// that is legal here.
    pub fn parse_move(&self, notation: &str) -> Option<ChessMove> {
        let notation = notation.trim();
        let candidate = self
            .parse_uci(notation)
            .or_else(|| ChessMove::from_san(&self.board, notation).ok())?;
        MoveGen::new_legal(&self.board).find(|m| *m == candidate)
    }

    /// Validates without applying.
    pub fn is_legal(&self, notation: &str) -> bool {
        self.parse_move(notation).is_some()
    }

    /// Plays the move. `None` means illegal and leaves the position untouched.
    pub fn apply(&mut self, notation: &str) -> Option<AppliedMove> {
        let mv = self.parse_move(notation)?;
        let from = mv.get_source();
        let to = mv.get_dest();
        let mover = self.board.side_to_move();
        let piece = self.board.piece_on(from)?;

        let captured = match self.board.piece_on(to) {
            Some(p) => Some(p),
            // Diagonal pawn step onto an empty square: en passant.
            None if piece == Piece::Pawn && from.get_file() != to.get_file() => Some(Piece::Pawn),
            None => None,
        };

        self.board = self.board.make_move_new(mv);
        if piece == Piece::Pawn || captured.is_some() {
            self.halfmove_clock = 0;
            self.repetitions.clear();
        } else {
            self.halfmove_clock += 1;
        }
        if mover == Color::Black {
            self.fullmove_number += 1;
        }
        self.repetitions.push(self.board.get_hash());

        let applied = AppliedMove {
            notation: uci(mv),
            from,
            to,
            piece: piece.into(),
            captured: captured.map(PieceKind::from),
            promotion: mv.get_promotion().map(PieceKind::from),
            color: mover.into(),
        };
        debug!("applied {} ({})", applied.notation, self.fen());
        Some(applied)
    }

    pub fn is_check(&self) -> bool {
        self.board.checkers().popcnt() > 0
    }

    pub fn is_checkmate(&self) -> bool {
        self.board.status() == BoardStatus::Checkmate
    }

    pub fn is_stalemate(&self) -> bool {
        self.board.status() == BoardStatus::Stalemate
    }

    pub fn is_threefold_repetition(&self) -> bool {
        let Some(current) = self.repetitions.last() else {
            return false;
        };
        self.repetitions.iter().filter(|h| *h == current).count() >= 3
    }

    pub fn is_fifty_move_rule(&self) -> bool {
        self.halfmove_clock >= 100
    }

    pub fn is_insufficient_material(&self) -> bool {
        has_insufficient_material(&self.board)
    }

    /// Draw by rule, stalemate included.
    pub fn is_draw(&self) -> bool {
        self.is_stalemate() || self.draw_reason().is_some()
    }

    /// Why the position is drawn, stalemate excluded.
    pub fn draw_reason(&self) -> Option<DrawReason> {
        if self.is_checkmate() {
            None
        } else if self.is_threefold_repetition() {
            Some(DrawReason::ThreefoldRepetition)
        } else if self.is_insufficient_material() {
            Some(DrawReason::InsufficientMaterial)
        } else if self.is_fifty_move_rule() {
            Some(DrawReason::FiftyMoveRule)
        } else {
            None
        }
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            fen: self.fen(),
            turn: self.turn(),
            is_check: self.is_check(),
            is_checkmate: self.is_checkmate(),
            is_stalemate: self.is_stalemate(),
            is_draw: self.is_draw(),
            draw_reason: self.draw_reason(),
            legal_moves: self.legal_moves(),
        }
    }

    fn parse_uci(&self, notation: &str) -> Option<ChessMove> {
        if !notation.is_ascii() || !(4..=5).contains(&notation.len()) {
            return None;
        }
        let from = Square::from_str(&notation[0..2].to_lowercase()).ok()?;
        let to = Square::from_str(&notation[2..4].to_lowercase()).ok()?;
        let promotion = match notation[4..].to_lowercase().as_str() {
            "" if self.is_promotion_square(from, to) => Some(Piece::Queen),
            "" => None,
            "q" => Some(Piece::Queen),
            "r" => Some(Piece::Rook),
            "b" => Some(Piece::Bishop),
            "n" => Some(Piece::Knight),
            _ => return None,
        };
        Some(ChessMove::new(from, to, promotion))
    }

    fn is_promotion_square(&self, from: Square, to: Square) -> bool {
        self.board.piece_on(from) == Some(Piece::Pawn)
            && matches!(to.get_rank(), Rank::First | Rank::Eighth)
    }
}

impl LegalMoves for ChessPosition {
    fn legal_moves(&self) -> Vec<String> {
        MoveGen::new_legal(&self.board).map(uci).collect()
    }

    fn legal_moves_for(&self, piece: PieceKind) -> Vec<String> {
        let piece = Piece::from(piece);
        MoveGen::new_legal(&self.board)
            .filter(|m| self.board.piece_on(m.get_source()) == Some(piece))
            .map(uci)
            .collect()
    }
}

fn uci(mv: ChessMove) -> String {
    match mv.get_promotion() {
        Some(p) => format!(
            "{}{}{}",
            mv.get_source(),
            mv.get_dest(),
            PieceKind::from(p).letter()
        ),
        None => format!("{}{}", mv.get_source(), mv.get_dest()),
    }
}

/// Neither side can possibly mate: K v K, K+minor v K, or K+B v K+B with
/// bishops on the same square colour.
pub fn has_insufficient_material(board: &Board) -> bool {
    let heavy = *board.pieces(Piece::Pawn) | *board.pieces(Piece::Rook) | *board.pieces(Piece::Queen);
    if heavy.popcnt() > 0 {
        return false;
    }

    let count = |piece: Piece, color: Color| -> u32 {
        (*board.pieces(piece) & *board.color_combined(color)).popcnt()
    };
    let white_minors = count(Piece::Knight, Color::White) + count(Piece::Bishop, Color::White);
    let black_minors = count(Piece::Knight, Color::Black) + count(Piece::Bishop, Color::Black);

    match (white_minors, black_minors) {
        (0, 0) | (1, 0) | (0, 1) => true,
        (1, 1) => {
            let bishops = *board.pieces(Piece::Bishop);
            if bishops.popcnt() != 2 {
                return false;
            }
            let mut shades = bishops.map(square_shade);
            shades.next() == shades.next()
        }
        _ => false,
    }
}

fn square_shade(square: Square) -> usize {
    (square.get_rank().to_index() + square.get_file().to_index()) % 2
}
