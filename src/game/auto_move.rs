use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::game::LegalMoves;
use crate::models::PieceKind;

/// Picks a move to play for a player whose time ran out.
///
/// Pawn moves are preferred; any other legal move is the fallback. A
/// promotion always gets a freshly drawn piece, whatever suffix the move
/// list carried. `None` only when the position has no legal moves.
pub fn select_auto_move<P, R>(position: &P, rng: &mut R) -> Option<String>
where
    P: LegalMoves + ?Sized,
    R: Rng + ?Sized,
{
    let pawn_moves = position.legal_moves_for(PieceKind::Pawn);
    let chosen = match pawn_moves.choose(rng) {
        Some(mv) => mv.clone(),
        None => position.legal_moves().choose(rng)?.clone(),
    };

    let chosen = if chosen.len() == 5 {
        let piece = PieceKind::PROMOTIONS.choose(rng).copied().unwrap_or(PieceKind::Queen);
        format!("{}{}", &chosen[..4], piece.letter())
    } else {
        chosen
    };
    debug!("auto-move selected {}", chosen);
    Some(chosen)
}
