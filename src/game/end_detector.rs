use crate::models::{BoardSnapshot, GameEndReason, GameResult, Side};

/// Decides whether the position reached by `mover`'s move ends the game.
///
/// Checkmate wins for the mover; stalemate and the rules-engine draw flags
/// are draws. Only the snapshot is consulted, never history or clocks.
pub fn detect(snapshot: &BoardSnapshot, mover: Side) -> Option<GameResult> {
    if snapshot.is_checkmate {
        return Some(GameResult::checkmate(mover));
    }
    if snapshot.is_stalemate {
        return Some(GameResult::draw(GameEndReason::Stalemate));
    }
    snapshot
        .draw_reason
        .map(|reason| GameResult::draw(reason.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::ChessPosition;
    use crate::models::{DrawReason, Winner};

    fn snapshot() -> BoardSnapshot {
        BoardSnapshot {
            fen: String::new(),
            turn: Side::Black,
            is_check: false,
            is_checkmate: false,
            is_stalemate: false,
            is_draw: false,
            draw_reason: None,
            legal_moves: vec!["e7e5".into()],
        }
    }

    #[test]
    fn ongoing_position_is_not_terminal() {
        assert_eq!(detect(&snapshot(), Side::White), None);
        assert_eq!(detect(&ChessPosition::new().snapshot(), Side::Black), None);
    }

    #[test]
    fn checkmate_wins_for_the_mover() {
        let mut position = ChessPosition::new();
        for mv in ["f2f3", "e7e5", "g2g4", "d8h4"] {
            position.apply(mv).unwrap();
        }
        let result = detect(&position.snapshot(), Side::Black).unwrap();
        assert_eq!(result.winner, Winner::Black);
        assert_eq!(result.reason, GameEndReason::Checkmate);
    }

    #[test]
    fn checkmate_outranks_draw_flags() {
        let snap = BoardSnapshot {
            is_checkmate: true,
            is_draw: true,
            draw_reason: Some(DrawReason::FiftyMoveRule),
            ..snapshot()
        };
        assert_eq!(detect(&snap, Side::White), Some(GameResult::checkmate(Side::White)));
    }

    #[test]
    fn stalemate_outranks_other_draws() {
        let snap = BoardSnapshot {
            is_stalemate: true,
            is_draw: true,
            draw_reason: Some(DrawReason::InsufficientMaterial),
            ..snapshot()
        };
        let result = detect(&snap, Side::White).unwrap();
        assert_eq!(result.winner, Winner::Draw);
        assert_eq!(result.reason, GameEndReason::Stalemate);
    }

    #[test]
    fn draw_flags_map_to_reasons() {
        for reason in [
            DrawReason::ThreefoldRepetition,
            DrawReason::FiftyMoveRule,
            DrawReason::InsufficientMaterial,
        ] {
            let snap = BoardSnapshot {
                is_draw: true,
                draw_reason: Some(reason),
                ..snapshot()
            };
            assert_eq!(
                detect(&snap, Side::Black),
                Some(GameResult::draw(reason.into()))
            );
        }
    }
}
