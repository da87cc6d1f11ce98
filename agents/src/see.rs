//! Static exchange evaluation.
//!
//! Plays out every recapture on the target square, cheapest attacker first,
//! and lets each side stop when continuing would lose material. Pieces that
//! have captured are lifted off the board, so sliders behind them join in.

use chess9_core::attacks::{is_square_attacked, least_valuable_attacker};
use chess9_core::{GameState, Move, PieceType, SpecialMove};

/// Net material the moving side expects from `mv`, in centipawns.
/// Quiet moves score 0 unless the piece is simply lost on its new square.
pub fn static_exchange(state: &GameState, mv: &Move) -> i32 {
    let Some(mover) = state.board.piece_at(mv.from) else {
        return 0;
    };

    let mut first_gain = if mv.is_en_passant() {
        PieceType::Pawn.value()
    } else {
        state.board.piece_at(mv.to).map_or(0, |p| p.piece_type.value())
    };
    let mut on_square = mover.piece_type.value();
    if let Some(promoted) = mv.promotion {
        first_gain += promoted.value() - PieceType::Pawn.value();
        on_square = promoted.value();
    }

    let mut board = state.board.clone();
    board.set_piece(mv.from, None);
    if let Some(SpecialMove::EnPassant { captured }) = mv.special_move {
        board.set_piece(captured, None);
    }
    board.set_piece(mv.to, Some(mover));

    let mut gains = vec![first_gain];
    let mut side = mover.color.opponent();

    while let Some((square, piece)) = least_valuable_attacker(&board, mv.to, side) {
        board.set_piece(square, None);
        // A king may only take on an undefended square.
        if piece.piece_type.rules().royal && is_square_attacked(&board, mv.to, side.opponent()) {
            break;
        }
        let previous = gains[gains.len() - 1];
        gains.push(on_square - previous);
        board.set_piece(mv.to, Some(piece));
        on_square = piece.piece_type.value();
        side = side.opponent();
    }

    gains
        .into_iter()
        .rev()
        .reduce(|later, earlier| -(-earlier).max(later))
        .unwrap_or(0)
}
