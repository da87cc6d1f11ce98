//! Attack detection driven by the capability table.
//!
//! Every query walks outward from the target square using the reversed
//! displacement of each capability, so one routine serves all piece types.

use crate::board::Board;
use crate::pieces::Movement;
use crate::types::{Color, Piece, PieceType, Square};

/// Returns true if some piece of `attacker` not resting on a blocked square
/// reaches `target`. The attacker's own king safety is ignored.
pub fn is_square_attacked(board: &Board, target: Square, attacker: Color) -> bool {
    let mut found = false;
    visit_attackers(board, target, attacker, |_, _| {
        found = true;
        false
    });
    found
}

/// Lists the squares of all pieces of `attacker` that reach `target`.
pub fn attackers(board: &Board, target: Square, attacker: Color) -> Vec<Square> {
    let mut squares = Vec::new();
    visit_attackers(board, target, attacker, |square, _| {
        if !squares.contains(&square) {
            squares.push(square);
        }
        true
    });
    squares
}

/// Finds the cheapest piece of `attacker` that reaches `target`.
pub fn least_valuable_attacker(
    board: &Board,
    target: Square,
    attacker: Color,
) -> Option<(Square, Piece)> {
    let mut best: Option<(Square, Piece)> = None;
    visit_attackers(board, target, attacker, |square, piece| {
        let cheaper = best.map_or(true, |(_, current)| {
            piece.piece_type.value() < current.piece_type.value()
        });
        if cheaper {
            best = Some((square, piece));
        }
        // Nothing is cheaper than a pawn.
        piece.piece_type != PieceType::Pawn
    });
    best
}

/// Calls `visit` for each attacking piece until it returns false.
fn visit_attackers<F>(board: &Board, target: Square, attacker: Color, mut visit: F)
where
    F: FnMut(Square, Piece) -> bool,
{
    // Pawns capture one row forward, so look one row back.
    let back = -attacker.pawn_direction();
    for dc in [-1, 1] {
        if let Some(source) = target.offset(back, dc) {
            if let Some(piece) = attacking_piece(board, source, attacker) {
                if piece.piece_type == PieceType::Pawn && !visit(source, piece) {
                    return;
                }
            }
        }
    }

    for piece_type in PieceType::ALL {
        for &movement in piece_type.rules().movements {
            let keep_going = match movement {
                Movement::Pawn => true,
                Movement::Leap(offsets) => offsets.iter().all(|&(dr, dc)| {
                    match target.offset(-dr, -dc) {
                        Some(source) => match attacking_piece(board, source, attacker) {
                            Some(piece) if piece.piece_type == piece_type => visit(source, piece),
                            _ => true,
                        },
                        None => true,
                    }
                }),
                Movement::Slide(offsets) | Movement::SlideLeap(offsets) => {
                    offsets.iter().all(|&(dr, dc)| {
                        match first_piece_on_ray(board, target, -dr, -dc) {
                            Some((source, piece))
                                if piece.color == attacker && piece.piece_type == piece_type =>
                            {
                                visit(source, piece)
                            }
                            _ => true,
                        }
                    })
                }
            };
            if !keep_going {
                return;
            }
        }
    }
}

/// Piece of the given color on `square`, ignoring anything on a blocked square.
fn attacking_piece(board: &Board, square: Square, color: Color) -> Option<Piece> {
    if board.is_blocked(square) {
        return None;
    }
    board.piece_at(square).filter(|p| p.color == color)
}

/// Walks from `origin` by `(dr, dc)` and returns the first occupant.
/// Rays end before a blocked square or the board edge.
pub fn first_piece_on_ray(
    board: &Board,
    origin: Square,
    dr: i8,
    dc: i8,
) -> Option<(Square, Piece)> {
    let mut current = origin;
    loop {
        current = current.offset(dr, dc)?;
        if board.is_blocked(current) {
            return None;
        }
        if let Some(piece) = board.piece_at(current) {
            return Some((current, piece));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::BoardShape;

    fn sq(r: u8, c: u8) -> Square {
        Square::new(r, c).unwrap()
    }

    #[test]
    fn test_rook_attacks() {
        let mut board = Board::empty(BoardShape::Standard);
        board.set_piece(sq(4, 4), Some(Piece::new(PieceType::Rook, Color::White)));

        assert!(is_square_attacked(&board, sq(0, 4), Color::White));
        assert!(is_square_attacked(&board, sq(4, 8), Color::White));
        assert!(!is_square_attacked(&board, sq(3, 3), Color::White));
        assert!(!is_square_attacked(&board, sq(0, 4), Color::Black));
    }

    #[test]
    fn test_pawn_attacks_forward_only() {
        let mut board = Board::empty(BoardShape::Standard);
        board.set_piece(sq(6, 4), Some(Piece::new(PieceType::Pawn, Color::White)));
        board.set_piece(sq(2, 4), Some(Piece::new(PieceType::Pawn, Color::Black)));

        assert!(is_square_attacked(&board, sq(5, 3), Color::White));
        assert!(is_square_attacked(&board, sq(5, 5), Color::White));
        assert!(!is_square_attacked(&board, sq(7, 3), Color::White));
        assert!(is_square_attacked(&board, sq(3, 3), Color::Black));
        assert!(!is_square_attacked(&board, sq(1, 3), Color::Black));
    }

    #[test]
    fn test_nightrider_ray_stops_at_occupant() {
        let mut board = Board::empty(BoardShape::Standard);
        board.set_piece(sq(8, 0), Some(Piece::new(PieceType::Nightrider, Color::Black)));

        assert!(is_square_attacked(&board, sq(6, 1), Color::Black));
        assert!(is_square_attacked(&board, sq(4, 2), Color::Black));
        assert!(is_square_attacked(&board, sq(0, 4), Color::Black));

        board.set_piece(sq(4, 2), Some(Piece::new(PieceType::Pawn, Color::White)));
        assert!(is_square_attacked(&board, sq(4, 2), Color::Black));
        assert!(!is_square_attacked(&board, sq(2, 3), Color::Black));
    }

    #[test]
    fn test_angel_attacks_as_queen_and_knight() {
        let mut board = Board::empty(BoardShape::Standard);
        board.set_piece(sq(4, 4), Some(Piece::new(PieceType::Angel, Color::White)));

        assert!(is_square_attacked(&board, sq(0, 0), Color::White));
        assert!(is_square_attacked(&board, sq(2, 5), Color::White));
        assert!(!is_square_attacked(&board, sq(1, 5), Color::White));
    }

    #[test]
    fn test_no_attack_from_blocked_square() {
        let mut board = Board::empty(BoardShape::Cross);
        // Placed on a blocked corner directly; must never count as an attacker.
        board.set_piece(sq(0, 0), Some(Piece::new(PieceType::Queen, Color::White)));
        board.set_piece(sq(8, 8), Some(Piece::new(PieceType::Knight, Color::White)));

        assert!(!is_square_attacked(&board, sq(0, 3), Color::White));
        assert!(!is_square_attacked(&board, sq(4, 4), Color::White));
        assert!(!is_square_attacked(&board, sq(6, 7), Color::White));
        assert!(attackers(&board, sq(0, 3), Color::White).is_empty());
    }

    #[test]
    fn test_rays_stop_at_blocked_square() {
        let mut board = Board::empty(BoardShape::Cross);
        board.set_piece(sq(3, 0), Some(Piece::new(PieceType::Rook, Color::Black)));

        assert!(is_square_attacked(&board, sq(5, 0), Color::Black));
        assert!(!is_square_attacked(&board, sq(7, 0), Color::Black));
    }

    #[test]
    fn test_least_valuable_attacker() {
        let mut board = Board::empty(BoardShape::Standard);
        board.set_piece(sq(4, 0), Some(Piece::new(PieceType::Queen, Color::Black)));
        board.set_piece(sq(2, 3), Some(Piece::new(PieceType::Knight, Color::Black)));
        board.set_piece(sq(3, 3), Some(Piece::new(PieceType::Pawn, Color::Black)));

        let (square, piece) = least_valuable_attacker(&board, sq(4, 4), Color::Black).unwrap();
        assert_eq!(square, sq(3, 3));
        assert_eq!(piece.piece_type, PieceType::Pawn);
        assert_eq!(attackers(&board, sq(4, 4), Color::Black).len(), 3);
    }
}
