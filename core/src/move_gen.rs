use crate::game_state::GameState;
use crate::pieces::Movement;
use crate::types::{Color, LastMove, Move, Piece, PieceType, SpecialMove, Square, BOARD_SIZE};
use serde::{Deserialize, Serialize};

/// A growable list of moves.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MoveList {
    moves: Vec<Move>,
}

impl MoveList {
    /// Creates an empty move list.
    pub fn new() -> Self {
        Self {
            moves: Vec::with_capacity(96),
        }
    }

    /// Adds a move to the list.
    pub fn push(&mut self, mv: Move) {
        self.moves.push(mv);
    }

    /// Returns the number of moves.
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    /// Returns true if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Returns an iterator over the moves.
    pub fn iter(&self) -> impl Iterator<Item = &Move> {
        self.moves.iter()
    }

    /// Keeps only the moves matching the predicate.
    pub fn retain<F: FnMut(&Move) -> bool>(&mut self, f: F) {
        self.moves.retain(f);
    }

    pub fn into_vec(self) -> Vec<Move> {
        self.moves
    }
}

impl IntoIterator for MoveList {
    type Item = Move;
    type IntoIter = std::vec::IntoIter<Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.moves.into_iter()
    }
}

/// Outcome of a position for the side to move.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Ongoing,
    Checkmate,
    Stalemate,
}

/// Generates all legal moves for the side to move.
pub fn generate_legal_moves(state: &GameState) -> MoveList {
    legal_moves_for(state, state.turn)
}

/// Generates all legal moves for the given color, whoever is to move.
pub fn legal_moves_for(state: &GameState, color: Color) -> MoveList {
    let mut moves = generate_pseudo_legal_moves(state, color);
    filter_legal_moves(state, color, &mut moves);
    moves
}

/// Generates legal captures, en passant captures and promotions for the side to move.
pub fn generate_captures(state: &GameState) -> MoveList {
    let mut moves = generate_legal_moves(state);
    moves.retain(|mv| is_capture(state, mv) || mv.promotion.is_some());
    moves
}

/// Returns true if the move removes an enemy piece.
pub fn is_capture(state: &GameState, mv: &Move) -> bool {
    let mover = state
        .board
        .piece_at(mv.from)
        .map_or(state.turn, |piece| piece.color);
    mv.is_en_passant() || state.board.is_enemy(mv.to, mover)
}

/// Generates all pseudo-legal moves (not checking for king safety).
pub fn generate_pseudo_legal_moves(state: &GameState, color: Color) -> MoveList {
    let mut moves = MoveList::new();

    for (from, piece) in state.board.pieces(color) {
        if state.board.is_blocked(from) {
            continue;
        }
        for &movement in piece.piece_type.rules().movements {
            match movement {
                Movement::Pawn => generate_pawn_moves(state, from, piece, &mut moves),
                Movement::Leap(offsets) => generate_leaps(state, from, color, offsets, &mut moves),
                Movement::Slide(offsets) | Movement::SlideLeap(offsets) => {
                    generate_rays(state, from, color, offsets, &mut moves)
                }
            }
        }
        if piece.piece_type.rules().castles {
            generate_castling_moves(state, from, piece, &mut moves);
        }
    }

    moves
}

/// Filters out moves that would leave the mover's king attacked.
fn filter_legal_moves(state: &GameState, color: Color, moves: &mut MoveList) {
    moves.retain(|mv| !state.apply_move(*mv).is_side_in_check(color));
}

/// Pushes a pawn move, expanding it into promotions on the last row.
fn push_pawn_move(state: &GameState, from: Square, to: Square, color: Color, moves: &mut MoveList) {
    if to.row() == color.promotion_row() {
        for &choice in state.promotion.choices() {
            moves.push(Move::new_promotion(from, to, choice));
        }
    } else {
        moves.push(Move::new(from, to));
    }
}

/// Generates pawn pushes, captures and en passant for one pawn.
fn generate_pawn_moves(state: &GameState, from: Square, pawn: Piece, moves: &mut MoveList) {
    let color = pawn.color;
    let direction = color.pawn_direction();
    let board = &state.board;

    // Single push, then double push from the home row while unmoved
    if let Some(one) = from.offset(direction, 0) {
        if !board.is_blocked(one) && board.is_empty(one) {
            push_pawn_move(state, from, one, color, moves);

            if !pawn.has_moved && from.row() == color.pawn_row() {
                if let Some(two) = one.offset(direction, 0) {
                    if !board.is_blocked(two) && board.is_empty(two) {
                        push_pawn_move(state, from, two, color, moves);
                    }
                }
            }
        }
    }

    // Diagonal captures
    for dc in [-1, 1] {
        if let Some(target) = from.offset(direction, dc) {
            if !board.is_blocked(target) && board.is_enemy(target, color) {
                push_pawn_move(state, from, target, color, moves);
            }
        }
    }

    // En passant
    if let Some(captured) = en_passant_victim(state, from, color) {
        if let Some(target) = captured.offset(direction, 0) {
            if !board.is_blocked(target) && board.is_empty(target) {
                moves.push(Move::with_special(
                    from,
                    target,
                    SpecialMove::EnPassant { captured },
                ));
            }
        }
    }
}

/// Square of an enemy pawn that just double-pushed alongside `from`.
fn en_passant_victim(state: &GameState, from: Square, color: Color) -> Option<Square> {
    let LastMove {
        to,
        is_double_pawn_push: true,
        ..
    } = state.last_move?
    else {
        return None;
    };
    if to.row() != from.row() || to.col().abs_diff(from.col()) != 1 {
        return None;
    }
    let victim = state.board.piece_at(to)?;
    (victim.piece_type == PieceType::Pawn && victim.color != color).then_some(to)
}

/// Generates single-displacement moves.
fn generate_leaps(
    state: &GameState,
    from: Square,
    color: Color,
    offsets: &[(i8, i8)],
    moves: &mut MoveList,
) {
    for &(dr, dc) in offsets {
        if let Some(to) = from.offset(dr, dc) {
            if !state.board.is_blocked(to) && !state.board.is_color(to, color) {
                moves.push(Move::new(from, to));
            }
        }
    }
}

/// Generates repeated-displacement moves, for both sliders and riders.
fn generate_rays(
    state: &GameState,
    from: Square,
    color: Color,
    offsets: &[(i8, i8)],
    moves: &mut MoveList,
) {
    for &(dr, dc) in offsets {
        let mut current = from;

        while let Some(to) = current.offset(dr, dc) {
            if state.board.is_blocked(to) {
                break;
            }
            match state.board.piece_at(to) {
                None => moves.push(Move::new(from, to)),
                Some(piece) => {
                    if piece.color != color {
                        moves.push(Move::new(from, to));
                    }
                    break; // Can't move past any piece
                }
            }
            current = to;
        }
    }
}

/// Generates castling moves for an unmoved king.
///
/// The partner must be an unmoved rook on column 0 or the last column of the
/// king's row, with empty squares in between. The king moves two columns toward
/// it and may not start on, pass or land on an attacked square.
fn generate_castling_moves(state: &GameState, from: Square, king: Piece, moves: &mut MoveList) {
    if king.has_moved {
        return;
    }
    let color = king.color;
    let board = &state.board;
    let enemy = color.opponent();

    if state.is_attacked_by(from, enemy) {
        return;
    }

    for rook_col in [0, BOARD_SIZE - 1] {
        let Some(rook_from) = Square::new(from.row(), rook_col) else {
            continue;
        };
        if board.is_blocked(rook_from) || from.col().abs_diff(rook_col) < 3 {
            continue;
        }
        let partner_ok = board.piece_at(rook_from).is_some_and(|p| {
            p.color == color && p.piece_type.rules().castling_partner && !p.has_moved
        });
        if !partner_ok {
            continue;
        }

        let side: i8 = if rook_col > from.col() { 1 } else { -1 };
        let (low, high) = (from.col().min(rook_col), from.col().max(rook_col));
        let path_clear = (low + 1..high).all(|col| {
            Square::new(from.row(), col)
                .is_some_and(|sq| !board.is_blocked(sq) && board.is_empty(sq))
        });
        if !path_clear {
            continue;
        }

        let (Some(pass), Some(king_to)) = (from.offset(0, side), from.offset(0, 2 * side)) else {
            continue;
        };
        if state.is_attacked_by(pass, enemy) || state.is_attacked_by(king_to, enemy) {
            continue;
        }
        let Some(rook_to) = king_to.offset(0, -side) else {
            continue;
        };

        moves.push(Move::with_special(
            from,
            king_to,
            SpecialMove::Castling { rook_from, rook_to },
        ));
    }
}

/// Resolves an externally supplied move against the legal moves of the side
/// to move, returning the fully annotated move. Without a named promotion the
/// Angel promotion is chosen.
pub fn find_legal_move(
    state: &GameState,
    from: Square,
    to: Square,
    promotion: Option<PieceType>,
) -> Option<Move> {
    let wanted = promotion.or_else(|| {
        let is_pawn = state
            .board
            .piece_at(from)
            .is_some_and(|p| p.piece_type.rules().promotes);
        (is_pawn && to.row() == state.turn.promotion_row()).then_some(PieceType::Angel)
    });
    generate_legal_moves(state)
        .into_iter()
        .find(|mv| mv.from == from && mv.to == to && mv.promotion == wanted)
}

/// Checks if the side to move is checkmated.
pub fn is_checkmate(state: &GameState) -> bool {
    state.is_in_check() && generate_legal_moves(state).is_empty()
}

/// Checks if the side to move is stalemated.
pub fn is_stalemate(state: &GameState) -> bool {
    !state.is_in_check() && generate_legal_moves(state).is_empty()
}

/// Classifies the position for the side to move.
pub fn game_status(state: &GameState) -> GameStatus {
    if !generate_legal_moves(state).is_empty() {
        GameStatus::Ongoing
    } else if state.is_in_check() {
        GameStatus::Checkmate
    } else {
        GameStatus::Stalemate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::BoardShape;
    use crate::types::PromotionPolicy;

    fn sq(r: u8, c: u8) -> Square {
        Square::new(r, c).unwrap()
    }

    fn put(state: &mut GameState, r: u8, c: u8, pt: PieceType, color: Color) {
        state.board.set_piece(sq(r, c), Some(Piece::new(pt, color)));
    }

    fn kings(shape: BoardShape) -> GameState {
        let mut state = GameState::empty(shape);
        put(&mut state, 8, 4, PieceType::King, Color::White);
        put(&mut state, 0, 4, PieceType::King, Color::Black);
        state
    }

    #[test]
    fn test_starting_position_moves() {
        let state = GameState::new();
        let moves = generate_legal_moves(&state);

        // 9 pawns with single and double pushes, 2 knights with 2 moves each
        assert_eq!(moves.len(), 22);
    }

    #[test]
    fn test_cross_starting_position_moves() {
        let state = GameState::with_shape(BoardShape::Cross);
        assert_eq!(generate_legal_moves(&state).len(), 6);
    }

    #[test]
    fn test_no_moves_touch_blocked_squares() {
        let mut state = GameState::with_shape(BoardShape::Cross);
        put(&mut state, 4, 4, PieceType::Angel, Color::White);
        put(&mut state, 3, 3, PieceType::Nightrider, Color::White);
        put(&mut state, 5, 1, PieceType::Archbishop, Color::White);

        for color in Color::ALL {
            for mv in legal_moves_for(&state, color).iter() {
                assert!(!BoardShape::Cross.is_blocked(mv.from));
                assert!(!BoardShape::Cross.is_blocked(mv.to), "{:?}", mv);
            }
        }
    }

    #[test]
    fn test_blocked_origin_never_moves() {
        let mut state = kings(BoardShape::Cross);
        put(&mut state, 0, 0, PieceType::Queen, Color::White);
        let moves = generate_legal_moves(&state);
        assert!(moves.iter().all(|mv| mv.from != sq(0, 0)));
    }

    #[test]
    fn test_nightrider_moves() {
        let mut state = kings(BoardShape::Standard);
        put(&mut state, 8, 0, PieceType::Nightrider, Color::White);
        put(&mut state, 4, 2, PieceType::Pawn, Color::White);

        let targets: Vec<Square> = generate_legal_moves(&state)
            .iter()
            .filter(|mv| mv.from == sq(8, 0))
            .map(|mv| mv.to)
            .collect();

        assert!(targets.contains(&sq(6, 1)));
        assert!(!targets.contains(&sq(4, 2)));
        assert!(!targets.contains(&sq(2, 3)));
        assert!(targets.contains(&sq(7, 2)));
        assert!(targets.contains(&sq(4, 8)));
    }

    #[test]
    fn test_pawn_promotion_auto() {
        let mut state = kings(BoardShape::Standard);
        put(&mut state, 1, 0, PieceType::Pawn, Color::White);

        let pawn_moves: Vec<Move> = generate_legal_moves(&state)
            .into_iter()
            .filter(|m| m.from == sq(1, 0))
            .collect();
        assert_eq!(pawn_moves.len(), 1);
        assert_eq!(pawn_moves[0].promotion, Some(PieceType::Angel));
    }

    #[test]
    fn test_pawn_promotion_manual() {
        let mut state = kings(BoardShape::Standard).with_promotion(PromotionPolicy::Manual);
        put(&mut state, 1, 0, PieceType::Pawn, Color::White);

        let pawn_moves = generate_legal_moves(&state)
            .into_iter()
            .filter(|m| m.from == sq(1, 0))
            .count();
        assert_eq!(pawn_moves, PieceType::PROMOTION_CHOICES.len());
    }

    #[test]
    fn test_en_passant_requires_double_push() {
        let mut state = kings(BoardShape::Standard);
        put(&mut state, 3, 3, PieceType::Pawn, Color::White);
        state
            .board
            .set_piece(sq(1, 4), Some(Piece::new(PieceType::Pawn, Color::Black)));
        state.turn = Color::Black;

        let state = state.apply_move(Move::new(sq(1, 4), sq(3, 4)));
        let ep = generate_legal_moves(&state)
            .into_iter()
            .find(|mv| mv.is_en_passant())
            .expect("en passant available");
        assert_eq!(ep.to, sq(2, 4));

        let after = state.apply_move(ep);
        assert!(after.board.is_empty(sq(3, 4)));
        assert_eq!(
            after.board.piece_at(sq(2, 4)).map(|p| p.piece_type),
            Some(PieceType::Pawn)
        );

        // A single step does not allow it.
        let mut quiet = kings(BoardShape::Standard);
        put(&mut quiet, 3, 3, PieceType::Pawn, Color::White);
        put(&mut quiet, 3, 4, PieceType::Pawn, Color::Black);
        quiet.last_move = Some(LastMove {
            from: sq(2, 4),
            to: sq(3, 4),
            is_double_pawn_push: false,
        });
        assert!(generate_legal_moves(&quiet).iter().all(|mv| !mv.is_en_passant()));
    }

    #[test]
    fn test_castling_both_sides() {
        let mut state = kings(BoardShape::Standard);
        put(&mut state, 8, 0, PieceType::Rook, Color::White);
        put(&mut state, 8, 8, PieceType::Rook, Color::White);

        let castles: Vec<Move> = generate_legal_moves(&state)
            .into_iter()
            .filter(|mv| mv.is_castle())
            .collect();
        assert_eq!(castles.len(), 2);

        let kingside = castles.iter().find(|mv| mv.to == sq(8, 6)).unwrap();
        let after = state.apply_move(*kingside);
        assert_eq!(
            after.board.piece_at(sq(8, 5)).map(|p| p.piece_type),
            Some(PieceType::Rook)
        );
        assert!(after.board.is_empty(sq(8, 8)));

        let queenside = castles.iter().find(|mv| mv.to == sq(8, 2)).unwrap();
        let after = state.apply_move(*queenside);
        assert_eq!(
            after.board.piece_at(sq(8, 3)).map(|p| p.piece_type),
            Some(PieceType::Rook)
        );
    }

    #[test]
    fn test_special_moves_leave_source_unchanged() {
        let mut castling = kings(BoardShape::Standard);
        put(&mut castling, 8, 0, PieceType::Rook, Color::White);
        put(&mut castling, 8, 8, PieceType::Rook, Color::White);

        let mut promotion = kings(BoardShape::Standard).with_promotion(PromotionPolicy::Manual);
        put(&mut promotion, 1, 0, PieceType::Pawn, Color::White);

        let mut en_passant = kings(BoardShape::Standard);
        put(&mut en_passant, 3, 3, PieceType::Pawn, Color::White);
        put(&mut en_passant, 1, 4, PieceType::Pawn, Color::Black);
        en_passant.turn = Color::Black;
        let en_passant = en_passant.apply_move(Move::new(sq(1, 4), sq(3, 4)));

        let cases: [(&GameState, fn(&Move) -> bool, usize); 3] = [
            (&castling, |mv| mv.is_castle(), 2),
            (&promotion, |mv| mv.promotion.is_some(), PieceType::PROMOTION_CHOICES.len()),
            (&en_passant, |mv| mv.is_en_passant(), 1),
        ];
        for (state, is_special, expected) in cases {
            let before = state.clone();
            let special: Vec<Move> = generate_legal_moves(state)
                .into_iter()
                .filter(|mv| is_special(mv))
                .collect();
            assert_eq!(special.len(), expected);

            for mv in special {
                let after = state.apply_move(mv);
                assert_ne!(after, before);
                assert_eq!(*state, before, "{mv:?} changed the source position");
            }
        }
    }

    #[test]
    fn test_castling_blocked_by_attack_and_history() {
        let mut state = kings(BoardShape::Standard);
        put(&mut state, 8, 8, PieceType::Rook, Color::White);
        // Black rook covers the square the king passes.
        put(&mut state, 2, 5, PieceType::Rook, Color::Black);
        assert!(generate_legal_moves(&state).iter().all(|mv| !mv.is_castle()));

        let mut moved = kings(BoardShape::Standard);
        moved
            .board
            .set_piece(sq(8, 8), Some(Piece::new(PieceType::Rook, Color::White).moved()));
        assert!(generate_legal_moves(&moved).iter().all(|mv| !mv.is_castle()));
    }

    #[test]
    fn test_checkmate_and_stalemate() {
        // Back-row mate: black king boxed in by its own pawns.
        let mut mate = GameState::empty(BoardShape::Standard);
        put(&mut mate, 0, 4, PieceType::King, Color::Black);
        put(&mut mate, 1, 3, PieceType::Pawn, Color::Black);
        put(&mut mate, 1, 4, PieceType::Pawn, Color::Black);
        put(&mut mate, 1, 5, PieceType::Pawn, Color::Black);
        put(&mut mate, 0, 0, PieceType::Rook, Color::White);
        put(&mut mate, 8, 4, PieceType::King, Color::White);
        mate.turn = Color::Black;
        assert!(is_checkmate(&mate));
        assert_eq!(game_status(&mate), GameStatus::Checkmate);

        let mut stale = GameState::empty(BoardShape::Standard);
        put(&mut stale, 0, 0, PieceType::King, Color::Black);
        put(&mut stale, 1, 2, PieceType::Queen, Color::White);
        put(&mut stale, 2, 2, PieceType::King, Color::White);
        stale.turn = Color::Black;
        assert!(is_stalemate(&stale));
        assert_eq!(game_status(&stale), GameStatus::Stalemate);
    }

    #[test]
    fn test_find_legal_move_annotates() {
        let mut state = kings(BoardShape::Standard);
        put(&mut state, 8, 8, PieceType::Rook, Color::White);

        let castle = find_legal_move(&state, sq(8, 4), sq(8, 6), None).unwrap();
        assert!(castle.is_castle());
        assert!(find_legal_move(&state, sq(8, 4), sq(6, 4), None).is_none());
    }
}
