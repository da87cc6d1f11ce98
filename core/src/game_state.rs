//! Complete game state: board, side to move and the history needed for
//! en passant and move counters.
use crate::attacks;
use crate::board::*;
use crate::shape::BoardShape;
use crate::types::*;

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct GameState {
    /// The current board position, shape included
    pub board: Board,
    /// Which side is to move
    pub turn: Color,
    /// The previous move, if known; gates en passant
    pub last_move: Option<LastMove>,
    /// Half-move clock for the 50-move rule
    pub halfmove_clock: u16,
    /// Full move number (incremented after Black's move)
    pub fullmove_number: u16,
    /// How promotions are offered by move generation
    pub promotion: PromotionPolicy,
}

impl GameState {
    /// Creates a new game in the starting position on the standard board.
    pub fn new() -> Self {
        Self::with_shape(BoardShape::Standard)
    }

    /// Creates a new game in the starting position on the given shape.
    pub fn with_shape(shape: BoardShape) -> Self {
        Self::from_board(Board::starting_position(shape), Color::White)
    }

    /// Creates an empty game state for testing.
    pub fn empty(shape: BoardShape) -> Self {
        Self::from_board(Board::empty(shape), Color::White)
    }

    /// Wraps a board snapshot with the given side to move.
    pub fn from_board(board: Board, turn: Color) -> Self {
        Self {
            board,
            turn,
            last_move: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            promotion: PromotionPolicy::default(),
        }
    }

    /// Returns a copy with a different side to move.
    pub fn with_turn(&self, turn: Color) -> Self {
        Self {
            turn,
            ..self.clone()
        }
    }

    /// Returns a copy using the given promotion policy.
    pub fn with_promotion(&self, promotion: PromotionPolicy) -> Self {
        Self {
            promotion,
            ..self.clone()
        }
    }

    pub fn shape(&self) -> BoardShape {
        self.board.shape()
    }

    /// Returns true if the game is drawn by the 50-move rule.
    pub fn is_fifty_move_draw(&self) -> bool {
        self.halfmove_clock >= 100
    }

    /// Returns true if neither side can possibly deliver mate:
    /// bare kings, or a lone knight or bishop against a bare king.
    pub fn is_insufficient_material(&self) -> bool {
        let mut minors = [0u8; 2];
        for (_, piece) in self.board.occupied() {
            match piece.piece_type {
                PieceType::King => {}
                PieceType::Knight | PieceType::Bishop => minors[piece.color.index()] += 1,
                _ => return false,
            }
        }
        minors[0] + minors[1] <= 1
    }

    /// Applies a move, returning the new state. The receiver is left untouched.
    ///
    /// This does NOT check legality. Special-move metadata on the move drives
    /// castling and en passant; a pawn reaching the last row without a named
    /// promotion becomes an Angel. A move from an empty square only passes the turn.
    pub fn apply_move(&self, mv: Move) -> Self {
        let mut next = self.clone();
        next.turn = self.turn.opponent();
        if self.turn == Color::Black {
            next.fullmove_number += 1;
        }

        let Some(piece) = self.board.piece_at(mv.from) else {
            next.last_move = None;
            return next;
        };

        let mut is_capture = next.board.move_piece(mv.from, mv.to).is_some();

        match mv.special_move {
            Some(SpecialMove::Castling { rook_from, rook_to }) => {
                next.board.move_piece(rook_from, rook_to);
            }
            Some(SpecialMove::EnPassant { captured }) => {
                next.board.set_piece(captured, None);
                is_capture = true;
            }
            _ => {}
        }

        if piece.piece_type.rules().promotes && mv.to.row() == piece.color.promotion_row() {
            let promoted = mv.promotion.unwrap_or(PieceType::Angel);
            next.board
                .set_piece(mv.to, Some(Piece::new(promoted, piece.color).moved()));
        }

        let is_pawn = piece.piece_type == PieceType::Pawn;
        next.last_move = Some(LastMove {
            from: mv.from,
            to: mv.to,
            is_double_pawn_push: is_pawn && mv.from.row().abs_diff(mv.to.row()) == 2,
        });

        if is_pawn || is_capture {
            next.halfmove_clock = 0;
        } else {
            next.halfmove_clock += 1;
        }

        next
    }

    /// Returns true if the given square is attacked by the given color.
    pub fn is_attacked_by(&self, square: Square, attacker: Color) -> bool {
        attacks::is_square_attacked(&self.board, square, attacker)
    }

    /// Returns the square of the king of the given color.
    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.board.king_square(color)
    }

    /// Returns true if the current side to move is in check.
    pub fn is_in_check(&self) -> bool {
        self.is_side_in_check(self.turn)
    }

    /// Returns true if the given side's king is attacked.
    /// A side without a king is never in check.
    pub fn is_side_in_check(&self, color: Color) -> bool {
        self.king_square(color)
            .is_some_and(|king| self.is_attacked_by(king, color.opponent()))
    }

    /// Returns the position reflected across the middle row with colors swapped.
    pub fn mirrored(&self) -> Self {
        Self {
            board: self.board.mirrored(),
            turn: self.turn.opponent(),
            last_move: self.last_move.map(|lm| LastMove {
                from: lm.from.mirror(),
                to: lm.to.mirror(),
                ..lm
            }),
            ..self.clone()
        }
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}
