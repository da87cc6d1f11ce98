//! Mailbox board representation bound to a board shape.
use crate::shape::BoardShape;
use crate::types::*;

/// Back rank layout from column 0 to column 8.
const BACK_RANK: [PieceType; BOARD_SIZE as usize] = [
    PieceType::Rook,
    PieceType::Knight,
    PieceType::Bishop,
    PieceType::Queen,
    PieceType::King,
    PieceType::Queen,
    PieceType::Bishop,
    PieceType::Knight,
    PieceType::Rook,
];

/// 81 cells plus the shape that decides which of them are playable.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Board {
    squares: [Option<Piece>; SQUARE_COUNT],
    shape: BoardShape,
}

impl Board {
    /// Creates an empty board.
    pub const fn empty(shape: BoardShape) -> Self {
        Self {
            squares: [None; SQUARE_COUNT],
            shape,
        }
    }

    /// Creates the starting setup: `R N B Q K Q B N R` behind a row of pawns.
    /// Cells blocked by the shape stay empty.
    pub fn starting_position(shape: BoardShape) -> Self {
        let mut board = Self::empty(shape);

        for color in Color::ALL {
            for (col, &piece_type) in BACK_RANK.iter().enumerate() {
                let col = col as u8;
                if let Some(square) = Square::new(color.home_row(), col) {
                    board.place(square, Piece::new(piece_type, color));
                }
                if let Some(square) = Square::new(color.pawn_row(), col) {
                    board.place(square, Piece::new(PieceType::Pawn, color));
                }
            }
        }

        board
    }

    fn place(&mut self, square: Square, piece: Piece) {
        if !self.is_blocked(square) {
            self.set_piece(square, Some(piece));
        }
    }

    pub const fn shape(&self) -> BoardShape {
        self.shape
    }

    /// Returns true if the square is outside the playable area.
    pub const fn is_blocked(&self, square: Square) -> bool {
        self.shape.is_blocked(square)
    }

    /// Gets the piece at the given square.
    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.squares[square.index()]
    }

    /// Sets the piece at the given square.
    pub fn set_piece(&mut self, square: Square, piece: Option<Piece>) {
        self.squares[square.index()] = piece;
    }

    /// Moves a piece from one square to another, marking it as moved.
    /// Returns the captured piece, if any.
    pub fn move_piece(&mut self, from: Square, to: Square) -> Option<Piece> {
        let piece = self.squares[from.index()].map(Piece::moved);
        let captured = self.squares[to.index()];

        self.squares[from.index()] = None;
        self.squares[to.index()] = piece;

        captured
    }

    /// Returns true if the given square is empty.
    pub fn is_empty(&self, square: Square) -> bool {
        self.piece_at(square).is_none()
    }

    /// Returns true if the given square contains a piece of the given color.
    pub fn is_color(&self, square: Square, color: Color) -> bool {
        self.piece_at(square).is_some_and(|p| p.color == color)
    }

    /// Returns true if the given square contains an enemy piece.
    pub fn is_enemy(&self, square: Square, color: Color) -> bool {
        self.piece_at(square).is_some_and(|p| p.color != color)
    }

    /// Finds the royal piece of the given color.
    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.pieces(color)
            .find(|(_, piece)| piece.piece_type.rules().royal)
            .map(|(square, _)| square)
    }

    /// Iterates the pieces of one color with their squares.
    pub fn pieces(&self, color: Color) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.occupied().filter(move |(_, piece)| piece.color == color)
    }

    /// Iterates all pieces with their squares.
    pub fn occupied(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(move |sq| self.piece_at(sq).map(|piece| (sq, piece)))
    }

    /// Returns the board reflected across the middle row with colors swapped.
    pub fn mirrored(&self) -> Self {
        let mut mirrored = Self::empty(self.shape);
        for (square, piece) in self.occupied() {
            mirrored.set_piece(
                square.mirror(),
                Some(Piece {
                    color: piece.color.opponent(),
                    ..piece
                }),
            );
        }
        mirrored
    }
}
