//! Text layout for 9x9 positions, modelled on FEN.
//!
//! `<row0>/<row1>/.../<row8> <w|b> [shape]`, row 0 first. Digits are runs of
//! empty cells, uppercase letters are White pieces and lowercase Black.
//! Pawns away from their starting row are marked as moved.

use crate::board::Board;
use crate::game_state::GameState;
use crate::shape::BoardShape;
use crate::types::{Color, Piece, PieceType, Square, BOARD_SIZE};
use std::fmt::Write;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("invalid layout format: {0}")]
    InvalidFormat(String),

    #[error("invalid piece character: '{0}'")]
    InvalidPiece(char),

    #[error("invalid side to move: {0}")]
    InvalidColor(String),

    #[error("row {row} has {cells} cells, expected 9")]
    RowLength { row: usize, cells: usize },

    #[error("piece on blocked square {0}")]
    BlockedSquare(Square),

    #[error(transparent)]
    Shape(#[from] crate::error::CoreError),
}

impl GameState {
    /// Parses a text layout into a game state.
    pub fn from_layout(layout: &str) -> Result<Self, LayoutError> {
        let parts: Vec<&str> = layout.split_whitespace().collect();

        if parts.len() < 2 || parts.len() > 3 {
            return Err(LayoutError::InvalidFormat(format!(
                "expected 2 or 3 fields, got {}",
                parts.len()
            )));
        }

        let shape = match parts.get(2) {
            Some(name) => name.parse::<BoardShape>()?,
            None => BoardShape::Standard,
        };

        let board = parse_board(parts[0], shape)?;

        let turn = match parts[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(LayoutError::InvalidColor(other.to_string())),
        };

        Ok(GameState::from_board(board, turn))
    }

    /// Converts the game state to its text layout.
    pub fn to_layout(&self) -> String {
        let mut out = board_to_layout(&self.board);
        out.push(' ');
        out.push(if self.turn == Color::White { 'w' } else { 'b' });
        if !self.shape().is_rectangular() {
            out.push(' ');
            out.push_str(self.shape().name());
        }
        out
    }
}

/// Parses the board portion of a layout.
fn parse_board(board_str: &str, shape: BoardShape) -> Result<Board, LayoutError> {
    let mut board = Board::empty(shape);
    let rows: Vec<&str> = board_str.split('/').collect();

    if rows.len() != BOARD_SIZE as usize {
        return Err(LayoutError::InvalidFormat(format!(
            "expected 9 rows, got {}",
            rows.len()
        )));
    }

    for (row, row_str) in rows.iter().enumerate() {
        let mut col = 0usize;

        for ch in row_str.chars() {
            if let Some(run) = ch.to_digit(10) {
                if run == 0 {
                    return Err(LayoutError::InvalidPiece(ch));
                }
                col += run as usize;
                continue;
            }

            let mut piece = Piece::from_char(ch).ok_or(LayoutError::InvalidPiece(ch))?;
            let square = Square::new(row as u8, col as u8).ok_or(LayoutError::RowLength {
                row,
                cells: col + 1,
            })?;
            if shape.is_blocked(square) {
                return Err(LayoutError::BlockedSquare(square));
            }
            if piece.piece_type == PieceType::Pawn && square.row() != piece.color.pawn_row() {
                piece = piece.moved();
            }
            board.set_piece(square, Some(piece));
            col += 1;
        }

        if col != BOARD_SIZE as usize {
            return Err(LayoutError::RowLength { row, cells: col });
        }
    }

    Ok(board)
}

/// Converts the board to the first layout field.
fn board_to_layout(board: &Board) -> String {
    let mut out = String::with_capacity(96);

    for row in 0..BOARD_SIZE {
        let mut empty = 0;
        for col in 0..BOARD_SIZE {
            match Square::new(row, col).and_then(|sq| board.piece_at(sq)) {
                Some(piece) => {
                    if empty > 0 {
                        let _ = write!(out, "{}", empty);
                        empty = 0;
                    }
                    out.push(piece.to_char());
                }
                None => empty += 1,
            }
        }
        if empty > 0 {
            let _ = write!(out, "{}", empty);
        }
        if row + 1 < BOARD_SIZE {
            out.push('/');
        }
    }

    out
}

/// Named layouts.
pub mod positions {
    /// Starting position on the standard board.
    pub const STARTING: &str = "rnbqkqbnr/ppppppppp/9/9/9/9/9/PPPPPPPPP/RNBQKQBNR w";

    /// Starting position on the cross board.
    pub const CROSS_STARTING: &str = "3qkq3/3ppp3/9/9/9/9/9/3PPP3/3QKQ3 w cross";

    /// Compound pieces in the middle of the board.
    pub const COMPOUND_MIDDLEGAME: &str = "r2qk2jr/ppp1p1ppp/2n3a2/3p1p3/4C4/2N2E3/PPPP1PPPP/9/R3K3R w";
}
