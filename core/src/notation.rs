//! Human-readable coordinates: columns are letters from `a`, ranks count
//! down from the far edge, so row 0 is rank 9. Moves read `e3-e5`.

use crate::types::{Move, PieceType, Square, BOARD_SIZE};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotationError {
    #[error("invalid square: {0}")]
    InvalidSquare(String),

    #[error("invalid move: {0}")]
    InvalidMove(String),
}

/// Name of a square, e.g. `e3`.
pub fn square_name(square: Square) -> String {
    square.to_string()
}

/// Parses a square name such as `a9` or `i1`.
pub fn parse_square(name: &str) -> Result<Square, NotationError> {
    let invalid = || NotationError::InvalidSquare(name.to_string());
    let mut chars = name.chars();
    let file = chars.next().ok_or_else(invalid)?;
    let rank: u8 = chars.as_str().parse().map_err(|_| invalid())?;

    if !file.is_ascii_lowercase() || rank == 0 || rank > BOARD_SIZE {
        return Err(invalid());
    }
    let col = file as u8 - b'a';
    Square::new(BOARD_SIZE - rank, col).ok_or_else(invalid)
}

/// Move in `from-to` form, with `=X` for promotions.
pub fn move_notation(mv: &Move) -> String {
    match mv.promotion {
        Some(piece) => format!(
            "{}-{}={}",
            mv.from,
            mv.to,
            piece.code().to_ascii_uppercase()
        ),
        None => format!("{}-{}", mv.from, mv.to),
    }
}

/// Parses `e3-e5`, `e3e5` or `e8-e9=Q` into its squares and optional promotion.
pub fn parse_move(text: &str) -> Result<(Square, Square, Option<PieceType>), NotationError> {
    let invalid = || NotationError::InvalidMove(text.to_string());
    let (route, promotion) = match text.split_once('=') {
        Some((route, piece)) => {
            let mut chars = piece.chars();
            let code = chars.next().ok_or_else(invalid)?;
            if chars.next().is_some() {
                return Err(invalid());
            }
            (route, Some(PieceType::from_code(code).ok_or_else(invalid)?))
        }
        None => (text, None),
    };

    let (from, to) = match route.split_once('-') {
        Some(pair) => pair,
        None => {
            // Split before the second letter.
            let split = route
                .char_indices()
                .skip(1)
                .find(|(_, c)| c.is_ascii_lowercase())
                .map(|(i, _)| i)
                .ok_or_else(invalid)?;
            route.split_at(split)
        }
    };

    Ok((parse_square(from)?, parse_square(to)?, promotion))
}
