use crate::error::CoreError;
use crate::types::{Square, BOARD_SIZE};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named board outline. Blocked squares can never hold, receive or emit a move.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoardShape {
    /// Full 9x9 rectangle.
    #[default]
    #[serde(alias = "classic")]
    Standard,
    /// 9x9 with the four 3x3 corners removed.
    Cross,
}

/// Width of the arms of the cross.
const CROSS_ARM: u8 = 3;

impl BoardShape {
    /// Returns true if the square is not part of the playable area.
    pub const fn is_blocked(self, square: Square) -> bool {
        match self {
            BoardShape::Standard => false,
            BoardShape::Cross => {
                let low = CROSS_ARM;
                let high = BOARD_SIZE - CROSS_ARM;
                let row_outside = square.row() < low || square.row() >= high;
                let col_outside = square.col() < low || square.col() >= high;
                row_outside && col_outside
            }
        }
    }

    /// Iterates the blocked squares of this shape.
    pub fn blocked_squares(self) -> impl Iterator<Item = Square> {
        Square::all().filter(move |&sq| self.is_blocked(sq))
    }

    /// True when every square of the grid is playable.
    pub const fn is_rectangular(self) -> bool {
        matches!(self, BoardShape::Standard)
    }

    pub const fn name(self) -> &'static str {
        match self {
            BoardShape::Standard => "standard",
            BoardShape::Cross => "cross",
        }
    }
}

impl fmt::Display for BoardShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BoardShape {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "standard" | "classic" => Ok(BoardShape::Standard),
            "cross" => Ok(BoardShape::Cross),
            _ => Err(CoreError::UnknownShape(s.to_string())),
        }
    }
}
