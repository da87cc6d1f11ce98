use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of rows and columns on the board.
pub const BOARD_SIZE: u8 = 9;

/// Number of cells on the board, blocked ones included.
pub const SQUARE_COUNT: usize = (BOARD_SIZE as usize) * (BOARD_SIZE as usize);

/// Represents one of the two players.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    /// Both colors, White first.
    pub const ALL: [Color; 2] = [Color::White, Color::Black];

    /// Returns the opposite color.
    pub const fn opponent(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Row delta of a pawn step. White starts at the bottom and moves toward row 0.
    pub const fn pawn_direction(self) -> i8 {
        match self {
            Color::White => -1,
            Color::Black => 1,
        }
    }

    /// Row on which pawns of this color promote.
    pub const fn promotion_row(self) -> u8 {
        match self {
            Color::White => 0,
            Color::Black => BOARD_SIZE - 1,
        }
    }

    /// Row of the back rank in the starting setup.
    pub const fn home_row(self) -> u8 {
        match self {
            Color::White => BOARD_SIZE - 1,
            Color::Black => 0,
        }
    }

    /// Row of the pawn line in the starting setup.
    pub const fn pawn_row(self) -> u8 {
        match self {
            Color::White => BOARD_SIZE - 2,
            Color::Black => 1,
        }
    }

    /// Dense index for lookup tables.
    pub const fn index(self) -> usize {
        match self {
            Color::White => 0,
            Color::Black => 1,
        }
    }

    /// Lowercase name as used on the wire.
    pub const fn name(self) -> &'static str {
        match self {
            Color::White => "white",
            Color::Black => "black",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Standard and variant piece types, serialized by their single-letter code.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum PieceType {
    #[serde(rename = "p")]
    Pawn,
    #[serde(rename = "n")]
    Knight,
    #[serde(rename = "b")]
    Bishop,
    #[serde(rename = "r")]
    Rook,
    #[serde(rename = "q")]
    Queen,
    #[serde(rename = "k")]
    King,
    /// Bishop + knight.
    #[serde(rename = "a")]
    Archbishop,
    /// Rook + knight.
    #[serde(rename = "c")]
    Chancellor,
    /// Queen + knight.
    #[serde(rename = "e")]
    Angel,
    /// Knight offsets repeated as a slide.
    #[serde(rename = "j")]
    Nightrider,
}

impl PieceType {
    pub const ALL: [PieceType; 10] = [
        PieceType::Pawn,
        PieceType::Knight,
        PieceType::Bishop,
        PieceType::Rook,
        PieceType::Queen,
        PieceType::King,
        PieceType::Archbishop,
        PieceType::Chancellor,
        PieceType::Angel,
        PieceType::Nightrider,
    ];

    /// Pieces a pawn may become, strongest first.
    pub const PROMOTION_CHOICES: [PieceType; 7] = [
        PieceType::Angel,
        PieceType::Queen,
        PieceType::Chancellor,
        PieceType::Archbishop,
        PieceType::Rook,
        PieceType::Bishop,
        PieceType::Knight,
    ];

    /// Returns the material value of this piece type in centipawns.
    /// The king value only matters for exchange evaluation.
    pub const fn value(self) -> i32 {
        match self {
            PieceType::Pawn => 100,
            PieceType::Knight => 320,
            PieceType::Bishop => 330,
            PieceType::Rook => 500,
            PieceType::Queen => 900,
            PieceType::King => 20_000,
            PieceType::Archbishop => 600,
            PieceType::Chancellor => 700,
            PieceType::Angel => 1000,
            PieceType::Nightrider => 600,
        }
    }

    /// Dense index for lookup tables.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Single-letter code (lowercase).
    pub const fn code(self) -> char {
        match self {
            PieceType::Pawn => 'p',
            PieceType::Knight => 'n',
            PieceType::Bishop => 'b',
            PieceType::Rook => 'r',
            PieceType::Queen => 'q',
            PieceType::King => 'k',
            PieceType::Archbishop => 'a',
            PieceType::Chancellor => 'c',
            PieceType::Angel => 'e',
            PieceType::Nightrider => 'j',
        }
    }

    /// Parses a single-letter code, either case.
    pub fn from_code(c: char) -> Option<Self> {
        let lower = c.to_ascii_lowercase();
        PieceType::ALL.into_iter().find(|pt| pt.code() == lower)
    }
}

/// A piece with its type, color and whether it has ever moved.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Piece {
    #[serde(rename = "type")]
    pub piece_type: PieceType,
    pub color: Color,
    #[serde(default)]
    pub has_moved: bool,
}

impl Piece {
    /// Creates an unmoved piece.
    pub const fn new(piece_type: PieceType, color: Color) -> Self {
        Self {
            piece_type,
            color,
            has_moved: false,
        }
    }

    /// Returns the same piece flagged as moved.
    pub const fn moved(self) -> Self {
        Self {
            has_moved: true,
            ..self
        }
    }

    /// Layout character: uppercase for White, lowercase for Black.
    pub fn to_char(self) -> char {
        let c = self.piece_type.code();
        match self.color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }

    /// Parses a layout character.
    pub fn from_char(c: char) -> Option<Self> {
        let piece_type = PieceType::from_code(c)?;
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        Some(Piece::new(piece_type, color))
    }
}

/// Wire form of a square.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub r: u8,
    pub c: u8,
}

/// A cell of the 9x9 grid, stored as `row * 9 + col`.
/// Row 0 is the far edge from White's point of view.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(try_from = "Coord", into = "Coord")]
pub struct Square(u8);

impl Square {
    /// Creates a square from row and column.
    /// Returns None if either is off the board.
    pub const fn new(row: u8, col: u8) -> Option<Self> {
        if row < BOARD_SIZE && col < BOARD_SIZE {
            Some(Square(row * BOARD_SIZE + col))
        } else {
            None
        }
    }

    /// Creates a square from index (0-80).
    pub const fn from_index(index: u8) -> Option<Self> {
        if (index as usize) < SQUARE_COUNT {
            Some(Square(index))
        } else {
            None
        }
    }

    /// Iterates all 81 squares in index order.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..SQUARE_COUNT as u8).map(Square)
    }

    pub const fn row(self) -> u8 {
        self.0 / BOARD_SIZE
    }

    pub const fn col(self) -> u8 {
        self.0 % BOARD_SIZE
    }

    /// Returns the square index (0-80).
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns the square displaced by `(dr, dc)`, if it is on the board.
    pub const fn offset(self, dr: i8, dc: i8) -> Option<Self> {
        let row = self.row() as i8 + dr;
        let col = self.col() as i8 + dc;
        if row < 0 || col < 0 {
            return None;
        }
        Square::new(row as u8, col as u8)
    }

    /// Reflects the square across the middle row.
    pub const fn mirror(self) -> Self {
        Square((BOARD_SIZE - 1 - self.row()) * BOARD_SIZE + self.col())
    }

    /// Chebyshev (king-move) distance.
    pub const fn distance(self, other: Square) -> u8 {
        let dr = self.row().abs_diff(other.row());
        let dc = self.col().abs_diff(other.col());
        if dr > dc {
            dr
        } else {
            dc
        }
    }

    /// Distance to the nearest of the four central cells of the board.
    pub const fn center_distance(self) -> u8 {
        let mid = BOARD_SIZE / 2;
        let dr = self.row().abs_diff(mid);
        let dc = self.col().abs_diff(mid);
        dr + dc
    }
}

impl TryFrom<Coord> for Square {
    type Error = String;

    fn try_from(coord: Coord) -> Result<Self, Self::Error> {
        Square::new(coord.r, coord.c)
            .ok_or_else(|| format!("square ({}, {}) is off the board", coord.r, coord.c))
    }
}

impl From<Square> for Coord {
    fn from(square: Square) -> Self {
        Coord {
            r: square.row(),
            c: square.col(),
        }
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            (b'a' + self.col()) as char,
            BOARD_SIZE - self.row()
        )
    }
}

/// Extra bookkeeping carried by moves that are more than a piece relocation.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SpecialMove {
    #[serde(rename_all = "camelCase")]
    Castling { rook_from: Square, rook_to: Square },
    #[serde(rename_all = "camelCase")]
    EnPassant { captured: Square },
    #[serde(rename_all = "camelCase")]
    Promotion { promoted_to: PieceType },
}

/// A move, annotated with everything needed to apply it.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Move {
    pub from: Square,
    pub to: Square,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<PieceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_move: Option<SpecialMove>,
}

impl Move {
    /// Creates a plain move.
    pub const fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
            special_move: None,
        }
    }

    /// Creates a promotion move.
    pub const fn new_promotion(from: Square, to: Square, promotion: PieceType) -> Self {
        Self {
            from,
            to,
            promotion: Some(promotion),
            special_move: Some(SpecialMove::Promotion {
                promoted_to: promotion,
            }),
        }
    }

    /// Creates a move carrying special-move metadata.
    pub const fn with_special(from: Square, to: Square, special: SpecialMove) -> Self {
        Self {
            from,
            to,
            promotion: None,
            special_move: Some(special),
        }
    }

    pub fn is_castle(&self) -> bool {
        matches!(self.special_move, Some(SpecialMove::Castling { .. }))
    }

    pub fn is_en_passant(&self) -> bool {
        matches!(self.special_move, Some(SpecialMove::EnPassant { .. }))
    }

    /// True when both moves go between the same squares with the same promotion,
    /// regardless of metadata.
    pub fn same_route(&self, other: &Move) -> bool {
        self.from == other.from && self.to == other.to && self.promotion == other.promotion
    }
}

/// The previous move, as far as en passant needs to know it.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastMove {
    pub from: Square,
    pub to: Square,
    #[serde(default)]
    pub is_double_pawn_push: bool,
}

/// How pawns reaching the last row are promoted.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromotionPolicy {
    /// One promotion move per pawn advance, always to Angel.
    #[default]
    #[serde(alias = "autoAngel")]
    Auto,
    /// One move per promotion choice; the caller picks.
    Manual,
}

impl PromotionPolicy {
    /// Piece types offered for a promotion under this policy.
    pub fn choices(self) -> &'static [PieceType] {
        match self {
            PromotionPolicy::Auto => &PieceType::PROMOTION_CHOICES[..1],
            PromotionPolicy::Manual => &PieceType::PROMOTION_CHOICES,
        }
    }
}
