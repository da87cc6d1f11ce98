//! Declarative movement capabilities for every piece type.
//!
//! Move generation and attack detection consult this table only; compound
//! pieces are expressed as a union of the descriptors of their constituents.

use crate::types::PieceType;

/// Offsets are `(row delta, column delta)`.
pub type Offset = (i8, i8);

pub const ORTHOGONAL: [Offset; 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

pub const DIAGONAL: [Offset; 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];

pub const ALL_DIRECTIONS: [Offset; 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

pub const KNIGHT_OFFSETS: [Offset; 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

/// One movement capability.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Movement {
    /// Forward step, double step while unmoved, diagonal forward capture.
    Pawn,
    /// Single displacement that jumps over occupants.
    Leap(&'static [Offset]),
    /// Unit displacement repeated until blocked.
    Slide(&'static [Offset]),
    /// Leap displacement repeated until blocked.
    SlideLeap(&'static [Offset]),
}

impl Movement {
    /// Displacements of this capability; empty for pawns.
    pub fn offsets(self) -> &'static [Offset] {
        match self {
            Movement::Pawn => &[],
            Movement::Leap(offsets) | Movement::Slide(offsets) | Movement::SlideLeap(offsets) => {
                offsets
            }
        }
    }

    /// True for capabilities that repeat their displacement.
    pub fn is_ray(self) -> bool {
        matches!(self, Movement::Slide(_) | Movement::SlideLeap(_))
    }
}

/// Capability descriptor of a piece type.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PieceRules {
    pub movements: &'static [Movement],
    /// Must not be left attacked; at most one per side.
    pub royal: bool,
    /// May castle while unmoved.
    pub castles: bool,
    /// Can be the rook of a castling move.
    pub castling_partner: bool,
    /// Promotes on reaching the last row.
    pub promotes: bool,
}

impl PieceRules {
    const fn moves(movements: &'static [Movement]) -> Self {
        Self {
            movements,
            royal: false,
            castles: false,
            castling_partner: false,
            promotes: false,
        }
    }

    /// True if any capability repeats its displacement.
    pub fn has_rays(&self) -> bool {
        self.movements.iter().any(|m| m.is_ray())
    }
}

const PAWN: PieceRules = PieceRules {
    promotes: true,
    ..PieceRules::moves(&[Movement::Pawn])
};
const KNIGHT: PieceRules = PieceRules::moves(&[Movement::Leap(&KNIGHT_OFFSETS)]);
const BISHOP: PieceRules = PieceRules::moves(&[Movement::Slide(&DIAGONAL)]);
const ROOK: PieceRules = PieceRules {
    castling_partner: true,
    ..PieceRules::moves(&[Movement::Slide(&ORTHOGONAL)])
};
const QUEEN: PieceRules = PieceRules::moves(&[Movement::Slide(&ALL_DIRECTIONS)]);
const KING: PieceRules = PieceRules {
    royal: true,
    castles: true,
    ..PieceRules::moves(&[Movement::Leap(&ALL_DIRECTIONS)])
};
const ARCHBISHOP: PieceRules = PieceRules::moves(&[
    Movement::Slide(&DIAGONAL),
    Movement::Leap(&KNIGHT_OFFSETS),
]);
const CHANCELLOR: PieceRules = PieceRules::moves(&[
    Movement::Slide(&ORTHOGONAL),
    Movement::Leap(&KNIGHT_OFFSETS),
]);
const ANGEL: PieceRules = PieceRules::moves(&[
    Movement::Slide(&ALL_DIRECTIONS),
    Movement::Leap(&KNIGHT_OFFSETS),
]);
const NIGHTRIDER: PieceRules = PieceRules::moves(&[Movement::SlideLeap(&KNIGHT_OFFSETS)]);

impl PieceType {
    /// Returns the capability descriptor for this piece type.
    pub const fn rules(self) -> &'static PieceRules {
        match self {
            PieceType::Pawn => &PAWN,
            PieceType::Knight => &KNIGHT,
            PieceType::Bishop => &BISHOP,
            PieceType::Rook => &ROOK,
            PieceType::Queen => &QUEEN,
            PieceType::King => &KING,
            PieceType::Archbishop => &ARCHBISHOP,
            PieceType::Chancellor => &CHANCELLOR,
            PieceType::Angel => &ANGEL,
            PieceType::Nightrider => &NIGHTRIDER,
        }
    }
}
