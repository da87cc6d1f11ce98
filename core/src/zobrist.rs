use crate::game_state::GameState;
use crate::types::{Color, Piece, Square, BOARD_SIZE, SQUARE_COUNT};

const PIECE_KINDS: usize = 10;

/// Zobrist hashing for positions.
/// Uses pre-computed random numbers for each piece-square combination.
#[derive(Debug, Clone)]
pub struct ZobristKeys {
    /// Random values for each color, piece type and square
    piece_square: [[[u64; SQUARE_COUNT]; PIECE_KINDS]; 2],
    /// Castling-relevant pieces that have not moved yet
    unmoved: [u64; SQUARE_COUNT],
    /// Random value for side to move (XOR when black to move)
    black_to_move: u64,
    /// Column of a pawn that just double-pushed
    en_passant: [u64; BOARD_SIZE as usize],
}

impl ZobristKeys {
    /// Creates a new set of keys from a fixed seed, so hashes are reproducible.
    pub fn new() -> Self {
        // xorshift64
        let mut state = 0x9E37_79B9_7F4A_7C15u64;
        let mut next_random = || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state
        };

        let mut piece_square = [[[0u64; SQUARE_COUNT]; PIECE_KINDS]; 2];
        for color in piece_square.iter_mut() {
            for kind in color.iter_mut() {
                for key in kind.iter_mut() {
                    *key = next_random();
                }
            }
        }

        let mut unmoved = [0u64; SQUARE_COUNT];
        for key in unmoved.iter_mut() {
            *key = next_random();
        }

        let black_to_move = next_random();

        let mut en_passant = [0u64; BOARD_SIZE as usize];
        for key in en_passant.iter_mut() {
            *key = next_random();
        }

        Self {
            piece_square,
            unmoved,
            black_to_move,
            en_passant,
        }
    }

    /// Gets the key for a piece on a square.
    pub fn piece_square_key(&self, piece: Piece, square: Square) -> u64 {
        let key = self.piece_square[piece.color.index()][piece.piece_type.index()][square.index()];
        let rules = piece.piece_type.rules();
        if !piece.has_moved && (rules.castles || rules.castling_partner) {
            key ^ self.unmoved[square.index()]
        } else {
            key
        }
    }

    /// Gets the key for the side to move.
    pub fn side_to_move_key(&self, color: Color) -> u64 {
        match color {
            Color::White => 0,
            Color::Black => self.black_to_move,
        }
    }

    /// Gets the key for an en passant opportunity on a column.
    pub fn en_passant_key(&self, square: Option<Square>) -> u64 {
        match square {
            Some(sq) => self.en_passant[sq.col() as usize],
            None => 0,
        }
    }
}

impl Default for ZobristKeys {
    fn default() -> Self {
        Self::new()
    }
}

/// Global Zobrist keys instance.
/// Initialized once and shared across the application.
pub static ZOBRIST: std::sync::LazyLock<ZobristKeys> = std::sync::LazyLock::new(ZobristKeys::new);

impl GameState {
    /// Hash of the position: pieces, castling-relevant history, side to move
    /// and en passant opportunity. Used for transpositions and repetition checks.
    pub fn zobrist_hash(&self) -> u64 {
        let keys = &*ZOBRIST;
        let mut hash = self
            .board
            .occupied()
            .fold(0u64, |acc, (square, piece)| acc ^ keys.piece_square_key(piece, square));

        hash ^= keys.side_to_move_key(self.turn);

        let double_push = self
            .last_move
            .filter(|lm| lm.is_double_pawn_push)
            .map(|lm| lm.to);
        hash ^= keys.en_passant_key(double_push);

        hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Move;

    fn sq(r: u8, c: u8) -> Square {
        Square::new(r, c).unwrap()
    }

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(GameState::new().zobrist_hash(), GameState::new().zobrist_hash());
    }

    #[test]
    fn test_hash_depends_on_side_to_move() {
        let state = GameState::new();
        assert_ne!(
            state.zobrist_hash(),
            state.with_turn(Color::Black).zobrist_hash()
        );
    }

    #[test]
    fn test_transposition_same_hash() {
        let state = GameState::new();
        let a = state
            .apply_move(Move::new(sq(8, 1), sq(6, 2)))
            .apply_move(Move::new(sq(0, 1), sq(2, 2)))
            .apply_move(Move::new(sq(8, 7), sq(6, 6)));
        let b = state
            .apply_move(Move::new(sq(8, 7), sq(6, 6)))
            .apply_move(Move::new(sq(0, 1), sq(2, 2)))
            .apply_move(Move::new(sq(8, 1), sq(6, 2)));
        assert_eq!(a.zobrist_hash(), b.zobrist_hash());
    }
}
