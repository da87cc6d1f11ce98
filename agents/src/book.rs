//! Opening book keyed by a plain-text board signature.
//!
//! Books are JSON documents of the form
//! `{ "metadata": ..., "positions": { "<key>": { "moves": [{from, to, weight, games}] } } }`.

use chess9_core::{find_legal_move, GameState, Move, Square, BOARD_SIZE};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Books are only consulted before this full move.
pub const DEFAULT_BOOK_MOVE_LIMIT: u16 = 12;

#[derive(Debug, Error)]
pub enum BookError {
    #[error("failed to read opening book: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid opening book: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookMove {
    pub from: Square,
    pub to: Square,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub games: u32,
}

fn default_weight() -> f64 {
    1.0
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookPosition {
    #[serde(default)]
    pub moves: Vec<BookMove>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpeningBook {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(default)]
    pub positions: HashMap<String, BookPosition>,
    #[serde(skip, default = "default_move_limit")]
    move_limit: u16,
}

fn default_move_limit() -> u16 {
    DEFAULT_BOOK_MOVE_LIMIT
}

impl Default for OpeningBook {
    fn default() -> Self {
        Self {
            metadata: None,
            positions: HashMap::new(),
            move_limit: DEFAULT_BOOK_MOVE_LIMIT,
        }
    }
}

/// Signature of a position: two characters per square (`color initial` +
/// `type code`, or `..` when empty) followed by the side to move's initial.
pub fn position_key(state: &GameState) -> String {
    let mut key = String::with_capacity(2 * (BOARD_SIZE as usize).pow(2) + 1);
    for square in Square::all() {
        match state.board.piece_at(square) {
            Some(piece) => {
                key.push(color_initial(piece.color.name()));
                key.push(piece.piece_type.code());
            }
            None => key.push_str(".."),
        }
    }
    key.push(color_initial(state.turn.name()));
    key
}

fn color_initial(name: &str) -> char {
    name.chars().next().unwrap_or('?')
}

impl OpeningBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, BookError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, BookError> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, BookError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn with_move_limit(mut self, move_limit: u16) -> Self {
        self.move_limit = move_limit;
        self
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Records a move for the position, adding to its weight if already known.
    pub fn add_move(&mut self, state: &GameState, from: Square, to: Square, weight: f64) {
        let entry = self.positions.entry(position_key(state)).or_default();
        match entry.moves.iter_mut().find(|m| m.from == from && m.to == to) {
            Some(existing) => {
                existing.weight += weight;
                existing.games += 1;
            }
            None => entry.moves.push(BookMove {
                from,
                to,
                weight,
                games: 1,
            }),
        }
    }

    /// Folds another book into this one, summing weights of shared moves.
    pub fn merge(&mut self, other: OpeningBook) {
        for (key, position) in other.positions {
            let entry = self.positions.entry(key).or_default();
            for book_move in position.moves {
                match entry
                    .moves
                    .iter_mut()
                    .find(|m| m.from == book_move.from && m.to == book_move.to)
                {
                    Some(existing) => {
                        existing.weight += book_move.weight;
                        existing.games += book_move.games;
                    }
                    None => entry.moves.push(book_move),
                }
            }
        }
        if self.metadata.is_none() {
            self.metadata = other.metadata;
        }
    }

    /// Picks a book move by weight. Entries that are not legal in `state`
    /// are skipped; past the move limit the book is silent.
    pub fn probe(&self, state: &GameState, rng: &mut dyn RngCore) -> Option<Move> {
        if state.fullmove_number >= self.move_limit {
            return None;
        }

        let position = self.positions.get(&position_key(state))?;
        let candidates: Vec<(Move, f64)> = position
            .moves
            .iter()
            .filter_map(|m| find_legal_move(state, m.from, m.to, None).map(|mv| (mv, m.weight.max(0.0))))
            .collect();

        let total: f64 = candidates.iter().map(|(_, w)| w).sum();
        if total <= 0.0 {
            return candidates.first().map(|(mv, _)| *mv);
        }

        let mut roll = rng.gen_range(0.0..total);
        for (mv, weight) in &candidates {
            if roll < *weight {
                return Some(*mv);
            }
            roll -= weight;
        }
        candidates.last().map(|(mv, _)| *mv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess9_core::{BoardShape, Color};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sq(r: u8, c: u8) -> Square {
        Square::new(r, c).unwrap()
    }

    #[test]
    fn test_position_key_layout() {
        let state = GameState::new();
        let key = position_key(&state);
        assert_eq!(key.len(), 163);
        assert!(key.starts_with("brbnbbbqbkbqbbbnbr"));
        assert!(key.ends_with('w'));
        assert_ne!(key, position_key(&state.with_turn(Color::Black)));
    }

    #[test]
    fn test_probe_returns_legal_book_move() {
        let state = GameState::new();
        let mut book = OpeningBook::new();
        book.add_move(&state, sq(7, 4), sq(5, 4), 10.0);

        let mut rng = StdRng::seed_from_u64(1);
        let mv = book.probe(&state, &mut rng).unwrap();
        assert_eq!((mv.from, mv.to), (sq(7, 4), sq(5, 4)));
    }

    #[test]
    fn test_illegal_entries_are_skipped() {
        let state = GameState::new();
        let mut book = OpeningBook::new();
        book.add_move(&state, sq(7, 4), sq(3, 4), 100.0);

        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(book.probe(&state, &mut rng), None);
    }

    #[test]
    fn test_book_silent_after_move_limit() {
        let mut state = GameState::new();
        let mut book = OpeningBook::new().with_move_limit(5);
        book.add_move(&state, sq(7, 4), sq(5, 4), 1.0);
        state.fullmove_number = 5;

        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(book.probe(&state, &mut rng), None);
    }

    #[test]
    fn test_weights_bias_selection() {
        let state = GameState::new();
        let mut book = OpeningBook::new();
        book.add_move(&state, sq(7, 4), sq(5, 4), 95.0);
        book.add_move(&state, sq(7, 3), sq(5, 3), 5.0);

        let mut rng = StdRng::seed_from_u64(42);
        let heavy = (0..200)
            .filter(|_| book.probe(&state, &mut rng).map(|mv| mv.from) == Some(sq(7, 4)))
            .count();
        assert!(heavy > 150, "heavy move chosen {heavy} times");
    }

    #[test]
    fn test_parse_and_merge() {
        let state = GameState::with_shape(BoardShape::Standard);
        let key = position_key(&state);
        let json = format!(
            r#"{{"metadata": {{"games": 3}}, "positions": {{"{key}": {{"moves": [
                {{"from": {{"r": 7, "c": 4}}, "to": {{"r": 5, "c": 4}}, "weight": 60, "games": 2}}
            ]}}}}}}"#
        );
        let mut book = OpeningBook::from_json(&json).unwrap();
        assert_eq!(book.len(), 1);

        let mut other = OpeningBook::new();
        other.add_move(&state, sq(7, 4), sq(5, 4), 40.0);
        other.add_move(&state, sq(7, 2), sq(6, 2), 1.0);
        book.merge(other);

        let moves = &book.positions[&key].moves;
        assert_eq!(moves.len(), 2);
        assert_eq!(moves[0].weight, 100.0);
        assert_eq!(moves[0].games, 3);
        assert!(book.metadata.is_some());
    }

    #[test]
    fn test_rejects_malformed_book() {
        assert!(matches!(
            OpeningBook::from_json(r#"{"positions": []}"#),
            Err(BookError::Json(_))
        ));
    }
}
