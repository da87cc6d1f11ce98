pub mod book;
pub mod evaluation;
pub mod minimax;
pub mod ordering;
pub mod random;
pub mod search;
pub mod see;
pub mod strategy;
pub mod transposition;

use chess9_core::{GameState, Move};

/// Something that can pick a move in a position
pub trait Agent {
    /// Get the move to play, or None when the position has no legal move
    fn best_move(&mut self, state: &GameState) -> Option<Move>;

    /// Get the agent's name
    fn name(&self) -> &str;
}

pub use book::{position_key, BookError, OpeningBook};
pub use evaluation::{evaluate, evaluate_absolute, evaluate_for, Evaluatable, TEMPO_BONUS};
pub use minimax::MinimaxAgent;
pub use random::RandomAgent;
pub use search::*;
pub use see::static_exchange;
pub use strategy::{depth_for_elo, Difficulty, ParseDifficultyError, SelectionStrategy};
