use crate::Agent;
use chess9_core::{generate_legal_moves, GameState, Move};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng};

/// Plays a uniformly random legal move.
pub struct RandomAgent<R = StdRng> {
    name: String,
    rng: R,
}

impl RandomAgent<StdRng> {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl<R: RngCore> RandomAgent<R> {
    pub fn with_rng(rng: R) -> Self {
        RandomAgent {
            name: "Random".to_string(),
            rng,
        }
    }
}

impl Default for RandomAgent<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RngCore> Agent for RandomAgent<R> {
    fn best_move(&mut self, state: &GameState) -> Option<Move> {
        let moves = generate_legal_moves(state).into_vec();
        moves.choose(&mut self.rng).copied()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess9_core::{BoardShape, Color, Piece, PieceType, Square};

    #[test]
    fn test_random_agent_plays_legal_moves() {
        let mut agent = RandomAgent::seeded(17);
        let mut state = GameState::with_shape(BoardShape::Cross);

        for _ in 0..20 {
            let Some(mv) = agent.best_move(&state) else {
                break;
            };
            assert!(generate_legal_moves(&state).iter().any(|m| *m == mv));
            state = state.apply_move(mv);
        }
    }

    #[test]
    fn test_same_seed_same_game() {
        let state = GameState::new();
        let first: Vec<_> = {
            let mut agent = RandomAgent::seeded(99);
            (0..5).map(|_| agent.best_move(&state)).collect()
        };
        let mut agent = RandomAgent::seeded(99);
        let second: Vec<_> = (0..5).map(|_| agent.best_move(&state)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_no_move_when_stalemated() {
        let mut state = GameState::empty(BoardShape::Standard);
        let put = |state: &mut GameState, r, c, pt, color| {
            state
                .board
                .set_piece(Square::new(r, c).unwrap(), Some(Piece::new(pt, color)));
        };
        put(&mut state, 0, 0, PieceType::King, Color::Black);
        put(&mut state, 2, 2, PieceType::King, Color::White);
        put(&mut state, 2, 1, PieceType::Queen, Color::White);
        state.turn = Color::Black;

        assert_eq!(RandomAgent::seeded(1).best_move(&state), None);
    }
}
