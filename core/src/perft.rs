use crate::game_state::GameState;
use crate::move_gen::{generate_legal_moves, is_capture, is_checkmate};
use crate::types::Move;
use std::ops::AddAssign;

/// Leaf counts by move kind.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PerftResults {
    pub nodes: u64,
    pub captures: u64,
    pub en_passants: u64,
    pub castles: u64,
    pub promotions: u64,
    pub checks: u64,
    pub checkmates: u64,
}

impl PerftResults {
    fn tally_leaf(&mut self, before: &GameState, mv: &Move, after: &GameState) {
        self.nodes += 1;
        self.captures += u64::from(is_capture(before, mv));
        self.en_passants += u64::from(mv.is_en_passant());
        self.castles += u64::from(mv.is_castle());
        self.promotions += u64::from(mv.promotion.is_some());
        if after.is_in_check() {
            self.checks += 1;
            self.checkmates += u64::from(is_checkmate(after));
        }
    }
}

impl AddAssign<&PerftResults> for PerftResults {
    fn add_assign(&mut self, other: &PerftResults) {
        self.nodes += other.nodes;
        self.captures += other.captures;
        self.en_passants += other.en_passants;
        self.castles += other.castles;
        self.promotions += other.promotions;
        self.checks += other.checks;
        self.checkmates += other.checkmates;
    }
}

/// Counts leaf nodes of the legal move tree to the given depth.
pub fn perft(state: &GameState, depth: u8) -> u64 {
    match depth {
        0 => 1,
        1 => generate_legal_moves(state).len() as u64,
        _ => generate_legal_moves(state)
            .iter()
            .map(|mv| perft(&state.apply_move(*mv), depth - 1))
            .sum(),
    }
}

/// Node counts below each root move.
pub fn perft_divide(state: &GameState, depth: u8) -> Vec<(Move, u64)> {
    if depth == 0 {
        return Vec::new();
    }
    generate_legal_moves(state)
        .into_iter()
        .map(|mv| (mv, perft(&state.apply_move(mv), depth - 1)))
        .collect()
}

/// Perft with a breakdown of move kinds at the leaves.
pub fn perft_detailed(state: &GameState, depth: u8) -> PerftResults {
    let mut results = PerftResults::default();
    if depth == 0 {
        results.nodes = 1;
        return results;
    }

    for mv in generate_legal_moves(state).iter() {
        let child = state.apply_move(*mv);
        if depth == 1 {
            results.tally_leaf(state, mv, &child);
        } else {
            results += &perft_detailed(&child, depth - 1);
        }
    }
    results
}
