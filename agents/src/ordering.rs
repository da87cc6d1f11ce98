use crate::see::static_exchange;
use chess9_core::{is_capture, GameState, Move, PieceType, SQUARE_COUNT};

/// Deepest ply that keeps killer moves.
pub const MAX_PLY: usize = 128;

const TT_MOVE_SCORE: i32 = 1_000_000;
const GOOD_CAPTURE_SCORE: i32 = 100_000;
const PROMOTION_SCORE: i32 = 90_000;
const KILLER_SCORE: i32 = 80_000;
const BAD_CAPTURE_SCORE: i32 = -100_000;
const HISTORY_LIMIT: i32 = 50_000;

/// Most valuable victim, least valuable attacker.
pub fn mvv_lva(state: &GameState, mv: &Move) -> i32 {
    let victim = if mv.is_en_passant() {
        PieceType::Pawn.value()
    } else {
        state.board.piece_at(mv.to).map_or(0, |p| p.piece_type.value())
    };
    let attacker = state.board.piece_at(mv.from).map_or(0, |p| p.piece_type.value());
    victim * 10 - attacker / 10
}

/// Orders captures for quiescence, best victim first.
pub fn order_captures(state: &GameState, moves: &mut [Move]) {
    moves.sort_by_cached_key(|mv| {
        let promotion = mv.promotion.map_or(0, |p| p.value() * 10);
        -(mvv_lva(state, mv) + promotion)
    });
}

/// Killer and history tables gathered while searching.
pub struct MoveOrderer {
    killers: Vec<[Option<Move>; 2]>,
    history: Vec<i32>,
}

impl MoveOrderer {
    pub fn new() -> Self {
        Self {
            killers: vec![[None; 2]; MAX_PLY],
            history: vec![0; SQUARE_COUNT * SQUARE_COUNT],
        }
    }

    /// Sorts `moves` so the likeliest cutoffs come first:
    /// TT move, winning and equal captures, promotions, killers, quiet moves
    /// by history and finally captures that lose material.
    pub fn order(&self, state: &GameState, moves: &mut [Move], tt_move: Option<Move>, ply: usize) {
        moves.sort_by_cached_key(|mv| -self.score(state, mv, tt_move, ply));
    }

    fn score(&self, state: &GameState, mv: &Move, tt_move: Option<Move>, ply: usize) -> i32 {
        if tt_move.is_some_and(|tt| tt.same_route(mv)) {
            return TT_MOVE_SCORE;
        }

        if is_capture(state, mv) {
            let base = if static_exchange(state, mv) >= 0 {
                GOOD_CAPTURE_SCORE
            } else {
                BAD_CAPTURE_SCORE
            };
            return base + mvv_lva(state, mv);
        }

        if let Some(promoted) = mv.promotion {
            return PROMOTION_SCORE + promoted.value();
        }

        if let Some(slot) = self.killers.get(ply) {
            if slot[0] == Some(*mv) {
                return KILLER_SCORE;
            }
            if slot[1] == Some(*mv) {
                return KILLER_SCORE - 1_000;
            }
        }

        self.history[history_index(mv)]
    }

    /// Remembers a quiet move that caused a beta cutoff at `ply`.
    pub fn store_killer(&mut self, mv: Move, ply: usize) {
        if let Some(slot) = self.killers.get_mut(ply) {
            if slot[0] != Some(mv) {
                slot[1] = slot[0];
                slot[0] = Some(mv);
            }
        }
    }

    /// Rewards a quiet move that caused a cutoff, weighted by depth.
    pub fn update_history(&mut self, mv: Move, depth: u8) {
        let index = history_index(&mv);
        self.history[index] += i32::from(depth) * i32::from(depth);

        if self.history[index] >= HISTORY_LIMIT {
            for value in self.history.iter_mut() {
                *value /= 2;
            }
        }
    }
}

impl Default for MoveOrderer {
    fn default() -> Self {
        Self::new()
    }
}

fn history_index(mv: &Move) -> usize {
    mv.from.index() * SQUARE_COUNT + mv.to.index()
}
