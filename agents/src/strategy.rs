//! Difficulty levels and the move-selection strategy behind each one.
//!
//! Every level uses the same evaluator and search. What changes is how a move
//! is picked from the candidates: weaker levels roll dice before (or instead
//! of) trusting the search.

use crate::evaluation::evaluate;
use crate::search::{get_top_moves, search_with_tt_size, RankedMove, SearchLimits, SearchResult};
use chess9_core::{generate_legal_moves, is_capture, GameState, Move};
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Depth used by candidate searches when the limits name none.
const FALLBACK_DEPTH: u8 = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Easy,
    #[default]
    Medium,
    Hard,
    Expert,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown difficulty '{0}'")]
pub struct ParseDifficultyError(String);

impl Difficulty {
    pub const ALL: [Difficulty; 5] = [
        Difficulty::Beginner,
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Expert,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Expert => "expert",
        }
    }

    pub fn strategy(self) -> Box<dyn SelectionStrategy> {
        match self {
            Difficulty::Beginner => Box::new(BeginnerStrategy),
            Difficulty::Easy => Box::new(EasyStrategy),
            Difficulty::Medium => Box::new(PoolStrategy::medium()),
            Difficulty::Hard | Difficulty::Expert => Box::new(FullSearchStrategy),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Difficulty {
    type Err = ParseDifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Difficulty::ALL
            .into_iter()
            .find(|d| d.name() == lower)
            .ok_or_else(|| ParseDifficultyError(s.to_string()))
    }
}

/// Search depth for a rating. Only a rough knob; nothing here is calibrated.
pub fn depth_for_elo(elo: u32) -> u8 {
    match elo {
        0..=999 => 3,
        1000..=1399 => 4,
        1400..=1799 => 5,
        1800..=2199 => 6,
        _ => 8,
    }
}

/// Picks a move for one difficulty level.
pub trait SelectionStrategy: Send {
    fn select(
        &self,
        state: &GameState,
        limits: &SearchLimits,
        tt_size_mb: usize,
        rng: &mut dyn RngCore,
    ) -> SearchResult;

    fn name(&self) -> &str;
}

/// Plays a uniformly random legal move 85% of the time.
pub struct BeginnerStrategy;

impl SelectionStrategy for BeginnerStrategy {
    fn select(
        &self,
        state: &GameState,
        limits: &SearchLimits,
        tt_size_mb: usize,
        rng: &mut dyn RngCore,
    ) -> SearchResult {
        let moves = generate_legal_moves(state).into_vec();
        if moves.is_empty() {
            return search_with_tt_size(state, SearchLimits::depth(1), tt_size_mb);
        }

        if rng.gen_bool(0.85) {
            return random_result(state, &moves, rng);
        }

        if rng.gen_bool(0.10) {
            let ranked = get_top_moves(state, moves.len(), 1, time_budget(limits), tt_size_mb);
            let weakest = ranked.len().saturating_mul(3).div_ceil(10).max(1);
            if let Some(pick) = ranked[ranked.len() - weakest.min(ranked.len())..].choose(rng) {
                return ranked_result(pick, 1);
            }
        }

        search_with_tt_size(state, SearchLimits::depth(1), tt_size_mb)
    }

    fn name(&self) -> &str {
        "beginner"
    }
}

/// Grabs a random capture 70% of the time, otherwise leans on a shallow search.
pub struct EasyStrategy;

impl SelectionStrategy for EasyStrategy {
    fn select(
        &self,
        state: &GameState,
        limits: &SearchLimits,
        tt_size_mb: usize,
        rng: &mut dyn RngCore,
    ) -> SearchResult {
        let captures: Vec<Move> = generate_legal_moves(state)
            .iter()
            .filter(|mv| is_capture(state, mv))
            .copied()
            .collect();

        if !captures.is_empty() && rng.gen_bool(0.70) {
            return random_result(state, &captures, rng);
        }

        let depth = search_depth(limits).min(2);
        let pool = PoolStrategy {
            pool: 3,
            best_chance: 0.70,
            depth_cap: Some(depth),
        };
        pool.select(state, limits, tt_size_mb, rng)
    }

    fn name(&self) -> &str {
        "easy"
    }
}

/// Ranks the root moves and usually, but not always, plays the best one.
pub struct PoolStrategy {
    /// How many top candidates may be played
    pub pool: usize,
    /// Chance of playing the best candidate
    pub best_chance: f64,
    pub depth_cap: Option<u8>,
}

impl PoolStrategy {
    pub fn medium() -> Self {
        Self {
            pool: 2,
            best_chance: 0.70,
            depth_cap: None,
        }
    }
}

impl SelectionStrategy for PoolStrategy {
    fn select(
        &self,
        state: &GameState,
        limits: &SearchLimits,
        tt_size_mb: usize,
        rng: &mut dyn RngCore,
    ) -> SearchResult {
        let depth = match self.depth_cap {
            Some(cap) => search_depth(limits).min(cap),
            None => search_depth(limits),
        };
        let ranked = get_top_moves(state, self.pool.max(1), depth, time_budget(limits), tt_size_mb);

        let pick = match ranked.split_first() {
            None => return search_with_tt_size(state, SearchLimits::depth(1), tt_size_mb),
            Some((best, rest)) if rest.is_empty() || rng.gen_bool(self.best_chance) => best,
            Some((best, rest)) => rest.choose(rng).unwrap_or(best),
        };
        ranked_result(pick, depth)
    }

    fn name(&self) -> &str {
        "pool"
    }
}

/// The deterministic full search.
pub struct FullSearchStrategy;

impl SelectionStrategy for FullSearchStrategy {
    fn select(
        &self,
        state: &GameState,
        limits: &SearchLimits,
        tt_size_mb: usize,
        _rng: &mut dyn RngCore,
    ) -> SearchResult {
        search_with_tt_size(state, limits.clone(), tt_size_mb)
    }

    fn name(&self) -> &str {
        "full"
    }
}

fn search_depth(limits: &SearchLimits) -> u8 {
    limits.max_depth.unwrap_or(FALLBACK_DEPTH).max(1)
}

fn time_budget(limits: &SearchLimits) -> Option<u64> {
    limits.move_time.map(|t| t.as_millis() as u64)
}

fn random_result(state: &GameState, moves: &[Move], rng: &mut dyn RngCore) -> SearchResult {
    match moves.choose(rng) {
        Some(&mv) => SearchResult {
            best_move: Some(mv),
            score: -evaluate(&state.apply_move(mv)),
            ..SearchResult::default()
        },
        None => SearchResult::default(),
    }
}

fn ranked_result(ranked: &RankedMove, depth: u8) -> SearchResult {
    SearchResult {
        best_move: Some(ranked.mv),
        score: ranked.score,
        depth,
        nodes: ranked.nodes,
        stopped: false,
        pv: vec![ranked.mv],
    }
}
