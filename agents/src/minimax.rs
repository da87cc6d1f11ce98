use crate::{
    book::OpeningBook,
    search::{SearchLimits, SearchResult, DEFAULT_TT_SIZE_MB},
    strategy::Difficulty,
    Agent,
};
use chess9_core::{BoardShape, GameState, Move};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

/// Search-backed agent: consults its opening book first, then lets the
/// difficulty's selection strategy pick from the search results.
pub struct MinimaxAgent {
    name: String,
    limits: SearchLimits,
    difficulty: Difficulty,
    tt_size_mb: usize,
    book: Option<OpeningBook>,
    rng: StdRng,
    last_result: Option<SearchResult>,
}

impl MinimaxAgent {
    pub fn new(depth: u8) -> Self {
        Self::with_limits(format!("Minimax(depth={})", depth), SearchLimits::depth(depth))
    }

    pub fn with_time_limit(time_ms: u64) -> Self {
        Self::with_limits(format!("Minimax(time={}ms)", time_ms), SearchLimits::move_time(time_ms))
    }

    fn with_limits(name: String, limits: SearchLimits) -> Self {
        MinimaxAgent {
            name,
            limits,
            difficulty: Difficulty::Expert,
            tt_size_mb: DEFAULT_TT_SIZE_MB,
            book: None,
            rng: StdRng::from_entropy(),
            last_result: None,
        }
    }

    pub fn difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn book(mut self, book: OpeningBook) -> Self {
        self.book = Some(book);
        self
    }

    pub fn tt_size_mb(mut self, tt_size_mb: usize) -> Self {
        self.tt_size_mb = tt_size_mb;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Result of the most recent search, if the last move came from one.
    pub fn last_result(&self) -> Option<&SearchResult> {
        self.last_result.as_ref()
    }
}

impl Agent for MinimaxAgent {
    fn best_move(&mut self, state: &GameState) -> Option<Move> {
        // Book keys assume the full rectangular board.
        if state.shape() == BoardShape::Standard {
            if let Some(mv) = self.book.as_ref().and_then(|book| book.probe(state, &mut self.rng)) {
                debug!(from = %mv.from, to = %mv.to, "book move");
                self.last_result = None;
                return Some(mv);
            }
        }

        let result = self
            .difficulty
            .strategy()
            .select(state, &self.limits, self.tt_size_mb, &mut self.rng);
        let best = result.best_move;
        self.last_result = Some(result);
        best
    }

    fn name(&self) -> &str {
        &self.name
    }
}
