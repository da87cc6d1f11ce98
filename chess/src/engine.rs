//! Synchronous request handlers. The worker runs these on the blocking pool;
//! the CLI calls them directly.

use crate::config::EngineConfig;
use crate::protocol::{
    AnalysisReport, AnalyzeRequest, BestMoveRequest, BoardSnapshot, EvaluateRequest,
    LegacySearchRequest, LegacySearchResult, MoveReport, ProgressReport, ProtocolError, SearchSummary,
    TopMovesRequest,
};
use chess9_agents::{
    analyze_position, depth_for_elo, evaluate_for, get_top_moves, search_with_callback,
    Difficulty, InfoCallback, OpeningBook, SearchLimits, SearchProgress, SearchResult,
};
use chess9_core::{move_notation, BoardShape, Color, GameState, Move};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tracing::{debug, info};

/// Callback receiving a report after each completed search iteration.
pub type ProgressSink = Arc<dyn Fn(ProgressReport) + Send + Sync>;

/// Everything a handler needs besides the request itself.
#[derive(Clone)]
pub struct EngineContext {
    pub config: EngineConfig,
    /// Shape used when a snapshot does not name one
    pub shape: BoardShape,
    pub book: Option<Arc<OpeningBook>>,
}

impl EngineContext {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            shape: config.shape,
            config,
            book: None,
        }
    }

    fn limits(&self, depth: Option<u8>, elo: Option<u32>, time_limit_ms: Option<u64>) -> SearchLimits {
        let depth = depth
            .or_else(|| elo.map(depth_for_elo))
            .unwrap_or(self.config.depth);
        let mut limits = SearchLimits::depth(depth);
        if let Some(millis) = time_limit_ms.or(self.config.time_limit_ms) {
            limits = limits.with_move_time(millis);
        }
        limits
    }

    fn position(&self, snapshot: &BoardSnapshot, turn: Color) -> Result<GameState, ProtocolError> {
        snapshot.to_state(turn, self.shape, self.config.promotion)
    }

    /// Book move for `state`, if the fast path applies.
    fn book_move(&self, state: &GameState) -> Option<Move> {
        if state.shape() != BoardShape::Standard {
            info!(shape = %state.shape(), "non-rectangular board, using general search");
            return None;
        }
        self.book.as_ref()?.probe(state, &mut StdRng::from_entropy())
    }
}

fn progress_callback(sink: Option<ProgressSink>) -> Option<InfoCallback> {
    let sink = sink?;
    Some(Box::new(move |progress: &SearchProgress| {
        sink(ProgressReport {
            depth: progress.depth,
            score: progress.score,
            nodes: progress.nodes,
            time_ms: progress.time_ms,
            pv: progress.pv.iter().map(move_notation).collect(),
        })
    }))
}

/// Picks a move with the requested difficulty. Returns the move together
/// with the search that produced it, which is empty for book moves.
pub fn best_move(
    ctx: &EngineContext,
    request: &BestMoveRequest,
    progress: Option<ProgressSink>,
) -> Result<(Option<MoveReport>, SearchResult), ProtocolError> {
    let state = ctx.position(&request.position, request.color)?;

    if let Some(mv) = ctx.book_move(&state) {
        debug!(notation = %move_notation(&mv), "book move");
        return Ok((Some(MoveReport::new(mv)), SearchResult::default()));
    }

    let limits = ctx.limits(request.depth, request.elo, request.time_limit_ms);
    let difficulty = request.difficulty.unwrap_or(ctx.config.difficulty);
    let mut rng = StdRng::from_entropy();

    // Full-strength searches report their iterations; dice-rolling levels do not.
    let result = match progress_callback(progress) {
        Some(callback) if matches!(difficulty, Difficulty::Hard | Difficulty::Expert) => {
            search_with_callback(&state, limits, ctx.config.tt_size_mb, callback)
        }
        _ => difficulty
            .strategy()
            .select(&state, &limits, ctx.config.tt_size_mb, &mut rng),
    };

    debug!(
        difficulty = %difficulty,
        depth = result.depth,
        score = result.score,
        nodes = result.nodes,
        "best move search done"
    );
    let report = result
        .best_move
        .map(|mv| MoveReport::scored(mv, result.score, result.nodes));
    Ok((report, result))
}

/// `search`: a best-move request answered with the search summary.
pub fn search_summary(
    ctx: &EngineContext,
    request: &BestMoveRequest,
    progress: Option<ProgressSink>,
) -> Result<SearchSummary, ProtocolError> {
    let (best_move, result) = best_move(ctx, request, progress)?;
    Ok(SearchSummary {
        best_move,
        score: result.score,
        depth: result.depth,
        nodes: result.nodes,
    })
}

pub fn top_moves(ctx: &EngineContext, request: &TopMovesRequest) -> Result<Vec<MoveReport>, ProtocolError> {
    let state = ctx.position(&request.position, request.color)?;
    let depth = request.depth.unwrap_or(ctx.config.depth);
    let max_time = request.max_time_ms.or(ctx.config.time_limit_ms);
    let ranked = get_top_moves(&state, request.count, depth, max_time, ctx.config.tt_size_mb);
    Ok(ranked.iter().map(MoveReport::from).collect())
}

pub fn evaluate(ctx: &EngineContext, request: &EvaluateRequest) -> Result<i32, ProtocolError> {
    // The side to move earns the tempo bonus; score it as that side's turn.
    let state = ctx.position(&request.position, request.for_color)?;
    Ok(evaluate_for(&state, request.for_color))
}

/// Full-strength analysis, independent of any difficulty setting.
pub fn analyze(
    ctx: &EngineContext,
    request: &AnalyzeRequest,
    progress: Option<ProgressSink>,
) -> Result<AnalysisReport, ProtocolError> {
    let state = ctx.position(&request.position, request.color)?;
    let limits = ctx.limits(request.depth, None, request.time_limit_ms);
    let analysis = analyze_position(&state, limits.clone(), ctx.config.tt_size_mb, progress_callback(progress));

    let count = request.top_moves_count.unwrap_or(ctx.config.top_moves);
    let depth = limits.max_depth.unwrap_or(ctx.config.depth);
    let ranked = get_top_moves(&state, count, depth, request.time_limit_ms, ctx.config.tt_size_mb);
    Ok(AnalysisReport::new(analysis, &ranked))
}

/// Legacy `SEARCH`: always a plain full search.
pub fn legacy_search(
    ctx: &EngineContext,
    request: &LegacySearchRequest,
) -> Result<LegacySearchResult, ProtocolError> {
    let best = BestMoveRequest {
        position: request.position.clone(),
        color: request.turn_color,
        depth: request.depth,
        difficulty: Some(Difficulty::Expert),
        elo: request.elo,
        time_limit_ms: None,
    };
    let (report, result) = best_move(ctx, &best, None)?;
    Ok(LegacySearchResult {
        mv: report,
        score: result.score,
        nodes: result.nodes,
    })
}
