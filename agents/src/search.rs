use crate::evaluation::Evaluatable;
use crate::ordering::{order_captures, MoveOrderer};
use crate::see::static_exchange;
use crate::transposition::{NodeType, TranspositionTable};
use chess9_core::{
    generate_captures, generate_legal_moves, is_capture, legal_moves_for, GameState, Move,
    PieceType,
};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::debug;

/// Score of being mated right now; mates further away score closer to zero.
pub const MATE_SCORE: i32 = 30_000;
/// Budget used when neither a depth, a time nor a node limit is given.
pub const DEFAULT_MOVE_TIME_MS: u64 = 1000;
pub const DEFAULT_TT_SIZE_MB: usize = 16;

const INFINITY: i32 = 32_000;
const MATE_THRESHOLD: i32 = MATE_SCORE - 1_000;
const TIME_CHECK_INTERVAL: u64 = 2048;
const QUIESCENCE_DEPTH: u8 = 8;
const MAX_DEPTH: u8 = 64;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResult {
    pub best_move: Option<Move>,
    pub score: i32,
    pub depth: u8,
    pub nodes: u64,
    pub stopped: bool,
    pub pv: Vec<Move>,
}

#[derive(Debug, Clone)]
pub struct SearchProgress {
    pub depth: u8,
    pub score: i32,
    pub nodes: u64,
    pub pv: Vec<Move>,
    pub time_ms: u64,
}

pub type InfoCallback = Box<dyn Fn(&SearchProgress) + Send>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchLimits {
    pub max_depth: Option<u8>,
    pub move_time: Option<Duration>,
    pub nodes: Option<u64>,
}

impl SearchLimits {
    pub fn depth(depth: u8) -> Self {
        Self {
            max_depth: Some(depth),
            ..Self::default()
        }
    }

    pub fn move_time(millis: u64) -> Self {
        Self {
            move_time: Some(Duration::from_millis(millis)),
            ..Self::default()
        }
    }

    pub fn nodes(nodes: u64) -> Self {
        Self {
            nodes: Some(nodes),
            ..Self::default()
        }
    }

    pub fn with_move_time(mut self, millis: u64) -> Self {
        self.move_time = Some(Duration::from_millis(millis));
        self
    }

    pub fn with_nodes(mut self, nodes: u64) -> Self {
        self.nodes = Some(nodes);
        self
    }

    /// True when nothing would ever stop the search.
    fn is_unbounded(&self) -> bool {
        self.max_depth.is_none() && self.move_time.is_none() && self.nodes.is_none()
    }
}

/// A root move with the score it earned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedMove {
    #[serde(rename = "move")]
    pub mv: Move,
    pub score: i32,
    pub nodes: u64,
}

/// What a notable move does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TacticKind {
    #[serde(rename_all = "camelCase")]
    Capture { target: PieceType },
    Check,
}

/// A capture or check found while analyzing, with its expected material gain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tactic {
    #[serde(rename = "move")]
    pub mv: Move,
    pub kind: TacticKind,
    pub gain: i32,
}

/// Result of a background analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub best_move: Option<Move>,
    pub score: i32,
    pub depth: u8,
    pub nodes: u64,
    pub pv: Vec<Move>,
    /// Opponent captures that would win material from us
    pub threats: Vec<Tactic>,
    /// Our winning captures and checks
    pub opportunities: Vec<Tactic>,
}

struct SearchInfo {
    start_time: Instant,
    limits: SearchLimits,
    nodes: u64,
    stopped: bool,
    info_callback: Option<InfoCallback>,
    tt: TranspositionTable,
    orderer: MoveOrderer,
    quiescence_depth: u8,
}

impl SearchInfo {
    fn new(mut limits: SearchLimits, tt_size_mb: usize) -> Self {
        if limits.is_unbounded() {
            limits.move_time = Some(Duration::from_millis(DEFAULT_MOVE_TIME_MS));
        }
        Self {
            start_time: Instant::now(),
            limits,
            nodes: 0,
            stopped: false,
            info_callback: None,
            tt: TranspositionTable::new(tt_size_mb),
            orderer: MoveOrderer::new(),
            quiescence_depth: QUIESCENCE_DEPTH,
        }
    }

    fn should_stop(&mut self) -> bool {
        if self.stopped {
            return true;
        }

        if let Some(max_nodes) = self.limits.nodes {
            if self.nodes >= max_nodes {
                self.stopped = true;
                return true;
            }
        }

        // Check time limit periodically
        if self.nodes % TIME_CHECK_INTERVAL == 0 {
            if let Some(move_time) = self.limits.move_time {
                if self.start_time.elapsed() >= move_time {
                    self.stopped = true;
                    return true;
                }
            }
        }

        false
    }

    fn elapsed_ms(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }
}

/// Score for the side to move when it is mated `ply` plies from the root.
fn mated_in(ply: u8) -> i32 {
    -(MATE_SCORE - i32::from(ply))
}

/// True for scores that encode a forced mate.
pub fn is_mate_score(score: i32) -> bool {
    score.abs() >= MATE_THRESHOLD
}

pub fn search(state: &GameState, depth: u8) -> SearchResult {
    search_with_limits(state, SearchLimits::depth(depth))
}

pub fn search_with_limits(state: &GameState, limits: SearchLimits) -> SearchResult {
    search_with_tt_size(state, limits, DEFAULT_TT_SIZE_MB)
}

pub fn search_with_tt_size(state: &GameState, limits: SearchLimits, tt_size_mb: usize) -> SearchResult {
    let mut info = SearchInfo::new(limits, tt_size_mb);
    iterative_deepening(state, &mut info)
}

/// Searches like [`search_with_tt_size`], reporting every completed iteration.
pub fn search_with_callback(
    state: &GameState,
    limits: SearchLimits,
    tt_size_mb: usize,
    callback: InfoCallback,
) -> SearchResult {
    let mut info = SearchInfo::new(limits, tt_size_mb);
    info.info_callback = Some(callback);
    iterative_deepening(state, &mut info)
}

fn iterative_deepening(state: &GameState, info: &mut SearchInfo) -> SearchResult {
    let mut result = SearchResult::default();

    let root_moves = generate_legal_moves(state);
    if root_moves.is_empty() {
        // Terminal position: no move, mate or stalemate score.
        result.score = if state.is_in_check() { mated_in(0) } else { 0 };
        return result;
    }

    let max_depth = info.limits.max_depth.unwrap_or(MAX_DEPTH).clamp(1, MAX_DEPTH);
    let mut fallback = None;

    for depth in 1..=max_depth {
        let (score, best_move, pv) = alpha_beta_root(state, depth, info);

        // Only a completed iteration may replace the previous one.
        if info.stopped || best_move.is_none() {
            fallback = fallback.or(best_move);
            break;
        }

        result.best_move = best_move;
        result.score = score;
        result.depth = depth;
        result.pv = pv;

        debug!(depth, score, nodes = info.nodes, "search iteration complete");

        if let Some(ref callback) = info.info_callback {
            callback(&SearchProgress {
                depth,
                score,
                nodes: info.nodes,
                pv: result.pv.clone(),
                time_ms: info.elapsed_ms(),
            });
        }

        if is_mate_score(score) {
            break;
        }
    }

    if result.best_move.is_none() {
        // Out of budget before depth 1 finished; never answer without a move.
        result.best_move = fallback.or_else(|| root_moves.iter().next().copied());
        result.score = state.evaluate();
    }

    result.nodes = info.nodes;
    result.stopped = info.stopped;
    result
}

fn alpha_beta_root(
    state: &GameState,
    depth: u8,
    info: &mut SearchInfo,
) -> (i32, Option<Move>, Vec<Move>) {
    let hash = state.zobrist_hash();
    let tt_move = info.tt.probe(hash).and_then(|entry| entry.best_move);

    let mut moves = generate_legal_moves(state).into_vec();
    info.orderer.order(state, &mut moves, tt_move, 0);

    let mut alpha = -INFINITY;
    let mut best_move = None;
    let mut best_score = -INFINITY;
    let mut best_pv = vec![];

    for mv in moves {
        let child = state.apply_move(mv);
        let (score, mut pv) = alpha_beta(&child, depth - 1, -INFINITY, -alpha, 1, info);
        let score = -score;

        if info.stopped {
            break;
        }

        if score > best_score {
            best_score = score;
            best_move = Some(mv);
            best_pv = vec![mv];
            best_pv.append(&mut pv);
        }

        alpha = alpha.max(score);
    }

    if !info.stopped {
        info.tt.store(hash, best_move, best_score, depth, NodeType::Exact);
    }

    (best_score, best_move, best_pv)
}

fn alpha_beta(
    state: &GameState,
    depth: u8,
    mut alpha: i32,
    beta: i32,
    ply: u8,
    info: &mut SearchInfo,
) -> (i32, Vec<Move>) {
    info.nodes += 1;

    if info.should_stop() {
        return (0, vec![]);
    }

    if state.is_fifty_move_draw() || state.is_insufficient_material() {
        return (0, vec![]);
    }

    let original_alpha = alpha;
    let hash = state.zobrist_hash();
    let mut tt_move = None;

    if let Some(entry) = info.tt.probe(hash) {
        tt_move = entry.best_move;
        // Mate scores depend on the distance to the root, so they are not reused.
        if entry.depth >= depth && !is_mate_score(entry.score) {
            let cutoff = match entry.node_type {
                NodeType::Exact => true,
                NodeType::LowerBound => entry.score >= beta,
                NodeType::UpperBound => entry.score <= alpha,
            };
            if cutoff {
                return (entry.score, vec![]);
            }
        }
    }

    if depth == 0 {
        return (quiescence(state, 0, alpha, beta, ply, info), vec![]);
    }

    let mut moves = generate_legal_moves(state).into_vec();

    if moves.is_empty() {
        let score = if state.is_in_check() { mated_in(ply) } else { 0 };
        return (score, vec![]);
    }

    info.orderer.order(state, &mut moves, tt_move, usize::from(ply));

    let mut best_move = None;
    let mut best_score = -INFINITY;
    let mut best_pv = vec![];

    for mv in moves {
        let child = state.apply_move(mv);
        let (score, mut pv) = alpha_beta(&child, depth - 1, -beta, -alpha, ply + 1, info);
        let score = -score;

        if info.stopped {
            return (best_score, best_pv);
        }

        if score > best_score {
            best_score = score;
            best_move = Some(mv);
            best_pv = vec![mv];
            best_pv.append(&mut pv);
        }

        alpha = alpha.max(score);

        if alpha >= beta {
            if !is_capture(state, &mv) && mv.promotion.is_none() {
                info.orderer.store_killer(mv, usize::from(ply));
                info.orderer.update_history(mv, depth);
            }
            break;
        }
    }

    let node_type = if best_score <= original_alpha {
        NodeType::UpperBound
    } else if best_score >= beta {
        NodeType::LowerBound
    } else {
        NodeType::Exact
    };
    info.tt.store(hash, best_move, best_score, depth, node_type);

    (best_score, best_pv)
}

/// Resolves captures past the horizon. Out of check the side to move may
/// stand pat, so the result is never below the static evaluation; in check
/// every evasion is searched and having none is mate.
fn quiescence(
    state: &GameState,
    qdepth: u8,
    mut alpha: i32,
    beta: i32,
    ply: u8,
    info: &mut SearchInfo,
) -> i32 {
    info.nodes += 1;

    if info.should_stop() {
        return 0;
    }

    if state.is_in_check() {
        let mut evasions = generate_legal_moves(state).into_vec();
        if evasions.is_empty() {
            return mated_in(ply);
        }
        if qdepth >= info.quiescence_depth {
            return state.evaluate();
        }
        info.orderer.order(state, &mut evasions, None, usize::from(ply));
        return search_quiet_extension(state, &evasions, -INFINITY, qdepth, alpha, beta, ply, info);
    }

    let stand_pat = state.evaluate();
    if stand_pat >= beta || qdepth >= info.quiescence_depth {
        return stand_pat;
    }
    alpha = alpha.max(stand_pat);

    let mut captures = generate_captures(state).into_vec();
    // Captures that lose material cannot beat standing pat.
    captures.retain(|mv| mv.promotion.is_some() || static_exchange(state, mv) >= 0);
    order_captures(state, &mut captures);

    search_quiet_extension(state, &captures, stand_pat, qdepth, alpha, beta, ply, info)
}

#[allow(clippy::too_many_arguments)]
fn search_quiet_extension(
    state: &GameState,
    moves: &[Move],
    floor: i32,
    qdepth: u8,
    mut alpha: i32,
    beta: i32,
    ply: u8,
    info: &mut SearchInfo,
) -> i32 {
    let mut best = floor;
    for &mv in moves {
        let child = state.apply_move(mv);
        let score = -quiescence(&child, qdepth + 1, -beta, -alpha, ply + 1, info);

        if info.stopped {
            return best;
        }

        best = best.max(score);
        alpha = alpha.max(score);
        if alpha >= beta {
            break;
        }
    }
    best
}

/// Scores every legal move and returns the best `count`, highest first.
///
/// Moves are re-scored at increasing depth up to `depth`; a depth that runs
/// out of budget part way is discarded, so every score comes from the same
/// completed depth. One table and one deadline serve all root moves.
pub fn get_top_moves(
    state: &GameState,
    count: usize,
    depth: u8,
    max_time_ms: Option<u64>,
    tt_size_mb: usize,
) -> Vec<RankedMove> {
    let moves = generate_legal_moves(state);
    if moves.is_empty() || count == 0 {
        return Vec::new();
    }

    let mut limits = SearchLimits::depth(depth.max(1));
    limits.move_time = max_time_ms.map(Duration::from_millis);
    let mut info = SearchInfo::new(limits, tt_size_mb);

    // Depth 0: static score after each move.
    let mut ranked: Vec<RankedMove> = moves
        .iter()
        .map(|&mv| RankedMove {
            mv,
            score: -state.apply_move(mv).evaluate(),
            nodes: 1,
        })
        .collect();
    sort_ranked(&mut ranked);

    'deepening: for current in 1..=depth.max(1) {
        let mut iteration = Vec::with_capacity(ranked.len());
        for entry in &ranked {
            let before = info.nodes;
            let child = state.apply_move(entry.mv);
            let (score, _) = alpha_beta(&child, current - 1, -INFINITY, INFINITY, 1, &mut info);
            if info.stopped {
                break 'deepening;
            }
            iteration.push(RankedMove {
                mv: entry.mv,
                score: -score,
                nodes: info.nodes - before,
            });
        }
        sort_ranked(&mut iteration);
        ranked = iteration;
        debug!(depth = current, nodes = info.nodes, "top moves iteration complete");
    }

    ranked.truncate(count);
    ranked
}

fn sort_ranked(moves: &mut [RankedMove]) {
    moves.sort_by(|a, b| b.score.cmp(&a.score));
}

/// Searches the position and lists the tactics on the board, independent
/// of any difficulty setting.
pub fn analyze_position(
    state: &GameState,
    limits: SearchLimits,
    tt_size_mb: usize,
    callback: Option<InfoCallback>,
) -> Analysis {
    let mut info = SearchInfo::new(limits, tt_size_mb);
    info.info_callback = callback;
    let result = iterative_deepening(state, &mut info);

    Analysis {
        best_move: result.best_move,
        score: result.score,
        depth: result.depth,
        nodes: result.nodes,
        pv: result.pv,
        threats: find_threats(state),
        opportunities: find_opportunities(state),
    }
}

/// Captures the opponent could make against us that win material.
pub fn find_threats(state: &GameState) -> Vec<Tactic> {
    let opponent_view = state.with_turn(state.turn.opponent());
    let mut threats: Vec<Tactic> = legal_moves_for(&opponent_view, opponent_view.turn)
        .iter()
        .filter_map(|mv| winning_capture(&opponent_view, mv))
        .collect();
    threats.sort_by(|a, b| b.gain.cmp(&a.gain));
    threats
}

/// Our captures that win material, then our checking moves.
pub fn find_opportunities(state: &GameState) -> Vec<Tactic> {
    let mut opportunities = Vec::new();
    for mv in generate_legal_moves(state).iter() {
        if let Some(capture) = winning_capture(state, mv) {
            opportunities.push(capture);
        } else if state.apply_move(*mv).is_in_check() {
            opportunities.push(Tactic {
                mv: *mv,
                kind: TacticKind::Check,
                gain: static_exchange(state, mv).max(0),
            });
        }
    }
    opportunities.sort_by(|a, b| b.gain.cmp(&a.gain));
    opportunities
}

fn winning_capture(state: &GameState, mv: &Move) -> Option<Tactic> {
    if !is_capture(state, mv) {
        return None;
    }
    let gain = static_exchange(state, mv);
    let target = if mv.is_en_passant() {
        PieceType::Pawn
    } else {
        state.board.piece_at(mv.to)?.piece_type
    };
    (gain > 0).then_some(Tactic {
        mv: *mv,
        kind: TacticKind::Capture { target },
        gain,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess9_core::{game_status, BoardShape, Color, GameStatus, Piece, Square};
    use std::sync::{Arc, Mutex};

    fn sq(r: u8, c: u8) -> Square {
        Square::new(r, c).unwrap()
    }

    fn put(state: &mut GameState, r: u8, c: u8, pt: PieceType, color: Color) {
        state.board.set_piece(sq(r, c), Some(Piece::new(pt, color)));
    }

    fn with_kings(white: (u8, u8), black: (u8, u8)) -> GameState {
        let mut state = GameState::empty(BoardShape::Standard);
        put(&mut state, white.0, white.1, PieceType::King, Color::White);
        put(&mut state, black.0, black.1, PieceType::King, Color::Black);
        state
    }

    fn back_rank_mate() -> GameState {
        let mut state = with_kings((8, 4), (0, 4));
        for c in 3..6 {
            put(&mut state, 1, c, PieceType::Pawn, Color::Black);
        }
        put(&mut state, 5, 0, PieceType::Rook, Color::White);
        state
    }

    #[test]
    fn test_rook_takes_hanging_pawn() {
        let mut state = with_kings((8, 0), (0, 8));
        put(&mut state, 4, 4, PieceType::Rook, Color::White);
        put(&mut state, 4, 6, PieceType::Pawn, Color::Black);

        let result = search(&state, 2);
        assert_eq!(result.best_move, Some(Move::new(sq(4, 4), sq(4, 6))));
    }

    #[test]
    fn test_rook_takes_queen() {
        let mut state = with_kings((8, 1), (0, 7)).with_turn(Color::Black);
        put(&mut state, 4, 0, PieceType::Rook, Color::Black);
        put(&mut state, 4, 4, PieceType::Queen, Color::White);

        let result = search(&state, 1);
        assert_eq!(result.best_move, Some(Move::new(sq(4, 0), sq(4, 4))));
    }

    #[test]
    fn test_avoids_defended_pawn() {
        let mut state = with_kings((8, 0), (0, 8));
        put(&mut state, 4, 4, PieceType::Knight, Color::White);
        put(&mut state, 2, 3, PieceType::Pawn, Color::Black);
        put(&mut state, 0, 1, PieceType::Bishop, Color::Black);

        let result = search(&state, 1);
        assert_ne!(result.best_move, Some(Move::new(sq(4, 4), sq(2, 3))));
        assert!(result.best_move.is_some());

        // A pawn diagonally in front of the knight is out of its reach anyway.
        let mut state = with_kings((8, 0), (0, 8));
        put(&mut state, 4, 4, PieceType::Knight, Color::White);
        put(&mut state, 3, 3, PieceType::Pawn, Color::Black);
        put(&mut state, 1, 1, PieceType::Bishop, Color::Black);
        let result = search(&state, 1);
        assert_ne!(result.best_move, Some(Move::new(sq(4, 4), sq(3, 3))));
    }

    #[test]
    fn test_finds_mate_in_one() {
        let state = back_rank_mate();
        let result = search(&state, 1);

        assert_eq!(result.best_move, Some(Move::new(sq(5, 0), sq(0, 0))));
        assert_eq!(result.score, MATE_SCORE - 1);
    }

    #[test]
    fn test_prefers_mate_over_stalemate() {
        let mut state = with_kings((2, 2), (0, 0));
        put(&mut state, 4, 1, PieceType::Queen, Color::White);

        let result = search(&state, 3);
        let best = result.best_move.unwrap();
        assert_eq!(game_status(&state.apply_move(best)), GameStatus::Checkmate);
    }

    #[test]
    fn test_mate_in_two() {
        // One rook takes away the second row, the other mates on the first.
        let mut state = with_kings((8, 8), (0, 4));
        put(&mut state, 6, 0, PieceType::Rook, Color::White);
        put(&mut state, 7, 1, PieceType::Rook, Color::White);

        let result = search(&state, 3);
        assert!(is_mate_score(result.score), "score {}", result.score);
        assert_eq!(result.score, MATE_SCORE - 3);
    }

    #[test]
    fn test_search_leaves_state_untouched() {
        let state = GameState::from_layout(chess9_core::positions::COMPOUND_MIDDLEGAME).unwrap();
        let before = state.clone();
        let _ = search(&state, 2);
        let _ = get_top_moves(&state, 3, 1, None, 1);
        assert_eq!(state, before);
    }

    #[test]
    fn test_search_through_special_moves_leaves_state_untouched() {
        let mut castling = with_kings((8, 4), (0, 4));
        put(&mut castling, 8, 0, PieceType::Rook, Color::White);
        put(&mut castling, 8, 8, PieceType::Rook, Color::White);

        let mut promotion = with_kings((8, 4), (0, 8));
        put(&mut promotion, 1, 0, PieceType::Pawn, Color::White);

        let mut en_passant = with_kings((8, 4), (0, 4));
        put(&mut en_passant, 3, 3, PieceType::Pawn, Color::White);
        put(&mut en_passant, 1, 4, PieceType::Pawn, Color::Black);
        en_passant.turn = Color::Black;
        let en_passant = en_passant.apply_move(Move::new(sq(1, 4), sq(3, 4)));

        for state in [castling, promotion, en_passant] {
            let before = state.clone();
            let result = search(&state, 3);
            assert!(result.best_move.is_some());
            let _ = get_top_moves(&state, 5, 2, None, 1);
            assert_eq!(state, before);
        }
    }

    #[test]
    fn test_no_moves_is_not_an_error() {
        let mut mated = back_rank_mate();
        mated = mated.apply_move(Move::new(sq(5, 0), sq(0, 0)));
        let result = search(&mated, 3);
        assert_eq!(result.best_move, None);
        assert_eq!(result.score, -MATE_SCORE);

        let mut stalemate = with_kings((2, 2), (0, 0)).with_turn(Color::Black);
        put(&mut stalemate, 2, 1, PieceType::Queen, Color::White);
        let result = search(&stalemate, 3);
        assert_eq!(result.best_move, None);
        assert_eq!(result.score, 0);
    }

    #[test]
    fn test_node_budget_keeps_completed_depth() {
        let state = GameState::new();
        let result = search_with_limits(&state, SearchLimits::depth(20).with_nodes(3_000));

        assert!(result.stopped);
        assert!(result.best_move.is_some());
        assert!(result.depth >= 1 && result.depth < 20);
    }

    #[test]
    fn test_progress_reported_per_iteration() {
        let depths = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&depths);
        let callback: InfoCallback = Box::new(move |progress| {
            sink.lock().unwrap().push(progress.depth);
        });

        let state = GameState::with_shape(BoardShape::Cross);
        let result = search_with_callback(&state, SearchLimits::depth(3), 1, callback);

        assert_eq!(result.depth, 3);
        assert_eq!(*depths.lock().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_quiescence_never_below_stand_pat() {
        let mut state = with_kings((8, 0), (0, 8));
        put(&mut state, 4, 4, PieceType::Knight, Color::White);
        put(&mut state, 2, 3, PieceType::Pawn, Color::Black);
        put(&mut state, 0, 1, PieceType::Bishop, Color::Black);

        let mut info = SearchInfo::new(SearchLimits::depth(1), 1);
        let score = quiescence(&state, 0, -INFINITY, INFINITY, 0, &mut info);
        assert!(score >= state.evaluate());
    }

    #[test]
    fn test_quiescence_sees_recapture() {
        let mut state = with_kings((8, 0), (0, 8));
        put(&mut state, 2, 3, PieceType::Knight, Color::White);
        put(&mut state, 0, 1, PieceType::Bishop, Color::Black);
        let state = state.with_turn(Color::Black);

        let mut info = SearchInfo::new(SearchLimits::depth(1), 1);
        let score = quiescence(&state, 0, -INFINITY, INFINITY, 0, &mut info);
        // Black wins the knight.
        assert!(score > state.evaluate() + 200);
    }

    #[test]
    fn test_top_moves_sorted_and_bounded() {
        let mut state = with_kings((8, 0), (0, 8));
        put(&mut state, 4, 4, PieceType::Rook, Color::White);
        put(&mut state, 4, 6, PieceType::Pawn, Color::Black);

        let top = get_top_moves(&state, 5, 2, None, 1);
        assert_eq!(top.len(), 5);
        assert!(top.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(top[0].mv, Move::new(sq(4, 4), sq(4, 6)));

        let all = generate_legal_moves(&state).len();
        assert_eq!(get_top_moves(&state, 1000, 1, None, 1).len(), all);
        assert!(get_top_moves(&state, 0, 1, None, 1).is_empty());
    }

    #[test]
    fn test_analysis_reports_threats_and_opportunities() {
        let mut state = with_kings((8, 0), (0, 8));
        put(&mut state, 4, 4, PieceType::Rook, Color::White);
        put(&mut state, 4, 6, PieceType::Pawn, Color::Black);
        put(&mut state, 6, 2, PieceType::Knight, Color::White);
        put(&mut state, 2, 2, PieceType::Rook, Color::Black);

        let analysis = analyze_position(&state, SearchLimits::depth(2), 1, None);
        assert!(analysis.best_move.is_some());

        // The black rook can take our undefended knight.
        assert!(analysis
            .threats
            .iter()
            .any(|t| t.mv == Move::new(sq(2, 2), sq(6, 2))));
        // We can take the pawn and give check along the back rank.
        assert!(analysis.opportunities.iter().any(|t| t.mv == Move::new(sq(4, 4), sq(4, 6))
            && t.kind == TacticKind::Capture { target: PieceType::Pawn }));
        assert!(analysis
            .opportunities
            .iter()
            .any(|t| t.kind == TacticKind::Check));
    }
}
