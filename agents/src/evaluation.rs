use chess9_core::pieces::KNIGHT_OFFSETS;
use chess9_core::{Board, Color, GameState, PieceType, Square, BOARD_SIZE};

/// Bonus credited to the side to move.
pub const TEMPO_BONUS: i32 = 10;

const BISHOP_PAIR_BONUS: i32 = 50;
const DOUBLED_PAWN_PENALTY: i32 = 15;
const ISOLATED_PAWN_PENALTY: i32 = 20;
const LINKED_PAWN_BONUS: i32 = 10;
const KNIGHT_MOBILITY_BONUS: i32 = 4;
const MOP_UP_MARGIN: i32 = 200;
const MAX_PHASE: i32 = 32;

/// Anything that can be scored from the point of view of the side to move.
pub trait Evaluatable {
    fn evaluate(&self) -> i32;
}

impl Evaluatable for GameState {
    fn evaluate(&self) -> i32 {
        evaluate(self)
    }
}

/// Evaluates a position from the perspective of the side to move.
/// Returns a score in centipawns where positive values favor the side to move.
pub fn evaluate(state: &GameState) -> i32 {
    evaluate_for(state, state.turn)
}

/// Evaluates a position from the perspective of `color`, whoever is to move.
pub fn evaluate_for(state: &GameState, color: Color) -> i32 {
    let score = evaluate_absolute(state);
    match color {
        Color::White => score,
        Color::Black => -score,
    }
}

/// Evaluates a position from White's perspective.
/// Positive scores favor White, negative favor Black.
pub fn evaluate_absolute(state: &GameState) -> i32 {
    let tempo = match state.turn {
        Color::White => TEMPO_BONUS,
        Color::Black => -TEMPO_BONUS,
    };
    static_score(state) + tempo
}

/// Middlegame and endgame halves of a score, blended by game phase.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Score {
    mg: i32,
    eg: i32,
}

impl Score {
    fn add(&mut self, mg: i32, eg: i32) {
        self.mg += mg;
        self.eg += eg;
    }
}

/// Everything one side contributes to the evaluation.
#[derive(Debug, Default)]
struct SideSummary {
    score: Score,
    /// Material without the king
    material: i32,
    phase: i32,
    king: Option<Square>,
}

/// White-minus-Black score without the tempo term.
fn static_score(state: &GameState) -> i32 {
    let white = summarize(&state.board, Color::White);
    let black = summarize(&state.board, Color::Black);

    let phase = (white.phase + black.phase).min(MAX_PHASE);
    let mg = white.score.mg - black.score.mg;
    let mut eg = white.score.eg - black.score.eg;

    // Endgame weight above 0.4.
    if phase * 10 < MAX_PHASE * 6 {
        if let (Some(white_king), Some(black_king)) = (white.king, black.king) {
            if white.material > black.material + MOP_UP_MARGIN {
                eg += mop_up(white_king, black_king);
            } else if black.material > white.material + MOP_UP_MARGIN {
                eg -= mop_up(black_king, white_king);
            }
        }
    }

    (mg * phase + eg * (MAX_PHASE - phase)) / MAX_PHASE
}

fn summarize(board: &Board, color: Color) -> SideSummary {
    let mut summary = SideSummary::default();
    let mut pawn_files = [0u8; BOARD_SIZE as usize];
    let mut bishops = 0;

    for (square, piece) in board.pieces(color) {
        let piece_type = piece.piece_type;
        let value = match piece_type {
            PieceType::King => 0,
            other => other.value(),
        };
        let (mg_pst, eg_pst) = piece_square_value(piece_type, square, color);

        summary.material += value;
        summary.phase += phase_value(piece_type);
        summary.score.add(value + mg_pst, value + eg_pst);

        match piece_type {
            PieceType::Pawn => pawn_files[square.col() as usize] += 1,
            PieceType::Bishop => bishops += 1,
            PieceType::Knight => {
                let mobility = knight_mobility(board, square, color) * KNIGHT_MOBILITY_BONUS;
                summary.score.add(mobility, mobility);
            }
            PieceType::King => summary.king = Some(square),
            _ => {}
        }
    }

    if bishops >= 2 {
        summary.score.add(BISHOP_PAIR_BONUS, BISHOP_PAIR_BONUS);
    }

    let penalty = pawn_file_penalty(&pawn_files);
    summary.score.add(-penalty, -penalty);

    for (square, piece) in board.pieces(color) {
        if piece.piece_type != PieceType::Pawn {
            continue;
        }
        let supported = is_supported(board, square, color);
        if is_passed(board, square, color) {
            let progress = i32::from(color.home_row().abs_diff(square.row()));
            let mut bonus = progress * progress * 5;
            if supported {
                bonus = (bonus * 13 + 5) / 10;
            }
            summary.score.add(bonus, bonus * 2);
        } else if supported {
            summary.score.add(LINKED_PAWN_BONUS, LINKED_PAWN_BONUS);
        }
    }

    summary
}

fn phase_value(piece_type: PieceType) -> i32 {
    match piece_type {
        PieceType::Knight | PieceType::Bishop => 1,
        PieceType::Rook | PieceType::Nightrider => 2,
        PieceType::Archbishop | PieceType::Chancellor => 3,
        PieceType::Queen | PieceType::Angel => 4,
        PieceType::Pawn | PieceType::King => 0,
    }
}

/// Penalty for doubled and isolated pawns, given pawn counts per file.
fn pawn_file_penalty(files: &[u8; BOARD_SIZE as usize]) -> i32 {
    let mut penalty = 0;
    for (col, &count) in files.iter().enumerate() {
        if count == 0 {
            continue;
        }
        penalty += i32::from(count - 1) * DOUBLED_PAWN_PENALTY;

        let left = col.checked_sub(1).map_or(0, |c| files[c]);
        let right = files.get(col + 1).copied().unwrap_or(0);
        if left == 0 && right == 0 {
            penalty += ISOLATED_PAWN_PENALTY;
        }
    }
    penalty
}

/// No enemy pawn ahead on the same or an adjacent file.
fn is_passed(board: &Board, square: Square, color: Color) -> bool {
    let dir = color.pawn_direction();
    (-1..=1).all(|dc| {
        (1..BOARD_SIZE as i8)
            .map_while(|step| square.offset(dir * step, dc))
            .all(|ahead| {
                board.piece_at(ahead).map_or(true, |p| {
                    p.piece_type != PieceType::Pawn || p.color == color
                })
            })
    })
}

/// A friendly pawn stands diagonally behind.
fn is_supported(board: &Board, square: Square, color: Color) -> bool {
    let behind = -color.pawn_direction();
    [-1, 1].into_iter().any(|dc| {
        square
            .offset(behind, dc)
            .and_then(|sq| board.piece_at(sq))
            .is_some_and(|p| p.piece_type == PieceType::Pawn && p.color == color)
    })
}

/// Squares a knight could step to: on the board, not blocked, not our own piece.
fn knight_mobility(board: &Board, square: Square, color: Color) -> i32 {
    KNIGHT_OFFSETS
        .iter()
        .filter_map(|&(dr, dc)| square.offset(dr, dc))
        .filter(|&target| !board.is_blocked(target) && !board.is_color(target, color))
        .count() as i32
}

/// Drives the losing king to the edge and brings the winning king closer.
fn mop_up(winning_king: Square, losing_king: Square) -> i32 {
    let distance = i32::from(winning_king.row().abs_diff(losing_king.row()))
        + i32::from(winning_king.col().abs_diff(losing_king.col()));
    i32::from(losing_king.center_distance()) * 10 + (14 - distance) * 4
}

/// Middlegame and endgame table values for a piece.
fn piece_square_value(piece_type: PieceType, square: Square, color: Color) -> (i32, i32) {
    // Tables are written from White's side; Black reads them upside down.
    let row = match color {
        Color::White => square.row(),
        Color::Black => square.mirror().row(),
    };
    let (row, col) = (row as usize, square.col() as usize);

    let table = match piece_type {
        PieceType::Pawn => &PAWN_TABLE,
        PieceType::Knight | PieceType::Archbishop => &KNIGHT_TABLE,
        PieceType::Bishop => &BISHOP_TABLE,
        PieceType::Rook => &ROOK_TABLE,
        PieceType::Queen | PieceType::Chancellor | PieceType::Angel | PieceType::Nightrider => {
            &QUEEN_TABLE
        }
        PieceType::King => return (KING_MG_TABLE[row][col], KING_EG_TABLE[row][col]),
    };
    (table[row][col], table[row][col])
}

// Piece-square tables, row 0 = Black's back rank, White moves upward.
// Values are in centipawns.

type Table = [[i32; 9]; 9];

const PAWN_TABLE: Table = [
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [50, 50, 50, 50, 50, 50, 50, 50, 50],
    [10, 10, 20, 30, 30, 30, 20, 10, 10],
    [5, 5, 10, 25, 25, 25, 10, 5, 5],
    [0, 0, 0, 20, 25, 20, 0, 0, 0],
    [5, -5, -10, 0, 10, 0, -10, -5, 5],
    [5, 10, 10, -20, -20, -20, 10, 10, 5],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
];

const KNIGHT_TABLE: Table = [
    [-50, -40, -30, -30, -30, -30, -30, -40, -50],
    [-40, -20, 0, 0, 0, 0, 0, -20, -40],
    [-30, 0, 10, 15, 15, 15, 10, 0, -30],
    [-30, 5, 15, 20, 20, 20, 15, 5, -30],
    [-30, 0, 15, 20, 25, 20, 15, 0, -30],
    [-30, 5, 15, 20, 20, 20, 15, 5, -30],
    [-30, 0, 10, 15, 15, 15, 10, 0, -30],
    [-40, -20, 0, 5, 5, 5, 0, -20, -40],
    [-50, -40, -30, -30, -30, -30, -30, -40, -50],
];

const BISHOP_TABLE: Table = [
    [-20, -10, -10, -10, -10, -10, -10, -10, -20],
    [-10, 0, 0, 0, 0, 0, 0, 0, -10],
    [-10, 0, 5, 10, 10, 10, 5, 0, -10],
    [-10, 5, 5, 10, 10, 10, 5, 5, -10],
    [-10, 0, 10, 10, 15, 10, 10, 0, -10],
    [-10, 10, 10, 10, 10, 10, 10, 10, -10],
    [-10, 5, 0, 0, 0, 0, 0, 5, -10],
    [-10, 0, 0, 0, 0, 0, 0, 0, -10],
    [-20, -10, -10, -10, -10, -10, -10, -10, -20],
];

const ROOK_TABLE: Table = [
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [5, 10, 10, 10, 10, 10, 10, 10, 5],
    [-5, 0, 0, 0, 0, 0, 0, 0, -5],
    [-5, 0, 0, 0, 0, 0, 0, 0, -5],
    [-5, 0, 0, 0, 0, 0, 0, 0, -5],
    [-5, 0, 0, 0, 0, 0, 0, 0, -5],
    [-5, 0, 0, 0, 0, 0, 0, 0, -5],
    [0, 0, 0, 5, 5, 5, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
];

const QUEEN_TABLE: Table = [
    [-20, -10, -10, -5, -5, -5, -10, -10, -20],
    [-10, 0, 0, 0, 0, 0, 0, 0, -10],
    [-10, 0, 5, 5, 5, 5, 5, 0, -10],
    [-5, 0, 5, 5, 5, 5, 5, 0, -5],
    [0, 0, 5, 5, 5, 5, 5, 0, 0],
    [-5, 0, 5, 5, 5, 5, 5, 0, -5],
    [-10, 0, 5, 5, 5, 5, 5, 0, -10],
    [-10, 0, 0, 0, 0, 0, 0, 0, -10],
    [-20, -10, -10, -5, -5, -5, -10, -10, -20],
];

const KING_MG_TABLE: Table = [
    [-30, -40, -40, -50, -50, -50, -40, -40, -30],
    [-30, -40, -40, -50, -50, -50, -40, -40, -30],
    [-30, -40, -40, -50, -50, -50, -40, -40, -30],
    [-30, -40, -40, -50, -50, -50, -40, -40, -30],
    [-30, -40, -40, -50, -50, -50, -40, -40, -30],
    [-20, -30, -30, -40, -40, -40, -30, -30, -20],
    [20, 20, 0, 0, 0, 0, 0, 20, 20],
    [20, 30, 10, 0, 0, 0, 10, 30, 20],
    [20, 30, 10, 0, 0, 0, 10, 30, 20],
];

const KING_EG_TABLE: Table = [
    [-50, -40, -30, -20, -20, -20, -30, -40, -50],
    [-30, -20, -10, 0, 0, 0, -10, -20, -30],
    [-30, -10, 10, 20, 20, 20, 10, -10, -30],
    [-30, 0, 20, 30, 30, 30, 20, 0, -30],
    [-30, 0, 20, 30, 40, 30, 20, 0, -30],
    [-30, 0, 20, 30, 30, 30, 20, 0, -30],
    [-30, -10, 10, 20, 20, 20, 10, -10, -30],
    [-30, -20, -10, 0, 0, 0, -10, -20, -30],
    [-50, -40, -30, -20, -20, -20, -30, -40, -50],
];
