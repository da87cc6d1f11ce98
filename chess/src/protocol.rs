//! JSON message protocol spoken by the engine worker.
//!
//! Requests are `{ "type", "id", "data" }` envelopes. The older
//! `{ "type": "SEARCH", "id", "payload" }` form is still accepted and is
//! answered in the same legacy shape.

use chess9_agents::{Analysis, Difficulty, RankedMove, Tactic};
use chess9_core::{
    move_notation, Board, BoardShape, Color, CoreError, GameState, LastMove, Move, Piece,
    PromotionPolicy, SpecialMove, Square, BOARD_SIZE,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown message type '{0}'")]
    UnknownType(String),

    #[error("'{0}' request without data")]
    MissingData(&'static str),

    #[error("malformed '{kind}' data: {source}")]
    InvalidData {
        kind: &'static str,
        source: serde_json::Error,
    },

    #[error("board must be {size}x{size}", size = BOARD_SIZE)]
    BoardSize,

    #[error("piece on blocked square {0}")]
    BlockedSquare(Square),

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Envelope as it arrives, before the data is interpreted.
#[derive(Debug, Clone, Deserialize)]
pub struct RawMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub payload: Option<Value>,
}

/// Board as sent by the caller: 9 rows of 9 `piece | null`, plus the context
/// move generation needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSnapshot {
    pub board: Vec<Vec<Option<Piece>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_move: Option<LastMove>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub move_number: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<BoardShape>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<PromotionPolicy>,
}

impl BoardSnapshot {
    pub fn from_state(state: &GameState) -> Self {
        let board = (0..BOARD_SIZE)
            .map(|r| {
                (0..BOARD_SIZE)
                    .map(|c| Square::new(r, c).and_then(|sq| state.board.piece_at(sq)))
                    .collect()
            })
            .collect();
        Self {
            board,
            last_move: state.last_move,
            move_number: Some(state.fullmove_number),
            shape: Some(state.shape()),
            promotion: Some(state.promotion),
        }
    }

    /// Builds the position to search, `turn` to move. Shape and promotion
    /// policy fall back to the worker's settings when the snapshot omits them.
    pub fn to_state(
        &self,
        turn: Color,
        shape: BoardShape,
        promotion: PromotionPolicy,
    ) -> Result<GameState, ProtocolError> {
        let shape = self.shape.unwrap_or(shape);
        if self.board.len() != BOARD_SIZE as usize
            || self.board.iter().any(|row| row.len() != BOARD_SIZE as usize)
        {
            return Err(ProtocolError::BoardSize);
        }

        let mut board = Board::empty(shape);
        for (r, row) in self.board.iter().enumerate() {
            for (c, piece) in row.iter().enumerate() {
                let Some(piece) = piece else { continue };
                let Some(square) = Square::new(r as u8, c as u8) else {
                    return Err(ProtocolError::BoardSize);
                };
                if board.is_blocked(square) {
                    return Err(ProtocolError::BlockedSquare(square));
                }
                board.set_piece(square, Some(*piece));
            }
        }

        for color in Color::ALL {
            if board.king_square(color).is_none() {
                return Err(CoreError::MissingKing(color).into());
            }
        }

        let mut state = GameState::from_board(board, turn);
        state.last_move = self.last_move;
        state.fullmove_number = self.move_number.unwrap_or(1).max(1);
        state.promotion = self.promotion.unwrap_or(promotion);
        Ok(state)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BestMoveRequest {
    #[serde(flatten)]
    pub position: BoardSnapshot,
    pub color: Color,
    #[serde(default)]
    pub depth: Option<u8>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub elo: Option<u32>,
    #[serde(default, alias = "timeLimit")]
    pub time_limit_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopMovesRequest {
    #[serde(flatten)]
    pub position: BoardSnapshot,
    pub color: Color,
    #[serde(default = "default_top_moves")]
    pub count: usize,
    #[serde(default)]
    pub depth: Option<u8>,
    #[serde(default)]
    pub max_time_ms: Option<u64>,
}

fn default_top_moves() -> usize {
    3
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateRequest {
    #[serde(flatten)]
    pub position: BoardSnapshot,
    pub for_color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(flatten)]
    pub position: BoardSnapshot,
    pub color: Color,
    #[serde(default)]
    pub depth: Option<u8>,
    #[serde(default)]
    pub time_limit_ms: Option<u64>,
    #[serde(default)]
    pub top_moves_count: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadBookRequest {
    #[serde(default)]
    pub book: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeRequest {
    pub shape: BoardShape,
}

/// Payload of the legacy `SEARCH` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacySearchRequest {
    #[serde(flatten)]
    pub position: BoardSnapshot,
    pub turn_color: Color,
    #[serde(default)]
    pub depth: Option<u8>,
    #[serde(default)]
    pub elo: Option<u32>,
    /// Accepted for compatibility; playing style is not modelled.
    #[serde(default)]
    pub personality: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    GetBestMove(BestMoveRequest),
    /// Same as `getBestMove`, answered with the search summary shape.
    Search(BestMoveRequest),
    GetTopMoves(TopMovesRequest),
    EvaluatePosition(EvaluateRequest),
    Analyze(AnalyzeRequest),
    LoadBook(LoadBookRequest),
    SetBoardShape(ShapeRequest),
    LegacySearch(LegacySearchRequest),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub id: Value,
    pub body: RequestBody,
}

impl Request {
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        Self::from_value(serde_json::from_str(text)?)
    }

    pub fn from_value(value: Value) -> Result<Self, ProtocolError> {
        let raw: RawMessage = serde_json::from_value(value)?;
        Self::from_raw(raw)
    }

    pub fn from_raw(raw: RawMessage) -> Result<Self, ProtocolError> {
        let RawMessage {
            kind,
            id,
            data,
            payload,
        } = raw;

        let body = match kind.as_str() {
            "getBestMove" => RequestBody::GetBestMove(decode("getBestMove", data)?),
            "search" => RequestBody::Search(decode("search", data)?),
            "getTopMoves" => RequestBody::GetTopMoves(decode("getTopMoves", data)?),
            "evaluatePosition" => RequestBody::EvaluatePosition(decode("evaluatePosition", data)?),
            "analyze" => RequestBody::Analyze(decode("analyze", data)?),
            "loadBook" => RequestBody::LoadBook(decode("loadBook", data)?),
            "setBoardShape" => RequestBody::SetBoardShape(decode("setBoardShape", data)?),
            "SEARCH" => RequestBody::LegacySearch(decode("SEARCH", payload.or(data))?),
            _ => return Err(ProtocolError::UnknownType(kind)),
        };
        Ok(Request { id, body })
    }
}

fn decode<T: serde::de::DeserializeOwned>(
    kind: &'static str,
    data: Option<Value>,
) -> Result<T, ProtocolError> {
    match data {
        None | Some(Value::Null) => Err(ProtocolError::MissingData(kind)),
        Some(value) => {
            serde_json::from_value(value).map_err(|source| ProtocolError::InvalidData { kind, source })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseKind {
    #[serde(rename = "bestMove")]
    BestMove,
    #[serde(rename = "topMoves")]
    TopMoves,
    #[serde(rename = "positionScore")]
    PositionScore,
    #[serde(rename = "analysis")]
    Analysis,
    #[serde(rename = "progress")]
    Progress,
    #[serde(rename = "SEARCH_RESULT")]
    SearchResult,
    #[serde(rename = "SEARCH_ERROR")]
    SearchError,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMeta {
    pub duration_ms: u64,
}

/// Outgoing message. Modern responses fill `data`; legacy ones use
/// `payload`, `meta` and `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(rename = "type")]
    pub kind: ResponseKind,
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    pub fn new(kind: ResponseKind, id: Value, data: impl Serialize) -> Self {
        Self {
            kind,
            id,
            data: Some(serde_json::to_value(data).unwrap_or(Value::Null)),
            payload: None,
            meta: None,
            error: None,
        }
    }

    pub fn legacy_result(id: Value, payload: impl Serialize, duration_ms: u64) -> Self {
        Self {
            kind: ResponseKind::SearchResult,
            id,
            data: None,
            payload: Some(serde_json::to_value(payload).unwrap_or(Value::Null)),
            meta: Some(ResponseMeta { duration_ms }),
            error: None,
        }
    }

    pub fn legacy_error(id: Value, error: impl ToString) -> Self {
        Self {
            kind: ResponseKind::SearchError,
            id,
            data: None,
            payload: None,
            meta: None,
            error: Some(error.to_string()),
        }
    }

    /// Body of the response, whichever field carries it.
    pub fn body(&self) -> &Value {
        self.data
            .as_ref()
            .or(self.payload.as_ref())
            .unwrap_or(&Value::Null)
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// A move as reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveReport {
    pub from: Square,
    pub to: Square,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<chess9_core::PieceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_move: Option<SpecialMove>,
    pub notation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<u64>,
}

impl MoveReport {
    pub fn new(mv: Move) -> Self {
        Self {
            from: mv.from,
            to: mv.to,
            promotion: mv.promotion,
            special_move: mv.special_move,
            notation: move_notation(&mv),
            score: None,
            nodes: None,
        }
    }

    pub fn scored(mv: Move, score: i32, nodes: u64) -> Self {
        Self {
            score: Some(score),
            nodes: Some(nodes),
            ..Self::new(mv)
        }
    }
}

impl From<&RankedMove> for MoveReport {
    fn from(ranked: &RankedMove) -> Self {
        MoveReport::scored(ranked.mv, ranked.score, ranked.nodes)
    }
}

/// Payload of a `SEARCH_RESULT`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacySearchResult {
    #[serde(rename = "move")]
    pub mv: Option<MoveReport>,
    pub score: i32,
    pub nodes: u64,
}

/// Data of a `search` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSummary {
    pub best_move: Option<MoveReport>,
    pub score: i32,
    pub depth: u8,
    pub nodes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    pub depth: u8,
    pub score: i32,
    pub nodes: u64,
    pub time_ms: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pv: Vec<String>,
}

/// Data of an `analysis` response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub best_move: Option<MoveReport>,
    pub score: i32,
    pub depth: u8,
    pub nodes: u64,
    pub pv: Vec<String>,
    pub threats: Vec<Tactic>,
    pub opportunities: Vec<Tactic>,
    pub top_moves: Vec<MoveReport>,
}

impl AnalysisReport {
    pub fn new(analysis: Analysis, top_moves: &[RankedMove]) -> Self {
        Self {
            best_move: analysis
                .best_move
                .map(|mv| MoveReport::scored(mv, analysis.score, analysis.nodes)),
            score: analysis.score,
            depth: analysis.depth,
            nodes: analysis.nodes,
            pv: analysis.pv.iter().map(move_notation).collect(),
            threats: analysis.threats,
            opportunities: analysis.opportunities,
            top_moves: top_moves.iter().map(MoveReport::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess9_core::PieceType;
    use serde_json::json;

    fn start_board() -> Value {
        serde_json::to_value(BoardSnapshot::from_state(&GameState::new())).unwrap()
    }

    #[test]
    fn test_parse_get_best_move() {
        let mut data = start_board();
        data["color"] = json!("white");
        data["depth"] = json!(3);
        data["difficulty"] = json!("easy");
        let request = Request::from_value(json!({"type": "getBestMove", "id": 7, "data": data})).unwrap();

        assert_eq!(request.id, json!(7));
        let RequestBody::GetBestMove(body) = request.body else {
            panic!("wrong body");
        };
        assert_eq!(body.depth, Some(3));
        assert_eq!(body.difficulty, Some(Difficulty::Easy));

        let state = body
            .position
            .to_state(body.color, BoardShape::Standard, PromotionPolicy::Auto)
            .unwrap();
        assert_eq!(state.board, GameState::new().board);
    }

    #[test]
    fn test_legacy_search_uses_payload() {
        let mut payload = start_board();
        payload["turnColor"] = json!("black");
        payload["depth"] = json!(2);
        payload["personality"] = json!("aggressive");
        let request =
            Request::from_value(json!({"type": "SEARCH", "id": "a1", "payload": payload})).unwrap();

        let RequestBody::LegacySearch(body) = request.body else {
            panic!("wrong body");
        };
        assert_eq!(body.turn_color, Color::Black);
        assert_eq!(body.depth, Some(2));
    }

    #[test]
    fn test_unknown_and_missing() {
        assert!(matches!(
            Request::parse(r#"{"type": "fly", "id": 1, "data": {}}"#),
            Err(ProtocolError::UnknownType(t)) if t == "fly"
        ));
        assert!(matches!(
            Request::parse(r#"{"type": "loadBook", "id": 1}"#),
            Err(ProtocolError::MissingData("loadBook"))
        ));
        assert!(matches!(
            Request::parse(r#"{"type": "setBoardShape", "id": 1, "data": {"shape": "hexagon"}}"#),
            Err(ProtocolError::InvalidData { kind: "setBoardShape", .. })
        ));
        assert!(matches!(Request::parse("not json"), Err(ProtocolError::Json(_))));
    }

    #[test]
    fn test_snapshot_validation() {
        let mut snapshot = BoardSnapshot::from_state(&GameState::new());
        snapshot.board.pop();
        assert!(matches!(
            snapshot.to_state(Color::White, BoardShape::Standard, PromotionPolicy::Auto),
            Err(ProtocolError::BoardSize)
        ));

        // A piece in a cross corner.
        let mut snapshot = BoardSnapshot::from_state(&GameState::with_shape(BoardShape::Cross));
        snapshot.board[0][0] = Some(Piece::new(PieceType::Rook, Color::Black));
        assert!(matches!(
            snapshot.to_state(Color::White, BoardShape::Standard, PromotionPolicy::Auto),
            Err(ProtocolError::BlockedSquare(_))
        ));

        let mut snapshot = BoardSnapshot::from_state(&GameState::new());
        snapshot.board[8][4] = None;
        assert!(matches!(
            snapshot.to_state(Color::White, BoardShape::Standard, PromotionPolicy::Auto),
            Err(ProtocolError::Core(CoreError::MissingKing(Color::White)))
        ));
    }

    #[test]
    fn test_response_shapes() {
        let mv = Move::new(Square::new(6, 4).unwrap(), Square::new(4, 4).unwrap());
        let modern = Response::new(ResponseKind::BestMove, json!(3), MoveReport::scored(mv, 25, 100));
        let value: Value = serde_json::from_str(&modern.to_json().unwrap()).unwrap();
        assert_eq!(value["type"], "bestMove");
        assert_eq!(value["data"]["notation"], "e3-e5");
        assert_eq!(value["data"]["from"], json!({"r": 6, "c": 4}));
        assert!(value.get("payload").is_none());

        let none = Response::new(ResponseKind::BestMove, json!(4), Option::<MoveReport>::None);
        assert!(none.to_json().unwrap().contains("\"data\":null"));

        let legacy = Response::legacy_result(json!("x"), MoveReport::new(mv), 12);
        let value: Value = serde_json::from_str(&legacy.to_json().unwrap()).unwrap();
        assert_eq!(value["type"], "SEARCH_RESULT");
        assert_eq!(value["meta"]["durationMs"], 12);
        assert!(value.get("data").is_none());
    }
}
