use chess9::protocol::{BoardSnapshot, ResponseKind};
use chess9::{ClientError, EngineClient, EngineConfig, Response, Worker};
use chess9_core::{BoardShape, Color, GameState, Piece, PieceType, Square};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

fn sq(r: u8, c: u8) -> Square {
    Square::new(r, c).unwrap()
}

fn config() -> EngineConfig {
    EngineConfig {
        tt_size_mb: 1,
        ..EngineConfig::default()
    }
}

fn position(state: &GameState) -> Value {
    serde_json::to_value(BoardSnapshot::from_state(state)).unwrap()
}

fn rook_and_pawn() -> GameState {
    let mut state = GameState::empty(BoardShape::Standard);
    for (r, c, pt, color) in [
        (8, 0, PieceType::King, Color::White),
        (0, 8, PieceType::King, Color::Black),
        (4, 4, PieceType::Rook, Color::White),
        (4, 6, PieceType::Pawn, Color::Black),
    ] {
        state.board.set_piece(sq(r, c), Some(Piece::new(pt, color)));
    }
    state
}

fn with(mut data: Value, fields: Value) -> Value {
    if let (Some(target), Some(extra)) = (data.as_object_mut(), fields.as_object()) {
        for (key, value) in extra {
            target.insert(key.clone(), value.clone());
        }
    }
    data
}

async fn next(responses: &mut UnboundedReceiver<Response>) -> Response {
    loop {
        let response = tokio::time::timeout(Duration::from_secs(30), responses.recv())
            .await
            .expect("worker answered in time")
            .expect("worker still running");
        if response.kind != ResponseKind::Progress {
            return response;
        }
    }
}

#[tokio::test]
async fn test_unknown_type_gets_no_response() {
    let (sender, mut responses) = Worker::spawn(config());
    sender.post(json!({"type": "teleport", "id": 1, "data": {}})).unwrap();
    sender.post(json!({"no": "type"})).unwrap();
    sender.post(json!({"type": "loadBook", "id": 2, "data": {}})).unwrap();

    let data = with(position(&GameState::new()), json!({"forColor": "white"}));
    sender
        .post(json!({"type": "evaluatePosition", "id": 3, "data": data}))
        .unwrap();

    let response = next(&mut responses).await;
    assert_eq!(response.id, json!(3));
    assert_eq!(response.kind, ResponseKind::PositionScore);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_responses_arrive_out_of_order() {
    let (sender, mut responses) = Worker::spawn(config());

    let slow = with(
        position(&GameState::new()),
        json!({"color": "white", "count": 50, "depth": 2}),
    );
    sender
        .post(json!({"type": "getTopMoves", "id": "slow", "data": slow}))
        .unwrap();
    let fast = with(position(&GameState::new()), json!({"forColor": "white"}));
    sender
        .post(json!({"type": "evaluatePosition", "id": "fast", "data": fast}))
        .unwrap();

    let first = next(&mut responses).await;
    let second = next(&mut responses).await;
    assert_eq!(first.id, json!("fast"));
    assert_eq!(second.id, json!("slow"));
    assert_eq!(second.kind, ResponseKind::TopMoves);

    let scores: Vec<i64> = second
        .body()
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["score"].as_i64().unwrap())
        .collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn test_legacy_search_answers_in_legacy_shape() {
    let (sender, mut responses) = Worker::spawn(config());
    let payload = with(position(&rook_and_pawn()), json!({"turnColor": "white", "depth": 2}));
    sender
        .post(json!({"type": "SEARCH", "id": "old", "payload": payload}))
        .unwrap();

    let response = next(&mut responses).await;
    assert_eq!(response.kind, ResponseKind::SearchResult);
    assert_eq!(response.id, json!("old"));
    assert!(response.data.is_none());
    assert!(response.meta.is_some());

    let payload = response.payload.unwrap();
    assert_eq!(payload["move"]["from"], json!({"r": 4, "c": 4}));
    assert_eq!(payload["move"]["to"], json!({"r": 4, "c": 6}));
    assert!(payload["score"].as_i64().unwrap() > 0);
    assert!(payload["nodes"].as_u64().unwrap() > 0);

    let line = serde_json::to_value(&response_line(&sender, &mut responses).await).unwrap();
    assert_eq!(line["type"], "SEARCH_RESULT");
    assert!(line["meta"]["durationMs"].is_u64());
}

/// Legacy request with its board under `data`, as some callers send it.
async fn response_line(
    sender: &chess9::WorkerSender,
    responses: &mut UnboundedReceiver<Response>,
) -> Response {
    let data = with(position(&rook_and_pawn()), json!({"turnColor": "white", "depth": 1}));
    sender
        .post(json!({"type": "SEARCH", "id": "older", "data": data}))
        .unwrap();
    next(responses).await
}

#[tokio::test]
async fn test_search_alias_reports_summary() {
    let (sender, mut responses) = Worker::spawn(config());
    let data = with(position(&rook_and_pawn()), json!({"color": "white", "depth": 2}));
    sender
        .post(json!({"type": "search", "id": 9, "data": data}))
        .unwrap();

    let response = next(&mut responses).await;
    assert_eq!(response.kind, ResponseKind::BestMove);
    let body = response.body();
    assert_eq!(body["bestMove"]["notation"], "e5-g5");
    assert_eq!(body["depth"], 2);
    assert!(body["nodes"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn test_progress_precedes_best_move() {
    let (sender, mut responses) = Worker::spawn(config());
    let data = with(position(&rook_and_pawn()), json!({"color": "white", "depth": 3}));
    sender
        .post(json!({"type": "getBestMove", "id": 5, "data": data}))
        .unwrap();

    let mut depths = Vec::new();
    loop {
        let response = tokio::time::timeout(Duration::from_secs(30), responses.recv())
            .await
            .unwrap()
            .unwrap();
        if response.kind == ResponseKind::Progress {
            assert_eq!(response.id, json!(5));
            depths.push(response.body()["depth"].as_u64().unwrap());
        } else {
            assert_eq!(response.kind, ResponseKind::BestMove);
            break;
        }
    }
    assert_eq!(depths, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_terminal_position_reports_no_move() {
    let (sender, mut responses) = Worker::spawn(config());
    let mut state = GameState::empty(BoardShape::Standard);
    for (r, c, pt, color) in [
        (0, 0, PieceType::King, Color::Black),
        (2, 2, PieceType::King, Color::White),
        (2, 1, PieceType::Queen, Color::White),
    ] {
        state.board.set_piece(sq(r, c), Some(Piece::new(pt, color)));
    }
    let data = with(position(&state), json!({"color": "black", "depth": 2}));
    sender
        .post(json!({"type": "getBestMove", "id": 1, "data": data}))
        .unwrap();

    let response = next(&mut responses).await;
    assert_eq!(response.kind, ResponseKind::BestMove);
    assert_eq!(response.body(), &Value::Null);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_client_matches_concurrent_requests() {
    let client = EngineClient::spawn(config());
    let best = with(position(&rook_and_pawn()), json!({"color": "white", "depth": 2}));
    let eval = with(position(&GameState::new()), json!({"forColor": "black"}));

    let (best_move, score) = tokio::join!(client.best_move(best), client.evaluate(eval));
    let best_move = best_move.unwrap().unwrap();
    assert_eq!((best_move.from, best_move.to), (sq(4, 4), sq(4, 6)));
    assert_eq!(score.unwrap(), chess9_agents::TEMPO_BONUS);
}

#[tokio::test]
async fn test_client_shape_and_timeout() {
    let client = EngineClient::spawn(EngineConfig {
        request_timeout_ms: 1,
        ..config()
    });
    client.set_board_shape(BoardShape::Cross).unwrap();

    let data = with(
        position(&GameState::with_shape(BoardShape::Cross)),
        json!({"color": "white", "count": 5, "depth": 3}),
    );
    let err = client.request("getTopMoves", data).await.unwrap_err();
    assert!(matches!(err, ClientError::Timeout { .. }));
}
