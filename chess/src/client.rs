//! Async client over a [`Worker`]: assigns correlation ids and hands each
//! response back to the caller that asked for it.

use crate::config::EngineConfig;
use crate::protocol::{MoveReport, Response, ResponseKind};
use crate::worker::{Worker, WorkerClosed, WorkerSender};
use chess9_core::BoardShape;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::debug;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Closed(#[from] WorkerClosed),

    #[error("request {id} timed out after {after:?}")]
    Timeout { id: u64, after: Duration },

    #[error("failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),
}

type Pending = Arc<Mutex<HashMap<String, oneshot::Sender<Response>>>>;

pub struct EngineClient {
    sender: WorkerSender,
    pending: Pending,
    progress: broadcast::Sender<Response>,
    next_id: AtomicU64,
    timeout: Duration,
}

fn id_key(id: &Value) -> String {
    id.to_string()
}

impl EngineClient {
    /// Spawns a worker and the task routing its responses.
    pub fn spawn(config: EngineConfig) -> Self {
        let timeout = config.request_timeout();
        let (sender, responses) = Worker::spawn(config);
        Self::attach(sender, responses, timeout)
    }

    pub fn attach(
        sender: WorkerSender,
        responses: mpsc::UnboundedReceiver<Response>,
        timeout: Duration,
    ) -> Self {
        let pending: Pending = Arc::default();
        let (progress, _) = broadcast::channel(64);
        tokio::spawn(route(responses, Arc::clone(&pending), progress.clone()));

        Self {
            sender,
            pending,
            progress,
            next_id: AtomicU64::new(1),
            timeout,
        }
    }

    /// Progress reports of every in-flight search.
    pub fn progress(&self) -> broadcast::Receiver<Response> {
        self.progress.subscribe()
    }

    /// Sends a `{type, id, data}` request and waits for its response.
    pub async fn request(&self, kind: &str, data: impl Serialize) -> Result<Response, ClientError> {
        let data = serde_json::to_value(data)?;
        self.round_trip(|id| json!({"type": kind, "id": id, "data": data}))
            .await
    }

    /// Sends a legacy `SEARCH` request with its data under `payload`.
    pub async fn legacy_search(&self, payload: impl Serialize) -> Result<Response, ClientError> {
        let payload = serde_json::to_value(payload)?;
        self.round_trip(|id| json!({"type": "SEARCH", "id": id, "payload": payload}))
            .await
    }

    /// Sends a request that gets no answer, such as `setBoardShape`.
    pub fn notify(&self, kind: &str, data: impl Serialize) -> Result<(), ClientError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let data = serde_json::to_value(data)?;
        self.sender.post(json!({"type": kind, "id": id, "data": data}))?;
        Ok(())
    }

    pub fn set_board_shape(&self, shape: BoardShape) -> Result<(), ClientError> {
        self.notify("setBoardShape", json!({ "shape": shape }))
    }

    pub fn load_book(&self, book: Value) -> Result<(), ClientError> {
        self.notify("loadBook", json!({ "book": book }))
    }

    /// `getBestMove`, decoded. None when the side to move has no legal move.
    pub async fn best_move(&self, data: impl Serialize) -> Result<Option<MoveReport>, ClientError> {
        let response = self.request("getBestMove", data).await?;
        Ok(serde_json::from_value(response.body().clone())?)
    }

    pub async fn evaluate(&self, data: impl Serialize) -> Result<i32, ClientError> {
        let response = self.request("evaluatePosition", data).await?;
        Ok(serde_json::from_value(response.body().clone())?)
    }

    async fn round_trip(&self, build: impl FnOnce(u64) -> Value) -> Result<Response, ClientError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let key = id_key(&json!(id));
        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(key.clone(), tx);

        if let Err(err) = self.sender.post(build(id)) {
            self.pending.lock().remove(&key);
            return Err(err.into());
        }

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(_)) => Err(ClientError::Closed(WorkerClosed)),
            Err(_) => {
                self.pending.lock().remove(&key);
                Err(ClientError::Timeout {
                    id,
                    after: self.timeout,
                })
            }
        }
    }
}

async fn route(
    mut responses: mpsc::UnboundedReceiver<Response>,
    pending: Pending,
    progress: broadcast::Sender<Response>,
) {
    while let Some(response) = responses.recv().await {
        if response.kind == ResponseKind::Progress {
            // Nobody listening is fine.
            let _ = progress.send(response);
            continue;
        }

        let waiter = pending.lock().remove(&id_key(&response.id));
        match waiter {
            Some(tx) => {
                let _ = tx.send(response);
            }
            None => debug!(id = %response.id, "response without a waiting request"),
        }
    }

    // Worker gone: dropping the senders wakes every waiter.
    pending.lock().clear();
}
