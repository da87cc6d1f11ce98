//! Background engine worker.
//!
//! The worker owns its settings (board shape, opening book, config) and reads
//! JSON messages from a channel. Each search runs on the blocking pool over its
//! own position snapshot and posts its response when done, so responses can
//! arrive in any order. Nothing is ever cancelled: a new request does not stop
//! an older one, callers drop stale answers by id.

use crate::config::EngineConfig;
use crate::engine::{self, EngineContext, ProgressSink};
use crate::protocol::{
    LoadBookRequest, ProgressReport, Request, RequestBody, Response, ResponseKind,
};
use chess9_agents::OpeningBook;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("engine worker has shut down")]
pub struct WorkerClosed;

/// Posting side of a worker. Cheap to clone.
#[derive(Debug, Clone)]
pub struct WorkerSender {
    inbox: mpsc::UnboundedSender<Value>,
}

impl WorkerSender {
    pub fn post(&self, message: Value) -> Result<(), WorkerClosed> {
        self.inbox.send(message).map_err(|_| WorkerClosed)
    }
}

pub struct Worker {
    ctx: EngineContext,
    outgoing: mpsc::UnboundedSender<Response>,
}

impl Worker {
    /// Starts a worker on the current tokio runtime.
    pub fn spawn(config: EngineConfig) -> (WorkerSender, mpsc::UnboundedReceiver<Response>) {
        let (inbox, messages) = mpsc::unbounded_channel();
        let (outgoing, responses) = mpsc::unbounded_channel();

        let worker = Worker {
            ctx: EngineContext::new(config),
            outgoing,
        };
        tokio::spawn(worker.run(messages));

        (WorkerSender { inbox }, responses)
    }

    async fn run(mut self, mut messages: mpsc::UnboundedReceiver<Value>) {
        while let Some(message) = messages.recv().await {
            self.handle(message);
        }
        debug!("worker inbox closed");
    }

    fn handle(&mut self, message: Value) {
        let request = match Request::from_value(message) {
            Ok(request) => request,
            Err(err) => {
                warn!(%err, "ignoring message");
                return;
            }
        };

        match request.body {
            RequestBody::LoadBook(data) => self.load_book(data),
            RequestBody::SetBoardShape(data) => {
                info!(shape = %data.shape, "board shape set");
                self.ctx.shape = data.shape;
            }
            body => self.dispatch(request.id, body),
        }
    }

    fn load_book(&mut self, data: LoadBookRequest) {
        let Some(value) = data.book else {
            warn!("loadBook without book data");
            return;
        };
        match OpeningBook::from_value(value) {
            Ok(book) => {
                info!(positions = book.len(), metadata = ?book.metadata, "opening book loaded");
                let book = book.with_move_limit(self.ctx.config.book_move_limit);
                self.ctx.book = Some(Arc::new(book));
            }
            Err(err) => warn!(%err, "rejected opening book"),
        }
    }

    fn dispatch(&self, id: Value, body: RequestBody) {
        let ctx = self.ctx.clone();
        let outgoing = self.outgoing.clone();

        tokio::task::spawn_blocking(move || {
            if let Some(response) = respond(&ctx, id, body, &outgoing) {
                if outgoing.send(response).is_err() {
                    debug!("response dropped, receiver gone");
                }
            }
        });
    }
}

fn progress_sink(id: Value, outgoing: mpsc::UnboundedSender<Response>) -> ProgressSink {
    Arc::new(move |report: ProgressReport| {
        let _ = outgoing.send(Response::new(ResponseKind::Progress, id.clone(), report));
    })
}

/// Runs one request to completion. None means nothing should be sent back.
fn respond(
    ctx: &EngineContext,
    id: Value,
    body: RequestBody,
    outgoing: &mpsc::UnboundedSender<Response>,
) -> Option<Response> {
    let progress = progress_sink(id.clone(), outgoing.clone());

    let response = match body {
        RequestBody::GetBestMove(request) => engine::best_move(ctx, &request, Some(progress))
            .map(|(report, _)| Response::new(ResponseKind::BestMove, id, report)),
        RequestBody::Search(request) => engine::search_summary(ctx, &request, None)
            .map(|summary| Response::new(ResponseKind::BestMove, id, summary)),
        RequestBody::GetTopMoves(request) => engine::top_moves(ctx, &request)
            .map(|moves| Response::new(ResponseKind::TopMoves, id, moves)),
        RequestBody::EvaluatePosition(request) => engine::evaluate(ctx, &request)
            .map(|score| Response::new(ResponseKind::PositionScore, id, score)),
        RequestBody::Analyze(request) => engine::analyze(ctx, &request, Some(progress))
            .map(|analysis| Response::new(ResponseKind::Analysis, id, analysis)),
        RequestBody::LegacySearch(request) => {
            let start = Instant::now();
            let response = match engine::legacy_search(ctx, &request) {
                Ok(result) => {
                    Response::legacy_result(id, result, start.elapsed().as_millis() as u64)
                }
                Err(err) => {
                    warn!(%err, "legacy search failed");
                    Response::legacy_error(id, err)
                }
            };
            return Some(response);
        }
        RequestBody::LoadBook(_) | RequestBody::SetBoardShape(_) => return None,
    };

    match response {
        Ok(response) => Some(response),
        Err(err) => {
            warn!(%err, "ignoring request with malformed data");
            None
        }
    }
}
