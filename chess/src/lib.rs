//! Execution boundary of the 9x9 engine: the JSON message protocol, the
//! background worker that answers it and an async client on top.

pub mod client;
pub mod config;
pub mod engine;
pub mod protocol;
pub mod worker;

pub use client::{ClientError, EngineClient};
pub use config::{ConfigError, EngineConfig};
pub use engine::EngineContext;
pub use protocol::{
    BoardSnapshot, LegacySearchResult, MoveReport, ProtocolError, Request, RequestBody, Response,
    ResponseKind,
};
pub use worker::{Worker, WorkerClosed, WorkerSender};
