//! Engine settings shared by the worker and the CLI.

use chess9_agents::book::DEFAULT_BOOK_MOVE_LIMIT;
use chess9_agents::{Difficulty, DEFAULT_TT_SIZE_MB};
use chess9_core::{BoardShape, PromotionPolicy};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

/// Defaults applied when a request leaves something out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub depth: u8,
    /// Per-search wall-clock budget; None leaves only the depth limit
    pub time_limit_ms: Option<u64>,
    pub tt_size_mb: usize,
    pub difficulty: Difficulty,
    pub book_move_limit: u16,
    pub request_timeout_ms: u64,
    pub promotion: PromotionPolicy,
    pub shape: BoardShape,
    pub top_moves: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            depth: 4,
            time_limit_ms: None,
            tt_size_mb: DEFAULT_TT_SIZE_MB,
            difficulty: Difficulty::Expert,
            book_move_limit: DEFAULT_BOOK_MOVE_LIMIT,
            request_timeout_ms: 5_000,
            promotion: PromotionPolicy::Auto,
            shape: BoardShape::Standard,
            top_moves: 5,
        }
    }
}

impl EngineConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
