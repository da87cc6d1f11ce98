use thiserror::Error;

/// Errors raised by core lookups that take untrusted input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("unknown board shape: {0}")]
    UnknownShape(String),

    #[error("unknown piece code: '{0}'")]
    UnknownPiece(char),

    #[error("no {0} king on the board")]
    MissingKing(crate::types::Color),

    #[error("illegal move: {0}")]
    IllegalMove(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
