use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FundmatrixError {
    #[error("row source error on {table}: {message}")]
    Source { table: String, message: String },

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("unknown time window: {0}")]
    UnknownWindow(String),

    #[error("unknown table: {0}")]
    UnknownTable(String),

    #[error("unknown function: {0}")]
    UnknownFunction(String),

    #[error("validation error: {0}")]
    Validation(String),
}

impl FundmatrixError {
    /// Whether a retry of the same request may succeed.
    pub fn is_timeout(&self) -> bool {
        matches!(self, FundmatrixError::Timeout(_))
    }
}

pub type Result<T> = std::result::Result<T, FundmatrixError>;
