use fundmatrix::FundmatrixError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScreenerError {
    #[error(transparent)]
    Fundmatrix(#[from] FundmatrixError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("token not found in snapshot: {0}")]
    TokenNotFound(String),

    #[error("page {page} out of range (1..={pages})")]
    PageOutOfRange { page: usize, pages: usize },
}
