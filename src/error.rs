use candy::CandyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashError {
    #[error(transparent)]
    Candy(#[from] CandyError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("wallet not ready: {0}")]
    NotReady(String),
}
