//! Error types for workload generation and simulation.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, WorkloadError>;

#[derive(Debug, Error)]
pub enum WorkloadError {
    #[error(transparent)]
    Core(#[from] corelib::Error),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("unknown algorithm '{0}', expected one of ch, wch, hrw, dhash")]
    UnknownAlgorithm(String),

    #[error("zipf weights rejected: {0}")]
    Weights(#[from] rand::distributions::WeightedError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("simulation worker panicked")]
    WorkerPanicked,
}

impl WorkloadError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        WorkloadError::InvalidParameter(msg.into())
    }
}
