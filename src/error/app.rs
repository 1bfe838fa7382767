use thiserror::Error;

use super::{ConfigError, HttpError, MetricsError, SetupError, ThresholdError, ValidationError};

/// Anything that stops a run from producing a report.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
    #[error("Join error: {source}")]
    Join {
        #[from]
        source: tokio::task::JoinError,
    },
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),
    #[error("Metrics error: {0}")]
    Metrics(#[from] MetricsError),
    #[error("Threshold error: {0}")]
    Threshold(#[from] ThresholdError),
    #[error("Setup error: {0}")]
    Setup(#[from] SetupError),
}

pub type AppResult<T> = Result<T, AppError>;
