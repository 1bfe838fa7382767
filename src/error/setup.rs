use thiserror::Error;

use super::{ConfigError, TransportError};

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Health check failed: {url} returned status {status}")]
    UnhealthyStatus { url: String, status: u16 },
    #[error("Invalid health check path '{path}': {source}")]
    InvalidHealthUrl {
        path: String,
        #[source]
        source: ConfigError,
    },
    #[error("Health check failed: {url}: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: TransportError,
    },
}
