use std::fmt;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Invalid header name '{name}': {source}")]
    InvalidHeaderName {
        name: String,
        #[source]
        source: reqwest::header::InvalidHeaderName,
    },
    #[error("Invalid header value for '{name}': {source}")]
    InvalidHeaderValue {
        name: String,
        #[source]
        source: reqwest::header::InvalidHeaderValue,
    },
    #[error("Failed to build HTTP client: {source}")]
    BuildClientFailed {
        #[source]
        source: reqwest::Error,
    },
}

/// Broad classification of a failed request. Tallied per run and listed in
/// the summary; never changes control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TransportErrorKind {
    Timeout,
    Connect,
    Dns,
    Tls,
    Body,
    Other,
}

impl TransportErrorKind {
    pub const ALL: [TransportErrorKind; 6] = [
        TransportErrorKind::Timeout,
        TransportErrorKind::Connect,
        TransportErrorKind::Dns,
        TransportErrorKind::Tls,
        TransportErrorKind::Body,
        TransportErrorKind::Other,
    ];

    pub(crate) const fn index(self) -> usize {
        match self {
            TransportErrorKind::Timeout => 0,
            TransportErrorKind::Connect => 1,
            TransportErrorKind::Dns => 2,
            TransportErrorKind::Tls => 3,
            TransportErrorKind::Body => 4,
            TransportErrorKind::Other => 5,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            TransportErrorKind::Timeout => "timeout",
            TransportErrorKind::Connect => "connect",
            TransportErrorKind::Dns => "dns",
            TransportErrorKind::Tls => "tls",
            TransportErrorKind::Body => "body",
            TransportErrorKind::Other => "other",
        }
    }
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request that never produced a complete response.
///
/// Transport errors are folded into metrics by the VU runner; they never
/// abort a run on their own.
#[derive(Debug, Clone, Error)]
#[error("{kind} error after {duration:?}: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
    pub duration: Duration,
}

impl TransportError {
    #[must_use]
    pub const fn new(kind: TransportErrorKind, message: String, duration: Duration) -> Self {
        Self {
            kind,
            message,
            duration,
        }
    }
}
