use std::path::PathBuf;

use thiserror::Error;

use super::{ThresholdError, ValidationError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config '{path}': {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML config '{path}': {source}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to parse JSON config '{path}': {source}")]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Unsupported config extension '{ext}'. Use .toml or .json.")]
    UnsupportedExtension { ext: String },
    #[error("Config file must have .toml or .json extension.")]
    MissingExtension,
    #[error("Invalid base URL '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Base URL '{url}' must use http or https.")]
    UnsupportedScheme { url: String },
    #[error("Invalid endpoint '{path}': {source}")]
    InvalidEndpoint {
        path: String,
        #[source]
        source: url::ParseError,
    },
    #[error("At least one endpoint is required.")]
    NoEndpoints,
    #[error("At least one stage is required.")]
    NoStages,
    #[error("Stage {index} duration must be > 0.")]
    StageDurationZero { index: usize },
    #[error("Invalid duration for '{field}': {source}")]
    InvalidDuration {
        field: String,
        #[source]
        source: ValidationError,
    },
    #[error("Think time minimum {min_ms}ms exceeds maximum {max_ms}ms.")]
    ThinkTimeInverted { min_ms: u128, max_ms: u128 },
    #[error("Invalid header: {source}")]
    InvalidHeader {
        #[source]
        source: ValidationError,
    },
    #[error("Invalid threshold for '{metric}': {source}")]
    InvalidThreshold {
        metric: String,
        #[source]
        source: ThresholdError,
    },
}
