use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Shape of the end-of-run summary printed to stdout.
#[derive(Debug, Clone, Copy, Default, ValueEnum, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
