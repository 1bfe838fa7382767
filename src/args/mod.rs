//! CLI argument types, parsing helpers and built-in defaults.
mod cli;
mod defaults;
pub(crate) mod parsers;
mod types;

#[cfg(test)]
mod tests;

pub use cli::RunArgs;
pub use defaults::{
    DEFAULT_BASE_URL, DEFAULT_ENDPOINTS, DEFAULT_HEALTH_PATH,
    DEFAULT_PROGRESS_INTERVAL, DEFAULT_REQUEST_TIMEOUT, DEFAULT_THRESHOLDS, default_endpoints,
    default_stages,
};
pub use types::OutputFormat;

pub(crate) use parsers::parse_header;
