//! Configuration loading and resolution into a [`TestConfig`].
mod loader;
mod parse;
mod resolve;
pub mod types;

#[cfg(test)]
mod tests;

pub use loader::{DEFAULT_CONFIG_FILES, load_config, load_config_file};
pub use resolve::{TestConfig, parse_base_url, resolve_config};

pub(crate) use parse::parse_duration_value;
