mod app;
mod config;
mod http;
mod metrics;
mod setup;
mod threshold;
mod validation;

pub use app::{AppError, AppResult};
pub use config::ConfigError;
pub use http::{HttpError, TransportError, TransportErrorKind};
pub use metrics::MetricsError;
pub use setup::SetupError;
pub use threshold::ThresholdError;
pub use validation::ValidationError;
