use tracing_subscriber::{EnvFilter, FmtSubscriber};

const LOG_ENV: &str = "RAMPLOAD_LOG";

/// Install the global subscriber on stderr so stdout stays free for the
/// summary.
pub fn init_logging(verbose: bool, no_color: bool) {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter(verbose))
        .with_ansi(!no_color)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set global default subscriber: {}", err);
    }
}

/// `RAMPLOAD_LOG` wins over `RUST_LOG`; an unparsable directive falls back to
/// the default level.
fn env_filter(verbose: bool) -> EnvFilter {
    let directive = std::env::var(LOG_ENV)
        .or_else(|_| std::env::var("RUST_LOG"))
        .ok();
    directive
        .and_then(|value| EnvFilter::try_new(value).ok())
        .unwrap_or_else(|| EnvFilter::new(default_level(verbose)))
}

const fn default_level(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "info" }
}
