use async_trait::async_trait;
use tracing::info;
use url::Url;

/// What the teardown hook is told about the run it cleans up after.
#[derive(Debug, Clone)]
pub struct TeardownContext {
    pub base_url: Url,
    /// `false` when the health check failed and no load was generated.
    pub setup_completed: bool,
}

/// User-supplied lifecycle callbacks. Teardown runs exactly once per run,
/// including runs aborted during setup.
#[async_trait]
pub trait RunHooks: Send + Sync {
    async fn teardown(&self, context: &TeardownContext);
}

/// Default hooks: log completion and the tested URL.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHooks;

#[async_trait]
impl RunHooks for LoggingHooks {
    async fn teardown(&self, context: &TeardownContext) {
        if context.setup_completed {
            info!("Load test completed");
        } else {
            info!("Load test aborted during setup");
        }
        info!("Tested URL: {}", context.base_url);
    }
}
