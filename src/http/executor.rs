use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use tracing::debug;
use url::Url;

use crate::error::TransportError;
use crate::metrics::{MetricName, MetricSample, MetricsAggregator};

/// Completed response as seen by checks and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestResult {
    pub status: u16,
    pub duration: Duration,
    pub body_bytes: u64,
}

impl RequestResult {
    /// Statuses 200..=399 count as successful requests.
    #[must_use]
    pub const fn is_expected_status(&self) -> bool {
        self.status >= 200 && self.status < 400
    }
}

/// Issues one GET per call. Implementations must not retry.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    /// Perform a GET against `url` with `headers`.
    ///
    /// # Errors
    ///
    /// Returns a classified [`TransportError`] when no complete response was
    /// received (connect failure, timeout, DNS, TLS, body read).
    async fn get(&self, url: &Url, headers: &HeaderMap) -> Result<RequestResult, TransportError>;
}

/// Execute one request and record its latency, outcome and count.
///
/// Samples are recorded for every call, including transport failures, whose
/// duration is the time spent until the failure surfaced.
///
/// # Errors
///
/// Passes through the executor's [`TransportError`].
pub async fn execute_and_record(
    executor: &dyn RequestExecutor,
    url: &Url,
    headers: &HeaderMap,
    metrics: &MetricsAggregator,
    shard: usize,
) -> Result<RequestResult, TransportError> {
    let outcome = executor.get(url, headers).await;
    let (duration, failed) = match &outcome {
        Ok(result) => (result.duration, !result.is_expected_status()),
        Err(err) => {
            debug!("Request to {} failed: {}", url, err);
            (err.duration, true)
        }
    };
    metrics.record(
        shard,
        MetricSample::duration(MetricName::HttpReqDuration, duration),
    );
    metrics.record(shard, MetricSample::flag(MetricName::HttpReqFailed, failed));
    metrics.record(shard, MetricSample::count(MetricName::HttpReqs, 1));
    outcome
}
