use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::clock::RunClock;
use crate::metrics::{MetricName, MetricsAggregator};
use crate::shutdown::StopToken;
use crate::thresholds::{Threshold, evaluate};

/// Periodically log live metrics and threshold status until `done`.
pub(super) fn spawn_progress(
    metrics: Arc<MetricsAggregator>,
    thresholds: Arc<Vec<Threshold>>,
    period: Duration,
    mut done: StopToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = RunClock::ticker(period);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => log_progress(&metrics, &thresholds),
                () = done.stopped() => break,
            }
        }
    })
}

fn log_progress(metrics: &MetricsAggregator, thresholds: &[Threshold]) {
    let snapshot = metrics.snapshot();
    let vus = snapshot.gauge(MetricName::Vus).map_or(0, |gauge| gauge.value);
    let reqs = snapshot
        .counter(MetricName::HttpReqs)
        .map_or(0, |counter| counter.count);
    let p95 = snapshot
        .trend(MetricName::HttpReqDuration)
        .map_or(0.0, |trend| trend.percentile(95.0));
    let failed = snapshot
        .rate(MetricName::HttpReqFailed)
        .map_or(0.0, |rate| rate.rate());
    let errors = snapshot
        .rate(MetricName::Errors)
        .map_or(0.0, |rate| rate.rate());

    let outcomes = evaluate(thresholds, &snapshot);
    let passing = outcomes.iter().filter(|outcome| outcome.passed).count();
    info!(
        "[{:>4}s] vus={} reqs={} p95={:.1}ms failed={:.2}% errors={:.2}% thresholds={}/{}",
        snapshot.elapsed.as_secs(),
        vus,
        reqs,
        p95,
        failed * 100.0,
        errors * 100.0,
        passing,
        outcomes.len()
    );
    for outcome in outcomes.iter().filter(|outcome| !outcome.passed) {
        debug!(
            "Threshold {}: {} currently failing (observed {:.4})",
            outcome.metric, outcome.source, outcome.observed
        );
    }
}
