use std::sync::Arc;

use reqwest::header::HeaderMap;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::http::{EndpointSet, RequestExecutor, TransportTally, execute_and_record};
use crate::metrics::{MetricName, MetricSample, MetricsAggregator};
use crate::random::SeedSource;
use crate::shutdown::StopToken;

use super::checks::{CheckTally, run_checks};
use super::think::ThinkTime;

/// Read-only state shared by every VU of a run.
pub struct VuContext {
    pub executor: Arc<dyn RequestExecutor>,
    pub endpoints: Arc<EndpointSet>,
    pub headers: Arc<HeaderMap>,
    pub metrics: Arc<MetricsAggregator>,
    pub checks: Arc<CheckTally>,
    pub transport_errors: Arc<TransportTally>,
    pub think_time: ThinkTime,
    pub seeds: SeedSource,
    /// Run-wide abort, observed alongside each VU's own stop token.
    pub abort: StopToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VuExit {
    pub id: u64,
    pub iterations: u64,
}

pub struct VuRunner {
    id: u64,
    context: Arc<VuContext>,
    stop: StopToken,
}

impl VuRunner {
    #[must_use]
    pub const fn new(id: u64, context: Arc<VuContext>, stop: StopToken) -> Self {
        Self { id, context, stop }
    }

    /// Iterate until stopped. The stop signal is checked before every
    /// request and interrupts think time, never an in-flight request.
    pub async fn run(mut self) -> VuExit {
        let context = Arc::clone(&self.context);
        let mut rng = context.seeds.vu_rng(self.id);
        let mut abort = context.abort.clone();
        let shard = usize::try_from(self.id).unwrap_or(usize::MAX);
        let mut iterations: u64 = 0;

        loop {
            if self.stop.is_stopped() || abort.is_stopped() {
                break;
            }
            let Some(url) = context.endpoints.pick(&mut rng) else {
                warn!(vu = self.id, "Endpoint set is empty; stopping VU.");
                break;
            };

            let outcome = execute_and_record(
                context.executor.as_ref(),
                url,
                &context.headers,
                &context.metrics,
                shard,
            )
            .await;
            if let Err(err) = &outcome {
                context.transport_errors.record(err);
            }
            let results = run_checks(&outcome);
            context.checks.record(&results);
            for (_, passed) in results.iter() {
                context
                    .metrics
                    .record(shard, MetricSample::flag(MetricName::Checks, passed));
            }
            context.metrics.record(
                shard,
                MetricSample::flag(MetricName::Errors, !results.all_passed()),
            );
            context
                .metrics
                .record(shard, MetricSample::count(MetricName::Iterations, 1));
            iterations = iterations.saturating_add(1);

            let pause = context.think_time.sample(&mut rng);
            tokio::select! {
                () = sleep(pause) => {}
                () = self.stop.stopped() => break,
                () = abort.stopped() => break,
            }
        }

        debug!(vu = self.id, iterations, "VU stopped");
        VuExit {
            id: self.id,
            iterations,
        }
    }
}
