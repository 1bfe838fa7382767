//! Run lifecycle: health check, scheduled load, teardown and verdict.
mod hooks;
mod progress;
mod state;


use std::sync::Arc;
use std::time::Duration;

use reqwest::header::HeaderMap;
use tokio::time::Instant;
use tracing::{error, info, warn};
use url::Url;

use crate::clock::RunClock;
use crate::config::TestConfig;
use crate::error::{AppResult, SetupError};
use crate::http::{
    EndpointSet, RequestExecutor, TransportErrorCount, TransportTally, build_headers,
    resolve_endpoint,
};
use crate::metrics::{DEFAULT_SHARDS, MetricName, MetricsAggregator, MetricsSnapshot};
use crate::random::SeedSource;
use crate::scheduler::Scheduler;
use crate::shutdown::StopSignal;
use crate::thresholds::{ThresholdOutcome, all_passed, evaluate};
use crate::vu::{CheckCount, CheckTally, VuContext};

pub use hooks::{LoggingHooks, RunHooks, TeardownContext};
pub use state::{
    AbortReason, EXIT_INTERRUPTED, EXIT_PASSED, EXIT_SETUP_FAILED, EXIT_THRESHOLDS_FAILED,
    StateLog, TestState, Verdict,
};

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub base_url: Url,
    pub seed: u64,
    pub history: Vec<TestState>,
    pub snapshot: MetricsSnapshot,
    pub thresholds: Vec<ThresholdOutcome>,
    pub checks: Vec<CheckCount>,
    /// Requests without a complete response, by failure kind.
    pub transport_errors: Vec<TransportErrorCount>,
    /// VUs force-stopped after their grace period.
    pub anomalies: u64,
    pub peak_vus: u64,
    pub duration: Duration,
}

impl RunReport {
    /// Verdict of the final `Completed` state.
    #[must_use]
    pub fn verdict(&self) -> Option<&Verdict> {
        match self.history.last() {
            Some(TestState::Completed(verdict)) => Some(verdict),
            Some(
                TestState::Idle | TestState::Setup | TestState::Running | TestState::TearingDown,
            )
            | None => None,
        }
    }

    /// Process exit status; a run that never completed counts as failed.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        self.verdict()
            .map_or(EXIT_THRESHOLDS_FAILED, Verdict::exit_code)
    }

    #[must_use]
    pub fn entered(&self, state: &TestState) -> bool {
        self.history
            .iter()
            .any(|seen| std::mem::discriminant(seen) == std::mem::discriminant(state))
    }
}

/// Drives one run from `Idle` to `Completed`.
pub struct Orchestrator {
    config: Arc<TestConfig>,
    executor: Arc<dyn RequestExecutor>,
    hooks: Arc<dyn RunHooks>,
    abort: Arc<StopSignal>,
}

impl Orchestrator {
    #[must_use]
    pub fn new(config: Arc<TestConfig>, executor: Arc<dyn RequestExecutor>) -> Self {
        Self {
            config,
            executor,
            hooks: Arc::new(LoggingHooks),
            abort: Arc::new(StopSignal::new()),
        }
    }

    #[must_use]
    pub fn with_hooks(mut self, hooks: Arc<dyn RunHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Raising this signal interrupts the run: no new VUs, all VUs stop and
    /// drain, verdict `Aborted(Interrupted)`.
    #[must_use]
    pub fn abort_handle(&self) -> Arc<StopSignal> {
        Arc::clone(&self.abort)
    }

    /// Execute the run.
    ///
    /// Health-check failures and threshold failures are reported through
    /// the returned [`RunReport`], not as errors.
    ///
    /// # Errors
    ///
    /// Returns an error when the run cannot be prepared: invalid headers or
    /// endpoints, or metrics storage that cannot be allocated.
    pub async fn run(&self) -> AppResult<RunReport> {
        let config = Arc::clone(&self.config);
        let started = Instant::now();
        let mut states = StateLog::new();
        let seeds = config.seed.map_or_else(SeedSource::from_entropy, SeedSource::new);

        let headers = Arc::new(build_headers(&config.headers)?);
        let endpoints = Arc::new(EndpointSet::new(&config.base_url, &config.endpoints)?);
        let metrics = Arc::new(MetricsAggregator::new(DEFAULT_SHARDS)?);
        let checks = Arc::new(CheckTally::default());
        let transport_errors = Arc::new(TransportTally::default());

        states.transition(TestState::Setup);
        info!("Starting load test...");
        info!("Target URL: {}", config.base_url);

        if let Err(err) = self.health_check(&headers).await {
            error!("Setup failed: {}", err);
            self.teardown(false).await;
            states.transition(TestState::Completed(Verdict::Aborted {
                reason: AbortReason::SetupFailed(err.to_string()),
            }));
            return Ok(RunReport {
                base_url: config.base_url.clone(),
                seed: seeds.seed(),
                history: states.into_history(),
                snapshot: metrics.snapshot(),
                thresholds: Vec::new(),
                checks: checks.counts(),
                transport_errors: Vec::new(),
                anomalies: 0,
                peak_vus: 0,
                duration: started.elapsed(),
            });
        }

        states.transition(TestState::Running);
        info!(
            "Running {} stage(s) over {:?} against {} endpoint(s), seed {}",
            config.profile.stages().len(),
            config.profile.total_duration(),
            endpoints.len(),
            seeds.seed()
        );

        let context = Arc::new(VuContext {
            executor: Arc::clone(&self.executor),
            endpoints,
            headers,
            metrics: Arc::clone(&metrics),
            checks: Arc::clone(&checks),
            transport_errors: Arc::clone(&transport_errors),
            think_time: config.think_time,
            seeds,
            abort: self.abort.token(),
        });
        let scheduler = Scheduler::new(
            Arc::new(config.profile.clone()),
            context,
            config.tick,
            config.grace,
        );

        let progress_done = StopSignal::new();
        let progress = progress::spawn_progress(
            Arc::clone(&metrics),
            Arc::new(config.thresholds.clone()),
            config.progress_interval,
            progress_done.token(),
        );
        let outcome = scheduler
            .run(RunClock::start(), self.abort.token())
            .await;
        progress_done.stop();
        if let Err(err) = progress.await {
            warn!("Progress reporter failed: {}", err);
        }
        if outcome.anomalies > 0 {
            warn!(
                "{} VU(s) had to be aborted after the grace period",
                outcome.anomalies
            );
        }

        states.transition(TestState::TearingDown);
        self.teardown(true).await;

        let snapshot = metrics.snapshot();
        if !outcome.interrupted && metrics.count(MetricName::HttpReqs) == 0 {
            warn!("No requests were sent; thresholds are evaluated over empty metrics.");
        }
        let thresholds = evaluate(&config.thresholds, &snapshot);
        let verdict = if outcome.interrupted {
            Verdict::Aborted {
                reason: AbortReason::Interrupted,
            }
        } else if all_passed(&thresholds) {
            Verdict::Passed
        } else {
            Verdict::Failed {
                failed: thresholds
                    .iter()
                    .filter(|result| !result.passed)
                    .map(|result| format!("{}: {}", result.metric, result.source))
                    .collect(),
            }
        };
        info!("Verdict: {}", verdict);
        states.transition(TestState::Completed(verdict));

        Ok(RunReport {
            base_url: config.base_url.clone(),
            seed: seeds.seed(),
            history: states.into_history(),
            snapshot,
            thresholds,
            checks: checks.counts(),
            transport_errors: transport_errors.counts(),
            anomalies: outcome.anomalies,
            peak_vus: outcome.peak_vus,
            duration: started.elapsed(),
        })
    }

    /// One GET against the health path; anything but 200 fails setup.
    async fn health_check(&self, headers: &HeaderMap) -> Result<(), SetupError> {
        let url = resolve_endpoint(&self.config.base_url, &self.config.health_path).map_err(
            |err| SetupError::InvalidHealthUrl {
                path: self.config.health_path.clone(),
                source: err,
            },
        )?;
        match self.executor.get(&url, headers).await {
            Ok(result) if result.status == 200 => Ok(()),
            Ok(result) => Err(SetupError::UnhealthyStatus {
                url: url.to_string(),
                status: result.status,
            }),
            Err(err) => Err(SetupError::Unreachable {
                url: url.to_string(),
                source: err,
            }),
        }
    }

    async fn teardown(&self, setup_completed: bool) {
        let context = TeardownContext {
            base_url: self.config.base_url.clone(),
            setup_completed,
        };
        self.hooks.teardown(&context).await;
    }
}
