use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::task::JoinHandle;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, warn};

use crate::clock::deadline_after;
use crate::metrics::{MetricName, MetricSample};
use crate::shutdown::StopSignal;
use crate::vu::{VuContext, VuExit, VuRunner};

struct VuHandle {
    id: u64,
    stop: StopSignal,
    task: JoinHandle<VuExit>,
}

struct Draining {
    handle: VuHandle,
    deadline: Instant,
}

/// Result of one reconcile pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reconcile {
    pub spawned: u64,
    pub stopped: u64,
}

/// Live VU population owned by the scheduler.
///
/// VUs are kept in spawn order, so shrinking always stops the newest ones.
/// Stopped VUs finish their current iteration; any still running when its
/// grace deadline passes is aborted and counted as an anomaly.
pub struct VuPool {
    context: Arc<VuContext>,
    grace: Duration,
    next_id: u64,
    active: Vec<VuHandle>,
    draining: Vec<Draining>,
    anomalies: u64,
    peak: u64,
}

impl VuPool {
    #[must_use]
    pub const fn new(context: Arc<VuContext>, grace: Duration) -> Self {
        Self {
            context,
            grace,
            next_id: 1,
            active: Vec::new(),
            draining: Vec::new(),
            anomalies: 0,
            peak: 0,
        }
    }

    /// Spawn or stop VUs until the active count equals `target`.
    pub fn reconcile(&mut self, target: u64) -> Reconcile {
        let target = usize::try_from(target).unwrap_or(usize::MAX);
        let mut outcome = Reconcile::default();

        while self.active.len() < target {
            self.spawn();
            outcome.spawned = outcome.spawned.saturating_add(1);
        }
        while self.active.len() > target {
            let Some(handle) = self.active.pop() else {
                break;
            };
            self.begin_stop(handle);
            outcome.stopped = outcome.stopped.saturating_add(1);
        }

        if outcome.spawned > 0 || outcome.stopped > 0 {
            debug!(
                active = self.active.len(),
                spawned = outcome.spawned,
                stopped = outcome.stopped,
                "Reconciled VU pool"
            );
        }
        self.publish_gauges();
        outcome
    }

    /// Collect VUs that have exited and abort stopping VUs past their grace
    /// deadline. Never waits.
    pub fn reap(&mut self) {
        let now = Instant::now();
        let mut still_draining = Vec::with_capacity(self.draining.len());
        for mut entry in self.draining.drain(..) {
            match (&mut entry.handle.task).now_or_never() {
                Some(joined) => log_exit(entry.handle.id, joined),
                None if entry.deadline <= now => {
                    entry.handle.task.abort();
                    self.anomalies = self.anomalies.saturating_add(1);
                    warn!(
                        vu = entry.handle.id,
                        "VU did not stop within {:?} grace period; aborted", self.grace
                    );
                }
                None => still_draining.push(entry),
            }
        }
        self.draining = still_draining;

        // Active VUs only exit on their own after a global abort.
        let mut still_active = Vec::with_capacity(self.active.len());
        for mut handle in self.active.drain(..) {
            match (&mut handle.task).now_or_never() {
                Some(joined) => log_exit(handle.id, joined),
                None => still_active.push(handle),
            }
        }
        self.active = still_active;
        self.publish_gauges();
    }

    /// Signal every active VU to stop.
    pub fn stop_all(&mut self) {
        let handles: Vec<VuHandle> = self.active.drain(..).collect();
        for handle in handles {
            self.begin_stop(handle);
        }
        self.publish_gauges();
    }

    /// Wait for every stopping VU, aborting those that outlive their grace
    /// deadline.
    pub async fn drain(&mut self) {
        let entries: Vec<Draining> = self.draining.drain(..).collect();
        for mut entry in entries {
            match timeout_at(entry.deadline, &mut entry.handle.task).await {
                Ok(joined) => log_exit(entry.handle.id, joined),
                Err(_elapsed) => {
                    entry.handle.task.abort();
                    self.anomalies = self.anomalies.saturating_add(1);
                    warn!(
                        vu = entry.handle.id,
                        "VU did not stop within {:?} grace period; aborted", self.grace
                    );
                }
            }
        }
        self.publish_gauges();
    }

    #[must_use]
    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    #[must_use]
    pub fn draining_len(&self) -> usize {
        self.draining.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty() && self.draining.is_empty()
    }

    /// Ids of active VUs, oldest first.
    #[must_use]
    pub fn active_ids(&self) -> Vec<u64> {
        self.active.iter().map(|handle| handle.id).collect()
    }

    #[must_use]
    pub const fn anomalies(&self) -> u64 {
        self.anomalies
    }

    #[must_use]
    pub const fn peak(&self) -> u64 {
        self.peak
    }

    fn spawn(&mut self) {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        let stop = StopSignal::new();
        let runner = VuRunner::new(id, Arc::clone(&self.context), stop.token());
        let task = tokio::spawn(runner.run());
        self.active.push(VuHandle { id, stop, task });
    }

    fn begin_stop(&mut self, handle: VuHandle) {
        handle.stop.stop();
        self.draining.push(Draining {
            handle,
            deadline: deadline_after(self.grace),
        });
    }

    fn publish_gauges(&mut self) {
        let active = u64::try_from(self.active.len()).unwrap_or(u64::MAX);
        self.peak = self.peak.max(active);
        let metrics = &self.context.metrics;
        metrics.record(0, MetricSample::gauge(MetricName::Vus, active));
        metrics.record(0, MetricSample::gauge(MetricName::VusMax, active));
    }
}

fn log_exit(id: u64, joined: Result<VuExit, tokio::task::JoinError>) {
    match joined {
        Ok(exit) => debug!(vu = exit.id, iterations = exit.iterations, "VU exited"),
        Err(err) if err.is_cancelled() => debug!(vu = id, "VU task cancelled"),
        Err(err) => warn!(vu = id, "VU task failed: {}", err),
    }
}
