//! Stage-driven VU scheduling: interpolates the ramp profile on every tick
//! and reconciles the live VU population toward it.
mod pool;
mod profile;


use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::clock::RunClock;
use crate::shutdown::StopToken;
use crate::vu::VuContext;

pub use pool::{Reconcile, VuPool};
pub use profile::{RampProfile, Stage};

pub const DEFAULT_TICK: Duration = Duration::from_millis(250);
pub const DEFAULT_GRACE: Duration = Duration::from_secs(30);

/// What the scheduler observed while driving a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleOutcome {
    /// Ended early because the run-wide abort was raised.
    pub interrupted: bool,
    /// VUs force-stopped after outliving the grace period.
    pub anomalies: u64,
    pub peak_vus: u64,
}

pub struct Scheduler {
    profile: Arc<RampProfile>,
    pool: VuPool,
    tick: Duration,
}

impl Scheduler {
    #[must_use]
    pub fn new(
        profile: Arc<RampProfile>,
        context: Arc<VuContext>,
        tick: Duration,
        grace: Duration,
    ) -> Self {
        Self {
            profile,
            pool: VuPool::new(context, grace),
            tick,
        }
    }

    /// Drive the profile to completion (or until `abort`), then stop and
    /// drain every VU.
    pub async fn run(mut self, clock: RunClock, mut abort: StopToken) -> ScheduleOutcome {
        let total = self.profile.total_duration();
        let mut ticker = RunClock::ticker(self.tick);
        let mut current_stage: Option<usize> = None;

        let interrupted = loop {
            tokio::select! {
                _ = ticker.tick() => {}
                () = abort.stopped() => break true,
            }

            let elapsed = clock.elapsed();
            if elapsed >= total {
                break false;
            }
            let stage = self.profile.stage_index_at(elapsed);
            if stage != current_stage {
                if let Some(index) = stage {
                    let target = self.profile.stages().get(index).map_or(0, |s| s.target);
                    info!(
                        "Stage {}/{}: target {} VUs",
                        index.saturating_add(1),
                        self.profile.stages().len(),
                        target
                    );
                }
                current_stage = stage;
            }

            self.pool.reap();
            let target = self.profile.target_at(elapsed);
            self.pool.reconcile(target);
        };

        if interrupted {
            warn!("Run interrupted; stopping all VUs.");
        } else {
            debug!("Ramp profile exhausted; stopping remaining VUs.");
        }
        self.pool.stop_all();
        self.pool.drain().await;
        info!("ramp-down complete");

        ScheduleOutcome {
            interrupted,
            anomalies: self.pool.anomalies(),
            peak_vus: self.pool.peak(),
        }
    }
}
