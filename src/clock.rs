//! Run-relative time source for stage transitions and pacing.
use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior, interval};

#[derive(Debug, Clone, Copy)]
pub struct RunClock {
    start: Instant,
}

impl RunClock {
    #[must_use]
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Interval that skips missed ticks instead of bursting to catch up.
    #[must_use]
    pub fn ticker(period: Duration) -> Interval {
        let mut ticker = interval(period.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker
    }
}

/// Deadline `grace` after now, saturating at now on overflow.
#[must_use]
pub fn deadline_after(grace: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(grace).unwrap_or(now)
}
