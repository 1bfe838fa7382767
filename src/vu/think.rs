use std::time::Duration;

use rand::Rng;

use crate::error::ConfigError;

pub const DEFAULT_THINK_MIN: Duration = Duration::from_secs(1);
pub const DEFAULT_THINK_MAX: Duration = Duration::from_secs(3);

/// Pause between iterations, drawn uniformly from `[min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThinkTime {
    min: Duration,
    max: Duration,
}

impl ThinkTime {
    /// # Errors
    ///
    /// Returns an error when `min` is greater than `max`.
    pub fn new(min: Duration, max: Duration) -> Result<Self, ConfigError> {
        if min > max {
            return Err(ConfigError::ThinkTimeInverted {
                min_ms: min.as_millis(),
                max_ms: max.as_millis(),
            });
        }
        Ok(Self { min, max })
    }

    #[must_use]
    pub const fn min(&self) -> Duration {
        self.min
    }

    #[must_use]
    pub const fn max(&self) -> Duration {
        self.max
    }

    /// A degenerate range (`min == max`) always yields `min`.
    pub fn sample<R>(&self, rng: &mut R) -> Duration
    where
        R: Rng + ?Sized,
    {
        let min_us = u64::try_from(self.min.as_micros()).unwrap_or(u64::MAX);
        let max_us = u64::try_from(self.max.as_micros()).unwrap_or(u64::MAX);
        if max_us <= min_us {
            return self.min;
        }
        Duration::from_micros(rng.gen_range(min_us..max_us))
    }
}

impl Default for ThinkTime {
    fn default() -> Self {
        Self {
            min: DEFAULT_THINK_MIN,
            max: DEFAULT_THINK_MAX,
        }
    }
}
