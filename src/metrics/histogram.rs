use std::time::Duration;

use hdrhistogram::Histogram;

use crate::error::MetricsError;

/// Significant figures kept by every latency histogram.
const SIGNIFICANT_FIGURES: u8 = 3;
const MICROS_PER_MILLI: f64 = 1_000.0;

/// Latency distribution recorded in microseconds.
#[derive(Debug, Clone)]
pub struct LatencyHistogram {
    hist: Histogram<u64>,
}

impl LatencyHistogram {
    /// Create a new latency histogram.
    ///
    /// # Errors
    ///
    /// Returns an error if the histogram cannot be created.
    pub fn new() -> Result<Self, MetricsError> {
        let hist = Histogram::<u64>::new(SIGNIFICANT_FIGURES).map_err(|err| {
            MetricsError::Histogram {
                context: "create",
                source: Box::new(err),
            }
        })?;
        Ok(Self { hist })
    }

    /// Record a latency.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be recorded.
    pub fn record(&mut self, latency: Duration) -> Result<(), MetricsError> {
        let micros = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX).max(1);
        self.hist
            .record(micros)
            .map_err(|err| MetricsError::Histogram {
                context: "record",
                source: Box::new(err),
            })
    }

    /// Merge another histogram into this one.
    ///
    /// # Errors
    ///
    /// Returns an error if the merge fails.
    pub fn merge(&mut self, other: &LatencyHistogram) -> Result<(), MetricsError> {
        self.hist
            .add(&other.hist)
            .map_err(|err| MetricsError::Histogram {
                context: "merge",
                source: Box::new(err),
            })
    }

    #[must_use]
    pub fn count(&self) -> u64 {
        self.hist.len()
    }

    /// Value at percentile `p` (0..=100) in milliseconds, 0 when empty.
    #[must_use]
    pub fn percentile_ms(&self, p: f64) -> f64 {
        if self.count() == 0 {
            return 0.0;
        }
        micros_to_ms(self.hist.value_at_percentile(p.clamp(0.0, 100.0)))
    }

    #[must_use]
    pub fn min_ms(&self) -> f64 {
        if self.count() == 0 {
            return 0.0;
        }
        micros_to_ms(self.hist.min())
    }

    #[must_use]
    pub fn max_ms(&self) -> f64 {
        micros_to_ms(self.hist.max())
    }

    #[must_use]
    pub fn mean_ms(&self) -> f64 {
        self.hist.mean() / MICROS_PER_MILLI
    }
}

fn micros_to_ms(micros: u64) -> f64 {
    micros as f64 / MICROS_PER_MILLI
}
