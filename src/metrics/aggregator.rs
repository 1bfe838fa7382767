use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::warn;

use crate::error::MetricsError;

use super::snapshot::{CounterStats, GaugeStats, MetricValue, RateStats, TrendStats};
use super::{LatencyHistogram, MetricKind, MetricName, MetricSample, MetricsSnapshot, SampleValue};

/// Default number of histogram shards per trend metric.
pub const DEFAULT_SHARDS: usize = 16;

struct TrendShards {
    shards: Vec<Mutex<LatencyHistogram>>,
}

impl TrendShards {
    fn new(count: usize) -> Result<Self, MetricsError> {
        let mut shards = Vec::with_capacity(count);
        for _ in 0..count {
            shards.push(Mutex::new(LatencyHistogram::new()?));
        }
        Ok(Self { shards })
    }

    fn record(&self, shard: usize, value: Duration) -> Result<(), MetricsError> {
        let idx = shard.checked_rem(self.shards.len()).unwrap_or(0);
        let Some(cell) = self.shards.get(idx) else {
            return Ok(());
        };
        let mut hist = cell.lock().unwrap_or_else(PoisonError::into_inner);
        hist.record(value)
    }

    fn merged(&self) -> Result<LatencyHistogram, MetricsError> {
        let mut merged = LatencyHistogram::new()?;
        for cell in &self.shards {
            let hist = cell.lock().unwrap_or_else(PoisonError::into_inner);
            merged.merge(&hist)?;
        }
        Ok(merged)
    }
}

#[derive(Default)]
struct RateCells {
    total: AtomicU64,
    hits: AtomicU64,
}

impl RateCells {
    /// `total` is bumped before `hits` and read after it, so a live read
    /// never sees more hits than samples.
    fn stats(&self) -> RateStats {
        let hits = self.hits.load(Ordering::Acquire);
        let total = self.total.load(Ordering::Acquire);
        RateStats { total, hits }
    }
}

enum Slot {
    Trend(TrendShards),
    Rate(RateCells),
    Counter(AtomicU64),
    Gauge { value: AtomicU64, keep_peak: bool },
}

impl Slot {
    const fn kind(&self) -> MetricKind {
        match self {
            Slot::Trend(_) => MetricKind::Trend,
            Slot::Rate(_) => MetricKind::Rate,
            Slot::Counter(_) => MetricKind::Counter,
            Slot::Gauge { .. } => MetricKind::Gauge,
        }
    }
}

/// Concurrent sample accumulator shared by every VU runner.
///
/// Counters, rates and gauges are plain atomics. Trend samples land in one of
/// several histogram shards picked by the writer's shard hint (its VU id), so
/// writers only contend when they share a shard; reads merge all shards.
pub struct MetricsAggregator {
    started: Instant,
    last_sample_us: AtomicU64,
    slots: Vec<Slot>,
}

impl MetricsAggregator {
    /// Build an aggregator with `shards` histogram shards per trend metric.
    ///
    /// # Errors
    ///
    /// Returns an error if a histogram cannot be allocated.
    pub fn new(shards: usize) -> Result<Self, MetricsError> {
        let shard_count = shards.max(1);
        let mut slots = Vec::with_capacity(MetricName::ALL.len());
        for metric in MetricName::ALL {
            let slot = match metric.kind() {
                MetricKind::Trend => Slot::Trend(TrendShards::new(shard_count)?),
                MetricKind::Rate => Slot::Rate(RateCells::default()),
                MetricKind::Counter => Slot::Counter(AtomicU64::new(0)),
                MetricKind::Gauge => Slot::Gauge {
                    value: AtomicU64::new(0),
                    keep_peak: metric == MetricName::VusMax,
                },
            };
            slots.push(slot);
        }
        Ok(Self {
            started: Instant::now(),
            last_sample_us: AtomicU64::new(0),
            slots,
        })
    }

    /// Record a sample, logging (not failing) when it cannot be stored.
    pub fn record(&self, shard: usize, sample: MetricSample) {
        if let Err(err) = self.try_record(shard, sample) {
            warn!("Dropped {} sample: {}", sample.metric, err);
        }
    }

    /// Record a sample.
    ///
    /// # Errors
    ///
    /// Returns an error when the sample kind does not match the metric kind
    /// or the histogram rejects the value.
    pub fn try_record(&self, shard: usize, sample: MetricSample) -> Result<(), MetricsError> {
        let slot = self.slot(sample.metric);
        match (slot, sample.value) {
            (Some(Slot::Trend(trend)), SampleValue::Duration(value)) => {
                trend.record(shard, value)?;
            }
            (Some(Slot::Rate(cells)), SampleValue::Flag(hit)) => {
                cells.total.fetch_add(1, Ordering::AcqRel);
                if hit {
                    cells.hits.fetch_add(1, Ordering::AcqRel);
                }
            }
            (Some(Slot::Counter(counter)), SampleValue::Count(value)) => {
                counter.fetch_add(value, Ordering::AcqRel);
            }
            (Some(Slot::Gauge { value, keep_peak }), SampleValue::Gauge(observed)) => {
                if *keep_peak {
                    value.fetch_max(observed, Ordering::AcqRel);
                } else {
                    value.store(observed, Ordering::Release);
                }
            }
            (slot, value) => {
                return Err(MetricsError::SampleKindMismatch {
                    metric: sample.metric.as_str(),
                    kind: slot.map_or("missing", |found| found.kind().as_str()),
                    sample: value.kind().as_str(),
                });
            }
        }

        let offset = sample.timestamp.saturating_duration_since(self.started);
        self.last_sample_us.fetch_max(
            u64::try_from(offset.as_micros()).unwrap_or(u64::MAX),
            Ordering::AcqRel,
        );
        Ok(())
    }

    /// Samples recorded for a trend or rate, accumulated value otherwise.
    #[must_use]
    pub fn count(&self, metric: MetricName) -> u64 {
        match self.slot(metric) {
            Some(Slot::Trend(trend)) => trend.merged().map_or(0, |hist| hist.count()),
            Some(Slot::Rate(cells)) => cells.total.load(Ordering::Acquire),
            Some(Slot::Counter(counter)) => counter.load(Ordering::Acquire),
            Some(Slot::Gauge { value, .. }) => value.load(Ordering::Acquire),
            None => 0,
        }
    }

    /// Fraction of `true` samples for a rate metric.
    #[must_use]
    pub fn rate(&self, metric: MetricName) -> f64 {
        match self.slot(metric) {
            Some(Slot::Rate(cells)) => cells.stats().rate(),
            Some(Slot::Trend(_) | Slot::Counter(_) | Slot::Gauge { .. }) | None => 0.0,
        }
    }

    /// Percentile `p` (0..=100) of a trend metric, in milliseconds.
    #[must_use]
    pub fn percentile(&self, metric: MetricName, p: f64) -> f64 {
        match self.slot(metric) {
            Some(Slot::Trend(trend)) => trend.merged().map_or(0.0, |hist| hist.percentile_ms(p)),
            Some(Slot::Rate(_) | Slot::Counter(_) | Slot::Gauge { .. }) | None => 0.0,
        }
    }

    /// Merge every shard into an immutable snapshot.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let elapsed = self.started.elapsed();
        let active = Duration::from_micros(self.last_sample_us.load(Ordering::Acquire));
        let mut metrics = BTreeMap::new();
        for metric in MetricName::ALL {
            let value = match self.slot(metric) {
                Some(Slot::Trend(trend)) => match trend.merged() {
                    Ok(histogram) => MetricValue::Trend(TrendStats { histogram }),
                    Err(err) => {
                        warn!("Failed to merge {} shards: {}", metric, err);
                        continue;
                    }
                },
                Some(Slot::Rate(cells)) => MetricValue::Rate(cells.stats()),
                Some(Slot::Counter(counter)) => {
                    let count = counter.load(Ordering::Acquire);
                    MetricValue::Counter(CounterStats {
                        count,
                        per_second: per_second(count, active),
                    })
                }
                Some(Slot::Gauge { value, .. }) => MetricValue::Gauge(GaugeStats {
                    value: value.load(Ordering::Acquire),
                }),
                None => continue,
            };
            metrics.insert(metric, value);
        }
        MetricsSnapshot { elapsed, metrics }
    }

    fn slot(&self, metric: MetricName) -> Option<&Slot> {
        self.slots.get(metric.index())
    }
}

fn per_second(count: u64, window: Duration) -> f64 {
    let secs = window.as_secs_f64();
    if secs <= 0.0 {
        return 0.0;
    }
    count as f64 / secs
}
