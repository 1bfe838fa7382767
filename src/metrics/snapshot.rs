use std::collections::BTreeMap;
use std::time::Duration;

use super::{LatencyHistogram, MetricName};

/// Point-in-time, immutable copy of every metric.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub elapsed: Duration,
    pub(super) metrics: BTreeMap<MetricName, MetricValue>,
}

#[derive(Debug, Clone)]
pub enum MetricValue {
    Trend(TrendStats),
    Rate(RateStats),
    Counter(CounterStats),
    Gauge(GaugeStats),
}

impl MetricValue {
    /// Number of samples (trend, rate) or accumulated value (counter, gauge).
    #[must_use]
    pub fn count(&self) -> u64 {
        match self {
            MetricValue::Trend(trend) => trend.count(),
            MetricValue::Rate(rate) => rate.total,
            MetricValue::Counter(counter) => counter.count,
            MetricValue::Gauge(gauge) => gauge.value,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrendStats {
    pub(super) histogram: LatencyHistogram,
}

impl TrendStats {
    #[must_use]
    pub fn count(&self) -> u64 {
        self.histogram.count()
    }

    #[must_use]
    pub fn percentile(&self, p: f64) -> f64 {
        self.histogram.percentile_ms(p)
    }

    #[must_use]
    pub fn avg(&self) -> f64 {
        self.histogram.mean_ms()
    }

    #[must_use]
    pub fn min(&self) -> f64 {
        self.histogram.min_ms()
    }

    #[must_use]
    pub fn max(&self) -> f64 {
        self.histogram.max_ms()
    }

    #[must_use]
    pub fn med(&self) -> f64 {
        self.histogram.percentile_ms(50.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateStats {
    pub total: u64,
    pub hits: u64,
}

impl RateStats {
    /// Fraction of `true` samples; 0 when nothing was recorded.
    #[must_use]
    pub fn rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.hits as f64 / self.total as f64
    }

    #[must_use]
    pub const fn misses(&self) -> u64 {
        self.total.saturating_sub(self.hits)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CounterStats {
    pub count: u64,
    pub per_second: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GaugeStats {
    pub value: u64,
}

impl MetricsSnapshot {
    #[must_use]
    pub fn get(&self, metric: MetricName) -> Option<&MetricValue> {
        self.metrics.get(&metric)
    }

    pub fn iter(&self) -> impl Iterator<Item = (MetricName, &MetricValue)> {
        self.metrics.iter().map(|(name, value)| (*name, value))
    }

    #[must_use]
    pub fn trend(&self, metric: MetricName) -> Option<&TrendStats> {
        match self.metrics.get(&metric) {
            Some(MetricValue::Trend(trend)) => Some(trend),
            Some(MetricValue::Rate(_) | MetricValue::Counter(_) | MetricValue::Gauge(_))
            | None => None,
        }
    }

    #[must_use]
    pub fn rate(&self, metric: MetricName) -> Option<RateStats> {
        match self.metrics.get(&metric) {
            Some(MetricValue::Rate(rate)) => Some(*rate),
            Some(MetricValue::Trend(_) | MetricValue::Counter(_) | MetricValue::Gauge(_))
            | None => None,
        }
    }

    #[must_use]
    pub fn counter(&self, metric: MetricName) -> Option<CounterStats> {
        match self.metrics.get(&metric) {
            Some(MetricValue::Counter(counter)) => Some(*counter),
            Some(MetricValue::Trend(_) | MetricValue::Rate(_) | MetricValue::Gauge(_))
            | None => None,
        }
    }

    #[must_use]
    pub fn gauge(&self, metric: MetricName) -> Option<GaugeStats> {
        match self.metrics.get(&metric) {
            Some(MetricValue::Gauge(gauge)) => Some(*gauge),
            Some(MetricValue::Trend(_) | MetricValue::Rate(_) | MetricValue::Counter(_))
            | None => None,
        }
    }
}
