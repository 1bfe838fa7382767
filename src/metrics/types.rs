use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::ThresholdError;

/// How samples of a metric are accumulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// Distribution of durations (percentiles, min/max/avg).
    Trend,
    /// Fraction of samples that were `true`.
    Rate,
    /// Monotonic sum.
    Counter,
    /// Last value wins; `vus_max` keeps the peak.
    Gauge,
}

impl MetricKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            MetricKind::Trend => "trend",
            MetricKind::Rate => "rate",
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
        }
    }
}

/// Built-in metrics emitted by the executor and VU runners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetricName {
    HttpReqDuration,
    HttpReqFailed,
    HttpReqs,
    Errors,
    Checks,
    Iterations,
    Vus,
    VusMax,
}

impl MetricName {
    pub const ALL: [MetricName; 8] = [
        MetricName::HttpReqDuration,
        MetricName::HttpReqFailed,
        MetricName::HttpReqs,
        MetricName::Errors,
        MetricName::Checks,
        MetricName::Iterations,
        MetricName::Vus,
        MetricName::VusMax,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            MetricName::HttpReqDuration => "http_req_duration",
            MetricName::HttpReqFailed => "http_req_failed",
            MetricName::HttpReqs => "http_reqs",
            MetricName::Errors => "errors",
            MetricName::Checks => "checks",
            MetricName::Iterations => "iterations",
            MetricName::Vus => "vus",
            MetricName::VusMax => "vus_max",
        }
    }

    #[must_use]
    pub const fn kind(self) -> MetricKind {
        match self {
            MetricName::HttpReqDuration => MetricKind::Trend,
            MetricName::HttpReqFailed | MetricName::Errors | MetricName::Checks => {
                MetricKind::Rate
            }
            MetricName::HttpReqs | MetricName::Iterations => MetricKind::Counter,
            MetricName::Vus | MetricName::VusMax => MetricKind::Gauge,
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            MetricName::HttpReqDuration => 0,
            MetricName::HttpReqFailed => 1,
            MetricName::HttpReqs => 2,
            MetricName::Errors => 3,
            MetricName::Checks => 4,
            MetricName::Iterations => 5,
            MetricName::Vus => 6,
            MetricName::VusMax => 7,
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MetricName {
    type Err = ThresholdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        MetricName::ALL
            .iter()
            .copied()
            .find(|metric| metric.as_str() == name)
            .ok_or_else(|| ThresholdError::UnknownMetric {
                name: name.to_owned(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleValue {
    Duration(Duration),
    Flag(bool),
    Count(u64),
    Gauge(u64),
}

impl SampleValue {
    #[must_use]
    pub const fn kind(self) -> MetricKind {
        match self {
            SampleValue::Duration(_) => MetricKind::Trend,
            SampleValue::Flag(_) => MetricKind::Rate,
            SampleValue::Count(_) => MetricKind::Counter,
            SampleValue::Gauge(_) => MetricKind::Gauge,
        }
    }
}

/// One observation handed to the aggregator.
#[derive(Debug, Clone, Copy)]
pub struct MetricSample {
    pub metric: MetricName,
    pub value: SampleValue,
    pub timestamp: Instant,
}

impl MetricSample {
    #[must_use]
    pub fn duration(metric: MetricName, value: Duration) -> Self {
        Self::now(metric, SampleValue::Duration(value))
    }

    #[must_use]
    pub fn flag(metric: MetricName, value: bool) -> Self {
        Self::now(metric, SampleValue::Flag(value))
    }

    #[must_use]
    pub fn count(metric: MetricName, value: u64) -> Self {
        Self::now(metric, SampleValue::Count(value))
    }

    #[must_use]
    pub fn gauge(metric: MetricName, value: u64) -> Self {
        Self::now(metric, SampleValue::Gauge(value))
    }

    fn now(metric: MetricName, value: SampleValue) -> Self {
        Self {
            metric,
            value,
            timestamp: Instant::now(),
        }
    }
}
