//! Sample types, sharded aggregation and latency histograms.
mod aggregator;
mod histogram;
mod snapshot;
mod types;


pub use aggregator::{DEFAULT_SHARDS, MetricsAggregator};
pub use histogram::LatencyHistogram;
pub use snapshot::{CounterStats, GaugeStats, MetricValue, MetricsSnapshot, RateStats, TrendStats};
pub use types::{MetricKind, MetricName, MetricSample, SampleValue};
