use crate::metrics::{MetricName, MetricValue, MetricsSnapshot};

use super::expr::{Aggregation, Threshold};

/// Result of checking one threshold against a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdOutcome {
    pub metric: MetricName,
    pub source: String,
    pub observed: f64,
    pub bound: f64,
    pub passed: bool,
    /// Headroom toward the bound; negative by how much it was missed.
    pub margin: f64,
}

/// Evaluate every threshold. Pure: the same snapshot always yields the same
/// outcomes, in the order given.
#[must_use]
pub fn evaluate(thresholds: &[Threshold], snapshot: &MetricsSnapshot) -> Vec<ThresholdOutcome> {
    thresholds
        .iter()
        .map(|threshold| evaluate_one(threshold, snapshot))
        .collect()
}

#[must_use]
pub fn evaluate_one(threshold: &Threshold, snapshot: &MetricsSnapshot) -> ThresholdOutcome {
    let observed = observe(threshold.aggregation, snapshot.get(threshold.metric));
    ThresholdOutcome {
        metric: threshold.metric,
        source: threshold.source.clone(),
        observed,
        bound: threshold.bound,
        passed: threshold.comparison.holds(observed, threshold.bound),
        margin: threshold.comparison.margin(observed, threshold.bound),
    }
}

#[must_use]
pub fn all_passed(outcomes: &[ThresholdOutcome]) -> bool {
    outcomes.iter().all(|outcome| outcome.passed)
}

/// Metrics without samples observe as 0.
fn observe(aggregation: Aggregation, value: Option<&MetricValue>) -> f64 {
    let Some(value) = value else {
        return 0.0;
    };
    match (value, aggregation) {
        (MetricValue::Trend(trend), _) if trend.count() == 0 => 0.0,
        (MetricValue::Trend(trend), Aggregation::Percentile(p)) => trend.percentile(p),
        (MetricValue::Trend(trend), Aggregation::Avg) => trend.avg(),
        (MetricValue::Trend(trend), Aggregation::Min) => trend.min(),
        (MetricValue::Trend(trend), Aggregation::Max) => trend.max(),
        (MetricValue::Trend(trend), Aggregation::Med) => trend.med(),
        (MetricValue::Rate(rate), Aggregation::Rate) => rate.rate(),
        (MetricValue::Counter(counter), Aggregation::Rate) => counter.per_second,
        (MetricValue::Gauge(gauge), Aggregation::Value) => gauge.value as f64,
        (metric, Aggregation::Count) => metric.count() as f64,
        (
            MetricValue::Trend(_)
            | MetricValue::Rate(_)
            | MetricValue::Counter(_)
            | MetricValue::Gauge(_),
            Aggregation::Percentile(_)
            | Aggregation::Avg
            | Aggregation::Min
            | Aggregation::Max
            | Aggregation::Med
            | Aggregation::Rate
            | Aggregation::Value,
        ) => 0.0,
    }
}
