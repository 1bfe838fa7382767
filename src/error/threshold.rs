use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ThresholdError {
    #[error("Threshold expression must not be empty.")]
    Empty,
    #[error("Unknown metric '{name}'.")]
    UnknownMetric { name: String },
    #[error("Missing comparison operator in '{expr}'.")]
    MissingOperator { expr: String },
    #[error("Unknown aggregation '{name}' in '{expr}'.")]
    UnknownAggregation { name: String, expr: String },
    #[error("Invalid percentile '{value}' in '{expr}'. Use p(N) with 0 < N <= 100.")]
    InvalidPercentile { value: String, expr: String },
    #[error("Invalid bound '{value}' in '{expr}'.")]
    InvalidBound { value: String, expr: String },
    #[error("Aggregation '{aggregation}' is not supported for {kind} metric '{metric}'.")]
    UnsupportedAggregation {
        aggregation: String,
        kind: &'static str,
        metric: String,
    },
}
