use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Histogram error during {context}: {source}")]
    Histogram {
        context: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("Metric '{metric}' is a {kind}; cannot record a {sample} sample.")]
    SampleKindMismatch {
        metric: &'static str,
        kind: &'static str,
        sample: &'static str,
    },
}
