use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid header format: '{value}'. Expected 'Key: Value'")]
    InvalidHeaderFormat { value: String },
    #[error("Invalid stage '{value}'. Expected 'duration:target' (e.g., 2m:10)")]
    InvalidStageFormat { value: String },
    #[error("Invalid stage target in '{value}': {source}")]
    InvalidStageTarget {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Invalid threshold '{value}'. Expected 'metric:expression' (e.g., http_req_duration:p(95)<500)")]
    InvalidThresholdFormat { value: String },
    #[error("Invalid threshold '{value}': {source}")]
    InvalidThreshold {
        value: String,
        #[source]
        source: super::ThresholdError,
    },
    #[error("Duration must not be empty.")]
    DurationEmpty,
    #[error("Invalid duration '{value}'.")]
    InvalidDurationFormat { value: String },
    #[error("Invalid duration '{value}': {source}")]
    InvalidDurationNumber {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Duration overflow.")]
    DurationOverflow,
    #[error("Invalid duration unit '{unit}'.")]
    InvalidDurationUnit { unit: String },
    #[error("Duration must be > 0.")]
    DurationZero,
}
