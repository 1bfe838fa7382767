use std::time::Duration;

use crate::config::parse_duration_value;
use crate::error::ValidationError;
use crate::metrics::MetricName;
use crate::scheduler::Stage;
use crate::thresholds::Threshold;

pub(crate) fn parse_header(s: &str) -> Result<(String, String), ValidationError> {
    match s.split_once(':') {
        Some((key, value)) => Ok((key.trim().to_owned(), value.trim().to_owned())),
        None => Err(ValidationError::InvalidHeaderFormat {
            value: s.to_owned(),
        }),
    }
}

pub(crate) fn parse_duration_arg(s: &str) -> Result<Duration, ValidationError> {
    parse_duration_value(s)
}

/// `DURATION:TARGET`, e.g. `2m:10`.
pub(crate) fn parse_stage(s: &str) -> Result<Stage, ValidationError> {
    let Some((duration, target)) = s.rsplit_once(':') else {
        return Err(ValidationError::InvalidStageFormat {
            value: s.to_owned(),
        });
    };
    let duration = parse_duration_value(duration)?;
    let target: u64 = target
        .trim()
        .parse()
        .map_err(|err| ValidationError::InvalidStageTarget {
            value: s.to_owned(),
            source: err,
        })?;
    Ok(Stage::new(duration, target))
}

/// `METRIC:EXPRESSION`, e.g. `http_req_duration:p(95)<500`.
pub(crate) fn parse_threshold_arg(s: &str) -> Result<Threshold, ValidationError> {
    let Some((metric, expr)) = s.split_once(':') else {
        return Err(ValidationError::InvalidThresholdFormat {
            value: s.to_owned(),
        });
    };
    metric
        .parse::<MetricName>()
        .and_then(|metric| Threshold::parse(metric, expr))
        .map_err(|err| ValidationError::InvalidThreshold {
            value: s.to_owned(),
            source: err,
        })
}
