use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::args::OutputFormat;
use crate::error::ValidationError;

/// On-disk run configuration (`rampload.toml` / `rampload.json`).
///
/// Every field is optional; CLI flags and the `BASE_URL` environment
/// variable take precedence.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub base_url: Option<String>,
    pub endpoints: Option<Vec<String>>,
    pub health_path: Option<String>,
    pub stages: Option<Vec<StageConfig>>,
    /// Metric name to threshold expressions, e.g.
    /// `http_req_duration = ["p(95)<500"]`.
    pub thresholds: Option<BTreeMap<String, Vec<String>>>,
    pub headers: Option<Vec<String>>,
    pub think_min: Option<DurationValue>,
    pub think_max: Option<DurationValue>,
    pub timeout: Option<DurationValue>,
    pub tick: Option<DurationValue>,
    pub grace: Option<DurationValue>,
    pub progress_interval: Option<DurationValue>,
    pub seed: Option<u64>,
    pub summary_export: Option<String>,
    pub output_format: Option<OutputFormat>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StageConfig {
    pub duration: DurationValue,
    pub target: u64,
}

/// Either whole seconds or a unit-suffixed string such as `"2m"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    pub(crate) fn to_duration(&self) -> Result<Duration, ValidationError> {
        match self {
            DurationValue::Seconds(secs) => {
                if *secs == 0 {
                    Err(ValidationError::DurationZero)
                } else {
                    Ok(Duration::from_secs(*secs))
                }
            }
            DurationValue::Text(text) => super::parse_duration_value(text),
        }
    }
}
