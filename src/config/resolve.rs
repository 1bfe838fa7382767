use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::args::{
    DEFAULT_BASE_URL, DEFAULT_HEALTH_PATH, DEFAULT_PROGRESS_INTERVAL, DEFAULT_REQUEST_TIMEOUT,
    DEFAULT_THRESHOLDS, OutputFormat, RunArgs, default_endpoints, default_stages, parse_header,
};
use crate::error::ConfigError;
use crate::metrics::MetricName;
use crate::scheduler::{DEFAULT_GRACE, DEFAULT_TICK, RampProfile, Stage};
use crate::thresholds::Threshold;
use crate::vu::{DEFAULT_THINK_MAX, DEFAULT_THINK_MIN, ThinkTime};

use super::types::{ConfigFile, DurationValue};

/// Fully resolved, immutable settings for one run.
#[derive(Debug, Clone)]
pub struct TestConfig {
    pub base_url: Url,
    pub endpoints: Vec<String>,
    pub health_path: String,
    pub profile: RampProfile,
    pub thresholds: Vec<Threshold>,
    pub headers: Vec<(String, String)>,
    pub think_time: ThinkTime,
    pub request_timeout: Duration,
    pub tick: Duration,
    pub grace: Duration,
    pub progress_interval: Duration,
    pub seed: Option<u64>,
    pub summary_export: Option<PathBuf>,
    pub output_format: OutputFormat,
}

impl TestConfig {
    /// Built-in defaults against `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error only if the built-in stages or thresholds fail
    /// validation.
    pub fn with_defaults(base_url: Url) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url,
            endpoints: default_endpoints(),
            health_path: DEFAULT_HEALTH_PATH.to_owned(),
            profile: RampProfile::new(default_stages())?,
            thresholds: default_thresholds()?,
            headers: Vec::new(),
            think_time: ThinkTime::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            tick: DEFAULT_TICK,
            grace: DEFAULT_GRACE,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            seed: None,
            summary_export: None,
            output_format: OutputFormat::Text,
        })
    }
}

/// Merge CLI flags (including `BASE_URL`), the optional config file and the
/// built-in defaults, in that order of precedence.
///
/// List settings (endpoints, stages, thresholds) are replaced as a whole by
/// the highest-precedence source that sets them; headers accumulate, CLI
/// last.
///
/// # Errors
///
/// Returns an error when any merged value fails validation.
pub fn resolve_config(
    args: &RunArgs,
    file: Option<&ConfigFile>,
) -> Result<TestConfig, ConfigError> {
    let empty = ConfigFile::default();
    let file = file.unwrap_or(&empty);

    let base_url = parse_base_url(
        args.base_url
            .as_deref()
            .or(file.base_url.as_deref())
            .unwrap_or(DEFAULT_BASE_URL),
    )?;

    let endpoints = if !args.endpoints.is_empty() {
        args.endpoints.clone()
    } else if let Some(endpoints) = file.endpoints.as_ref() {
        endpoints.clone()
    } else {
        default_endpoints()
    };
    if endpoints.is_empty() {
        return Err(ConfigError::NoEndpoints);
    }

    let health_path = args
        .health_path
        .clone()
        .or_else(|| file.health_path.clone())
        .unwrap_or_else(|| DEFAULT_HEALTH_PATH.to_owned());

    let stages = if !args.stages.is_empty() {
        args.stages.clone()
    } else if let Some(stages) = file.stages.as_ref() {
        stages
            .iter()
            .enumerate()
            .map(|(idx, stage)| -> Result<Stage, ConfigError> {
                let field = format!("stages[{}].duration", idx);
                Ok(Stage::new(duration_field(&field, &stage.duration)?, stage.target))
            })
            .collect::<Result<Vec<_>, _>>()?
    } else {
        default_stages()
    };
    let profile = RampProfile::new(stages)?;

    let thresholds = if !args.thresholds.is_empty() {
        args.thresholds.clone()
    } else if let Some(thresholds) = file.thresholds.as_ref() {
        parse_threshold_table(thresholds)?
    } else {
        default_thresholds()?
    };

    let mut headers = Vec::new();
    for header in file.headers.iter().flatten() {
        let parsed =
            parse_header(header).map_err(|err| ConfigError::InvalidHeader { source: err })?;
        headers.push(parsed);
    }
    headers.extend(args.headers.iter().cloned());

    let think_min = pick_duration(args.think_min, file.think_min.as_ref(), "think_min")?
        .unwrap_or(DEFAULT_THINK_MIN);
    let think_max = pick_duration(args.think_max, file.think_max.as_ref(), "think_max")?
        .unwrap_or(DEFAULT_THINK_MAX);
    let think_time = ThinkTime::new(think_min, think_max)?;

    Ok(TestConfig {
        base_url,
        endpoints,
        health_path,
        profile,
        thresholds,
        headers,
        think_time,
        request_timeout: pick_duration(args.timeout, file.timeout.as_ref(), "timeout")?
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT),
        tick: pick_duration(args.tick, file.tick.as_ref(), "tick")?.unwrap_or(DEFAULT_TICK),
        grace: pick_duration(args.grace, file.grace.as_ref(), "grace")?.unwrap_or(DEFAULT_GRACE),
        progress_interval: pick_duration(
            args.progress_interval,
            file.progress_interval.as_ref(),
            "progress_interval",
        )?
        .unwrap_or(DEFAULT_PROGRESS_INTERVAL),
        seed: args.seed.or(file.seed),
        summary_export: args
            .summary_export
            .clone()
            .or_else(|| file.summary_export.as_ref().map(PathBuf::from)),
        output_format: args.output_format.or(file.output_format).unwrap_or_default(),
    })
}

/// Parse and validate the base URL; only http and https are accepted.
///
/// # Errors
///
/// Returns an error for unparsable URLs or other schemes.
pub fn parse_base_url(value: &str) -> Result<Url, ConfigError> {
    let trimmed = value.trim();
    let url = Url::parse(trimmed).map_err(|err| ConfigError::InvalidBaseUrl {
        url: trimmed.to_owned(),
        source: err,
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(ConfigError::UnsupportedScheme {
            url: trimmed.to_owned(),
        }),
    }
}

fn default_thresholds() -> Result<Vec<Threshold>, ConfigError> {
    DEFAULT_THRESHOLDS
        .iter()
        .map(|(metric, expr)| {
            Threshold::parse(*metric, expr).map_err(|err| ConfigError::InvalidThreshold {
                metric: metric.as_str().to_owned(),
                source: err,
            })
        })
        .collect()
}

fn parse_threshold_table(
    table: &BTreeMap<String, Vec<String>>,
) -> Result<Vec<Threshold>, ConfigError> {
    let mut thresholds = Vec::new();
    for (name, exprs) in table {
        let invalid = |err| ConfigError::InvalidThreshold {
            metric: name.clone(),
            source: err,
        };
        let metric: MetricName = name.parse().map_err(invalid)?;
        for expr in exprs {
            thresholds.push(Threshold::parse(metric, expr).map_err(invalid)?);
        }
    }
    Ok(thresholds)
}

fn duration_field(field: &str, value: &DurationValue) -> Result<Duration, ConfigError> {
    value
        .to_duration()
        .map_err(|err| ConfigError::InvalidDuration {
            field: field.to_owned(),
            source: err,
        })
}

fn pick_duration(
    cli: Option<Duration>,
    file: Option<&DurationValue>,
    field: &str,
) -> Result<Option<Duration>, ConfigError> {
    if cli.is_some() {
        return Ok(cli);
    }
    file.map(|value| duration_field(field, value)).transpose()
}
