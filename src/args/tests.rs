use std::time::Duration;

use clap::Parser;

use super::parsers::{parse_duration_arg, parse_stage, parse_threshold_arg};
use super::*;
use crate::error::ValidationError;
use crate::metrics::MetricName;
use crate::scheduler::Stage;
use crate::thresholds::{Aggregation, Comparison};

fn parse_test_args<I, T>(args: I) -> Result<RunArgs, String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    RunArgs::try_parse_from(args).map_err(|err| err.to_string())
}

#[test]
fn parse_args_collects_repeatable_flags() -> Result<(), String> {
    let args = parse_test_args([
        "rampload",
        "-u",
        "http://localhost:8080",
        "-e",
        "/a",
        "--endpoint",
        "/b",
        "-s",
        "30s:5",
        "--stage",
        "1m:0",
        "--threshold",
        "errors:rate<0.05",
        "-H",
        "X-Env: staging",
        "--think-min",
        "100ms",
        "--think-max",
        "1s",
        "--seed",
        "9",
        "--output-format",
        "JSON",
    ])?;

    let checks = [
        (
            args.base_url.as_deref() == Some("http://localhost:8080"),
            "Unexpected base_url",
        ),
        (args.endpoints == vec!["/a", "/b"], "Unexpected endpoints"),
        (
            args.stages
                == vec![
                    Stage::new(Duration::from_secs(30), 5),
                    Stage::new(Duration::from_secs(60), 0),
                ],
            "Unexpected stages",
        ),
        (args.thresholds.len() == 1, "Unexpected thresholds"),
        (
            args.headers == vec![("X-Env".to_owned(), "staging".to_owned())],
            "Unexpected headers",
        ),
        (
            args.think_min == Some(Duration::from_millis(100)),
            "Unexpected think_min",
        ),
        (args.seed == Some(9), "Unexpected seed"),
        (
            args.output_format == Some(OutputFormat::Json),
            "Unexpected output format",
        ),
    ];
    for (ok, message) in checks {
        if !ok {
            return Err(message.to_owned());
        }
    }
    Ok(())
}

#[test]
fn parse_args_rejects_malformed_stage() -> Result<(), String> {
    if RunArgs::try_parse_from(["rampload", "-s", "2m"]).is_ok() {
        return Err("Expected stage without target to fail".to_owned());
    }
    Ok(())
}

#[test]
fn parse_stage_accepts_units_and_rejects_zero() -> Result<(), String> {
    let stage = parse_stage("2m:10").map_err(|err| err.to_string())?;
    if stage != Stage::new(Duration::from_secs(120), 10) {
        return Err(format!("Unexpected stage {:?}", stage));
    }
    match parse_stage("0s:10") {
        Err(ValidationError::DurationZero) => {}
        other => return Err(format!("Expected DurationZero, got {:?}", other)),
    }
    match parse_stage("2m:ten") {
        Err(ValidationError::InvalidStageTarget { .. }) => Ok(()),
        other => Err(format!("Expected InvalidStageTarget, got {:?}", other)),
    }
}

#[test]
fn parse_threshold_arg_splits_metric_and_expression() -> Result<(), String> {
    let threshold =
        parse_threshold_arg("http_req_duration:p(99)<=800").map_err(|err| err.to_string())?;
    if threshold.metric != MetricName::HttpReqDuration
        || threshold.aggregation != Aggregation::Percentile(99.0)
        || threshold.comparison != Comparison::Le
    {
        return Err(format!("Unexpected threshold {:?}", threshold));
    }
    match parse_threshold_arg("latency:p(95)<500") {
        Err(ValidationError::InvalidThreshold { .. }) => {}
        other => return Err(format!("Expected unknown metric error, got {:?}", other)),
    }
    match parse_threshold_arg("p(95)<500") {
        Err(ValidationError::InvalidThresholdFormat { .. }) => Ok(()),
        other => Err(format!("Expected format error, got {:?}", other)),
    }
}

#[test]
fn parse_duration_arg_supports_units() -> Result<(), String> {
    let cases = [
        ("250ms", Duration::from_millis(250)),
        ("3", Duration::from_secs(3)),
        ("2m", Duration::from_secs(120)),
        ("1h", Duration::from_secs(3600)),
    ];
    for (text, expected) in cases {
        let parsed = parse_duration_arg(text).map_err(|err| err.to_string())?;
        if parsed != expected {
            return Err(format!("'{}' parsed as {:?}", text, parsed));
        }
    }
    match parse_duration_arg("5d") {
        Err(ValidationError::InvalidDurationUnit { unit }) if unit == "d" => Ok(()),
        other => Err(format!("Expected unit error, got {:?}", other)),
    }
}

#[test]
fn default_profile_matches_six_stages() -> Result<(), String> {
    let stages = default_stages();
    let targets: Vec<u64> = stages.iter().map(|stage| stage.target).collect();
    if targets != vec![10, 10, 50, 50, 100, 0] {
        return Err(format!("Unexpected targets {:?}", targets));
    }
    let total: Duration = stages.iter().map(|stage| stage.duration).sum();
    if total != Duration::from_secs(1080) {
        return Err(format!("Unexpected total {:?}", total));
    }
    if default_endpoints().len() != 5 {
        return Err("Expected five default endpoints".to_owned());
    }
    Ok(())
}
