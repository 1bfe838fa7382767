use std::time::Duration;

use clap::Parser;
use tempfile::tempdir;

use super::types::DurationValue;
use super::*;
use crate::args::{DEFAULT_BASE_URL, OutputFormat, RunArgs};
use crate::error::ConfigError;
use crate::metrics::MetricName;

fn args(extra: &[&str]) -> Result<RunArgs, String> {
    let mut argv = vec!["rampload"];
    argv.extend_from_slice(extra);
    RunArgs::try_parse_from(argv).map_err(|err| err.to_string())
}

fn write_config(name: &str, content: &str) -> Result<(tempfile::TempDir, std::path::PathBuf), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = dir.path().join(name);
    std::fs::write(&path, content).map_err(|err| format!("write failed: {}", err))?;
    Ok((dir, path))
}

#[test]
fn parse_toml_config_with_stages_and_thresholds() -> Result<(), String> {
    let (_dir, path) = write_config(
        "rampload.toml",
        r#"
base_url = "http://localhost:3000"
endpoints = ["/get", "/headers"]
think_min = "500ms"
think_max = 2
seed = 7

[[stages]]
duration = "10s"
target = 5

[[stages]]
duration = 20
target = 0

[thresholds]
http_req_duration = ["p(95)<300", "max<1000"]
"#,
    )?;

    let file = load_config_file(&path).map_err(|err| err.to_string())?;
    if file.base_url.as_deref() != Some("http://localhost:3000") {
        return Err("Unexpected base_url".to_owned());
    }
    let stages = file.stages.as_ref().ok_or("Expected stages")?;
    let first = stages.first().ok_or("Missing stage")?;
    if first.target != 5 || !matches!(&first.duration, DurationValue::Text(text) if text == "10s") {
        return Err(format!("Unexpected first stage {:?}", first));
    }

    let config = resolve_config(&args(&[])?, Some(&file)).map_err(|err| err.to_string())?;
    if config.profile.total_duration() != Duration::from_secs(30) {
        return Err(format!("Unexpected total {:?}", config.profile.total_duration()));
    }
    if config.thresholds.len() != 2
        || config
            .thresholds
            .iter()
            .any(|threshold| threshold.metric != MetricName::HttpReqDuration)
    {
        return Err(format!("Unexpected thresholds {:?}", config.thresholds));
    }
    if config.think_time.min() != Duration::from_millis(500)
        || config.think_time.max() != Duration::from_secs(2)
    {
        return Err(format!("Unexpected think time {:?}", config.think_time));
    }
    if config.seed != Some(7) || config.endpoints != vec!["/get", "/headers"] {
        return Err("Unexpected seed or endpoints".to_owned());
    }
    Ok(())
}

#[test]
fn parse_json_config() -> Result<(), String> {
    let (_dir, path) = write_config(
        "rampload.json",
        r#"{
  "base_url": "https://api.local",
  "stages": [ { "duration": "1m", "target": 3 } ],
  "headers": ["Authorization: Bearer t"],
  "output_format": "json"
}"#,
    )?;
    let file = load_config_file(&path).map_err(|err| err.to_string())?;
    let config = resolve_config(&args(&[])?, Some(&file)).map_err(|err| err.to_string())?;
    if config.output_format != OutputFormat::Json {
        return Err("Expected json output".to_owned());
    }
    if config.headers != vec![("Authorization".to_owned(), "Bearer t".to_owned())] {
        return Err(format!("Unexpected headers {:?}", config.headers));
    }
    Ok(())
}

#[test]
fn unknown_fields_and_extensions_are_rejected() -> Result<(), String> {
    let (_dir, path) = write_config("rampload.toml", "vus = 10\n")?;
    match load_config_file(&path) {
        Err(ConfigError::ParseToml { .. }) => {}
        other => return Err(format!("Expected ParseToml, got {:?}", other)),
    }
    let (_yaml_dir, yaml) = write_config("rampload.yaml", "base_url: x\n")?;
    match load_config_file(&yaml) {
        Err(ConfigError::UnsupportedExtension { ext }) if ext == "yaml" => Ok(()),
        other => Err(format!("Expected UnsupportedExtension, got {:?}", other)),
    }
}

#[test]
fn cli_overrides_config_file() -> Result<(), String> {
    let (_dir, path) = write_config(
        "rampload.toml",
        r#"
base_url = "http://from-file.local"
grace = "5s"
endpoints = ["/file"]
"#,
    )?;
    let file = load_config_file(&path).map_err(|err| err.to_string())?;
    let cli = args(&["-u", "http://from-cli.local", "-e", "/cli", "--grace", "2s"])?;
    let config = resolve_config(&cli, Some(&file)).map_err(|err| err.to_string())?;
    if config.base_url.as_str() != "http://from-cli.local/" {
        return Err(format!("Unexpected base url {}", config.base_url));
    }
    if config.endpoints != vec!["/cli"] || config.grace != Duration::from_secs(2) {
        return Err("CLI values must win".to_owned());
    }
    Ok(())
}

#[test]
fn defaults_apply_without_overrides() -> Result<(), String> {
    let cli = args(&["-u", DEFAULT_BASE_URL])?;
    let config = resolve_config(&cli, None).map_err(|err| err.to_string())?;
    let defaults = TestConfig::with_defaults(config.base_url.clone()).map_err(|err| err.to_string())?;
    if config.profile != defaults.profile
        || config.thresholds != defaults.thresholds
        || config.endpoints != defaults.endpoints
        || config.health_path != "/status/200"
    {
        return Err("Resolved config must equal built-in defaults".to_owned());
    }
    if config.request_timeout != Duration::from_secs(5) || config.tick != Duration::from_millis(250) {
        return Err("Unexpected timing defaults".to_owned());
    }
    Ok(())
}

#[test]
fn invalid_values_are_reported() -> Result<(), String> {
    match resolve_config(&args(&["-u", "ftp://files.local"])?, None) {
        Err(ConfigError::UnsupportedScheme { .. }) => {}
        other => return Err(format!("Expected UnsupportedScheme, got {:?}", other)),
    }
    let inverted = args(&["-u", DEFAULT_BASE_URL, "--think-min", "3s", "--think-max", "1s"])?;
    match resolve_config(&inverted, None) {
        Err(ConfigError::ThinkTimeInverted { .. }) => {}
        other => return Err(format!("Expected ThinkTimeInverted, got {:?}", other)),
    }
    let (_dir, path) = write_config(
        "rampload.toml",
        "[thresholds]\nhttp_req_failed = [\"p(95)<1\"]\n",
    )?;
    let file = load_config_file(&path).map_err(|err| err.to_string())?;
    match resolve_config(&args(&["-u", DEFAULT_BASE_URL])?, Some(&file)) {
        Err(ConfigError::InvalidThreshold { metric, .. }) if metric == "http_req_failed" => Ok(()),
        other => Err(format!("Expected InvalidThreshold, got {:?}", other)),
    }
}

#[test]
fn zero_stage_duration_in_file_is_rejected() -> Result<(), String> {
    let (_dir, path) = write_config(
        "rampload.toml",
        "[[stages]]\nduration = 0\ntarget = 1\n",
    )?;
    let file = load_config_file(&path).map_err(|err| err.to_string())?;
    match resolve_config(&args(&["-u", DEFAULT_BASE_URL])?, Some(&file)) {
        Err(ConfigError::InvalidDuration { field, .. }) if field == "stages[0].duration" => Ok(()),
        other => Err(format!("Expected InvalidDuration, got {:?}", other)),
    }
}
