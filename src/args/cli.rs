use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::scheduler::Stage;
use crate::thresholds::Threshold;

use super::parsers::{parse_duration_arg, parse_header, parse_stage, parse_threshold_arg};
use super::types::OutputFormat;

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Stage-driven HTTP load generator: ramps virtual users through timed stages, aggregates latency and error metrics, and gates the run on thresholds."
)]
pub struct RunArgs {
    /// Base URL of the system under test (default http://demo.dev.local)
    #[arg(long = "base-url", short = 'u', env = "BASE_URL")]
    pub base_url: Option<String>,

    /// Endpoint path picked at random each iteration (repeatable; replaces the default set)
    #[arg(long = "endpoint", short = 'e')]
    pub endpoints: Vec<String>,

    /// Path probed once before the load starts
    #[arg(long = "health-path")]
    pub health_path: Option<String>,

    /// Ramp stage as DURATION:TARGET, e.g. 2m:10 (repeatable; replaces the default profile)
    #[arg(long = "stage", short = 's', value_parser = parse_stage)]
    pub stages: Vec<Stage>,

    /// Threshold as METRIC:EXPR, e.g. 'http_req_duration:p(95)<500' (repeatable; replaces the defaults)
    #[arg(long = "threshold", value_parser = parse_threshold_arg)]
    pub thresholds: Vec<Threshold>,

    /// HTTP headers in 'Key: Value' format (repeatable)
    #[arg(long = "header", short = 'H', value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Minimum think time between iterations (supports ms/s/m/h)
    #[arg(long = "think-min", value_parser = parse_duration_arg)]
    pub think_min: Option<Duration>,

    /// Maximum think time between iterations, exclusive (supports ms/s/m/h)
    #[arg(long = "think-max", value_parser = parse_duration_arg)]
    pub think_max: Option<Duration>,

    /// Per-request timeout (supports ms/s/m/h)
    #[arg(long = "timeout", value_parser = parse_duration_arg)]
    pub timeout: Option<Duration>,

    /// Scheduler reconcile interval (supports ms/s/m/h)
    #[arg(long = "tick", value_parser = parse_duration_arg)]
    pub tick: Option<Duration>,

    /// How long stopping VUs may take before they are aborted (supports ms/s/m/h)
    #[arg(long = "grace", value_parser = parse_duration_arg)]
    pub grace: Option<Duration>,

    /// Interval between live progress log lines (supports ms/s/m/h)
    #[arg(long = "progress-interval", value_parser = parse_duration_arg)]
    pub progress_interval: Option<Duration>,

    /// Seed for endpoint picks and think times; random when omitted
    #[arg(long = "seed")]
    pub seed: Option<u64>,

    /// Write the JSON summary to this path
    #[arg(long = "summary-export")]
    pub summary_export: Option<PathBuf>,

    /// Summary format printed to stdout
    #[arg(long = "output-format", value_enum, ignore_case = true)]
    pub output_format: Option<OutputFormat>,

    /// Enable debug logging
    #[arg(long, short)]
    pub verbose: bool,

    /// Disable ANSI colors in log output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Path to a TOML or JSON config file (defaults to ./rampload.toml or ./rampload.json)
    #[arg(long, short)]
    pub config: Option<PathBuf>,
}
