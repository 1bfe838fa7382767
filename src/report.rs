//! End-of-run summary: text lines for the terminal and a JSON document for
//! `--summary-export`.
use std::path::Path;

use serde::Serialize;

use crate::error::AppResult;
use crate::metrics::{MetricValue, MetricsSnapshot};
use crate::orchestrator::{RunReport, TestState, Verdict};
use crate::thresholds::ThresholdOutcome;
use crate::vu::CheckCount;

const PERCENTILES: [f64; 4] = [50.0, 90.0, 95.0, 99.0];

#[derive(Debug, Serialize)]
pub struct JsonSummary {
    pub base_url: String,
    pub seed: u64,
    pub verdict: String,
    pub passed: bool,
    pub exit_code: u8,
    pub duration_ms: u128,
    pub states: Vec<&'static str>,
    pub peak_vus: u64,
    pub scheduler_anomalies: u64,
    pub metrics: Vec<JsonMetric>,
    pub checks: Vec<JsonCheck>,
    pub transport_errors: Vec<JsonTransportError>,
    pub thresholds: Vec<JsonThreshold>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum JsonMetric {
    Trend {
        name: &'static str,
        count: u64,
        avg: f64,
        min: f64,
        med: f64,
        max: f64,
        p90: f64,
        p95: f64,
        p99: f64,
    },
    Rate {
        name: &'static str,
        rate: f64,
        passes: u64,
        fails: u64,
    },
    Counter {
        name: &'static str,
        count: u64,
        per_second: f64,
    },
    Gauge {
        name: &'static str,
        value: u64,
    },
}

#[derive(Debug, Serialize)]
pub struct JsonCheck {
    pub name: &'static str,
    pub passes: u64,
    pub fails: u64,
}

#[derive(Debug, Serialize)]
pub struct JsonTransportError {
    pub kind: &'static str,
    pub count: u64,
}

#[derive(Debug, Serialize)]
pub struct JsonThreshold {
    pub metric: &'static str,
    pub expression: String,
    pub observed: f64,
    pub bound: f64,
    pub margin: f64,
    pub passed: bool,
}

impl JsonSummary {
    #[must_use]
    pub fn from_report(report: &RunReport) -> Self {
        Self {
            base_url: report.base_url.to_string(),
            seed: report.seed,
            verdict: report
                .verdict()
                .map_or_else(|| "incomplete".to_owned(), Verdict::to_string),
            passed: report.verdict().is_some_and(Verdict::is_pass),
            exit_code: report.exit_code(),
            duration_ms: report.duration.as_millis(),
            states: report.history.iter().map(TestState::name).collect(),
            peak_vus: report.peak_vus,
            scheduler_anomalies: report.anomalies,
            metrics: json_metrics(&report.snapshot),
            checks: report.checks.iter().map(json_check).collect(),
            transport_errors: report
                .transport_errors
                .iter()
                .map(|count| JsonTransportError {
                    kind: count.kind.as_str(),
                    count: count.count,
                })
                .collect(),
            thresholds: report.thresholds.iter().map(json_threshold).collect(),
        }
    }
}

fn json_metrics(snapshot: &MetricsSnapshot) -> Vec<JsonMetric> {
    snapshot
        .iter()
        .map(|(metric, value)| {
            let name = metric.as_str();
            match value {
                MetricValue::Trend(trend) => JsonMetric::Trend {
                    name,
                    count: trend.count(),
                    avg: trend.avg(),
                    min: trend.min(),
                    med: trend.med(),
                    max: trend.max(),
                    p90: trend.percentile(90.0),
                    p95: trend.percentile(95.0),
                    p99: trend.percentile(99.0),
                },
                MetricValue::Rate(rate) => JsonMetric::Rate {
                    name,
                    rate: rate.rate(),
                    passes: rate.hits,
                    fails: rate.misses(),
                },
                MetricValue::Counter(counter) => JsonMetric::Counter {
                    name,
                    count: counter.count,
                    per_second: counter.per_second,
                },
                MetricValue::Gauge(gauge) => JsonMetric::Gauge {
                    name,
                    value: gauge.value,
                },
            }
        })
        .collect()
}

const fn json_check(count: &CheckCount) -> JsonCheck {
    JsonCheck {
        name: count.check.name(),
        passes: count.passes,
        fails: count.fails,
    }
}

fn json_threshold(outcome: &ThresholdOutcome) -> JsonThreshold {
    JsonThreshold {
        metric: outcome.metric.as_str(),
        expression: outcome.source.clone(),
        observed: outcome.observed,
        bound: outcome.bound,
        margin: outcome.margin,
        passed: outcome.passed,
    }
}

/// Human-readable summary, one line per entry.
#[must_use]
pub fn summary_lines(report: &RunReport) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(format!("Target: {}", report.base_url));
    lines.push(format!(
        "Duration: {:.1}s  Peak VUs: {}  Seed: {}",
        report.duration.as_secs_f64(),
        report.peak_vus,
        report.seed
    ));

    if report
        .checks
        .iter()
        .any(|count| count.passes > 0 || count.fails > 0)
    {
        lines.push("Checks:".to_owned());
        for count in &report.checks {
            let mark = if count.fails == 0 { "ok" } else { "FAIL" };
            lines.push(format!(
                "  [{}] {}: {} passed / {} failed",
                mark,
                count.check.name(),
                count.passes,
                count.fails
            ));
        }
    }

    if !report.transport_errors.is_empty() {
        let kinds: Vec<String> = report
            .transport_errors
            .iter()
            .map(|count| format!("{}={}", count.kind, count.count))
            .collect();
        lines.push(format!("Transport errors: {}", kinds.join(" ")));
    }

    lines.push("Metrics:".to_owned());
    for (metric, value) in report.snapshot.iter() {
        lines.push(format!("  {}: {}", metric, describe_metric(value)));
    }

    if !report.thresholds.is_empty() {
        lines.push("Thresholds:".to_owned());
        for outcome in &report.thresholds {
            let mark = if outcome.passed { "ok" } else { "FAIL" };
            lines.push(format!(
                "  [{}] {}: {} (observed {:.4}, margin {:+.4})",
                mark, outcome.metric, outcome.source, outcome.observed, outcome.margin
            ));
        }
    }

    if report.anomalies > 0 {
        lines.push(format!(
            "Scheduler anomalies: {} VU(s) force-stopped after the grace period",
            report.anomalies
        ));
    }
    lines.push(format!(
        "Result: {}",
        report
            .verdict()
            .map_or_else(|| "incomplete".to_owned(), Verdict::to_string)
    ));
    lines
}

fn describe_metric(value: &MetricValue) -> String {
    match value {
        MetricValue::Trend(trend) => {
            let percentiles: Vec<String> = PERCENTILES
                .iter()
                .map(|p| format!("p({})={:.2}ms", p, trend.percentile(*p)))
                .collect();
            format!(
                "count={} avg={:.2}ms min={:.2}ms max={:.2}ms {}",
                trend.count(),
                trend.avg(),
                trend.min(),
                trend.max(),
                percentiles.join(" ")
            )
        }
        MetricValue::Rate(rate) => format!(
            "{:.2}% ({} of {})",
            rate.rate() * 100.0,
            rate.hits,
            rate.total
        ),
        MetricValue::Counter(counter) => {
            format!("{} ({:.2}/s)", counter.count, counter.per_second)
        }
        MetricValue::Gauge(gauge) => gauge.value.to_string(),
    }
}

/// # Errors
///
/// Returns an error when the summary cannot be serialized.
pub fn render_json(report: &RunReport) -> AppResult<String> {
    Ok(serde_json::to_string_pretty(&JsonSummary::from_report(report))?)
}

/// Write the JSON summary to `path`.
///
/// # Errors
///
/// Returns an error when serialization or the file write fails.
pub async fn export_summary(path: &Path, report: &RunReport) -> AppResult<()> {
    let json = render_json(report)?;
    tokio::fs::write(path, json).await?;
    Ok(())
}
