use std::fmt;

use crate::error::ThresholdError;
use crate::metrics::{MetricKind, MetricName};

/// Statistic a threshold compares against its bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Aggregation {
    /// `p(N)`, N in (0, 100].
    Percentile(f64),
    Avg,
    Min,
    Max,
    Med,
    Rate,
    Count,
    Value,
}

impl Aggregation {
    fn parse(text: &str, expr: &str) -> Result<Self, ThresholdError> {
        match text {
            "avg" => Ok(Aggregation::Avg),
            "min" => Ok(Aggregation::Min),
            "max" => Ok(Aggregation::Max),
            "med" => Ok(Aggregation::Med),
            "rate" => Ok(Aggregation::Rate),
            "count" => Ok(Aggregation::Count),
            "value" => Ok(Aggregation::Value),
            other => {
                let Some(inner) = other
                    .strip_prefix("p(")
                    .and_then(|rest| rest.strip_suffix(')'))
                else {
                    return Err(ThresholdError::UnknownAggregation {
                        name: other.to_owned(),
                        expr: expr.to_owned(),
                    });
                };
                let invalid = || ThresholdError::InvalidPercentile {
                    value: inner.to_owned(),
                    expr: expr.to_owned(),
                };
                let value: f64 = inner.trim().parse().map_err(|_err| invalid())?;
                if !(value > 0.0 && value <= 100.0) {
                    return Err(invalid());
                }
                Ok(Aggregation::Percentile(value))
            }
        }
    }

    const fn supports(self, kind: MetricKind) -> bool {
        match kind {
            MetricKind::Trend => matches!(
                self,
                Aggregation::Percentile(_)
                    | Aggregation::Avg
                    | Aggregation::Min
                    | Aggregation::Max
                    | Aggregation::Med
                    | Aggregation::Count
            ),
            MetricKind::Rate | MetricKind::Counter => {
                matches!(self, Aggregation::Rate | Aggregation::Count)
            }
            MetricKind::Gauge => matches!(self, Aggregation::Value),
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Aggregation::Percentile(p) => write!(f, "p({})", p),
            Aggregation::Avg => f.write_str("avg"),
            Aggregation::Min => f.write_str("min"),
            Aggregation::Max => f.write_str("max"),
            Aggregation::Med => f.write_str("med"),
            Aggregation::Rate => f.write_str("rate"),
            Aggregation::Count => f.write_str("count"),
            Aggregation::Value => f.write_str("value"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl Comparison {
    // Two-character operators first so `<=` is not read as `<`.
    const TOKENS: [(&'static str, Comparison); 6] = [
        ("<=", Comparison::Le),
        (">=", Comparison::Ge),
        ("==", Comparison::Eq),
        ("!=", Comparison::Ne),
        ("<", Comparison::Lt),
        (">", Comparison::Gt),
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Comparison::Lt => "<",
            Comparison::Le => "<=",
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
            Comparison::Eq => "==",
            Comparison::Ne => "!=",
        }
    }

    #[must_use]
    pub fn holds(self, observed: f64, bound: f64) -> bool {
        let equal = (observed - bound).abs() <= f64::EPSILON;
        match self {
            Comparison::Lt => observed < bound,
            Comparison::Le => observed < bound || equal,
            Comparison::Gt => observed > bound,
            Comparison::Ge => observed > bound || equal,
            Comparison::Eq => equal,
            Comparison::Ne => !equal,
        }
    }

    /// Distance to the bound on the passing side; negative when failing.
    #[must_use]
    pub fn margin(self, observed: f64, bound: f64) -> f64 {
        match self {
            Comparison::Lt | Comparison::Le => bound - observed,
            Comparison::Gt | Comparison::Ge => observed - bound,
            Comparison::Eq => -(observed - bound).abs(),
            Comparison::Ne => (observed - bound).abs(),
        }
    }
}

/// Pass/fail criterion on one metric, e.g. `http_req_duration: p(95)<500`.
#[derive(Debug, Clone, PartialEq)]
pub struct Threshold {
    pub metric: MetricName,
    pub source: String,
    pub aggregation: Aggregation,
    pub comparison: Comparison,
    pub bound: f64,
}

impl Threshold {
    /// Parse `<aggregation> <op> <number>` for `metric`.
    ///
    /// # Errors
    ///
    /// Returns an error when the expression is malformed or the aggregation
    /// does not apply to the metric's kind.
    pub fn parse(metric: MetricName, expr: &str) -> Result<Self, ThresholdError> {
        let source = expr.trim();
        if source.is_empty() {
            return Err(ThresholdError::Empty);
        }
        let op_start = source
            .find(['<', '>', '=', '!'])
            .ok_or_else(|| ThresholdError::MissingOperator {
                expr: source.to_owned(),
            })?;
        let lhs = source.get(..op_start).unwrap_or_default().trim();
        let rest = source.get(op_start..).unwrap_or_default();
        let (token, comparison) = Comparison::TOKENS
            .iter()
            .find(|(token, _)| rest.starts_with(token))
            .copied()
            .ok_or_else(|| ThresholdError::MissingOperator {
                expr: source.to_owned(),
            })?;
        let rhs = rest.get(token.len()..).unwrap_or_default().trim();

        let aggregation = Aggregation::parse(lhs, source)?;
        let bound: f64 = rhs.parse().map_err(|_err| ThresholdError::InvalidBound {
            value: rhs.to_owned(),
            expr: source.to_owned(),
        })?;
        if !bound.is_finite() {
            return Err(ThresholdError::InvalidBound {
                value: rhs.to_owned(),
                expr: source.to_owned(),
            });
        }
        if !aggregation.supports(metric.kind()) {
            return Err(ThresholdError::UnsupportedAggregation {
                aggregation: aggregation.to_string(),
                kind: metric.kind().as_str(),
                metric: metric.as_str().to_owned(),
            });
        }

        Ok(Self {
            metric,
            source: source.to_owned(),
            aggregation,
            comparison,
            bound,
        })
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.metric, self.source)
    }
}
