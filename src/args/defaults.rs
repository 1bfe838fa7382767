use std::time::Duration;

use crate::metrics::MetricName;
use crate::scheduler::Stage;

pub const DEFAULT_BASE_URL: &str = "http://demo.dev.local";
pub const DEFAULT_HEALTH_PATH: &str = "/status/200";
pub const DEFAULT_ENDPOINTS: [&str; 5] = ["/status/200", "/get", "/post", "/headers", "/user-agent"];
pub const DEFAULT_THRESHOLDS: [(MetricName, &str); 3] = [
    (MetricName::HttpReqDuration, "p(95)<500"),
    (MetricName::HttpReqFailed, "rate<0.1"),
    (MetricName::Errors, "rate<0.1"),
];
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_secs(10);

/// (duration seconds, target VUs)
const DEFAULT_STAGES: [(u64, u64); 6] = [
    (120, 10),
    (300, 10),
    (120, 50),
    (300, 50),
    (120, 100),
    (120, 0),
];

#[must_use]
pub fn default_stages() -> Vec<Stage> {
    DEFAULT_STAGES
        .iter()
        .map(|(secs, target)| Stage::new(Duration::from_secs(*secs), *target))
        .collect()
}

#[must_use]
pub fn default_endpoints() -> Vec<String> {
    DEFAULT_ENDPOINTS.iter().map(|path| (*path).to_owned()).collect()
}
