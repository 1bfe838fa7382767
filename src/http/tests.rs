use std::io::{Read, Write};
use std::net::{Shutdown, TcpListener};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rand::SeedableRng;
use rand::rngs::StdRng;
use reqwest::header::{ACCEPT, HeaderMap, USER_AGENT};
use url::Url;

use super::client::classify;
use super::headers::{DEFAULT_ACCEPT, DEFAULT_USER_AGENT};
use super::*;
use crate::error::{TransportError, TransportErrorKind};
use crate::metrics::{MetricName, MetricsAggregator};

fn run_async_test<F>(future: F) -> Result<(), String>
where
    F: std::future::Future<Output = Result<(), String>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| format!("Failed to build runtime: {}", err))?;
    runtime.block_on(future)
}

fn base() -> Result<Url, String> {
    Url::parse("http://demo.dev.local").map_err(|err| err.to_string())
}

struct FixedExecutor {
    outcome: Result<RequestResult, TransportError>,
    calls: AtomicU64,
}

#[async_trait]
impl RequestExecutor for FixedExecutor {
    async fn get(&self, _url: &Url, _headers: &HeaderMap) -> Result<RequestResult, TransportError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.outcome.clone()
    }
}

#[test]
fn classify_prefers_timeout_and_body_flags() -> Result<(), String> {
    if classify(true, false, true, "operation timed out") != TransportErrorKind::Timeout {
        return Err("Expected timeout".to_owned());
    }
    if classify(false, true, false, "error decoding response body") != TransportErrorKind::Body {
        return Err("Expected body".to_owned());
    }
    Ok(())
}

#[test]
fn classify_reads_error_chain() -> Result<(), String> {
    let cases = [
        (
            "error sending request: client error (Connect): dns error: failed to lookup address information",
            TransportErrorKind::Dns,
        ),
        (
            "error sending request: invalid peer certificate: UnknownIssuer",
            TransportErrorKind::Tls,
        ),
        (
            "error sending request: tcp connect error: Connection refused (os error 111)",
            TransportErrorKind::Connect,
        ),
    ];
    for (chain, expected) in cases {
        let kind = classify(false, false, true, chain);
        if kind != expected {
            return Err(format!("'{}' classified as {}, expected {}", chain, kind, expected));
        }
    }
    if classify(false, false, false, "builder error") != TransportErrorKind::Other {
        return Err("Expected other".to_owned());
    }
    Ok(())
}

#[test]
fn fixed_headers_are_always_present() -> Result<(), String> {
    let headers = build_headers(&[("X-Trace".to_owned(), "abc".to_owned())])
        .map_err(|err| err.to_string())?;
    if headers.get(USER_AGENT).and_then(|value| value.to_str().ok()) != Some(DEFAULT_USER_AGENT) {
        return Err("Missing User-Agent".to_owned());
    }
    if headers.get(ACCEPT).and_then(|value| value.to_str().ok()) != Some(DEFAULT_ACCEPT) {
        return Err("Missing Accept".to_owned());
    }
    if headers.get("x-trace").and_then(|value| value.to_str().ok()) != Some("abc") {
        return Err("Missing extra header".to_owned());
    }
    Ok(())
}

#[test]
fn user_headers_override_defaults() -> Result<(), String> {
    let headers = build_headers(&[("Accept".to_owned(), "text/plain".to_owned())])
        .map_err(|err| err.to_string())?;
    if headers.get(ACCEPT).and_then(|value| value.to_str().ok()) != Some("text/plain") {
        return Err("Expected Accept override".to_owned());
    }
    Ok(())
}

#[test]
fn invalid_header_name_is_rejected() -> Result<(), String> {
    if build_headers(&[("bad header".to_owned(), "x".to_owned())]).is_ok() {
        return Err("Expected invalid header name error".to_owned());
    }
    Ok(())
}

#[test]
fn endpoints_append_to_base_path() -> Result<(), String> {
    let base = Url::parse("http://demo.dev.local/api/").map_err(|err| err.to_string())?;
    let url = resolve_endpoint(&base, "/status/200").map_err(|err| err.to_string())?;
    if url.as_str() != "http://demo.dev.local/api/status/200" {
        return Err(format!("Unexpected url {}", url));
    }
    let relative = resolve_endpoint(&base, "get").map_err(|err| err.to_string())?;
    if relative.as_str() != "http://demo.dev.local/api/get" {
        return Err(format!("Unexpected url {}", relative));
    }
    let absolute =
        resolve_endpoint(&base, "https://other.local/x").map_err(|err| err.to_string())?;
    if absolute.as_str() != "https://other.local/x" {
        return Err(format!("Unexpected url {}", absolute));
    }
    Ok(())
}

#[test]
fn empty_endpoint_set_is_rejected() -> Result<(), String> {
    if EndpointSet::new(&base()?, &[]).is_ok() {
        return Err("Expected NoEndpoints".to_owned());
    }
    let set = EndpointSet::new(&base()?, &["/get".to_owned()]).map_err(|err| err.to_string())?;
    if set.is_empty() || set.len() != 1 {
        return Err(format!("Expected one endpoint, got {}", set.len()));
    }
    Ok(())
}

#[test]
fn seeded_pick_is_deterministic_and_covers_set() -> Result<(), String> {
    let paths: Vec<String> = ["/a", "/b", "/c"].iter().map(|p| (*p).to_owned()).collect();
    let set = EndpointSet::new(&base()?, &paths).map_err(|err| err.to_string())?;

    let draw = |seed: u64| -> Vec<String> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..64)
            .filter_map(|_| set.pick(&mut rng).map(|url| url.path().to_owned()))
            .collect()
    };
    let first = draw(7);
    if first != draw(7) {
        return Err("Same seed must pick the same sequence".to_owned());
    }
    for path in &paths {
        if !first.contains(path) {
            return Err(format!("{} never picked in 64 draws", path));
        }
    }
    Ok(())
}

#[test]
fn execute_and_record_counts_transport_errors() -> Result<(), String> {
    run_async_test(async {
        let metrics = MetricsAggregator::new(1).map_err(|err| err.to_string())?;
        let executor = FixedExecutor {
            outcome: Err(TransportError::new(
                TransportErrorKind::Connect,
                "connection refused".to_owned(),
                Duration::from_millis(3),
            )),
            calls: AtomicU64::new(0),
        };
        let url = base()?;
        let result = execute_and_record(&executor, &url, &HeaderMap::new(), &metrics, 0).await;
        if result.is_ok() {
            return Err("Expected transport error".to_owned());
        }
        if metrics.count(MetricName::HttpReqDuration) != 1
            || metrics.count(MetricName::HttpReqs) != 1
        {
            return Err("Transport error must still record latency and count".to_owned());
        }
        if (metrics.rate(MetricName::HttpReqFailed) - 1.0).abs() > f64::EPSILON {
            return Err("Transport error must count as failed".to_owned());
        }
        Ok(())
    })
}

#[test]
fn execute_and_record_flags_error_statuses() -> Result<(), String> {
    run_async_test(async {
        let metrics = MetricsAggregator::new(1).map_err(|err| err.to_string())?;
        let url = base()?;
        for status in [200_u16, 302, 404, 500] {
            let executor = FixedExecutor {
                outcome: Ok(RequestResult {
                    status,
                    duration: Duration::from_millis(5),
                    body_bytes: 2,
                }),
                calls: AtomicU64::new(0),
            };
            let _recorded = execute_and_record(&executor, &url, &HeaderMap::new(), &metrics, 0)
                .await
                .map_err(|err| err.to_string())?;
        }
        let rate = metrics.rate(MetricName::HttpReqFailed);
        if (rate - 0.5).abs() > f64::EPSILON {
            return Err(format!("Expected failed rate 0.5, got {}", rate));
        }
        Ok(())
    })
}

fn spawn_one_shot_server(response: &'static [u8]) -> Result<String, String> {
    let listener =
        TcpListener::bind("127.0.0.1:0").map_err(|err| format!("bind failed: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("addr failed: {}", err))?;
    std::thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut buffer = [0_u8; 1024];
            if stream.read(&mut buffer).is_ok() && stream.write_all(response).is_ok() {
                drop(stream.flush());
            }
            drop(stream.shutdown(Shutdown::Both));
        }
    });
    Ok(format!("http://{}", addr))
}

#[test]
fn reqwest_executor_reads_status_and_body() -> Result<(), String> {
    run_async_test(async {
        let base_url = spawn_one_shot_server(
            b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok",
        )?;
        let url = Url::parse(&base_url).map_err(|err| err.to_string())?;
        let executor = ReqwestExecutor::new(Duration::from_secs(5), Duration::from_secs(5))
            .map_err(|err| err.to_string())?;
        let headers = build_headers(&[]).map_err(|err| err.to_string())?;
        let result = executor
            .get(&url, &headers)
            .await
            .map_err(|err| err.to_string())?;
        if result.status != 200 || result.body_bytes != 2 {
            return Err(format!("Unexpected result {:?}", result));
        }
        Ok(())
    })
}

#[test]
fn reqwest_executor_classifies_refused_connection() -> Result<(), String> {
    run_async_test(async {
        let listener =
            TcpListener::bind("127.0.0.1:0").map_err(|err| format!("bind failed: {}", err))?;
        let addr = listener
            .local_addr()
            .map_err(|err| format!("addr failed: {}", err))?;
        drop(listener);

        let url = Url::parse(&format!("http://{}", addr)).map_err(|err| err.to_string())?;
        let executor = ReqwestExecutor::new(Duration::from_secs(2), Duration::from_secs(2))
            .map_err(|err| err.to_string())?;
        match executor.get(&url, &HeaderMap::new()).await {
            Ok(result) => Err(format!("Expected failure, got {:?}", result)),
            Err(err) if err.kind == TransportErrorKind::Connect => Ok(()),
            Err(err) => Err(format!("Expected connect error, got {}", err)),
        }
    })
}

#[test]
fn transport_tally_counts_only_seen_kinds() -> Result<(), String> {
    let tally = TransportTally::default();
    for kind in [
        TransportErrorKind::Timeout,
        TransportErrorKind::Timeout,
        TransportErrorKind::Dns,
    ] {
        tally.record(&TransportError::new(
            kind,
            "failed".to_owned(),
            Duration::from_millis(1),
        ));
    }
    let counts = tally.counts();
    let expected = vec![
        TransportErrorCount {
            kind: TransportErrorKind::Timeout,
            count: 2,
        },
        TransportErrorCount {
            kind: TransportErrorKind::Dns,
            count: 1,
        },
    ];
    if counts != expected {
        return Err(format!("Unexpected tally {:?}", counts));
    }
    Ok(())
}
