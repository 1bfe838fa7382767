use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::HeaderMap;
use tokio::time::Instant;
use url::Url;

use crate::error::{HttpError, TransportError, TransportErrorKind};

use super::{RequestExecutor, RequestResult};

const DNS_MARKERS: [&str; 4] = [
    "dns error",
    "failed to lookup address",
    "name or service not known",
    "no such host",
];
const TLS_MARKERS: [&str; 4] = ["certificate", "tls", "ssl", "handshake"];

/// `reqwest`-backed executor sharing one connection pool across all VUs.
#[derive(Debug, Clone)]
pub struct ReqwestExecutor {
    client: Client,
}

impl ReqwestExecutor {
    /// Build the client with a per-request and a connect timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying client cannot be built.
    pub fn new(request_timeout: Duration, connect_timeout: Duration) -> Result<Self, HttpError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout.min(request_timeout))
            .build()
            .map_err(|err| HttpError::BuildClientFailed { source: err })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl RequestExecutor for ReqwestExecutor {
    async fn get(&self, url: &Url, headers: &HeaderMap) -> Result<RequestResult, TransportError> {
        let start = Instant::now();
        let response = self
            .client
            .get(url.clone())
            .headers(headers.clone())
            .send()
            .await
            .map_err(|err| transport_error(&err, start.elapsed()))?;
        let status = response.status().as_u16();
        let body_bytes = drain_response_body(response)
            .await
            .map_err(|err| transport_error(&err, start.elapsed()))?;
        Ok(RequestResult {
            status,
            duration: start.elapsed(),
            body_bytes,
        })
    }
}

async fn drain_response_body(response: reqwest::Response) -> Result<u64, reqwest::Error> {
    let mut stream = response.bytes_stream();
    let mut total_bytes: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let bytes = chunk?;
        total_bytes = total_bytes.saturating_add(u64::try_from(bytes.len()).unwrap_or(u64::MAX));
    }
    Ok(total_bytes)
}

fn transport_error(err: &reqwest::Error, duration: Duration) -> TransportError {
    let chain = error_chain(err);
    let kind = classify(err.is_timeout(), err.is_body() || err.is_decode(), err.is_connect(), &chain);
    TransportError::new(kind, chain, duration)
}

fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Map reqwest's coarse flags plus the error chain text to a kind.
pub(super) fn classify(
    timed_out: bool,
    body: bool,
    connect: bool,
    chain: &str,
) -> TransportErrorKind {
    if timed_out {
        return TransportErrorKind::Timeout;
    }
    if body {
        return TransportErrorKind::Body;
    }
    let text = chain.to_ascii_lowercase();
    if DNS_MARKERS.iter().any(|marker| text.contains(marker)) {
        return TransportErrorKind::Dns;
    }
    if TLS_MARKERS.iter().any(|marker| text.contains(marker)) {
        return TransportErrorKind::Tls;
    }
    if connect {
        return TransportErrorKind::Connect;
    }
    TransportErrorKind::Other
}
