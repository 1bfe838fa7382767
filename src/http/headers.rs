use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue, USER_AGENT};

use crate::error::HttpError;

pub(crate) const DEFAULT_USER_AGENT: &str = concat!("rampload/", env!("CARGO_PKG_VERSION"));
pub(crate) const DEFAULT_ACCEPT: &str = "application/json";

/// Fixed headers sent with every iteration request.
///
/// `User-Agent` and `Accept` are always present; user headers are applied
/// afterwards and replace them when they share a name.
///
/// # Errors
///
/// Returns an error when a header name or value is not valid HTTP.
pub fn build_headers(extra: &[(String, String)]) -> Result<HeaderMap, HttpError> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
    headers.insert(ACCEPT, HeaderValue::from_static(DEFAULT_ACCEPT));
    for (key, value) in extra {
        let name = HeaderName::from_bytes(key.as_bytes()).map_err(|err| {
            HttpError::InvalidHeaderName {
                name: key.clone(),
                source: err,
            }
        })?;
        let val = HeaderValue::from_str(value).map_err(|err| HttpError::InvalidHeaderValue {
            name: key.clone(),
            source: err,
        })?;
        headers.insert(name, val);
    }
    Ok(headers)
}
