use rand::Rng;
use url::Url;

use crate::error::ConfigError;

/// Non-empty, read-only list of target URLs.
#[derive(Debug, Clone)]
pub struct EndpointSet {
    urls: Vec<Url>,
}

impl EndpointSet {
    /// Resolve every path against `base`.
    ///
    /// # Errors
    ///
    /// Returns an error when `paths` is empty or a path does not form a
    /// valid URL.
    pub fn new(base: &Url, paths: &[String]) -> Result<Self, ConfigError> {
        if paths.is_empty() {
            return Err(ConfigError::NoEndpoints);
        }
        let urls = paths
            .iter()
            .map(|path| resolve_endpoint(base, path))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { urls })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Uniformly random endpoint. `None` only for an empty set, which
    /// [`EndpointSet::new`] never builds.
    pub fn pick<R>(&self, rng: &mut R) -> Option<&Url>
    where
        R: Rng + ?Sized,
    {
        if self.is_empty() {
            return None;
        }
        self.urls.get(rng.gen_range(0..self.urls.len()))
    }
}

/// Append `path` to the base URL text; absolute URLs are taken as-is.
///
/// # Errors
///
/// Returns an error when the combined text is not a valid URL.
pub fn resolve_endpoint(base: &Url, path: &str) -> Result<Url, ConfigError> {
    let trimmed = path.trim();
    let joined = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_owned()
    } else if trimmed.starts_with('/') {
        format!("{}{}", base.as_str().trim_end_matches('/'), trimmed)
    } else {
        format!("{}/{}", base.as_str().trim_end_matches('/'), trimmed)
    };
    Url::parse(&joined).map_err(|err| ConfigError::InvalidEndpoint {
        path: path.to_owned(),
        source: err,
    })
}
