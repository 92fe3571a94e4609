//! Connection settings for the backend API.

use std::env;
use std::time::Duration;

/// Base URL used when `CASAROJA_API_URL` is not set.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8001/api";

/// Per-request timeout used when `CASAROJA_API_TIMEOUT_MS` is not set.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Where the backend lives and how long a request may take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to (no trailing slash)
    pub base_url: String,
    /// Fixed timeout applied to every request
    pub timeout: Duration,
}

impl ApiConfig {
    /// Create a config for `base_url` with the default timeout.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize(base_url.into()),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Load from `CASAROJA_API_URL` and `CASAROJA_API_TIMEOUT_MS`, falling
    /// back to the defaults for unset or unparsable values.
    #[must_use]
    pub fn from_env() -> Self {
        let base_url =
            env::var("CASAROJA_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let timeout = env::var("CASAROJA_API_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map_or(DEFAULT_TIMEOUT, Duration::from_millis);

        Self::new(base_url).with_timeout(timeout)
    }

    /// Replace the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = normalize(base_url.into());
        self
    }

    /// Replace the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Join an endpoint path onto the base URL.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

fn normalize(mut base_url: String) -> String {
    while base_url.ends_with('/') {
        base_url.pop();
    }
    base_url
}
