//! Storefront configuration.
//!
//! Read from the environment (and a `.env` file, when present):
//!
//! | Variable | Default |
//! |---|---|
//! | `CASAROJA_API_URL` | `http://127.0.0.1:8001/api` |
//! | `CASAROJA_API_TIMEOUT_MS` | `10000` |
//! | `CASAROJA_STATE_DIR` | `.casaroja` |

use casaroja_client::ApiConfig;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// State directory used when `CASAROJA_STATE_DIR` is not set.
pub const DEFAULT_STATE_DIR: &str = ".casaroja";

/// Configuration error
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed
    #[error("invalid value for {var}: {value}")]
    Invalid {
        /// Variable name
        var: &'static str,
        /// Offending value
        value: String,
    },

    /// Configuration validation failed
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

/// Everything the storefront needs to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorefrontConfig {
    /// Backend connection
    pub api: ApiConfig,
    /// Where tokens and the session snapshot are kept
    pub state_dir: PathBuf,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
        }
    }
}

impl StorefrontConfig {
    /// Load `.env` if present, then read the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env"),
            Err(error) if error.not_found() => {},
            Err(error) => tracing::warn!(%error, "Ignoring unreadable .env"),
        }
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Build from `lookup`, which maps a variable name to its value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to an unusable value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = lookup("CASAROJA_API_URL") {
            config.api = config.api.with_base_url(url);
        }

        if let Some(value) = lookup("CASAROJA_API_TIMEOUT_MS") {
            let millis: u64 = value.trim().parse().map_err(|_| ConfigError::Invalid {
                var: "CASAROJA_API_TIMEOUT_MS",
                value: value.clone(),
            })?;
            config.api = config.api.with_timeout(Duration::from_millis(millis));
        }

        if let Some(dir) = lookup("CASAROJA_STATE_DIR") {
            config.state_dir = PathBuf::from(dir);
        }

        config.validate()?;
        Ok(config)
    }

    /// Replace the backend base URL.
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api = self.api.with_base_url(url);
        self
    }

    /// Replace the state directory.
    #[must_use]
    pub fn with_state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.state_dir = dir.into();
        self
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for an unusable URL, a zero
    /// timeout or an empty state directory.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = &self.api.base_url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Validation(format!(
                "API URL must start with http:// or https://, got {url:?}"
            )));
        }
        if self.api.timeout.is_zero() {
            return Err(ConfigError::Validation("API timeout must be positive".to_string()));
        }
        if self.state_dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation("state directory must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = StorefrontConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.api.base_url, "http://127.0.0.1:8001/api");
        assert_eq!(config.api.timeout, Duration::from_millis(10_000));
        assert_eq!(config.state_dir, PathBuf::from(".casaroja"));
    }

    #[test]
    fn variables_override_defaults() {
        let config = StorefrontConfig::from_lookup(lookup(&[
            ("CASAROJA_API_URL", "https://api.casaroja.cl/api/"),
            ("CASAROJA_API_TIMEOUT_MS", "2500"),
            ("CASAROJA_STATE_DIR", "/tmp/casaroja"),
        ]))
        .unwrap();
        assert_eq!(config.api.base_url, "https://api.casaroja.cl/api");
        assert_eq!(config.api.timeout, Duration::from_millis(2500));
        assert_eq!(config.state_dir, PathBuf::from("/tmp/casaroja"));
    }

    #[test]
    fn bad_timeout_is_an_error() {
        let err = StorefrontConfig::from_lookup(lookup(&[("CASAROJA_API_TIMEOUT_MS", "soon")]))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                var: "CASAROJA_API_TIMEOUT_MS",
                value: "soon".to_string()
            }
        );
    }

    #[test]
    fn non_http_url_fails_validation() {
        let err = StorefrontConfig::from_lookup(lookup(&[("CASAROJA_API_URL", "ftp://x")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn zero_timeout_fails_validation() {
        let err = StorefrontConfig::from_lookup(lookup(&[("CASAROJA_API_TIMEOUT_MS", "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }
}
