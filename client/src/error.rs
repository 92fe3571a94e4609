//! Error types for the API client and local storage

use serde_json::Value;
use thiserror::Error;

/// The uniform failure shape every API call returns.
///
/// `status` is 0 when no HTTP response arrived (connection refused,
/// timeout). Otherwise it is the response status and `data` holds the
/// decoded body, if any.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ApiError {
    /// Human-readable message
    pub message: String,
    /// HTTP status, or 0 for network failures
    pub status: u16,
    /// Response body, when one was received
    pub data: Option<Value>,
}

/// Coarse classification of an [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// No response: unreachable host or timeout
    Network,
    /// 401
    Unauthorized,
    /// 429
    RateLimited,
    /// Any other 4xx
    Client,
    /// 5xx
    Server,
    /// A successful response whose body did not decode
    Decode,
}

impl ApiError {
    /// A failure that never produced an HTTP response.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: 0,
            data: None,
        }
    }

    /// An HTTP error response.
    ///
    /// The message comes from the body's `message` field, then `detail`,
    /// then falls back to `HTTP error <status>`.
    #[must_use]
    pub fn from_response(status: u16, data: Option<Value>) -> Self {
        let message = data
            .as_ref()
            .and_then(|body| text_field(body, "message").or_else(|| text_field(body, "detail")))
            .unwrap_or_else(|| format!("HTTP error {status}"));

        Self {
            message,
            status,
            data,
        }
    }

    /// A successful response that could not be decoded into the expected type.
    #[must_use]
    pub fn decode(status: u16, error: &serde_json::Error) -> Self {
        Self {
            message: format!("invalid response body: {error}"),
            status,
            data: None,
        }
    }

    /// Classify by status.
    #[must_use]
    pub const fn kind(&self) -> ApiErrorKind {
        match self.status {
            0 => ApiErrorKind::Network,
            401 => ApiErrorKind::Unauthorized,
            429 => ApiErrorKind::RateLimited,
            400..=499 => ApiErrorKind::Client,
            500..=599 => ApiErrorKind::Server,
            _ => ApiErrorKind::Decode,
        }
    }

    /// Whether the status is in the 4xx range.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self.status, 400..=499)
    }
}

fn text_field(body: &Value, key: &str) -> Option<String> {
    body.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

/// Errors from a [`crate::storage::KeyValueStorage`] backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the underlying medium failed
    #[error("storage I/O failed for key {key}: {source}")]
    Io {
        /// Key being accessed
        key: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A stored value did not (de)serialize
    #[error("stored value for key {key} is invalid: {source}")]
    Serialization {
        /// Key being accessed
        key: String,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },

    /// Key contains characters the backend cannot store
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
}
