//! The in-memory token pair and its mirror in storage.

use crate::storage::{self, KeyValueStorage};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};

/// Storage key the token pair is persisted under.
pub const TOKENS_KEY: &str = "auth_tokens";

/// Access and refresh tokens issued by the backend.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived bearer token
    pub access: String,
    /// Long-lived token exchanged for a new access token
    pub refresh: String,
}

impl TokenPair {
    /// Create a pair.
    #[must_use]
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: access.into(),
            refresh: refresh.into(),
        }
    }

    /// When the access token expires, if it is a JWT carrying `exp`.
    #[must_use]
    pub fn access_expires_at(&self) -> Option<DateTime<Utc>> {
        jwt_expiry(&self.access)
    }
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access", &"<redacted>")
            .field("refresh", &"<redacted>")
            .finish()
    }
}

/// Read the `exp` claim of a JWT without verifying its signature.
///
/// Returns `None` for opaque tokens and tokens without `exp`.
#[must_use]
pub fn jwt_expiry(token: &str) -> Option<DateTime<Utc>> {
    #[derive(Deserialize)]
    struct Claims {
        exp: Option<i64>,
    }

    let mut parts = token.split('.');
    let (_header, payload, _signature) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: Claims = serde_json::from_slice(&bytes).ok()?;
    DateTime::from_timestamp(claims.exp?, 0)
}

/// Shared holder of at most one token pair.
///
/// Every change is mirrored to storage under [`TOKENS_KEY`]. Storage
/// failures are logged and never surface to callers.
#[derive(Clone)]
pub struct TokenStore {
    current: Arc<Mutex<Option<TokenPair>>>,
    storage: Arc<dyn KeyValueStorage>,
}

impl TokenStore {
    /// Create a store, loading any persisted pair.
    #[must_use]
    pub fn load(storage: Arc<dyn KeyValueStorage>) -> Self {
        let persisted = match storage::read_json::<TokenPair>(storage.as_ref(), TOKENS_KEY) {
            Ok(pair) => pair,
            Err(error) => {
                tracing::warn!(%error, "Ignoring unreadable persisted tokens");
                None
            },
        };

        Self {
            current: Arc::new(Mutex::new(persisted)),
            storage,
        }
    }

    /// The storage this store mirrors to.
    #[must_use]
    pub fn storage(&self) -> Arc<dyn KeyValueStorage> {
        Arc::clone(&self.storage)
    }

    /// The current pair.
    #[must_use]
    pub fn get(&self) -> Option<TokenPair> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The current access token.
    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.get().map(|pair| pair.access)
    }

    /// The current refresh token.
    #[must_use]
    pub fn refresh_token(&self) -> Option<String> {
        self.get().map(|pair| pair.refresh)
    }

    /// Whether an access token is held.
    #[must_use]
    pub fn has_access_token(&self) -> bool {
        self.get().is_some_and(|pair| !pair.access.is_empty())
    }

    /// Whether a refresh token is held.
    #[must_use]
    pub fn has_refresh_token(&self) -> bool {
        self.get().is_some_and(|pair| !pair.refresh.is_empty())
    }

    /// Replace the pair and persist it.
    pub fn set(&self, pair: TokenPair) {
        if let Err(error) = storage::write_json(self.storage.as_ref(), TOKENS_KEY, &pair) {
            tracing::warn!(%error, "Failed to persist tokens");
        }
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(pair);
    }

    /// Drop the pair from memory and storage.
    pub fn clear(&self) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = None;
        if let Err(error) = self.storage.clear(TOKENS_KEY) {
            tracing::warn!(%error, "Failed to remove persisted tokens");
        }
    }

    /// Whether the held access token is usable at `now`.
    ///
    /// An expired JWT is still usable when a refresh token is held, since
    /// the first 401 will trade it in.
    #[must_use]
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        match self.get() {
            None => false,
            Some(pair) if pair.access.is_empty() => false,
            Some(pair) => match pair.access_expires_at() {
                Some(expires_at) if expires_at <= now => !pair.refresh.is_empty(),
                _ => true,
            },
        }
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("has_access_token", &self.has_access_token())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn jwt(exp: i64) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{exp},"user_id":7}}"#));
        format!("{header}.{payload}.signature")
    }

    #[test]
    fn reads_exp_from_jwt() {
        let expiry = jwt_expiry(&jwt(1_735_689_600)).unwrap();
        assert_eq!(expiry.to_rfc3339(), "2025-01-01T00:00:00+00:00");
    }

    #[test]
    fn opaque_tokens_have_no_expiry() {
        assert_eq!(jwt_expiry("opaque-token"), None);
        assert_eq!(jwt_expiry("a.b.c.d"), None);
        assert_eq!(jwt_expiry("a.!!!.c"), None);
    }

    #[test]
    fn set_and_clear_mirror_to_storage() {
        let storage = Arc::new(MemoryStorage::new());
        let tokens = TokenStore::load(storage.clone());
        assert!(!tokens.has_access_token());

        tokens.set(TokenPair::new("a1", "r1"));
        let raw = storage.get(TOKENS_KEY).unwrap().unwrap();
        assert_eq!(raw, r#"{"access":"a1","refresh":"r1"}"#);

        let reloaded = TokenStore::load(storage.clone());
        assert_eq!(reloaded.access_token().as_deref(), Some("a1"));

        tokens.clear();
        assert!(!storage.contains(TOKENS_KEY));
        assert_eq!(tokens.get(), None);
    }

    #[test]
    fn load_accepts_login_response_shape_and_ignores_garbage() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set(TOKENS_KEY, r#"{"access":"a","refresh":"r","user":{"id":1}}"#)
            .unwrap();
        assert_eq!(TokenStore::load(storage.clone()).refresh_token().as_deref(), Some("r"));

        storage.set(TOKENS_KEY, "{").unwrap();
        assert_eq!(TokenStore::load(storage).get(), None);
    }

    #[test]
    fn expired_access_needs_refresh_token() {
        let now = DateTime::from_timestamp(1_735_689_600, 0).unwrap();
        let tokens = TokenStore::load(Arc::new(MemoryStorage::new()));

        tokens.set(TokenPair::new(jwt(1_735_689_000), ""));
        assert!(!tokens.is_usable_at(now));

        tokens.set(TokenPair::new(jwt(1_735_689_000), "refresh"));
        assert!(tokens.is_usable_at(now));

        tokens.set(TokenPair::new(jwt(1_735_690_000), ""));
        assert!(tokens.is_usable_at(now));

        tokens.set(TokenPair::new("opaque", ""));
        assert!(tokens.is_usable_at(now));
    }

    #[test]
    fn debug_redacts_secrets() {
        let rendered = format!("{:?}", TokenPair::new("secret-access", "secret-refresh"));
        assert!(!rendered.contains("secret"));
    }
}
