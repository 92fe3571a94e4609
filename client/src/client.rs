//! HTTP client with bearer authentication and one-shot token refresh

use crate::{
    config::ApiConfig,
    endpoints,
    error::ApiError,
    storage::KeyValueStorage,
    tokens::{TokenPair, TokenStore},
};
use reqwest::{header, Method};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Whether a request carries the bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMode {
    /// Attach `Authorization: Bearer <access>` and refresh once on 401
    #[default]
    Authenticated,
    /// No bearer header and no refresh (login, register, token refresh)
    Public,
}

/// Notifications the client broadcasts to its subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientEvent {
    /// A refresh failed and the tokens were dropped. Subscribers should
    /// return to the login entry point.
    SessionExpired,
}

/// One outbound call, described independently of the HTTP stack.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// HTTP method
    pub method: Method,
    /// Path relative to the base URL
    pub path: String,
    /// Query parameters
    pub query: Vec<(String, String)>,
    /// JSON body
    pub body: Option<Value>,
    /// Authentication mode
    pub mode: RequestMode,
}

impl ApiRequest {
    /// A request with no query, body or special mode.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            mode: RequestMode::Authenticated,
        }
    }

    /// `GET path`
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// `POST path`
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// `PUT path`
    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// `PATCH path`
    #[must_use]
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    /// `DELETE path`
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append query parameters.
    #[must_use]
    pub fn query<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Set a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] with status 0 if `body` cannot be encoded.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::network(format!("invalid request body: {e}")))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Send without a bearer token and never refresh.
    #[must_use]
    pub const fn public(mut self) -> Self {
        self.mode = RequestMode::Public;
        self
    }
}

#[derive(Deserialize)]
struct RefreshResponse {
    access: String,
    #[serde(default)]
    refresh: Option<String>,
}

/// Client for the Casa Roja backend.
///
/// Clones share the HTTP connection pool, the token store and the event
/// channel.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ApiConfig,
    tokens: TokenStore,
    events: broadcast::Sender<ClientEvent>,
}

impl ApiClient {
    /// Create a client, loading any persisted token pair from `storage`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] with status 0 if the HTTP stack cannot be
    /// initialized.
    pub fn new(config: &ApiConfig, storage: Arc<dyn KeyValueStorage>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::network(format!("failed to build HTTP client: {e}")))?;
        let (events, _) = broadcast::channel(16);

        Ok(Self {
            http,
            config: config.clone(),
            tokens: TokenStore::load(storage),
            events,
        })
    }

    /// The configuration in use.
    #[must_use]
    pub const fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// The token store.
    #[must_use]
    pub const fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Store a token pair (after login).
    pub fn set_tokens(&self, pair: TokenPair) {
        self.tokens.set(pair);
    }

    /// Drop the token pair (logout).
    pub fn clear_tokens(&self) {
        self.tokens.clear();
    }

    /// Whether an access token is held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.tokens.has_access_token()
    }

    /// Receive [`ClientEvent`]s.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    /// Send a request and decode the response body.
    ///
    /// In [`RequestMode::Authenticated`], a 401 while a refresh token is held
    /// triggers exactly one refresh call. On success the request is replayed
    /// once with the new access token. On failure the tokens are cleared,
    /// [`ClientEvent::SessionExpired`] is broadcast and the original 401 is
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] for network failures (status 0), HTTP error
    /// responses and undecodable bodies.
    #[tracing::instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let bearer = match request.mode {
            RequestMode::Authenticated => self.tokens.access_token(),
            RequestMode::Public => None,
        };

        let (status, body) = self.execute(&request, bearer.as_deref()).await?;

        if status == 401 && request.mode == RequestMode::Authenticated {
            if let Some(refresh) = self.tokens.refresh_token().filter(|r| !r.is_empty()) {
                return match self.refresh(&refresh).await {
                    Ok(access) => {
                        tracing::debug!("Replaying request with refreshed token");
                        let (status, body) = self.execute(&request, Some(&access)).await?;
                        decode(status, body)
                    },
                    Err(error) => {
                        tracing::warn!(%error, "Token refresh failed, ending session");
                        self.tokens.clear();
                        // No subscribers is fine.
                        let _ = self.events.send(ClientEvent::SessionExpired);
                        Err(ApiError::from_response(status, body))
                    },
                };
            }
        }

        decode(status, body)
    }

    /// `GET path` with query parameters.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Vec<(&'static str, String)>,
    ) -> Result<T, ApiError> {
        self.send(ApiRequest::get(path).query(query)).await
    }

    /// `POST path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(ApiRequest::post(path).json(body)?).await
    }

    /// `POST path` with a JSON body and no bearer token.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn post_public<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(ApiRequest::post(path).json(body)?.public()).await
    }

    /// `PUT path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(ApiRequest::put(path).json(body)?).await
    }

    /// `PATCH path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(ApiRequest::patch(path).json(body)?).await
    }

    /// `DELETE path`.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(ApiRequest::delete(path)).await
    }

    /// Trade the refresh token for a new access token and store the result.
    async fn refresh(&self, refresh: &str) -> Result<String, ApiError> {
        let request = ApiRequest::post(endpoints::auth::REFRESH)
            .json(&serde_json::json!({ "refresh": refresh }))?
            .public();

        let (status, body) = self.execute(&request, None).await?;
        let outcome = decode::<RefreshResponse>(status, body);
        metrics::counter!(
            "client.token_refreshes",
            "outcome" => if outcome.is_ok() { "success" } else { "failure" }
        )
        .increment(1);

        let RefreshResponse { access, refresh: rotated } = outcome?;
        let refresh = rotated.unwrap_or_else(|| refresh.to_string());
        self.tokens.set(TokenPair::new(access.clone(), refresh));
        Ok(access)
    }

    /// One HTTP round trip. Returns the status and the body, decoded as JSON
    /// when possible.
    async fn execute(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
    ) -> Result<(u16, Option<Value>), ApiError> {
        let mut builder = self
            .http
            .request(request.method.clone(), self.config.url(&request.path))
            .header(header::ACCEPT, "application/json");

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::warn!(error = %e, "Request failed before a response arrived");
            let message = if e.is_timeout() {
                "request timed out".to_string()
            } else {
                format!("could not reach the server: {e}")
            };
            ApiError::network(message)
        })?;

        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::network(format!("failed to read response body: {e}")))?;
        let body = if bytes.iter().all(u8::is_ascii_whitespace) {
            None
        } else {
            serde_json::from_slice(&bytes).ok()
        };

        tracing::debug!(status, "Response received");
        Ok((status, body))
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.config.base_url)
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

fn decode<T: DeserializeOwned>(status: u16, body: Option<Value>) -> Result<T, ApiError> {
    if !(200..300).contains(&status) {
        return Err(ApiError::from_response(status, body));
    }
    serde_json::from_value(body.unwrap_or(Value::Null)).map_err(|e| ApiError::decode(status, &e))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_builder_collects_parts() {
        let request = ApiRequest::post("/tickets/purchase/")
            .query([("page", "2")])
            .json(&json!({"event": 1}))
            .unwrap()
            .public();

        assert_eq!(request.method, Method::POST);
        assert_eq!(request.query, vec![("page".to_string(), "2".to_string())]);
        assert_eq!(request.body, Some(json!({"event": 1})));
        assert_eq!(request.mode, RequestMode::Public);
    }

    #[test]
    fn decode_maps_errors_and_empty_bodies() {
        decode::<()>(204, None).unwrap();

        let err = decode::<Value>(404, Some(json!({"detail": "Not found."}))).unwrap_err();
        assert_eq!((err.status, err.message.as_str()), (404, "Not found."));

        let err = decode::<u32>(200, Some(json!("nope"))).unwrap_err();
        assert_eq!(err.status, 200);
        assert!(err.message.starts_with("invalid response body"));
    }
}
