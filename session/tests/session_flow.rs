//! End-to-end session flows against a mock backend.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use casaroja_client::{
    services::AuthService, tokens::TOKENS_KEY, ApiClient, ApiConfig, KeyValueStorage,
    MemoryStorage, TokenPair,
};
use casaroja_core::environment::SystemClock;
use casaroja_session::{
    forward_session_expiry, mocks::sample_user, persistence::SESSION_KEY, session_store, Route,
    SessionAction, SessionEnvironment, SessionState, SessionStatus, SessionStore,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    server: MockServer,
    storage: Arc<MemoryStorage>,
    client: ApiClient,
    store: SessionStore<AuthService, SystemClock>,
}

async fn harness() -> Harness {
    let server = MockServer::start().await;
    let storage = Arc::new(MemoryStorage::new());
    let config = ApiConfig::new(format!("{}/api", server.uri()));
    let client = ApiClient::new(&config, storage.clone()).unwrap();

    let env = SessionEnvironment::new(
        AuthService::new(client.clone()),
        client.tokens().clone(),
        SystemClock,
    );
    let store = session_store(SessionState::restore(storage.as_ref()), env);

    Harness {
        server,
        storage,
        client,
        store,
    }
}

fn expired_jwt() -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256"}"#);
    let payload = URL_SAFE_NO_PAD.encode(br#"{"exp":1000}"#);
    format!("{header}.{payload}.sig")
}

#[tokio::test]
async fn logout_then_initialize_stays_anonymous_without_network() {
    let h = harness().await;
    h.client.set_tokens(TokenPair::new("a1", "r1"));

    h.store
        .send(SessionAction::Login { user: sample_user() })
        .await
        .unwrap();
    assert!(h.storage.contains(SESSION_KEY));

    h.store.send(SessionAction::Logout).await.unwrap();
    assert!(!h.storage.contains(TOKENS_KEY));
    assert!(!h.storage.contains(SESSION_KEY));

    let mut handle = h.store.send(SessionAction::Initialize).await.unwrap();
    handle.wait().await;

    assert_eq!(h.store.state(SessionState::status).await, SessionStatus::Anonymous);
    assert!(h.server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn initialize_revalidates_persisted_session() {
    let h = harness().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/profile/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7,
            "username": "user@example.com",
            "first_name": "Ana",
            "last_name": "Rojas Soto"
        })))
        .expect(1)
        .mount(&h.server)
        .await;
    h.client.set_tokens(TokenPair::new("a1", "r1"));

    let mut handle = h.store.send(SessionAction::Initialize).await.unwrap();
    assert_eq!(h.store.state(SessionState::status).await, SessionStatus::Loading);
    handle.wait().await;

    let last_name = h
        .store
        .state(|s| s.user.as_ref().map(|u| u.last_name.clone()))
        .await;
    assert_eq!(last_name.as_deref(), Some("Rojas Soto"));
    assert!(h.store.state(|s| s.is_authenticated).await);
}

#[tokio::test]
async fn failed_refresh_leaves_session_anonymous_and_redirects() {
    let h = harness().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/profile/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Token expired"})))
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/token/refresh/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Token is invalid"})))
        .expect(1)
        .mount(&h.server)
        .await;

    h.client.set_tokens(TokenPair::new("a1", "r1"));
    h.store
        .send(SessionAction::Login { user: sample_user() })
        .await
        .unwrap();
    let bridge = forward_session_expiry(h.client.subscribe(), h.store.clone());

    let mut handle = h.store.send(SessionAction::Initialize).await.unwrap();
    handle.wait().await;

    let redirected = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if h.store.state(|s| s.redirect).await == Some(Route::Login) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(redirected.is_ok(), "expiry never reached the session store");

    assert_eq!(h.store.state(SessionState::status).await, SessionStatus::Anonymous);
    assert_eq!(h.client.tokens().get(), None);
    assert!(!h.storage.contains(SESSION_KEY));
    bridge.abort();
}

#[tokio::test]
async fn expired_token_without_refresh_is_dropped_locally() {
    let h = harness().await;
    h.client.set_tokens(TokenPair::new(expired_jwt(), ""));
    h.storage
        .set(
            SESSION_KEY,
            &json!({"state": {"user": null, "isAuthenticated": true}, "version": 0}).to_string(),
        )
        .unwrap();

    let h = Harness {
        store: session_store(
            SessionState::restore(h.storage.as_ref()),
            h.store.environment().clone(),
        ),
        ..h
    };
    assert!(h.store.state(|s| s.is_authenticated).await);

    h.store.send(SessionAction::Initialize).await.unwrap();

    assert_eq!(h.store.state(SessionState::status).await, SessionStatus::Anonymous);
    assert!(!h.storage.contains(TOKENS_KEY));
    assert!(h.server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn expiry_bridge_stops_once_store_has_shut_down() {
    let h = harness().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/profile/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Token expired"})))
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/token/refresh/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Token is invalid"})))
        .expect(1)
        .mount(&h.server)
        .await;

    h.client.set_tokens(TokenPair::new("a1", "r1"));
    let bridge = forward_session_expiry(h.client.subscribe(), h.store.clone());
    h.store.shutdown(Duration::from_secs(1)).await.unwrap();

    let result = AuthService::new(h.client.clone()).current_user().await;
    assert_eq!(result.unwrap_err().status, 401);

    let finished = tokio::time::timeout(Duration::from_secs(2), bridge).await;
    assert!(finished.is_ok(), "bridge kept running after shutdown");
}
