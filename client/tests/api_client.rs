//! HTTP-level tests for authentication, refresh and error normalization.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use casaroja_client::{
    services::{AuthService, EventsService, TicketsService},
    storage::MemoryStorage,
    tokens::TOKENS_KEY,
    types::{ChangePasswordRequest, EventFilters, LoginRequest, UserUpdate},
    ApiClient, ApiConfig, ApiErrorKind, ClientEvent, KeyValueStorage, TokenPair,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn user_json() -> Value {
    json!({
        "id": 7,
        "username": "user@example.com",
        "email": "user@example.com",
        "first_name": "Ana",
        "last_name": "Rojas",
        "user_type": "client",
        "phone_number": "",
        "is_verified": true,
        "created_at": "2025-01-10T12:00:00Z"
    })
}

fn event_json(id: u64) -> Value {
    json!({
        "id": id,
        "title": format!("Event {id}"),
        "short_description": "",
        "event_type": "workshop",
        "start_datetime": "2025-03-01T18:00:00Z",
        "end_datetime": "2025-03-01T20:00:00Z",
        "base_price": "0.00",
        "max_participants": 20,
        "status": "published",
        "featured": true
    })
}

fn client_for(server: &MockServer) -> (ApiClient, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    let config = ApiConfig::new(format!("{}/api", server.uri()));
    let client = ApiClient::new(&config, storage.clone()).unwrap();
    (client, storage)
}

#[tokio::test]
async fn authenticated_requests_carry_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/profile/"))
        .and(header("authorization", "Bearer a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json()))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_for(&server);
    client.set_tokens(TokenPair::new("a1", "r1"));

    let user = AuthService::new(client).current_user().await.unwrap();
    assert_eq!(user.id, 7);
}

#[tokio::test]
async fn unauthorized_response_refreshes_once_and_replays() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tickets/my-tickets/"))
        .and(header("authorization", "Bearer expired"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Token expired"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/token/refresh/"))
        .and(body_json(json!({"refresh": "r1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "fresh"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/tickets/my-tickets/"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let (client, storage) = client_for(&server);
    client.set_tokens(TokenPair::new("expired", "r1"));

    let tickets = TicketsService::new(client.clone()).my_tickets().await.unwrap();
    assert!(tickets.is_empty());

    // The refresh response carried no refresh token, so the old one is kept.
    assert_eq!(client.tokens().get(), Some(TokenPair::new("fresh", "r1")));
    let persisted: Value = serde_json::from_str(&storage.get(TOKENS_KEY).unwrap().unwrap()).unwrap();
    assert_eq!(persisted, json!({"access": "fresh", "refresh": "r1"}));
}

#[tokio::test]
async fn replayed_request_is_not_refreshed_again() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/profile/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "nope"})))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/token/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "a2", "refresh": "r2"})))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_for(&server);
    client.set_tokens(TokenPair::new("a1", "r1"));

    let err = AuthService::new(client.clone()).current_user().await.unwrap_err();
    assert_eq!(err.kind(), ApiErrorKind::Unauthorized);
    assert_eq!(err.message, "nope");
    assert_eq!(client.tokens().get(), Some(TokenPair::new("a2", "r2")));
}

#[tokio::test]
async fn failed_refresh_clears_tokens_and_expires_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/profile/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Token expired"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/token/refresh/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Token is blacklisted"})))
        .expect(1)
        .mount(&server)
        .await;

    let (client, storage) = client_for(&server);
    client.set_tokens(TokenPair::new("a1", "r1"));
    let mut events = client.subscribe();

    let err = AuthService::new(client.clone()).current_user().await.unwrap_err();
    assert_eq!(err.status, 401);
    assert_eq!(err.message, "Token expired");

    assert_eq!(client.tokens().get(), None);
    assert!(!storage.contains(TOKENS_KEY));
    assert_eq!(events.try_recv().unwrap(), ClientEvent::SessionExpired);
}

#[tokio::test]
async fn unauthorized_without_refresh_token_is_returned_as_is() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/profile/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_for(&server);
    client.set_tokens(TokenPair::new("a1", ""));

    let err = AuthService::new(client.clone()).current_user().await.unwrap_err();
    assert_eq!(err.message, "HTTP error 401");
    assert!(client.is_authenticated());
}

#[tokio::test]
async fn login_is_public_and_stores_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .and(body_json(json!({"username": "user@example.com", "password": "secret1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access": "a1",
            "refresh": "r1",
            "user": user_json()
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_for(&server);
    client.set_tokens(TokenPair::new("stale", "stale"));

    let auth = AuthService::new(client.clone());
    let response = auth
        .login(&LoginRequest {
            username: "user@example.com".into(),
            password: "secret1".into(),
        })
        .await
        .unwrap();

    assert_eq!(response.user.username, "user@example.com");
    assert_eq!(client.tokens().get(), Some(TokenPair::new("a1", "r1")));

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn current_user_without_token_skips_network() {
    let server = MockServer::start().await;
    let (client, _) = client_for(&server);

    let err = AuthService::new(client).current_user().await.unwrap_err();
    assert_eq!(err.status, 401);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn error_bodies_become_messages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/events/events/99/"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Not found."})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/events/upcoming/"))
        .respond_with(ResponseTemplate::new(503).set_body_string("<html>down</html>"))
        .mount(&server)
        .await;

    let (client, _) = client_for(&server);
    let events = EventsService::new(client);

    let err = events.get(99).await.unwrap_err();
    assert_eq!((err.status, err.message.as_str()), (404, "Not found."));
    assert_eq!(err.data, Some(json!({"detail": "Not found."})));

    let err = events.upcoming().await.unwrap_err();
    assert_eq!(err.kind(), ApiErrorKind::Server);
    assert_eq!(err.message, "HTTP error 503");
    assert_eq!(err.data, None);
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() {
    let config = ApiConfig::new("http://127.0.0.1:9/api").with_timeout(Duration::from_millis(500));
    let client = ApiClient::new(&config, Arc::new(MemoryStorage::new())).unwrap();

    let err = EventsService::new(client).featured().await.unwrap_err();
    assert_eq!(err.status, 0);
    assert_eq!(err.kind(), ApiErrorKind::Network);
}

#[tokio::test]
async fn slow_backend_times_out_as_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/events/featured/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([event_json(1)]))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let config = ApiConfig::new(format!("{}/api", server.uri())).with_timeout(Duration::from_millis(50));
    let client = ApiClient::new(&config, Arc::new(MemoryStorage::new())).unwrap();

    let err = EventsService::new(client).featured().await.unwrap_err();
    assert_eq!(err.status, 0);
    assert_eq!(err.kind(), ApiErrorKind::Network);
    assert_eq!(err.message, "request timed out");
}

#[tokio::test]
async fn featured_accepts_envelope_and_bare_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/events/featured/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 2, "next": null, "previous": null,
            "results": [event_json(1), event_json(2)]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/events/upcoming/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([event_json(3)])))
        .mount(&server)
        .await;

    let (client, _) = client_for(&server);
    let events = EventsService::new(client);

    let featured = events.featured().await.unwrap();
    assert_eq!(featured.iter().map(|e| e.id).collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(events.upcoming().await.unwrap().len(), 1);
}

#[tokio::test]
async fn list_filters_become_query_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/events/events/"))
        .and(query_param("page", "2"))
        .and(query_param("search", "cueca"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 11, "next": null, "previous": "http://x/?page=1",
            "results": [event_json(11)]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_for(&server);
    let filters = EventFilters {
        search: Some("cueca".into()),
        ..EventFilters::page(2)
    };
    let page = EventsService::new(client).list(&filters).await.unwrap();
    assert_eq!(page.count, 11);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests[0].url.query(), Some("page=2&search=cueca"));
}

#[tokio::test]
async fn use_ticket_posts_to_ticket_action() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/tickets/tickets/5/use_ticket/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "Ticket marcado como usado"})))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_for(&server);
    client.set_tokens(TokenPair::new("a1", "r1"));

    let response = TicketsService::new(client).use_ticket(5).await.unwrap();
    assert_eq!(response.status, "Ticket marcado como usado");
}

#[tokio::test]
async fn profile_update_sends_only_set_fields() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/auth/profile/"))
        .and(header("authorization", "Bearer a1"))
        .and(body_json(json!({"phone_number": "+56 9 1234 5678"})))
        .respond_with(ResponseTemplate::new(200).set_body_json({
            let mut user = user_json();
            user["phone_number"] = json!("+56 9 1234 5678");
            user
        }))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_for(&server);
    client.set_tokens(TokenPair::new("a1", "r1"));
    let auth = AuthService::new(client);

    let update = UserUpdate {
        phone_number: Some("+56 9 1234 5678".into()),
        ..UserUpdate::default()
    };
    let user = auth.update_profile(&update).await.unwrap();
    assert_eq!(user.phone_number, "+56 9 1234 5678");
}

#[tokio::test]
async fn wrong_old_password_is_a_client_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/change-password/"))
        .and(body_json(json!({"old_password": "nope", "new_password": "secret2"})))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"old_password": ["Wrong password."]})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_for(&server);
    client.set_tokens(TokenPair::new("a1", "r1"));
    let auth = AuthService::new(client);

    let err = auth
        .change_password(&ChangePasswordRequest {
            old_password: "nope".into(),
            new_password: "secret2".into(),
        })
        .await
        .unwrap_err();

    assert_eq!(err.status, 400);
    assert_eq!(err.kind(), ApiErrorKind::Client);
    assert_eq!(err.message, "HTTP error 400");
    assert_eq!(err.data, Some(json!({"old_password": ["Wrong password."]})));
}
