//! Mock backend and fixtures for testing.

use crate::environment::SessionEnvironment;
use crate::providers::SessionBackend;
use casaroja_client::{types::User, ApiError, MemoryStorage, TokenStore};
use casaroja_testing::mocks::{test_clock, FixedClock};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Mock backend returning a canned answer and counting calls.
#[derive(Debug, Clone)]
pub struct MockBackend {
    answer: Result<User, ApiError>,
    calls: Arc<AtomicUsize>,
}

impl MockBackend {
    /// Answer every call with `user`.
    #[must_use]
    pub fn returning(user: User) -> Self {
        Self {
            answer: Ok(user),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Fail every call with `error`.
    #[must_use]
    pub fn failing(error: ApiError) -> Self {
        Self {
            answer: Err(error),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of calls so far, shared between clones.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SessionBackend for MockBackend {
    fn current_user(&self) -> impl Future<Output = Result<User, ApiError>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let answer = self.answer.clone();
        async move { answer }
    }
}

/// The user most tests sign in as.
#[must_use]
pub fn sample_user() -> User {
    User {
        id: 7,
        username: "user@example.com".to_string(),
        email: "user@example.com".to_string(),
        first_name: "Ana".to_string(),
        last_name: "Rojas".to_string(),
        user_type: casaroja_client::types::UserType::Client,
        phone_number: String::new(),
        profile_image: None,
        birth_date: None,
        is_verified: true,
        created_at: None,
        profile: None,
    }
}

/// An environment over fresh in-memory storage and the fixed test clock.
#[must_use]
pub fn test_environment(backend: MockBackend) -> SessionEnvironment<MockBackend, FixedClock> {
    let tokens = TokenStore::load(Arc::new(MemoryStorage::new()));
    SessionEnvironment::new(backend, tokens, test_clock())
}
