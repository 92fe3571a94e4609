//! Session reducer.
//!
//! Token and snapshot writes happen synchronously inside the reducer, so a
//! `Logout` has fully cleared storage by the time `send` returns. The only
//! effect is the profile fetch issued by `Initialize`.

use crate::actions::SessionAction;
use crate::environment::SessionEnvironment;
use crate::persistence;
use crate::providers::SessionBackend;
use crate::state::{Route, SessionState};
use casaroja_core::effect::Effect;
use casaroja_core::environment::Clock;
use casaroja_core::reducer::Reducer;
use casaroja_core::{smallvec, SmallVec};
use std::marker::PhantomData;

/// Session reducer.
#[derive(Debug, Clone)]
pub struct SessionReducer<B, C> {
    _phantom: PhantomData<(B, C)>,
}

impl<B, C> SessionReducer<B, C> {
    /// Create a reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<B, C> Default for SessionReducer<B, C> {
    fn default() -> Self {
        Self::new()
    }
}

fn end_session<B, C>(state: &mut SessionState, env: &SessionEnvironment<B, C>)
where
    B: SessionBackend + Clone,
    C: Clock + Clone,
{
    env.tokens.clear();
    state.reset();
    persistence::persist(env.storage.as_ref(), state);
}

impl<B, C> Reducer for SessionReducer<B, C>
where
    B: SessionBackend + Clone + 'static,
    C: Clock + Clone + 'static,
{
    type State = SessionState;
    type Action = SessionAction;
    type Environment = SessionEnvironment<B, C>;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ═══════════════════════════════════════════════════════════════
            // Initialize: revalidate against the backend
            // ═══════════════════════════════════════════════════════════════
            SessionAction::Initialize => {
                if !env.tokens.is_usable_at(env.clock.now()) {
                    if state.is_authenticated || state.user.is_some() {
                        tracing::info!("Persisted session has no usable token, resetting");
                    }
                    if env.tokens.get().is_some() {
                        env.tokens.clear();
                    }
                    state.reset();
                    persistence::persist(env.storage.as_ref(), state);
                    return smallvec![Effect::None];
                }

                state.is_loading = true;
                let backend = env.backend.clone();
                smallvec![Effect::Future(Box::pin(async move {
                    match backend.current_user().await {
                        Ok(user) => Some(SessionAction::UserLoaded { user }),
                        Err(error) => Some(SessionAction::InitializeFailed {
                            message: error.message,
                        }),
                    }
                }))]
            },

            SessionAction::UserLoaded { user } | SessionAction::Login { user } => {
                tracing::debug!(user_id = user.id, "Session authenticated");
                state.user = Some(user);
                state.is_authenticated = true;
                state.is_loading = false;
                state.redirect = None;
                persistence::persist(env.storage.as_ref(), state);
                smallvec![Effect::None]
            },

            SessionAction::InitializeFailed { message } => {
                tracing::warn!(%message, "Session revalidation failed");
                end_session(state, env);
                smallvec![Effect::None]
            },

            SessionAction::Logout => {
                end_session(state, env);
                smallvec![Effect::None]
            },

            SessionAction::SessionExpired => {
                tracing::info!("Session expired, redirecting to login");
                end_session(state, env);
                state.redirect = Some(Route::Login);
                smallvec![Effect::None]
            },

            SessionAction::UpdateUser { update } => {
                if let Some(user) = state.user.as_mut() {
                    update.apply_to(user);
                    persistence::persist(env.storage.as_ref(), state);
                }
                smallvec![Effect::None]
            },

            SessionAction::SetLoading { loading } => {
                state.is_loading = loading;
                smallvec![Effect::None]
            },

            SessionAction::RedirectHandled => {
                state.redirect = None;
                smallvec![Effect::None]
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mocks::{sample_user, test_environment, MockBackend};
    use crate::persistence::SESSION_KEY;
    use crate::state::SessionStatus;
    use casaroja_client::{types::UserUpdate, ApiError, KeyValueStorage, TokenPair};
    use casaroja_testing::{assertions, run_effects, FixedClock, ReducerTest};

    type TestReducer = SessionReducer<MockBackend, FixedClock>;

    #[test]
    fn login_authenticates_and_persists() {
        let env = test_environment(MockBackend::returning(sample_user()));
        let storage = env.storage.clone();

        ReducerTest::new(TestReducer::new())
            .with_env(env)
            .given_state(SessionState {
                is_loading: true,
                ..SessionState::default()
            })
            .when_action(SessionAction::Login { user: sample_user() })
            .then_state(|s| {
                assert_eq!(s.status(), SessionStatus::Authenticated);
                assert_eq!(s.user.as_ref().map(|u| u.id), Some(7));
            })
            .then_effects(assertions::assert_no_effects)
            .run();

        assert!(storage.get(SESSION_KEY).unwrap().is_some());
    }

    #[test]
    fn initialize_without_token_resets_stale_snapshot() {
        let backend = MockBackend::returning(sample_user());
        let env = test_environment(backend.clone());

        ReducerTest::new(TestReducer::new())
            .with_env(env)
            .given_state(SessionState::authenticated(sample_user()))
            .when_action(SessionAction::Initialize)
            .then_state(|s| assert_eq!(*s, SessionState::default()))
            .then_effects(assertions::assert_no_effects)
            .run();

        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn initialize_with_token_fetches_user() {
        let backend = MockBackend::returning(sample_user());
        let env = test_environment(backend.clone());
        env.tokens.set(TokenPair::new("a1", "r1"));

        let reducer = TestReducer::new();
        let mut state = SessionState::default();
        let effects = reducer.reduce(&mut state, SessionAction::Initialize, &env);
        assert_eq!(state.status(), SessionStatus::Loading);

        let produced = run_effects(effects).await;
        assert_eq!(produced, vec![SessionAction::UserLoaded { user: sample_user() }]);
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn failed_revalidation_clears_tokens() {
        let env = test_environment(MockBackend::failing(ApiError::from_response(401, None)));
        env.tokens.set(TokenPair::new("a1", "r1"));

        let reducer = TestReducer::new();
        let mut state = SessionState::authenticated(sample_user());
        let effects = reducer.reduce(&mut state, SessionAction::Initialize, &env);
        for action in run_effects(effects).await {
            reducer.reduce(&mut state, action, &env);
        }

        assert_eq!(state.status(), SessionStatus::Anonymous);
        assert_eq!(env.tokens.get(), None);
        assert!(env.storage.get(SESSION_KEY).unwrap().is_none());
    }

    #[test]
    fn logout_clears_tokens_and_snapshot() {
        let env = test_environment(MockBackend::returning(sample_user()));
        env.tokens.set(TokenPair::new("a1", "r1"));
        let tokens = env.tokens.clone();
        let storage = env.storage.clone();

        ReducerTest::new(TestReducer::new())
            .with_env(env)
            .given_state(SessionState::default())
            .when_action(SessionAction::Login { user: sample_user() })
            .when_action(SessionAction::Logout)
            .then_state(|s| assert_eq!(*s, SessionState::default()))
            .run();

        assert_eq!(tokens.get(), None);
        assert!(storage.get(SESSION_KEY).unwrap().is_none());
    }

    #[test]
    fn expiry_records_login_redirect() {
        let env = test_environment(MockBackend::returning(sample_user()));

        ReducerTest::new(TestReducer::new())
            .with_env(env)
            .given_state(SessionState::authenticated(sample_user()))
            .when_action(SessionAction::SessionExpired)
            .then_state(|s| {
                assert_eq!(s.status(), SessionStatus::Anonymous);
                assert_eq!(s.redirect, Some(Route::Login));
            })
            .run();
    }

    #[test]
    fn update_user_is_noop_when_anonymous() {
        let update = UserUpdate {
            first_name: Some("Camila".into()),
            ..UserUpdate::default()
        };

        ReducerTest::new(TestReducer::new())
            .with_env(test_environment(MockBackend::returning(sample_user())))
            .given_state(SessionState::default())
            .when_action(SessionAction::UpdateUser {
                update: update.clone(),
            })
            .then_state(|s| assert!(s.user.is_none()))
            .run();

        ReducerTest::new(TestReducer::new())
            .with_env(test_environment(MockBackend::returning(sample_user())))
            .given_state(SessionState::authenticated(sample_user()))
            .when_action(SessionAction::UpdateUser { update })
            .then_state(|s| {
                let user = s.user.as_ref().unwrap();
                assert_eq!(user.first_name, "Camila");
                assert_eq!(user.last_name, "Rojas");
            })
            .run();
    }
}
