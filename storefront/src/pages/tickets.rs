//! The signed-in customer's tickets.

use super::{Loadable, RequestId, RequestTracker};
use crate::environment::StorefrontEnvironment;
use crate::providers::{Accounts, Catalog, SessionHandle, TicketDesk};
use casaroja_client::types::{Ticket, UseTicketResponse};
use casaroja_client::{ApiError, ApiErrorKind};
use casaroja_core::effect::Effect;
use casaroja_core::reducer::Reducer;
use casaroja_core::{async_effect, smallvec, SmallVec};
use casaroja_session::Route;
use std::marker::PhantomData;

/// Ticket list state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TicketsState {
    /// Tickets
    pub tickets: Loadable<Vec<Ticket>>,
    /// Ticket being redeemed
    pub using: Option<u64>,
    /// Outcome of the last redemption
    pub notice: Option<String>,
    /// Navigation requested by the page
    pub redirect: Option<Route>,
    /// Load bookkeeping
    pub requests: RequestTracker,
}

/// Ticket list actions.
#[derive(Debug, Clone)]
pub enum TicketsAction {
    /// Page shown; loads when signed in, else redirects to login
    Mount {
        /// Whether a session is held
        authenticated: bool,
    },
    /// Reload tickets
    Load,
    /// Tickets arrived
    Loaded {
        /// Load this answers
        request: RequestId,
        /// Outcome
        result: Result<Vec<Ticket>, ApiError>,
    },
    /// Redeem a ticket
    UseTicket {
        /// Ticket id
        id: u64,
    },
    /// Redemption finished
    TicketUsed {
        /// Ticket id
        id: u64,
        /// Outcome
        result: Result<UseTicketResponse, ApiError>,
    },
    /// The redirect was followed
    RedirectHandled,
}

/// Ticket list reducer.
#[derive(Debug, Clone)]
pub struct TicketsReducer<E, T, A, S> {
    _phantom: PhantomData<(E, T, A, S)>,
}

impl<E, T, A, S> TicketsReducer<E, T, A, S> {
    /// Create a reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<E, T, A, S> Default for TicketsReducer<E, T, A, S> {
    fn default() -> Self {
        Self::new()
    }
}

fn load<T>(state: &mut TicketsState, desk: &T) -> SmallVec<[Effect<TicketsAction>; 4]>
where
    T: TicketDesk + Clone + 'static,
{
    let request = state.requests.next();
    state.tickets = Loadable::Loading;
    let desk = desk.clone();
    smallvec![async_effect! {
        let result = desk.my_tickets().await;
        Some(TicketsAction::Loaded { request, result })
    }]
}

impl<E, T, A, S> Reducer for TicketsReducer<E, T, A, S>
where
    E: Catalog + Clone + 'static,
    T: TicketDesk + Clone + 'static,
    A: Accounts + Clone + 'static,
    S: SessionHandle + Clone + 'static,
{
    type State = TicketsState;
    type Action = TicketsAction;
    type Environment = StorefrontEnvironment<E, T, A, S>;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            TicketsAction::Mount { authenticated } => {
                if !authenticated {
                    state.redirect = Some(Route::Login);
                    return smallvec![Effect::None];
                }
                load(state, &env.tickets)
            },

            TicketsAction::Load => load(state, &env.tickets),

            TicketsAction::Loaded { request, result } => {
                if !state.requests.is_current(request) {
                    return smallvec![Effect::None];
                }
                state.tickets = match result {
                    Ok(tickets) => Loadable::from_items(tickets),
                    Err(error) if error.kind() == ApiErrorKind::Unauthorized => {
                        state.redirect = Some(Route::Login);
                        Loadable::Error(error.message)
                    },
                    Err(error) => {
                        tracing::warn!(%error, "Failed to load tickets");
                        Loadable::Error("Could not load your tickets.".to_string())
                    },
                };
                smallvec![Effect::None]
            },

            TicketsAction::UseTicket { id } => {
                if state.using.is_some() {
                    return smallvec![Effect::None];
                }
                state.using = Some(id);
                state.notice = None;
                let desk = env.tickets.clone();
                smallvec![async_effect! {
                    let result = desk.use_ticket(id).await;
                    Some(TicketsAction::TicketUsed { id, result })
                }]
            },

            TicketsAction::TicketUsed { id, result } => {
                state.using = None;
                match result {
                    Ok(response) => {
                        tracing::info!(ticket_id = id, "Ticket used");
                        state.notice = Some(response.status);
                        load(state, &env.tickets)
                    },
                    Err(error) => {
                        tracing::warn!(%error, ticket_id = id, "Could not use ticket");
                        state.notice = Some(error.message);
                        smallvec![Effect::None]
                    },
                }
            },

            TicketsAction::RedirectHandled => {
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
    use crate::mocks::{
        sample_ticket, test_env, MockAccounts, MockCatalog, MockTicketDesk, RecordingSession,
        TestEnv,
    };
    use casaroja_testing::{assertions, run_effects, ReducerTest};

    type TestReducer = TicketsReducer<MockCatalog, MockTicketDesk, MockAccounts, RecordingSession>;

    fn env_with(desk: MockTicketDesk) -> TestEnv {
        let mut env = test_env();
        env.tickets = desk;
        env
    }

    async fn settle(reducer: &TestReducer, state: &mut TicketsState, env: &TestEnv, action: TicketsAction) {
        let mut pending = run_effects(reducer.reduce(state, action, env)).await;
        while let Some(next) = pending.pop() {
            pending.extend(run_effects(reducer.reduce(state, next, env)).await);
        }
    }

    #[test]
    fn anonymous_visit_redirects_to_login() {
        ReducerTest::new(TestReducer::new())
            .with_env(test_env())
            .given_state(TicketsState::default())
            .when_action(TicketsAction::Mount {
                authenticated: false,
            })
            .then_state(|s| {
                assert_eq!(s.redirect, Some(Route::Login));
                assert_eq!(s.tickets, Loadable::Idle);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[tokio::test]
    async fn tickets_are_listed() {
        let env = env_with(MockTicketDesk::default().with_tickets(Ok(vec![sample_ticket(1)])));
        let reducer = TestReducer::new();
        let mut state = TicketsState::default();

        settle(&reducer, &mut state, &env, TicketsAction::Mount { authenticated: true }).await;

        assert_eq!(state.tickets.populated().unwrap()[0].ticket_number, "CR-00001");
    }

    #[tokio::test]
    async fn using_a_ticket_reloads_the_list() {
        let env = env_with(MockTicketDesk::default().with_tickets(Ok(vec![sample_ticket(1)])));
        let reducer = TestReducer::new();
        let mut state = TicketsState::default();

        settle(&reducer, &mut state, &env, TicketsAction::UseTicket { id: 1 }).await;

        assert_eq!(state.using, None);
        assert_eq!(state.notice.as_deref(), Some("Ticket used"));
        assert!(state.tickets.populated().is_some());
    }

    #[tokio::test]
    async fn rejected_redemption_keeps_list() {
        let env = env_with(
            MockTicketDesk::default()
                .with_use_ticket(Err(ApiError::from_response(400, Some(serde_json::json!({"detail": "Ticket already used"}))))),
        );
        let reducer = TestReducer::new();
        let mut state = TicketsState {
            tickets: Loadable::Populated(vec![sample_ticket(1)]),
            ..TicketsState::default()
        };

        settle(&reducer, &mut state, &env, TicketsAction::UseTicket { id: 1 }).await;

        assert_eq!(state.notice.as_deref(), Some("Ticket already used"));
        assert!(state.tickets.populated().is_some());
    }

    #[test]
    fn unauthorized_load_redirects() {
        let mut requests = RequestTracker::default();
        let request = requests.next();

        ReducerTest::new(TestReducer::new())
            .with_env(test_env())
            .given_state(TicketsState {
                tickets: Loadable::Loading,
                requests,
                ..TicketsState::default()
            })
            .when_action(TicketsAction::Loaded {
                request,
                result: Err(ApiError::from_response(401, None)),
            })
            .then_state(|s| assert_eq!(s.redirect, Some(Route::Login)))
            .run();
    }
}
