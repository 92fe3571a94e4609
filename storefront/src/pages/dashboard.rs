//! The signed-in customer's dashboard.
//!
//! Requires a session. Loads the current user and the featured events
//! together and shows at most [`DASHBOARD_FEATURED_LIMIT`] of the latter.

use super::{Loadable, RequestId, RequestTracker};
use crate::environment::StorefrontEnvironment;
use crate::providers::{Accounts, Catalog, SessionHandle, TicketDesk};
use casaroja_client::types::{Event, User};
use casaroja_client::{ApiError, ApiErrorKind};
use casaroja_core::effect::Effect;
use casaroja_core::reducer::Reducer;
use casaroja_core::{async_effect, smallvec, SmallVec};
use casaroja_session::Route;
use std::marker::PhantomData;

/// Most featured events the dashboard shows.
pub const DASHBOARD_FEATURED_LIMIT: usize = 3;

/// What a loaded dashboard shows.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardData {
    /// The signed-in user
    pub user: User,
    /// Up to [`DASHBOARD_FEATURED_LIMIT`] featured events
    pub featured: Vec<Event>,
}

/// Dashboard state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardState {
    /// User and featured events
    pub data: Loadable<DashboardData>,
    /// Navigation requested by the page
    pub redirect: Option<Route>,
    /// Load bookkeeping
    pub requests: RequestTracker,
}

/// Dashboard actions.
#[derive(Debug, Clone)]
pub enum DashboardAction {
    /// Page shown; loads when signed in, else redirects to login
    Mount {
        /// Whether a session is held
        authenticated: bool,
    },
    /// User and featured events arrived
    Loaded {
        /// Load this answers
        request: RequestId,
        /// Current user
        user: Result<User, ApiError>,
        /// Featured events
        featured: Result<Vec<Event>, ApiError>,
    },
    /// The redirect was followed
    RedirectHandled,
}

/// Dashboard reducer.
#[derive(Debug, Clone)]
pub struct DashboardReducer<E, T, A, S> {
    _phantom: PhantomData<(E, T, A, S)>,
}

impl<E, T, A, S> DashboardReducer<E, T, A, S> {
    /// Create a reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<E, T, A, S> Default for DashboardReducer<E, T, A, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E, T, A, S> Reducer for DashboardReducer<E, T, A, S>
where
    E: Catalog + Clone + 'static,
    T: TicketDesk + Clone + 'static,
    A: Accounts + Clone + 'static,
    S: SessionHandle + Clone + 'static,
{
    type State = DashboardState;
    type Action = DashboardAction;
    type Environment = StorefrontEnvironment<E, T, A, S>;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            DashboardAction::Mount { authenticated } => {
                if !authenticated {
                    tracing::debug!("Dashboard requires a session, redirecting to login");
                    state.redirect = Some(Route::Login);
                    return smallvec![Effect::None];
                }

                let request = state.requests.next();
                state.data = Loadable::Loading;
                let accounts = env.accounts.clone();
                let catalog = env.catalog.clone();
                smallvec![async_effect! {
                    let (user, featured) =
                        futures::future::join(accounts.current_user(), catalog.featured()).await;
                    Some(DashboardAction::Loaded { request, user, featured })
                }]
            },

            DashboardAction::Loaded {
                request,
                user,
                featured,
            } => {
                if !state.requests.is_current(request) {
                    return smallvec![Effect::None];
                }

                state.data = match (user, featured) {
                    (Ok(user), Ok(mut featured)) => {
                        featured.truncate(DASHBOARD_FEATURED_LIMIT);
                        Loadable::Populated(DashboardData { user, featured })
                    },
                    (Err(error), _) | (_, Err(error)) => {
                        tracing::warn!(%error, "Failed to load dashboard");
                        if error.kind() == ApiErrorKind::Unauthorized {
                            state.redirect = Some(Route::Login);
                        }
                        Loadable::Error("Could not load your account information.".to_string())
                    },
                };
                smallvec![Effect::None]
            },

            DashboardAction::RedirectHandled => {
                state.redirect = None;
                smallvec![Effect::None]
            },
        }
    }
}
