//! Landing page: hero text and featured events.

use super::{Loadable, RequestId, RequestTracker};
use crate::environment::StorefrontEnvironment;
use crate::providers::{Accounts, Catalog, SessionHandle, TicketDesk};
use casaroja_client::types::Event;
use casaroja_client::ApiError;
use casaroja_core::effect::Effect;
use casaroja_core::reducer::Reducer;
use casaroja_core::{async_effect, smallvec, SmallVec};
use std::marker::PhantomData;

/// Most featured events the landing page shows.
pub const HOME_FEATURED_LIMIT: usize = 6;

/// Landing page state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HomeState {
    /// Featured events, at most [`HOME_FEATURED_LIMIT`]
    pub featured: Loadable<Vec<Event>>,
    /// Load bookkeeping
    pub requests: RequestTracker,
}

/// Landing page actions.
#[derive(Debug, Clone)]
pub enum HomeAction {
    /// Load featured events
    Load,
    /// Featured events arrived
    Loaded {
        /// Load this answers
        request: RequestId,
        /// Outcome
        result: Result<Vec<Event>, ApiError>,
    },
}

/// Landing page reducer.
#[derive(Debug, Clone)]
pub struct HomeReducer<E, T, A, S> {
    _phantom: PhantomData<(E, T, A, S)>,
}

impl<E, T, A, S> HomeReducer<E, T, A, S> {
    /// Create a reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<E, T, A, S> Default for HomeReducer<E, T, A, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E, T, A, S> Reducer for HomeReducer<E, T, A, S>
where
    E: Catalog + Clone + 'static,
    T: TicketDesk + Clone + 'static,
    A: Accounts + Clone + 'static,
    S: SessionHandle + Clone + 'static,
{
    type State = HomeState;
    type Action = HomeAction;
    type Environment = StorefrontEnvironment<E, T, A, S>;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            HomeAction::Load => {
                let request = state.requests.next();
                state.featured = Loadable::Loading;
                let catalog = env.catalog.clone();
                smallvec![async_effect! {
                    let result = catalog.featured().await;
                    Some(HomeAction::Loaded { request, result })
                }]
            },

            HomeAction::Loaded { request, result } => {
                if !state.requests.is_current(request) {
                    tracing::debug!("Dropping superseded featured events");
                    return smallvec![Effect::None];
                }
                state.featured = match result {
                    Ok(mut events) => {
                        events.truncate(HOME_FEATURED_LIMIT);
                        Loadable::from_items(events)
                    },
                    Err(error) => {
                        tracing::warn!(%error, "Failed to load featured events");
                        Loadable::Error(
                            "We could not load events right now. Please try again.".to_string(),
                        )
                    },
                };
                smallvec![Effect::None]
            },
        }
    }
}
