//! Venue list.

use super::{Loadable, RequestId, RequestTracker};
use crate::environment::StorefrontEnvironment;
use crate::providers::{Accounts, Catalog, SessionHandle, TicketDesk};
use casaroja_client::types::Location;
use casaroja_client::ApiError;
use casaroja_core::effect::Effect;
use casaroja_core::reducer::Reducer;
use casaroja_core::{async_effect, smallvec, SmallVec};
use std::marker::PhantomData;

/// Venue list state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VenuesState {
    /// Venues
    pub venues: Loadable<Vec<Location>>,
    /// Load bookkeeping
    pub requests: RequestTracker,
}

/// Venue list actions.
#[derive(Debug, Clone)]
pub enum VenuesAction {
    /// Load venues
    Load,
    /// Venues arrived
    Loaded {
        /// Load this answers
        request: RequestId,
        /// Outcome
        result: Result<Vec<Location>, ApiError>,
    },
}

/// Venue list reducer.
#[derive(Debug, Clone)]
pub struct VenuesReducer<E, T, A, S> {
    _phantom: PhantomData<(E, T, A, S)>,
}

impl<E, T, A, S> VenuesReducer<E, T, A, S> {
    /// Create a reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<E, T, A, S> Default for VenuesReducer<E, T, A, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E, T, A, S> Reducer for VenuesReducer<E, T, A, S>
where
    E: Catalog + Clone + 'static,
    T: TicketDesk + Clone + 'static,
    A: Accounts + Clone + 'static,
    S: SessionHandle + Clone + 'static,
{
    type State = VenuesState;
    type Action = VenuesAction;
    type Environment = StorefrontEnvironment<E, T, A, S>;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            VenuesAction::Load => {
                let request = state.requests.next();
                state.venues = Loadable::Loading;
                let catalog = env.catalog.clone();
                smallvec![async_effect! {
                    let result = catalog.venues().await;
                    Some(VenuesAction::Loaded { request, result })
                }]
            },

            VenuesAction::Loaded { request, result } => {
                if !state.requests.is_current(request) {
                    return smallvec![Effect::None];
                }
                state.venues = match result {
                    Ok(venues) => Loadable::from_items(venues),
                    Err(error) => {
                        tracing::warn!(%error, "Failed to load venues");
                        Loadable::Error("Could not load venues. Check your connection.".to_string())
                    },
                };
                smallvec![Effect::None]
            },
        }
    }
}
