//! Event catalog.
//!
//! Starts on page 1. Changing page or search issues a new load; a page
//! already in the cache is shown while its refetch runs.

use super::{Loadable, RequestId, RequestTracker};
use crate::environment::StorefrontEnvironment;
use crate::providers::{Accounts, Catalog, SessionHandle, TicketDesk};
use casaroja_client::types::{Event, EventFilters, Page};
use casaroja_client::ApiError;
use casaroja_core::effect::Effect;
use casaroja_core::reducer::Reducer;
use casaroja_core::{async_effect, smallvec, SmallVec};
use std::marker::PhantomData;

/// Event catalog state.
#[derive(Debug, Clone, PartialEq)]
pub struct EventsState {
    /// Filters of the current load
    pub filters: EventFilters,
    /// Events on the current page
    pub events: Loadable<Vec<Event>>,
    /// Total events across pages
    pub total: u64,
    /// Whether a later page exists
    pub has_next: bool,
    /// Cached events are shown while a refetch runs
    pub refreshing: bool,
    /// Load bookkeeping
    pub requests: RequestTracker,
}

impl Default for EventsState {
    fn default() -> Self {
        Self {
            filters: EventFilters::page(1),
            events: Loadable::Idle,
            total: 0,
            has_next: false,
            refreshing: false,
            requests: RequestTracker::default(),
        }
    }
}

impl EventsState {
    /// The 1-based page being shown.
    #[must_use]
    pub fn page(&self) -> u32 {
        self.filters.page.unwrap_or(1)
    }

    fn show(&mut self, page: Page<Event>) {
        self.total = page.count;
        self.has_next = page.next.is_some();
        self.events = Loadable::from_items(page.results);
    }
}

/// Event catalog actions.
#[derive(Debug, Clone)]
pub enum EventsAction {
    /// Load with the current filters
    Load,
    /// Go to a 1-based page
    GoToPage {
        /// Page
        page: u32,
    },
    /// Search by free text, back on page 1
    Search {
        /// Query; empty clears the search
        query: String,
    },
    /// A page arrived
    Loaded {
        /// Load this answers
        request: RequestId,
        /// Outcome
        result: Result<Page<Event>, ApiError>,
    },
}

/// Event catalog reducer.
#[derive(Debug, Clone)]
pub struct EventsReducer<E, T, A, S> {
    _phantom: PhantomData<(E, T, A, S)>,
}

impl<E, T, A, S> EventsReducer<E, T, A, S> {
    /// Create a reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<E, T, A, S> Default for EventsReducer<E, T, A, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E, T, A, S> EventsReducer<E, T, A, S>
where
    E: Catalog + Clone + 'static,
    T: TicketDesk + Clone + 'static,
    A: Accounts + Clone + 'static,
    S: SessionHandle + Clone + 'static,
{
    fn load(state: &mut EventsState, catalog: &E) -> SmallVec<[Effect<EventsAction>; 4]> {
        let request = state.requests.next();
        match catalog.cached_events(&state.filters) {
            Some(page) => {
                state.show(page);
                state.refreshing = true;
            },
            None => {
                state.events = Loadable::Loading;
                state.refreshing = false;
            },
        }

        let catalog = catalog.clone();
        let filters = state.filters.clone();
        smallvec![async_effect! {
            let result = catalog.events(filters).await;
            Some(EventsAction::Loaded { request, result })
        }]
    }
}

impl<E, T, A, S> Reducer for EventsReducer<E, T, A, S>
where
    E: Catalog + Clone + 'static,
    T: TicketDesk + Clone + 'static,
    A: Accounts + Clone + 'static,
    S: SessionHandle + Clone + 'static,
{
    type State = EventsState;
    type Action = EventsAction;
    type Environment = StorefrontEnvironment<E, T, A, S>;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            EventsAction::Load => Self::load(state, &env.catalog),

            EventsAction::GoToPage { page } => {
                state.filters.page = Some(page.max(1));
                Self::load(state, &env.catalog)
            },

            EventsAction::Search { query } => {
                let query = query.trim();
                state.filters.search = (!query.is_empty()).then(|| query.to_owned());
                state.filters.page = Some(1);
                Self::load(state, &env.catalog)
            },

            EventsAction::Loaded { request, result } => {
                if !state.requests.is_current(request) {
                    tracing::debug!("Dropping superseded events page");
                    return smallvec![Effect::None];
                }
                state.refreshing = false;
                match result {
                    Ok(page) => state.show(page),
                    Err(error) => {
                        tracing::warn!(%error, page = state.page(), "Failed to load events");
                        state.events =
                            Loadable::Error("Could not load events. Check your connection.".to_string());
                    },
                }
                smallvec![Effect::None]
            },
        }
    }
}
