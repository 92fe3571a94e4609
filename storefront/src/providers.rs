//! What the pages need from the outside world.
//!
//! Pages depend on these traits rather than on concrete services so their
//! reducers can be tested without a backend. The production
//! implementations go through the query cache.

use casaroja_client::types::{
    AuthResponse, Event, EventFilters, LoginRequest, Location, Page, PurchaseTicketRequest,
    RegisterRequest, Ticket, UseTicketResponse, User,
};
use casaroja_client::ApiError;
use casaroja_core::environment::Clock;
use casaroja_query::{AuthQueries, EventQueries, TicketQueries};
use casaroja_session::{SessionAction, SessionBackend, SessionStore};
use std::future::Future;

/// Event catalog reads.
pub trait Catalog: Send + Sync {
    /// Featured events.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the catalog cannot be read.
    fn featured(&self) -> impl Future<Output = Result<Vec<Event>, ApiError>> + Send;

    /// One page of events.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the catalog cannot be read.
    fn events(
        &self,
        filters: EventFilters,
    ) -> impl Future<Output = Result<Page<Event>, ApiError>> + Send;

    /// The last page fetched for `filters`, shown while a refetch runs.
    fn cached_events(&self, filters: &EventFilters) -> Option<Page<Event>>;

    /// Venues.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the venues cannot be read.
    fn venues(&self) -> impl Future<Output = Result<Vec<Location>, ApiError>> + Send;
}

/// The customer's tickets.
pub trait TicketDesk: Send + Sync {
    /// Tickets owned by the signed-in customer.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the tickets cannot be read.
    fn my_tickets(&self) -> impl Future<Output = Result<Vec<Ticket>, ApiError>> + Send;

    /// Buy tickets.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the purchase is rejected.
    fn purchase(
        &self,
        request: PurchaseTicketRequest,
    ) -> impl Future<Output = Result<Ticket, ApiError>> + Send;

    /// Redeem a ticket.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the ticket cannot be used.
    fn use_ticket(&self, id: u64) -> impl Future<Output = Result<UseTicketResponse, ApiError>> + Send;
}

/// Account operations.
pub trait Accounts: Send + Sync {
    /// Exchange credentials for tokens. Tokens are kept by the client.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the credentials are rejected.
    fn login(
        &self,
        credentials: LoginRequest,
    ) -> impl Future<Output = Result<AuthResponse, ApiError>> + Send;

    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the registration is rejected.
    fn register(&self, request: RegisterRequest) -> impl Future<Output = Result<User, ApiError>> + Send;

    /// The signed-in user.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if no session is held or it was rejected.
    fn current_user(&self) -> impl Future<Output = Result<User, ApiError>> + Send;
}

/// Write access to the session store.
pub trait SessionHandle: Send + Sync {
    /// Mark `user` as signed in. Ends any loading state.
    fn login(&self, user: User) -> impl Future<Output = ()> + Send;

    /// Raise or drop the session's loading flag around a submission.
    fn set_loading(&self, loading: bool) -> impl Future<Output = ()> + Send;
}

impl<C> Catalog for EventQueries<C>
where
    C: Clock + Clone + 'static,
{
    fn featured(&self) -> impl Future<Output = Result<Vec<Event>, ApiError>> + Send {
        let queries = self.clone();
        async move { queries.featured().await }
    }

    fn events(
        &self,
        filters: EventFilters,
    ) -> impl Future<Output = Result<Page<Event>, ApiError>> + Send {
        let queries = self.clone();
        async move { queries.list(&filters).await }
    }

    fn cached_events(&self, filters: &EventFilters) -> Option<Page<Event>> {
        self.cached_list(filters)
    }

    fn venues(&self) -> impl Future<Output = Result<Vec<Location>, ApiError>> + Send {
        let queries = self.clone();
        async move { queries.locations().await }
    }
}

impl<C> TicketDesk for TicketQueries<C>
where
    C: Clock + Clone + 'static,
{
    fn my_tickets(&self) -> impl Future<Output = Result<Vec<Ticket>, ApiError>> + Send {
        let queries = self.clone();
        async move { queries.my_tickets().await }
    }

    fn purchase(
        &self,
        request: PurchaseTicketRequest,
    ) -> impl Future<Output = Result<Ticket, ApiError>> + Send {
        let queries = self.clone();
        async move { queries.purchase(&request).await }
    }

    fn use_ticket(&self, id: u64) -> impl Future<Output = Result<UseTicketResponse, ApiError>> + Send {
        let queries = self.clone();
        async move { queries.use_ticket(id).await }
    }
}

impl<C> Accounts for AuthQueries<C>
where
    C: Clock + Clone + 'static,
{
    fn login(
        &self,
        credentials: LoginRequest,
    ) -> impl Future<Output = Result<AuthResponse, ApiError>> + Send {
        let queries = self.clone();
        async move { AuthQueries::login(&queries, &credentials).await }
    }

    fn register(&self, request: RegisterRequest) -> impl Future<Output = Result<User, ApiError>> + Send {
        let queries = self.clone();
        async move { AuthQueries::register(&queries, &request).await }
    }

    fn current_user(&self) -> impl Future<Output = Result<User, ApiError>> + Send {
        let queries = self.clone();
        async move { AuthQueries::current_user(&queries).await }
    }
}

impl<B, C> SessionHandle for SessionStore<B, C>
where
    B: SessionBackend + Clone + 'static,
    C: Clock + Clone + 'static,
{
    fn login(&self, user: User) -> impl Future<Output = ()> + Send {
        let store = self.clone();
        async move {
            if let Err(error) = store.send(SessionAction::Login { user }).await {
                tracing::warn!(%error, "Session store rejected login");
            }
        }
    }

    fn set_loading(&self, loading: bool) -> impl Future<Output = ()> + Send {
        let store = self.clone();
        async move {
            if let Err(error) = store.send(SessionAction::SetLoading { loading }).await {
                tracing::warn!(%error, loading, "Session store rejected loading change");
            }
        }
    }
}
