//! The storefront's queries and mutations.
//!
//! Keys, stale times and invalidation rules live here so pages never pick
//! their own.

use crate::cache::QueryClient;
use crate::key::QueryKey;
use crate::options::QueryOptions;
use casaroja_client::services::{AuthService, EventsService, TicketsService};
use casaroja_client::types::{
    AuthResponse, Category, Event, EventFilters, LoginRequest, Location, Page,
    PurchaseTicketRequest, RegisterRequest, Ticket, TicketFilters, UseTicketResponse, User,
};
use casaroja_client::ApiError;
use casaroja_core::environment::Clock;

/// Cache keys.
pub mod keys {
    use crate::key::{KeySegment, QueryKey};
    use casaroja_client::types::{EventFilters, TicketFilters};

    /// `["events"]`
    #[must_use]
    pub fn events() -> QueryKey {
        QueryKey::new(["events"])
    }

    /// `["events", filters]`
    #[must_use]
    pub fn event_list(filters: &EventFilters) -> QueryKey {
        events().with(KeySegment::params(filters))
    }

    /// `["events", id]`
    #[must_use]
    pub fn event(id: u64) -> QueryKey {
        events().with(id)
    }

    /// `["events", "featured"]`
    #[must_use]
    pub fn featured_events() -> QueryKey {
        events().with("featured")
    }

    /// `["events", "upcoming"]`
    #[must_use]
    pub fn upcoming_events() -> QueryKey {
        events().with("upcoming")
    }

    /// `["categories"]`
    #[must_use]
    pub fn categories() -> QueryKey {
        QueryKey::new(["categories"])
    }

    /// `["locations"]`
    #[must_use]
    pub fn locations() -> QueryKey {
        QueryKey::new(["locations"])
    }

    /// `["tickets"]`
    #[must_use]
    pub fn tickets() -> QueryKey {
        QueryKey::new(["tickets"])
    }

    /// `["tickets", "my-tickets"]`
    #[must_use]
    pub fn my_tickets() -> QueryKey {
        tickets().with("my-tickets")
    }

    /// `["tickets", id]`
    #[must_use]
    pub fn ticket(id: u64) -> QueryKey {
        tickets().with(id)
    }

    /// `["tickets", "all"]`
    #[must_use]
    pub fn all_tickets() -> QueryKey {
        tickets().with("all")
    }

    /// `["tickets", "all", filters]`
    #[must_use]
    pub fn all_tickets_page(filters: &TicketFilters) -> QueryKey {
        all_tickets().with(KeySegment::params(filters))
    }

    /// `["auth"]`
    #[must_use]
    pub fn auth() -> QueryKey {
        QueryKey::new(["auth"])
    }

    /// `["auth", "current-user"]`
    #[must_use]
    pub fn current_user() -> QueryKey {
        auth().with("current-user")
    }
}

/// Cached event catalog reads.
#[derive(Debug, Clone)]
pub struct EventQueries<C> {
    cache: QueryClient<C>,
    service: EventsService,
}

impl<C: Clock + Clone> EventQueries<C> {
    /// Wrap a service.
    #[must_use]
    pub const fn new(cache: QueryClient<C>, service: EventsService) -> Self {
        Self { cache, service }
    }

    /// One page of events, fresh for 2 minutes.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] once retries are exhausted.
    pub async fn list(&self, filters: &EventFilters) -> Result<Page<Event>, ApiError> {
        self.cache
            .fetch_query(&keys::event_list(filters), QueryOptions::stale_minutes(2), || {
                self.service.list(filters)
            })
            .await
    }

    /// The last page fetched for `filters`, even if stale.
    #[must_use]
    pub fn cached_list(&self, filters: &EventFilters) -> Option<Page<Event>> {
        self.cache.get_query_data(&keys::event_list(filters))
    }

    /// One event, fresh for 5 minutes.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] once retries are exhausted.
    pub async fn detail(&self, id: u64) -> Result<Event, ApiError> {
        self.cache
            .fetch_query(&keys::event(id), QueryOptions::stale_minutes(5), || self.service.get(id))
            .await
    }

    /// Featured events, fresh for 10 minutes.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] once retries are exhausted.
    pub async fn featured(&self) -> Result<Vec<Event>, ApiError> {
        self.cache
            .fetch_query(&keys::featured_events(), QueryOptions::stale_minutes(10), || {
                self.service.featured()
            })
            .await
    }

    /// Upcoming events, fresh for 5 minutes.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] once retries are exhausted.
    pub async fn upcoming(&self) -> Result<Vec<Event>, ApiError> {
        self.cache
            .fetch_query(&keys::upcoming_events(), QueryOptions::stale_minutes(5), || {
                self.service.upcoming()
            })
            .await
    }

    /// Categories, fresh for 30 minutes.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] once retries are exhausted.
    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        self.cache
            .fetch_query(&keys::categories(), QueryOptions::stale_minutes(30), || {
                self.service.categories()
            })
            .await
    }

    /// Venues, fresh for 30 minutes.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] once retries are exhausted.
    pub async fn locations(&self) -> Result<Vec<Location>, ApiError> {
        self.cache
            .fetch_query(&keys::locations(), QueryOptions::stale_minutes(30), || {
                self.service.locations()
            })
            .await
    }
}

/// Cached ticket reads and ticket mutations.
#[derive(Debug, Clone)]
pub struct TicketQueries<C> {
    cache: QueryClient<C>,
    service: TicketsService,
}

impl<C: Clock + Clone> TicketQueries<C> {
    /// Wrap a service.
    #[must_use]
    pub const fn new(cache: QueryClient<C>, service: TicketsService) -> Self {
        Self { cache, service }
    }

    /// The customer's tickets, fresh for 2 minutes.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] once retries are exhausted.
    pub async fn my_tickets(&self) -> Result<Vec<Ticket>, ApiError> {
        self.cache
            .fetch_query(&keys::my_tickets(), QueryOptions::stale_minutes(2), || {
                self.service.my_tickets()
            })
            .await
    }

    /// One ticket, fresh for 5 minutes.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] once retries are exhausted.
    pub async fn detail(&self, id: u64) -> Result<Ticket, ApiError> {
        self.cache
            .fetch_query(&keys::ticket(id), QueryOptions::stale_minutes(5), || self.service.get(id))
            .await
    }

    /// A page of all visible tickets, fresh for 2 minutes.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] once retries are exhausted.
    pub async fn all(&self, filters: &TicketFilters) -> Result<Page<Ticket>, ApiError> {
        self.cache
            .fetch_query(&keys::all_tickets_page(filters), QueryOptions::stale_minutes(2), || {
                self.service.list(filters)
            })
            .await
    }

    /// Buy tickets, then invalidate the customer's tickets and every ticket
    /// query.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the purchase fails.
    pub async fn purchase(&self, request: &PurchaseTicketRequest) -> Result<Ticket, ApiError> {
        self.cache
            .mutate(&[keys::my_tickets(), keys::tickets()], || self.service.purchase(request))
            .await
    }

    /// Mark a ticket used, then invalidate it, the customer's tickets and
    /// the all-tickets pages.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the call fails.
    pub async fn use_ticket(&self, id: u64) -> Result<UseTicketResponse, ApiError> {
        self.cache
            .mutate(
                &[keys::ticket(id), keys::my_tickets(), keys::all_tickets()],
                || self.service.use_ticket(id),
            )
            .await
    }
}

/// Cached current-user read and the auth mutations.
#[derive(Debug, Clone)]
pub struct AuthQueries<C> {
    cache: QueryClient<C>,
    service: AuthService,
}

impl<C: Clock + Clone> AuthQueries<C> {
    /// Wrap a service.
    #[must_use]
    pub const fn new(cache: QueryClient<C>, service: AuthService) -> Self {
        Self { cache, service }
    }

    /// The service behind these queries.
    #[must_use]
    pub const fn service(&self) -> &AuthService {
        &self.service
    }

    /// The signed-in user, fresh for 5 minutes, never retried.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the call fails.
    pub async fn current_user(&self) -> Result<User, ApiError> {
        self.cache
            .fetch_query(
                &keys::current_user(),
                QueryOptions::stale_minutes(5).without_retry(),
                || self.service.current_user(),
            )
            .await
    }

    /// Log in and invalidate `["auth"]`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the credentials are rejected.
    pub async fn login(&self, credentials: &LoginRequest) -> Result<AuthResponse, ApiError> {
        self.cache
            .mutate(&[keys::auth()], || self.service.login(credentials))
            .await
    }

    /// Register and invalidate `["auth"]`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the registration is rejected.
    pub async fn register(&self, request: &RegisterRequest) -> Result<User, ApiError> {
        self.cache
            .mutate(&[keys::auth()], || self.service.register(request))
            .await
    }

    /// Forget the tokens and empty the whole cache.
    pub fn logout(&self) {
        self.service.logout();
        self.cache.clear();
    }
}
