//! In-memory providers and fixtures for page tests.

use crate::environment::StorefrontEnvironment;
use crate::providers::{Accounts, Catalog, SessionHandle, TicketDesk};
use casaroja_client::types::{
    AuthResponse, Event, EventFilters, EventStatus, EventType, LoginRequest, Location, Money, Page,
    PurchaseTicketRequest, RegisterRequest, Ticket, TicketStatus, UseTicketResponse, User,
};
use casaroja_client::ApiError;
use casaroja_session::mocks::sample_user;
use chrono::{TimeZone, Utc};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Environment built from the mocks below.
pub type TestEnv = StorefrontEnvironment<MockCatalog, MockTicketDesk, MockAccounts, RecordingSession>;

/// Fresh mocks with empty successful answers.
#[must_use]
pub fn test_env() -> TestEnv {
    StorefrontEnvironment::new(
        MockCatalog::default(),
        MockTicketDesk::default(),
        MockAccounts::default(),
        RecordingSession::default(),
    )
}

/// Catalog with canned answers.
#[derive(Debug, Clone)]
pub struct MockCatalog {
    featured: Result<Vec<Event>, ApiError>,
    events: Result<Page<Event>, ApiError>,
    cached: Option<Page<Event>>,
    venues: Result<Vec<Location>, ApiError>,
    requested: Arc<Mutex<Vec<EventFilters>>>,
}

impl Default for MockCatalog {
    fn default() -> Self {
        Self {
            featured: Ok(Vec::new()),
            events: Ok(Page::default()),
            cached: None,
            venues: Ok(Vec::new()),
            requested: Arc::default(),
        }
    }
}

impl MockCatalog {
    /// Answer `featured` with `answer`.
    #[must_use]
    pub fn with_featured(mut self, answer: Result<Vec<Event>, ApiError>) -> Self {
        self.featured = answer;
        self
    }

    /// Answer `events` with `answer`.
    #[must_use]
    pub fn with_events(mut self, answer: Result<Page<Event>, ApiError>) -> Self {
        self.events = answer;
        self
    }

    /// Report `page` as already cached.
    #[must_use]
    pub fn with_cached(mut self, page: Page<Event>) -> Self {
        self.cached = Some(page);
        self
    }

    /// Answer `venues` with `answer`.
    #[must_use]
    pub fn with_venues(mut self, answer: Result<Vec<Location>, ApiError>) -> Self {
        self.venues = answer;
        self
    }

    /// Filters passed to `events`, in call order.
    #[must_use]
    pub fn requested(&self) -> Vec<EventFilters> {
        self.requested
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Catalog for MockCatalog {
    fn featured(&self) -> impl Future<Output = Result<Vec<Event>, ApiError>> + Send {
        let answer = self.featured.clone();
        async move { answer }
    }

    fn events(
        &self,
        filters: EventFilters,
    ) -> impl Future<Output = Result<Page<Event>, ApiError>> + Send {
        self.requested
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(filters);
        let answer = self.events.clone();
        async move { answer }
    }

    fn cached_events(&self, _filters: &EventFilters) -> Option<Page<Event>> {
        self.cached.clone()
    }

    fn venues(&self) -> impl Future<Output = Result<Vec<Location>, ApiError>> + Send {
        let answer = self.venues.clone();
        async move { answer }
    }
}

/// Ticket desk with canned answers.
#[derive(Debug, Clone)]
pub struct MockTicketDesk {
    tickets: Result<Vec<Ticket>, ApiError>,
    purchase: Result<Ticket, ApiError>,
    use_ticket: Result<UseTicketResponse, ApiError>,
    purchases: Arc<AtomicUsize>,
}

impl Default for MockTicketDesk {
    fn default() -> Self {
        Self {
            tickets: Ok(Vec::new()),
            purchase: Ok(sample_ticket(1)),
            use_ticket: Ok(UseTicketResponse {
                status: "Ticket used".to_string(),
            }),
            purchases: Arc::default(),
        }
    }
}

impl MockTicketDesk {
    /// Answer `my_tickets` with `answer`.
    #[must_use]
    pub fn with_tickets(mut self, answer: Result<Vec<Ticket>, ApiError>) -> Self {
        self.tickets = answer;
        self
    }

    /// Answer `purchase` with `answer`.
    #[must_use]
    pub fn with_purchase(mut self, answer: Result<Ticket, ApiError>) -> Self {
        self.purchase = answer;
        self
    }

    /// Answer `use_ticket` with `answer`.
    #[must_use]
    pub fn with_use_ticket(mut self, answer: Result<UseTicketResponse, ApiError>) -> Self {
        self.use_ticket = answer;
        self
    }

    /// Number of purchase calls.
    #[must_use]
    pub fn purchases(&self) -> usize {
        self.purchases.load(Ordering::SeqCst)
    }
}

impl TicketDesk for MockTicketDesk {
    fn my_tickets(&self) -> impl Future<Output = Result<Vec<Ticket>, ApiError>> + Send {
        let answer = self.tickets.clone();
        async move { answer }
    }

    fn purchase(
        &self,
        _request: PurchaseTicketRequest,
    ) -> impl Future<Output = Result<Ticket, ApiError>> + Send {
        self.purchases.fetch_add(1, Ordering::SeqCst);
        let answer = self.purchase.clone();
        async move { answer }
    }

    fn use_ticket(&self, _id: u64) -> impl Future<Output = Result<UseTicketResponse, ApiError>> + Send {
        let answer = self.use_ticket.clone();
        async move { answer }
    }
}

/// Account operations with canned answers and a call count.
#[derive(Debug, Clone)]
pub struct MockAccounts {
    login: Result<AuthResponse, ApiError>,
    register: Result<User, ApiError>,
    current_user: Result<User, ApiError>,
    calls: Arc<AtomicUsize>,
}

impl Default for MockAccounts {
    fn default() -> Self {
        Self {
            login: Ok(AuthResponse {
                access: "a1".to_string(),
                refresh: "r1".to_string(),
                user: sample_user(),
            }),
            register: Ok(sample_user()),
            current_user: Ok(sample_user()),
            calls: Arc::default(),
        }
    }
}

impl MockAccounts {
    /// Answer `login` with `answer`.
    #[must_use]
    pub fn with_login(mut self, answer: Result<AuthResponse, ApiError>) -> Self {
        self.login = answer;
        self
    }

    /// Answer `register` with `answer`.
    #[must_use]
    pub fn with_register(mut self, answer: Result<User, ApiError>) -> Self {
        self.register = answer;
        self
    }

    /// Answer `current_user` with `answer`.
    #[must_use]
    pub fn with_current_user(mut self, answer: Result<User, ApiError>) -> Self {
        self.current_user = answer;
        self
    }

    /// Number of calls of any kind.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Accounts for MockAccounts {
    fn login(
        &self,
        _credentials: LoginRequest,
    ) -> impl Future<Output = Result<AuthResponse, ApiError>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let answer = self.login.clone();
        async move { answer }
    }

    fn register(&self, _request: RegisterRequest) -> impl Future<Output = Result<User, ApiError>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let answer = self.register.clone();
        async move { answer }
    }

    fn current_user(&self) -> impl Future<Output = Result<User, ApiError>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let answer = self.current_user.clone();
        async move { answer }
    }
}

/// Session handle that records who logged in.
#[derive(Debug, Clone, Default)]
pub struct RecordingSession {
    logins: Arc<Mutex<Vec<User>>>,
    loading: Arc<Mutex<Vec<bool>>>,
}

impl RecordingSession {
    /// Users passed to `login`, in call order.
    #[must_use]
    pub fn logins(&self) -> Vec<User> {
        self.logins
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Values passed to `set_loading`, in call order.
    #[must_use]
    pub fn loading_changes(&self) -> Vec<bool> {
        self.loading
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SessionHandle for RecordingSession {
    fn login(&self, user: User) -> impl Future<Output = ()> + Send {
        self.logins
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(user);
        async {}
    }

    fn set_loading(&self, loading: bool) -> impl Future<Output = ()> + Send {
        self.loading
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(loading);
        async {}
    }
}

/// A published event starting 1 March 2025, 18:00 UTC, priced 15000.
#[must_use]
pub fn sample_event(id: u64) -> Event {
    let start = Utc.with_ymd_and_hms(2025, 3, 1, 18, 0, 0).single().unwrap_or_default();
    Event {
        id,
        title: format!("Event {id}"),
        description: None,
        short_description: "Folk music under the stars".to_string(),
        event_type: EventType::Performance,
        category: None,
        organizer: None,
        cultor: None,
        start_datetime: start,
        end_datetime: start + chrono::Duration::hours(2),
        duration_minutes: Some(120),
        location: None,
        requires_transport: false,
        meeting_point: None,
        base_price: Money(15_000.0),
        max_participants: 50,
        min_participants: None,
        available_spots: Some(12),
        is_sold_out: Some(false),
        allows_cancellation: true,
        status: EventStatus::Published,
        main_image: None,
        featured: false,
        tags: Vec::new(),
    }
}

/// A confirmed ticket for two to [`sample_event`]`(1)`.
#[must_use]
pub fn sample_ticket(id: u64) -> Ticket {
    let event = sample_event(1);
    Ticket {
        id,
        ticket_number: format!("CR-{id:05}"),
        purchase_date: event.start_datetime - chrono::Duration::days(10),
        event,
        status: TicketStatus::Confirmed,
        base_price: Money(15_000.0),
        discount_amount: Money(0.0),
        transport_fee: Money(0.0),
        total_price: Money(30_000.0),
        participants_count: 2,
        participant_names: vec!["Ana".to_string(), "Luis".to_string()],
        special_requests: None,
        used_date: None,
        qr_code: None,
    }
}

/// A venue in Valparaíso with parking.
#[must_use]
pub fn sample_venue(id: u64) -> Location {
    Location {
        id,
        name: format!("Venue {id}"),
        address: "Avenida Brasil 1234".to_string(),
        city: "Valparaíso".to_string(),
        postal_code: String::new(),
        latitude: None,
        longitude: None,
        capacity: 300,
        has_parking: true,
        has_accessibility: false,
        has_audio_equipment: false,
        contact_name: String::new(),
        contact_phone: String::new(),
        contact_email: String::new(),
    }
}
