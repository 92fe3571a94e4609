//! Records exchanged with the backend.
//!
//! Field names follow the backend's snake_case JSON. Fields that only some
//! serializers emit (list vs. detail views) default when absent.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ═══════════════════════════════════════════════════════════════════════
// Lenient numbers
// ═══════════════════════════════════════════════════════════════════════

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

impl NumberOrText {
    fn into_f64<E: serde::de::Error>(self) -> Result<f64, E> {
        let value = match self {
            Self::Number(n) => n,
            Self::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| E::custom(format!("invalid decimal: {s:?}")))?,
        };
        if value.is_finite() {
            Ok(value)
        } else {
            Err(E::custom(format!("decimal is not finite: {value}")))
        }
    }
}

fn optional_decimal<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<NumberOrText>::deserialize(deserializer)?
        .map(NumberOrText::into_f64)
        .transpose()
}

/// A monetary amount in Chilean pesos.
///
/// The backend serializes decimals as strings (`"15000.00"`); both strings
/// and JSON numbers are accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Money(pub f64);

impl Money {
    /// The amount.
    #[must_use]
    pub const fn amount(self) -> f64 {
        self.0
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        NumberOrText::deserialize(deserializer)?.into_f64().map(Money)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Users
// ═══════════════════════════════════════════════════════════════════════

/// Account role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    /// Customer buying tickets
    #[default]
    Client,
    /// Artist or teacher running events
    Cultor,
    /// Venue or platform manager
    Manager,
    /// Transport provider
    Transport,
    /// Event organizer
    EventCreator,
}

/// Extended profile attached to a user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    /// Free-text bio
    pub bio: String,
    /// Self-reported location
    pub location: String,
    /// Personal website
    pub website: String,
    /// Facebook URL
    pub social_facebook: String,
    /// Instagram URL
    pub social_instagram: String,
    /// YouTube URL
    pub social_youtube: String,
    /// Preferred language code
    pub language: String,
    /// IANA timezone
    pub timezone: String,
    /// Email notifications enabled
    pub notifications_email: bool,
    /// SMS notifications enabled
    pub notifications_sms: bool,
}

/// A backend account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Account id
    pub id: u64,
    /// Login name (the email for storefront registrations)
    pub username: String,
    /// Email address
    #[serde(default)]
    pub email: String,
    /// Given name
    #[serde(default)]
    pub first_name: String,
    /// Family name
    #[serde(default)]
    pub last_name: String,
    /// Role
    #[serde(default)]
    pub user_type: UserType,
    /// Phone number
    #[serde(default)]
    pub phone_number: String,
    /// Avatar URL
    #[serde(default)]
    pub profile_image: Option<String>,
    /// Date of birth
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    /// Whether the account is verified
    #[serde(default)]
    pub is_verified: bool,
    /// Creation time
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Extended profile
    #[serde(default)]
    pub profile: Option<UserProfile>,
}

impl User {
    /// Full name when both names are set, else the username.
    #[must_use]
    pub fn display_name(&self) -> String {
        let first = self.first_name.trim();
        let last = self.last_name.trim();
        if first.is_empty() || last.is_empty() {
            self.username.clone()
        } else {
            format!("{first} {last}")
        }
    }
}

/// Partial user update (`PATCH /auth/profile/`).
///
/// Unset fields are omitted from the request and left untouched by
/// [`UserUpdate::apply_to`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserUpdate {
    /// New email
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// New given name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// New family name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// New phone number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    /// New date of birth
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
}

impl UserUpdate {
    /// Merge the set fields into `user`.
    pub fn apply_to(&self, user: &mut User) {
        if let Some(email) = &self.email {
            user.email.clone_from(email);
        }
        if let Some(first_name) = &self.first_name {
            user.first_name.clone_from(first_name);
        }
        if let Some(last_name) = &self.last_name {
            user.last_name.clone_from(last_name);
        }
        if let Some(phone_number) = &self.phone_number {
            user.phone_number.clone_from(phone_number);
        }
        if let Some(birth_date) = self.birth_date {
            user.birth_date = Some(birth_date);
        }
    }

    /// Whether no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.phone_number.is_none()
            && self.birth_date.is_none()
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Catalog
// ═══════════════════════════════════════════════════════════════════════

/// Event category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Category id
    pub id: u64,
    /// Display name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Icon name
    #[serde(default)]
    pub icon: String,
    /// Display color
    #[serde(default)]
    pub color: String,
    /// Whether the category is active
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// A venue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Venue id
    pub id: u64,
    /// Venue name
    pub name: String,
    /// Street address
    #[serde(default)]
    pub address: String,
    /// City
    #[serde(default)]
    pub city: String,
    /// Postal code
    #[serde(default)]
    pub postal_code: String,
    /// Latitude
    #[serde(default, deserialize_with = "optional_decimal")]
    pub latitude: Option<f64>,
    /// Longitude
    #[serde(default, deserialize_with = "optional_decimal")]
    pub longitude: Option<f64>,
    /// Seated capacity
    #[serde(default)]
    pub capacity: u32,
    /// Parking available
    #[serde(default)]
    pub has_parking: bool,
    /// Step-free access
    #[serde(default)]
    pub has_accessibility: bool,
    /// Audio equipment on site
    #[serde(default)]
    pub has_audio_equipment: bool,
    /// Contact person
    #[serde(default)]
    pub contact_name: String,
    /// Contact phone
    #[serde(default)]
    pub contact_phone: String,
    /// Contact email
    #[serde(default)]
    pub contact_email: String,
}

impl Location {
    /// Labels for the amenities this venue offers.
    #[must_use]
    pub fn amenities(&self) -> Vec<&'static str> {
        [
            (self.has_parking, "Parking"),
            (self.has_accessibility, "Accessible"),
            (self.has_audio_equipment, "Audio equipment"),
        ]
        .into_iter()
        .filter_map(|(offered, label)| offered.then_some(label))
        .collect()
    }
}

/// Kind of event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// Single session
    Session,
    /// Hands-on workshop
    Workshop,
    /// Performance
    Performance,
    /// Exhibition
    Exhibition,
    /// Conference
    Conference,
    /// Festival
    Festival,
}

/// Publication status of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    /// Not yet public
    Draft,
    /// Open for sale
    Published,
    /// No spots left
    SoldOut,
    /// Called off
    Cancelled,
    /// Already happened
    Completed,
}

/// A cultural event. Read-only from the storefront.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event id
    pub id: u64,
    /// Title
    pub title: String,
    /// Long description (detail view only)
    #[serde(default)]
    pub description: Option<String>,
    /// Teaser text
    #[serde(default)]
    pub short_description: String,
    /// Kind of event
    pub event_type: EventType,
    /// Category
    #[serde(default)]
    pub category: Option<Category>,
    /// Organizing account
    #[serde(default)]
    pub organizer: Option<User>,
    /// Performing artist
    #[serde(default)]
    pub cultor: Option<User>,
    /// Start time
    pub start_datetime: DateTime<Utc>,
    /// End time
    pub end_datetime: DateTime<Utc>,
    /// Length in minutes
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    /// Venue, when confirmed
    #[serde(default)]
    pub location: Option<Location>,
    /// Whether transport is arranged
    #[serde(default)]
    pub requires_transport: bool,
    /// Where transport departs
    #[serde(default)]
    pub meeting_point: Option<String>,
    /// Price per participant
    pub base_price: Money,
    /// Capacity
    pub max_participants: u32,
    /// Minimum to run
    #[serde(default)]
    pub min_participants: Option<u32>,
    /// Spots left
    #[serde(default)]
    pub available_spots: Option<i64>,
    /// Whether the event is full
    #[serde(default)]
    pub is_sold_out: Option<bool>,
    /// Whether tickets can be cancelled
    #[serde(default)]
    pub allows_cancellation: bool,
    /// Publication status
    pub status: EventStatus,
    /// Cover image URL
    #[serde(default)]
    pub main_image: Option<String>,
    /// Highlighted on the home page
    #[serde(default)]
    pub featured: bool,
    /// Free-form tags
    #[serde(default)]
    pub tags: Vec<String>,
}

// ═══════════════════════════════════════════════════════════════════════
// Tickets
// ═══════════════════════════════════════════════════════════════════════

/// Ticket lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    /// Awaiting payment confirmation
    Pending,
    /// Valid for entry
    Confirmed,
    /// Already redeemed
    Used,
    /// Cancelled
    Cancelled,
    /// Refunded
    Refunded,
}

/// A purchased ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    /// Ticket id
    pub id: u64,
    /// Human-facing ticket number
    pub ticket_number: String,
    /// The event
    pub event: Event,
    /// Lifecycle state
    pub status: TicketStatus,
    /// Price before discounts and fees
    pub base_price: Money,
    /// Discount applied
    #[serde(default)]
    pub discount_amount: Money,
    /// Transport surcharge
    #[serde(default)]
    pub transport_fee: Money,
    /// Amount charged
    pub total_price: Money,
    /// Number of attendees
    pub participants_count: u32,
    /// Attendee names
    #[serde(default)]
    pub participant_names: Vec<String>,
    /// Notes for the organizer
    #[serde(default)]
    pub special_requests: Option<String>,
    /// Purchase time
    pub purchase_date: DateTime<Utc>,
    /// Redemption time
    #[serde(default)]
    pub used_date: Option<DateTime<Utc>>,
    /// QR payload
    #[serde(default)]
    pub qr_code: Option<String>,
}

// ═══════════════════════════════════════════════════════════════════════
// Envelopes
// ═══════════════════════════════════════════════════════════════════════

/// Pagination envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Total number of items across pages
    #[serde(default)]
    pub count: u64,
    /// URL of the next page
    #[serde(default)]
    pub next: Option<String>,
    /// URL of the previous page
    #[serde(default)]
    pub previous: Option<String>,
    /// Items on this page
    pub results: Vec<T>,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            count: 0,
            next: None,
            previous: None,
            results: Vec::new(),
        }
    }
}

/// A list endpoint's answer: either a bare array or a [`Page`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    /// Bare JSON array
    List(Vec<T>),
    /// Pagination envelope
    Page(Page<T>),
}

impl<T> Listing<T> {
    /// The items, whichever shape arrived.
    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::List(items) => items,
            Self::Page(page) => page.results,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Requests and responses
// ═══════════════════════════════════════════════════════════════════════

/// `POST /auth/login/`
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Username (the storefront sends the email)
    pub username: String,
    /// Password
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// `POST /auth/register/`
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Username (the storefront sends the email)
    pub username: String,
    /// Email
    pub email: String,
    /// Password
    pub password: String,
    /// Password confirmation
    pub password_confirm: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Role, always `client` from the storefront
    pub user_type: UserType,
    /// Phone number, possibly empty
    pub phone_number: String,
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("user_type", &self.user_type)
            .finish_non_exhaustive()
    }
}

/// Login response: tokens plus the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Access token
    pub access: String,
    /// Refresh token
    pub refresh: String,
    /// The signed-in user
    pub user: User,
}

/// `POST /auth/change-password/`
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    /// Current password
    pub old_password: String,
    /// Replacement password
    pub new_password: String,
}

impl std::fmt::Debug for ChangePasswordRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ChangePasswordRequest { .. }")
    }
}

/// `POST /tickets/purchase/`. Pricing is computed by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseTicketRequest {
    /// Event id
    pub event: u64,
    /// Number of attendees
    pub participants_count: u32,
    /// Attendee names
    pub participant_names: Vec<String>,
    /// Notes for the organizer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_requests: Option<String>,
    /// Discount code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_code: Option<String>,
}

/// Answer to `use_ticket`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UseTicketResponse {
    /// Backend confirmation text
    pub status: String,
}

// ═══════════════════════════════════════════════════════════════════════
// Filters
// ═══════════════════════════════════════════════════════════════════════

/// Query parameters for the event list. Unset fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventFilters {
    /// 1-based page
    pub page: Option<u32>,
    /// Category id
    pub category: Option<u64>,
    /// Kind of event
    pub event_type: Option<EventType>,
    /// Venue id
    pub location: Option<u64>,
    /// Free-text search
    pub search: Option<String>,
    /// Ordering expression, e.g. `start_datetime`
    pub ordering: Option<String>,
}

impl EventFilters {
    /// Filters selecting one page.
    #[must_use]
    pub fn page(page: u32) -> Self {
        Self {
            page: Some(page),
            ..Self::default()
        }
    }

    /// Query pairs for the set fields.
    #[must_use]
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        push(&mut query, "page", self.page);
        push(&mut query, "category", self.category);
        push(&mut query, "event_type", self.event_type.map(EventType::as_str));
        push(&mut query, "location", self.location);
        push(&mut query, "search", self.search.as_deref().filter(|s| !s.is_empty()));
        push(&mut query, "ordering", self.ordering.as_deref().filter(|s| !s.is_empty()));
        query
    }
}

/// Query parameters for the ticket list. Unset fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TicketFilters {
    /// 1-based page
    pub page: Option<u32>,
    /// Event id
    pub event: Option<u64>,
    /// Ticket status
    pub status: Option<TicketStatus>,
}

impl TicketFilters {
    /// Query pairs for the set fields.
    #[must_use]
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        push(&mut query, "page", self.page);
        push(&mut query, "event", self.event);
        push(&mut query, "status", self.status.map(TicketStatus::as_str));
        query
    }
}

fn push<V: ToString>(query: &mut Vec<(&'static str, String)>, key: &'static str, value: Option<V>) {
    if let Some(value) = value {
        query.push((key, value.to_string()));
    }
}

impl EventType {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Session => "session",
            Self::Workshop => "workshop",
            Self::Performance => "performance",
            Self::Exhibition => "exhibition",
            Self::Conference => "conference",
            Self::Festival => "festival",
        }
    }
}

impl TicketStatus {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Used => "used",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
        }
    }
}

const fn default_true() -> bool {
    true
}
