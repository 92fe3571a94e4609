//! Endpoint paths, relative to the configured base URL.

/// Authentication endpoints
pub mod auth {
    /// `POST` credentials, returns tokens and the user
    pub const LOGIN: &str = "/auth/login/";
    /// `POST` a registration, returns the created user
    pub const REGISTER: &str = "/auth/register/";
    /// `POST {refresh}`, returns a new access token
    pub const REFRESH: &str = "/auth/token/refresh/";
    /// `GET` or `PATCH` the current user
    pub const PROFILE: &str = "/auth/profile/";
    /// `POST` a password change
    pub const CHANGE_PASSWORD: &str = "/auth/change-password/";
}

/// Event catalog endpoints
pub mod events {
    /// Paginated, filterable event list
    pub const LIST: &str = "/events/events/";
    /// Featured events
    pub const FEATURED: &str = "/events/featured/";
    /// Upcoming events
    pub const UPCOMING: &str = "/events/upcoming/";
    /// Event categories
    pub const CATEGORIES: &str = "/events/categories/";
    /// Venues
    pub const LOCATIONS: &str = "/events/locations/";

    /// A single event
    #[must_use]
    pub fn detail(id: u64) -> String {
        format!("/events/events/{id}/")
    }
}

/// Ticket endpoints
pub mod tickets {
    /// Paginated ticket list
    pub const LIST: &str = "/tickets/tickets/";
    /// `POST` a purchase
    pub const PURCHASE: &str = "/tickets/purchase/";
    /// The signed-in customer's tickets
    pub const MY_TICKETS: &str = "/tickets/my-tickets/";

    /// A single ticket
    #[must_use]
    pub fn detail(id: u64) -> String {
        format!("/tickets/tickets/{id}/")
    }

    /// `POST` to mark a ticket as used
    #[must_use]
    pub fn use_ticket(id: u64) -> String {
        format!("/tickets/tickets/{id}/use_ticket/")
    }
}
