//! One service per backend resource, one method per endpoint.

pub mod auth;
pub mod events;
pub mod tickets;

pub use auth::AuthService;
pub use events::EventsService;
pub use tickets::TicketsService;
