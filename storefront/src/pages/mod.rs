//! Page state machines.
//!
//! Each page is a reducer hosted in a `casaroja_runtime::Store`. Loads are
//! tagged with a [`RequestId`]; a response whose id is no longer the
//! latest is dropped, so a slow answer never overwrites a newer one.

pub mod dashboard;
pub mod events;
pub mod home;
pub mod login;
pub mod purchase;
pub mod register;
pub mod tickets;
pub mod venues;

pub use dashboard::{DashboardAction, DashboardReducer, DashboardState};
pub use events::{EventsAction, EventsReducer, EventsState};
pub use home::{HomeAction, HomeReducer, HomeState};
pub use login::{LoginAction, LoginReducer, LoginState};
pub use purchase::{PurchaseAction, PurchaseReducer, PurchaseState};
pub use register::{RegisterAction, RegisterReducer, RegisterState};
pub use tickets::{TicketsAction, TicketsReducer, TicketsState};
pub use venues::{VenuesAction, VenuesReducer, VenuesState};

/// What a page shows for one piece of remote data.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Loadable<T> {
    /// Nothing requested yet
    #[default]
    Idle,
    /// A request is in flight
    Loading,
    /// The request failed
    Error(String),
    /// The request succeeded with nothing to show
    Empty,
    /// The request succeeded
    Populated(T),
}

impl<T> Loadable<T> {
    /// Whether a request is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// The loaded value, if any.
    #[must_use]
    pub const fn populated(&self) -> Option<&T> {
        match self {
            Self::Populated(value) => Some(value),
            _ => None,
        }
    }

    /// The error message, if the request failed.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message),
            _ => None,
        }
    }
}

impl<T> Loadable<Vec<T>> {
    /// `Empty` for no items, `Populated` otherwise.
    #[must_use]
    pub fn from_items(items: Vec<T>) -> Self {
        if items.is_empty() {
            Self::Empty
        } else {
            Self::Populated(items)
        }
    }
}

/// Identifies one load issued by a page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

/// Issues [`RequestId`]s and remembers the latest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestTracker {
    latest: u64,
}

impl RequestTracker {
    /// Issue a new id, superseding every earlier one.
    pub const fn next(&mut self) -> RequestId {
        self.latest += 1;
        RequestId(self.latest)
    }

    /// Whether `id` is the latest issued.
    #[must_use]
    pub const fn is_current(&self, id: RequestId) -> bool {
        id.0 == self.latest
    }
}
