//! Page environment

use crate::providers::{Accounts, Catalog, SessionHandle, TicketDesk};

/// Dependencies shared by every page reducer.
///
/// # Type Parameters
///
/// - `E`: event catalog
/// - `T`: ticket desk
/// - `A`: account operations
/// - `S`: session store handle
#[derive(Clone)]
pub struct StorefrontEnvironment<E, T, A, S>
where
    E: Catalog + Clone,
    T: TicketDesk + Clone,
    A: Accounts + Clone,
    S: SessionHandle + Clone,
{
    /// Event catalog.
    pub catalog: E,

    /// Ticket desk.
    pub tickets: T,

    /// Account operations.
    pub accounts: A,

    /// Session store.
    pub session: S,
}

impl<E, T, A, S> StorefrontEnvironment<E, T, A, S>
where
    E: Catalog + Clone,
    T: TicketDesk + Clone,
    A: Accounts + Clone,
    S: SessionHandle + Clone,
{
    /// Create a new environment.
    #[must_use]
    pub const fn new(catalog: E, tickets: T, accounts: A, session: S) -> Self {
        Self {
            catalog,
            tickets,
            accounts,
            session,
        }
    }
}
