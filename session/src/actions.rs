//! Session actions

use casaroja_client::types::{User, UserUpdate};

/// Inputs to the session state machine.
///
/// Commands come from pages and the front end. `UserLoaded` and
/// `InitializeFailed` are produced by the revalidation effect.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionAction {
    /// Revalidate the persisted session against the backend
    Initialize,

    /// Revalidation returned the current user
    UserLoaded {
        /// The user as the backend sees it
        user: User,
    },

    /// Revalidation failed
    InitializeFailed {
        /// Error message
        message: String,
    },

    /// Become authenticated with a pre-fetched user
    Login {
        /// The user returned by login or registration
        user: User,
    },

    /// Drop tokens and the user
    Logout,

    /// Merge a partial update into the held user
    UpdateUser {
        /// Fields to change
        update: UserUpdate,
    },

    /// Toggle the transient loading flag
    SetLoading {
        /// New value
        loading: bool,
    },

    /// The API client gave up on the tokens
    SessionExpired,

    /// The front end followed the pending redirect
    RedirectHandled,
}
