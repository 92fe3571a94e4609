//! Session state

use casaroja_client::types::User;

/// Where the front end should navigate next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// Landing page
    Home,
    /// Login form
    Login,
    /// Registration form
    Register,
    /// The signed-in customer's dashboard
    Dashboard,
    /// Event catalog
    Events,
    /// The customer's tickets
    Tickets,
    /// Venue list
    Venues,
}

impl Route {
    /// URL-style path.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Login => "/login",
            Self::Register => "/register",
            Self::Dashboard => "/dashboard",
            Self::Events => "/events",
            Self::Tickets => "/tickets",
            Self::Venues => "/venues",
        }
    }
}

/// Coarse view of [`SessionState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// No user
    Anonymous,
    /// A submission or revalidation is in flight
    Loading,
    /// A user is held
    Authenticated,
}

/// The signed-in user, if any.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    /// The current user
    pub user: Option<User>,
    /// Whether the session is authenticated
    pub is_authenticated: bool,
    /// Transient loading flag, never persisted
    pub is_loading: bool,
    /// Navigation requested by the session (after expiry)
    pub redirect: Option<Route>,
}

impl SessionState {
    /// An authenticated state for `user`.
    #[must_use]
    pub const fn authenticated(user: User) -> Self {
        Self {
            user: Some(user),
            is_authenticated: true,
            is_loading: false,
            redirect: None,
        }
    }

    /// The current status.
    #[must_use]
    pub const fn status(&self) -> SessionStatus {
        if self.is_loading {
            SessionStatus::Loading
        } else if self.is_authenticated {
            SessionStatus::Authenticated
        } else {
            SessionStatus::Anonymous
        }
    }

    /// Drop the user and return to anonymous. The redirect is kept.
    pub fn reset(&mut self) {
        self.user = None;
        self.is_authenticated = false;
        self.is_loading = false;
    }

    /// Take the pending redirect, if any.
    pub fn take_redirect(&mut self) -> Option<Route> {
        self.redirect.take()
    }
}
