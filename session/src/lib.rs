//! # Casa Roja Session
//!
//! The signed-in user as an explicit state machine:
//!
//! ```text
//! anonymous ──Initialize / Login──▶ loading ──UserLoaded──▶ authenticated
//!     ▲                                                         │
//!     └──────────── Logout / SessionExpired / InitializeFailed ─┘
//! ```
//!
//! [`SessionReducer`] runs inside a `casaroja_runtime::Store`. Tokens live
//! in the API client's [`casaroja_client::TokenStore`]; this crate persists
//! only `{user, isAuthenticated}` under [`persistence::SESSION_KEY`].
//!
//! ## Example
//!
//! ```ignore
//! let store = session_store(SessionState::restore(storage.as_ref()), env);
//! store.send(SessionAction::Initialize).await?.wait().await;
//! let signed_in = store.state(|s| s.is_authenticated).await;
//! ```

pub mod actions;
pub mod bridge;
pub mod environment;
pub mod persistence;
pub mod providers;
pub mod reducer;
pub mod state;

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

pub use actions::SessionAction;
pub use bridge::forward_session_expiry;
pub use environment::SessionEnvironment;
pub use providers::SessionBackend;
pub use reducer::SessionReducer;
pub use state::{Route, SessionState, SessionStatus};

use casaroja_runtime::Store;

/// A store hosting the session state machine.
pub type SessionStore<B, C> =
    Store<SessionState, SessionAction, SessionEnvironment<B, C>, SessionReducer<B, C>>;

/// Build a [`SessionStore`].
pub fn session_store<B, C>(initial: SessionState, env: SessionEnvironment<B, C>) -> SessionStore<B, C>
where
    B: SessionBackend + Clone + 'static,
    C: casaroja_core::environment::Clock + Clone + 'static,
{
    Store::new(initial, SessionReducer::new(), env)
}
