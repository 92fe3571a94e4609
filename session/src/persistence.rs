//! The persisted session snapshot
//!
//! Only the user and the authenticated flag survive a restart. The loading
//! flag and any pending redirect are transient.

use crate::state::SessionState;
use casaroja_client::{storage, types::User, KeyValueStorage};
use serde::{Deserialize, Serialize};

/// Storage key of the snapshot.
pub const SESSION_KEY: &str = "casaroja-auth";

/// Snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 0;

/// What is persisted of a [`SessionState`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSession {
    /// The user
    #[serde(default)]
    pub user: Option<User>,
    /// The authenticated flag
    #[serde(default)]
    pub is_authenticated: bool,
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    state: PersistedSession,
    #[serde(default)]
    version: u32,
}

impl From<&SessionState> for PersistedSession {
    fn from(state: &SessionState) -> Self {
        Self {
            user: state.user.clone(),
            is_authenticated: state.is_authenticated,
        }
    }
}

impl SessionState {
    /// Load the persisted snapshot. Missing or unreadable snapshots yield
    /// an anonymous state.
    #[must_use]
    pub fn restore(storage: &dyn KeyValueStorage) -> Self {
        match storage::read_json::<Envelope>(storage, SESSION_KEY) {
            Ok(Some(envelope)) => {
                if envelope.version != SNAPSHOT_VERSION {
                    tracing::warn!(version = envelope.version, "Unknown session snapshot version");
                }
                let PersistedSession {
                    user,
                    is_authenticated,
                } = envelope.state;
                Self {
                    user,
                    is_authenticated,
                    ..Self::default()
                }
            },
            Ok(None) => Self::default(),
            Err(error) => {
                tracing::warn!(%error, "Ignoring unreadable session snapshot");
                Self::default()
            },
        }
    }
}

/// Write the snapshot for `state`, or remove it when anonymous.
///
/// Failures are logged.
pub fn persist(storage: &dyn KeyValueStorage, state: &SessionState) {
    let result = if state.is_authenticated || state.user.is_some() {
        storage::write_json(
            storage,
            SESSION_KEY,
            &Envelope {
                state: state.into(),
                version: SNAPSHOT_VERSION,
            },
        )
    } else {
        storage.clear(SESSION_KEY)
    };

    if let Err(error) = result {
        tracing::warn!(%error, "Failed to persist session snapshot");
    }
}
