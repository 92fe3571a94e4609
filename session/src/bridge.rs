//! Forwards API client notifications into the session store

use crate::{SessionAction, SessionBackend, SessionStore};
use casaroja_client::ClientEvent;
use casaroja_core::environment::Clock;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

/// Spawn a task that turns [`ClientEvent::SessionExpired`] into
/// [`SessionAction::SessionExpired`].
///
/// The task ends when the client is dropped, or at the first expiry the
/// store refuses because it has shut down.
pub fn forward_session_expiry<B, C>(
    mut events: broadcast::Receiver<ClientEvent>,
    store: SessionStore<B, C>,
) -> JoinHandle<()>
where
    B: SessionBackend + Clone + 'static,
    C: Clock + Clone + 'static,
{
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(ClientEvent::SessionExpired) => {
                    if let Err(error) = store.send(SessionAction::SessionExpired).await {
                        tracing::debug!(%error, "Session store gone, stopping expiry bridge");
                        break;
                    }
                },
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Expiry bridge lagged");
                },
                Err(RecvError::Closed) => break,
            }
        }
    })
}
