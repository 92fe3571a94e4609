//! Session environment

use crate::providers::SessionBackend;
use casaroja_client::{KeyValueStorage, TokenStore};
use casaroja_core::environment::Clock;
use std::sync::Arc;

/// Dependencies of [`crate::SessionReducer`].
///
/// # Type Parameters
///
/// - `B`: backend used to revalidate the session
/// - `C`: clock used to judge token expiry
#[derive(Clone)]
pub struct SessionEnvironment<B, C>
where
    B: SessionBackend + Clone,
    C: Clock + Clone,
{
    /// Backend.
    pub backend: B,

    /// The API client's token store.
    pub tokens: TokenStore,

    /// Where the session snapshot is persisted.
    pub storage: Arc<dyn KeyValueStorage>,

    /// Clock.
    pub clock: C,
}

impl<B, C> SessionEnvironment<B, C>
where
    B: SessionBackend + Clone,
    C: Clock + Clone,
{
    /// Persist the snapshot next to the tokens.
    #[must_use]
    pub fn new(backend: B, tokens: TokenStore, clock: C) -> Self {
        let storage = tokens.storage();
        Self {
            backend,
            tokens,
            storage,
            clock,
        }
    }
}
