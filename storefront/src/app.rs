//! Wiring: storage, API client, query cache, session store and pages.

use crate::config::{ConfigError, StorefrontConfig};
use crate::environment::StorefrontEnvironment;
use casaroja_client::services::{AuthService, EventsService, TicketsService};
use casaroja_client::{
    ApiClient, ApiConfig, ApiError, ClientEvent, FileStorage, KeyValueStorage,
};
use casaroja_core::environment::SystemClock;
use casaroja_core::reducer::Reducer;
use casaroja_query::{AuthQueries, EventQueries, QueryClient, TicketQueries};
use casaroja_runtime::{Store, StoreError};
use casaroja_session::{
    forward_session_expiry, session_store, SessionAction, SessionEnvironment, SessionState,
    SessionStore,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

/// The environment pages run against in production.
pub type LiveEnvironment = StorefrontEnvironment<
    EventQueries<SystemClock>,
    TicketQueries<SystemClock>,
    AuthQueries<SystemClock>,
    SessionStore<AuthService, SystemClock>,
>;

/// A store hosting page reducer `R`.
pub type PageStore<R> =
    Store<<R as Reducer>::State, <R as Reducer>::Action, LiveEnvironment, R>;

/// Startup and page errors.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// Bad configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The API client could not be built
    #[error("API client setup failed: {0}")]
    Api(#[from] ApiError),

    /// A store rejected an action
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A running storefront.
///
/// Holds the single API client, query cache and session store every page
/// shares. Must be created inside a tokio runtime.
pub struct Storefront {
    api: ApiClient,
    cache: QueryClient<SystemClock>,
    session: SessionStore<AuthService, SystemClock>,
    env: LiveEnvironment,
    expiry_bridge: JoinHandle<()>,
    cache_reset: JoinHandle<()>,
}

impl Storefront {
    /// Start with file-backed storage under `config.state_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError`] if the configuration is invalid or the
    /// HTTP client cannot be built.
    pub fn open(config: &StorefrontConfig) -> Result<Self, StorefrontError> {
        config.validate()?;
        tracing::debug!(
            api = %config.api.base_url,
            state_dir = %config.state_dir.display(),
            "Opening storefront"
        );
        Self::with_storage(&config.api, Arc::new(FileStorage::new(&config.state_dir)))
    }

    /// Start over the given storage.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Api`] if the HTTP client cannot be built.
    pub fn with_storage(
        config: &ApiConfig,
        storage: Arc<dyn KeyValueStorage>,
    ) -> Result<Self, StorefrontError> {
        let api = ApiClient::new(config, storage)?;
        let cache = QueryClient::new(SystemClock);

        let session = session_store(
            SessionState::restore(api.tokens().storage().as_ref()),
            SessionEnvironment::new(AuthService::new(api.clone()), api.tokens().clone(), SystemClock),
        );
        let expiry_bridge = forward_session_expiry(api.subscribe(), session.clone());
        let cache_reset = clear_cache_on_expiry(api.subscribe(), cache.clone());

        let env = StorefrontEnvironment::new(
            EventQueries::new(cache.clone(), EventsService::new(api.clone())),
            TicketQueries::new(cache.clone(), TicketsService::new(api.clone())),
            AuthQueries::new(cache.clone(), AuthService::new(api.clone())),
            session.clone(),
        );

        Ok(Self {
            api,
            cache,
            session,
            env,
            expiry_bridge,
            cache_reset,
        })
    }

    /// The shared API client.
    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    /// The shared query cache.
    #[must_use]
    pub const fn cache(&self) -> &QueryClient<SystemClock> {
        &self.cache
    }

    /// The session store.
    #[must_use]
    pub const fn session(&self) -> &SessionStore<AuthService, SystemClock> {
        &self.session
    }

    /// The environment pages run against.
    #[must_use]
    pub const fn environment(&self) -> &LiveEnvironment {
        &self.env
    }

    /// Revalidate the persisted session against the backend.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the session store is shutting down.
    pub async fn initialize(&self) -> Result<SessionState, StoreError> {
        let mut handle = self.session.send(SessionAction::Initialize).await?;
        handle.wait().await;
        Ok(self.session.state(Clone::clone).await)
    }

    /// Whether a session is held.
    pub async fn is_authenticated(&self) -> bool {
        self.session.state(|s| s.is_authenticated).await
    }

    /// Forget tokens, the session snapshot and every cached query.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the session store is shutting down.
    pub async fn logout(&self) -> Result<(), StoreError> {
        self.env.accounts.logout();
        self.session.send(SessionAction::Logout).await?;
        tracing::info!("Signed out");
        Ok(())
    }

    /// Stop accepting session actions, wait up to `timeout` for the running
    /// ones to settle, then stop the background tasks.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownTimeout`] if session effects are still
    /// running when `timeout` expires.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
        let drained = self.session.shutdown(timeout).await;
        self.expiry_bridge.abort();
        self.cache_reset.abort();
        tracing::debug!(cached_queries = self.cache.len(), "Storefront stopped");
        drained
    }

    /// Host `reducer` in a new store starting from `initial`.
    #[must_use]
    pub fn page<R>(&self, initial: R::State, reducer: R) -> PageStore<R>
    where
        R: Reducer<Environment = LiveEnvironment> + Clone + Send + Sync + 'static,
        R::State: Send + Sync + 'static,
        R::Action: Send + Clone + 'static,
    {
        Store::new(initial, reducer, self.env.clone())
    }

    /// Run `actions` in order on a fresh page, waiting for each one's
    /// effects, and return the final state.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the page store rejects an action.
    pub async fn run_page<R, I>(
        &self,
        initial: R::State,
        reducer: R,
        actions: I,
    ) -> Result<R::State, StoreError>
    where
        R: Reducer<Environment = LiveEnvironment> + Clone + Send + Sync + 'static,
        R::State: Clone + Send + Sync + 'static,
        R::Action: Send + Clone + 'static,
        I: IntoIterator<Item = R::Action>,
    {
        let store = self.page(initial, reducer);
        for action in actions {
            let mut handle = store.send(action).await?;
            handle.wait().await;
        }
        Ok(store.state(Clone::clone).await)
    }
}

/// Empty `cache` whenever the client gives up on the session, so the next
/// account starts from nothing.
fn clear_cache_on_expiry(
    mut events: broadcast::Receiver<ClientEvent>,
    cache: QueryClient<SystemClock>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(ClientEvent::SessionExpired) => {
                    tracing::info!(cached_queries = cache.len(), "Session expired, clearing query cache");
                    cache.clear();
                },
                Err(RecvError::Lagged(skipped)) => {
                    // A skipped event may have been an expiry.
                    tracing::warn!(skipped, "Cache reset lagged, clearing query cache");
                    cache.clear();
                },
                Err(RecvError::Closed) => break,
            }
        }
    })
}

impl Drop for Storefront {
    fn drop(&mut self) {
        self.expiry_bridge.abort();
        self.cache_reset.abort();
    }
}

impl std::fmt::Debug for Storefront {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storefront")
            .field("api", &self.api.config().base_url)
            .field("cached_queries", &self.cache.len())
            .finish_non_exhaustive()
    }
}
