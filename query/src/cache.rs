//! The query cache

use crate::key::QueryKey;
use crate::options::{mutation_should_retry, query_should_retry, QueryOptions, MUTATION_MAX_RETRIES};
use casaroja_client::ApiError;
use casaroja_core::environment::Clock;
use casaroja_runtime::retry::{retry_with_predicate, RetryPolicy};
use chrono::{DateTime, Utc};
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

struct Entry {
    value: Arc<dyn Any + Send + Sync>,
    fetched_at: DateTime<Utc>,
    last_used: DateTime<Utc>,
    gc_time: Duration,
    invalidated: bool,
}

fn age(now: DateTime<Utc>, since: DateTime<Utc>) -> Duration {
    (now - since).to_std().unwrap_or(Duration::ZERO)
}

/// Shared cache of query results, keyed by [`QueryKey`].
///
/// Values of any `Clone + Send + Sync` type are stored type-erased. Clones
/// share the cache. Concurrent fetches of the same key are not
/// de-duplicated; the last one to finish wins.
#[derive(Clone)]
pub struct QueryClient<C> {
    entries: Arc<Mutex<HashMap<QueryKey, Entry>>>,
    clock: C,
    backoff: RetryPolicy,
}

impl<C: Clock + Clone> QueryClient<C> {
    /// An empty cache using the default backoff (1 s doubling to 30 s).
    #[must_use]
    pub fn new(clock: C) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            clock,
            backoff: RetryPolicy::default(),
        }
    }

    /// Replace the retry backoff. Retry counts still follow
    /// [`query_should_retry`] and [`mutation_should_retry`].
    #[must_use]
    pub fn with_backoff(mut self, backoff: RetryPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<QueryKey, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the cached value when fresh, otherwise fetch, cache and
    /// return it.
    ///
    /// # Errors
    ///
    /// Returns the last [`ApiError`] once retries are exhausted or refused.
    #[tracing::instrument(skip(self, options, fetch), fields(key = %key))]
    pub async fn fetch_query<T, F, Fut>(
        &self,
        key: &QueryKey,
        options: QueryOptions,
        fetch: F,
    ) -> Result<T, ApiError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        if let Some(value) = self.fresh_value::<T>(key, options.stale_time) {
            metrics::counter!("query.cache.hits").increment(1);
            tracing::trace!("Serving fresh cached value");
            return Ok(value);
        }
        metrics::counter!("query.cache.misses").increment(1);

        let policy = if options.retry {
            self.backoff.clone()
        } else {
            RetryPolicy::never()
        };
        let value = retry_with_predicate(&policy, fetch, query_should_retry).await?;

        self.store(key, value.clone(), options.gc_time);
        Ok(value)
    }

    fn fresh_value<T: Clone + 'static>(&self, key: &QueryKey, stale_time: Duration) -> Option<T> {
        let now = self.clock.now();
        let mut entries = self.lock();
        let entry = entries.get_mut(key)?;
        if entry.invalidated || age(now, entry.fetched_at) >= stale_time {
            return None;
        }

        let value = entry.value.downcast_ref::<T>().cloned();
        if value.is_none() {
            tracing::warn!(key = %key, "Cached value has a different type, refetching");
        } else {
            entry.last_used = now;
        }
        value
    }

    fn store<T: Send + Sync + 'static>(&self, key: &QueryKey, value: T, gc_time: Duration) {
        let now = self.clock.now();
        self.lock().insert(
            key.clone(),
            Entry {
                value: Arc::new(value),
                fetched_at: now,
                last_used: now,
                gc_time,
                invalidated: false,
            },
        );
    }

    /// The last cached value for `key`, stale or not.
    #[must_use]
    pub fn get_query_data<T: Clone + 'static>(&self, key: &QueryKey) -> Option<T> {
        self.lock()
            .get(key)
            .and_then(|entry| entry.value.downcast_ref::<T>().cloned())
    }

    /// Cache `value` under `key` as freshly fetched.
    pub fn set_query_data<T: Send + Sync + 'static>(&self, key: &QueryKey, value: T) {
        self.store(key, value, crate::options::DEFAULT_GC_TIME);
    }

    /// Mark every entry under `prefix` as needing a refetch. Returns how
    /// many entries were marked.
    pub fn invalidate_queries(&self, prefix: &QueryKey) -> usize {
        let mut marked = 0;
        for (key, entry) in self.lock().iter_mut() {
            if key.starts_with(prefix) {
                entry.invalidated = true;
                marked += 1;
            }
        }
        tracing::debug!(prefix = %prefix, marked, "Invalidated queries");
        marked
    }

    /// Whether `key` is cached and would be refetched by a query with
    /// `stale_time`.
    #[must_use]
    pub fn is_stale(&self, key: &QueryKey, stale_time: Duration) -> bool {
        let now = self.clock.now();
        self.lock()
            .get(key)
            .is_none_or(|entry| entry.invalidated || age(now, entry.fetched_at) >= stale_time)
    }

    /// Drop every entry under `prefix`.
    pub fn remove_queries(&self, prefix: &QueryKey) {
        self.lock().retain(|key, _| !key.starts_with(prefix));
    }

    /// Drop everything.
    pub fn clear(&self) {
        self.lock().clear();
        tracing::debug!("Query cache cleared");
    }

    /// Drop entries unused for longer than their gc time. Returns how many
    /// were dropped.
    pub fn collect_garbage(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| age(now, entry.last_used) <= entry.gc_time);
        before - entries.len()
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Run a mutation, retrying per [`mutation_should_retry`], and
    /// invalidate `invalidates` on success.
    ///
    /// # Errors
    ///
    /// Returns the last [`ApiError`] if the mutation fails.
    pub async fn mutate<T, F, Fut>(&self, invalidates: &[QueryKey], operation: F) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let policy = RetryPolicy {
            max_retries: MUTATION_MAX_RETRIES,
            ..self.backoff.clone()
        };
        let value = retry_with_predicate(&policy, operation, mutation_should_retry).await?;
        for key in invalidates {
            self.invalidate_queries(key);
        }
        Ok(value)
    }
}

impl<C> std::fmt::Debug for QueryClient<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let len = self.entries.lock().map_or(0, |entries| entries.len());
        f.debug_struct("QueryClient")
            .field("entries", &len)
            .finish_non_exhaustive()
    }
}
