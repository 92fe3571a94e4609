//! Per-query options and retry rules

use casaroja_client::ApiError;
use std::time::Duration;

/// Stale time applied when a query does not set one.
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(5 * 60);

/// How long an unused entry stays cached.
pub const DEFAULT_GC_TIME: Duration = Duration::from_secs(30 * 60);

/// Retries allowed for a failing query.
pub const QUERY_MAX_RETRIES: usize = 3;

/// Retries allowed for a failing mutation.
pub const MUTATION_MAX_RETRIES: usize = 1;

/// Options for one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// How long a fetched value is served without refetching
    pub stale_time: Duration,
    /// How long an unused entry is kept
    pub gc_time: Duration,
    /// Whether failures are retried
    pub retry: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            stale_time: DEFAULT_STALE_TIME,
            gc_time: DEFAULT_GC_TIME,
            retry: true,
        }
    }
}

impl QueryOptions {
    /// Default options with a stale time of `minutes`.
    #[must_use]
    pub fn stale_minutes(minutes: u64) -> Self {
        Self::default().with_stale_time(Duration::from_secs(minutes * 60))
    }

    /// Replace the stale time.
    #[must_use]
    pub const fn with_stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    /// Replace the gc time.
    #[must_use]
    pub const fn with_gc_time(mut self, gc_time: Duration) -> Self {
        self.gc_time = gc_time;
        self
    }

    /// Never retry.
    #[must_use]
    pub const fn without_retry(mut self) -> Self {
        self.retry = false;
        self
    }
}

/// Query retry rule: never retry a 4xx other than 429, otherwise retry
/// while fewer than three failures have been retried.
#[must_use]
pub const fn query_should_retry(failures: usize, error: &ApiError) -> bool {
    if error.is_client_error() && error.status != 429 {
        return false;
    }
    failures < QUERY_MAX_RETRIES
}

/// Mutation retry rule: never retry a 4xx, otherwise retry once.
#[must_use]
pub const fn mutation_should_retry(failures: usize, error: &ApiError) -> bool {
    !error.is_client_error() && failures < MUTATION_MAX_RETRIES
}
