//! # Casa Roja Query
//!
//! A small query cache in front of the domain services.
//!
//! - Every query has a [`QueryKey`], a stale time and a retry rule.
//! - A fresh cached value is returned without a network call. A stale or
//!   invalidated one is refetched.
//! - Mutations invalidate the keys they affect on success.
//!
//! [`EventQueries`], [`TicketQueries`] and [`AuthQueries`] carry the
//! storefront's keys, stale times and invalidation rules.
//!
//! ## Example
//!
//! ```ignore
//! let cache = QueryClient::new(SystemClock);
//! let events = EventQueries::new(cache.clone(), EventsService::new(api.clone()));
//! let featured = events.featured().await?; // network
//! let again = events.featured().await?;    // cache, fresh for 10 minutes
//! ```

pub mod cache;
pub mod key;
pub mod options;
pub mod queries;

pub use cache::QueryClient;
pub use key::{KeySegment, QueryKey};
pub use options::{mutation_should_retry, query_should_retry, QueryOptions};
pub use queries::{keys, AuthQueries, EventQueries, TicketQueries};
