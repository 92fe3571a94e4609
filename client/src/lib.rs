//! # Casa Roja API Client
//!
//! Typed client for the Casa Roja events backend.
//!
//! - [`ApiClient`]: bearer authentication, a single refresh-and-replay on
//!   HTTP 401, and a uniform [`ApiError`]
//! - [`services`]: one function per backend endpoint
//! - [`storage`]: the key-value store tokens and sessions persist to
//!
//! ## Example
//!
//! ```no_run
//! use casaroja_client::{ApiClient, ApiConfig, services::EventsService};
//! use casaroja_client::storage::MemoryStorage;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ApiClient::new(&ApiConfig::from_env(), Arc::new(MemoryStorage::new()))?;
//!     let featured = EventsService::new(client).featured().await?;
//!     println!("{} featured events", featured.len());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod services;
pub mod storage;
pub mod tokens;
pub mod types;

// Re-export main types for convenience
pub use client::{ApiClient, ApiRequest, ClientEvent, RequestMode};
pub use config::ApiConfig;
pub use error::{ApiError, ApiErrorKind, StorageError};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
pub use tokens::{TokenPair, TokenStore};
