//! Event catalog endpoints

use crate::{
    client::ApiClient,
    endpoints::events,
    error::ApiError,
    types::{Category, Event, EventFilters, Listing, Location, Page},
};

/// Read-only access to events, categories and venues.
#[derive(Debug, Clone)]
pub struct EventsService {
    client: ApiClient,
}

impl EventsService {
    /// Wrap a client.
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// One page of events.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the call fails.
    pub async fn list(&self, filters: &EventFilters) -> Result<Page<Event>, ApiError> {
        self.client.get(events::LIST, filters.to_query()).await
    }

    /// A single event.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the call fails (404 for unknown ids).
    pub async fn get(&self, id: u64) -> Result<Event, ApiError> {
        self.client.get(&events::detail(id), Vec::new()).await
    }

    /// Featured events.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the call fails.
    pub async fn featured(&self) -> Result<Vec<Event>, ApiError> {
        self.listing(events::FEATURED).await
    }

    /// Upcoming events.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the call fails.
    pub async fn upcoming(&self) -> Result<Vec<Event>, ApiError> {
        self.listing(events::UPCOMING).await
    }

    /// All categories.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the call fails.
    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        self.listing(events::CATEGORIES).await
    }

    /// All venues.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the call fails.
    pub async fn locations(&self) -> Result<Vec<Location>, ApiError> {
        self.listing(events::LOCATIONS).await
    }

    async fn listing<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ApiError> {
        let listing: Listing<T> = self.client.get(path, Vec::new()).await?;
        Ok(listing.into_vec())
    }
}
