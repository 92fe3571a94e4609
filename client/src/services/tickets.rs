//! Ticket endpoints

use crate::{
    client::ApiClient,
    endpoints::tickets,
    error::ApiError,
    types::{Listing, Page, PurchaseTicketRequest, Ticket, TicketFilters, UseTicketResponse},
};

/// Purchases and the customer's tickets. Every call is authenticated.
#[derive(Debug, Clone)]
pub struct TicketsService {
    client: ApiClient,
}

impl TicketsService {
    /// Wrap a client.
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// The signed-in customer's tickets.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the call fails.
    pub async fn my_tickets(&self) -> Result<Vec<Ticket>, ApiError> {
        let listing: Listing<Ticket> = self.client.get(tickets::MY_TICKETS, Vec::new()).await?;
        Ok(listing.into_vec())
    }

    /// A single ticket.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the call fails.
    pub async fn get(&self, id: u64) -> Result<Ticket, ApiError> {
        self.client.get(&tickets::detail(id), Vec::new()).await
    }

    /// Buy tickets. Prices are computed by the backend.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the purchase is rejected or the call fails.
    #[tracing::instrument(skip(self, request), fields(event = request.event, participants = request.participants_count))]
    pub async fn purchase(&self, request: &PurchaseTicketRequest) -> Result<Ticket, ApiError> {
        self.client.post(tickets::PURCHASE, request).await
    }

    /// Mark a ticket as used.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the ticket cannot be used or the call fails.
    pub async fn use_ticket(&self, id: u64) -> Result<UseTicketResponse, ApiError> {
        self.client
            .post(&tickets::use_ticket(id), &serde_json::json!({}))
            .await
    }

    /// All tickets visible to the caller, one page at a time.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the call fails.
    pub async fn list(&self, filters: &TicketFilters) -> Result<Page<Ticket>, ApiError> {
        self.client.get(tickets::LIST, filters.to_query()).await
    }
}
