//! What the session needs from the backend

use casaroja_client::{services::AuthService, types::User, ApiError};
use std::future::Future;

/// Fetches the user behind the held access token.
pub trait SessionBackend: Send + Sync {
    /// `GET /auth/profile/`
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when no token is held, the token is rejected or
    /// the call fails.
    fn current_user(&self) -> impl Future<Output = Result<User, ApiError>> + Send;
}

impl SessionBackend for AuthService {
    fn current_user(&self) -> impl Future<Output = Result<User, ApiError>> + Send {
        let service = self.clone();
        async move { AuthService::current_user(&service).await }
    }
}
