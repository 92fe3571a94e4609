//! Account endpoints

use crate::{
    client::ApiClient,
    endpoints::auth,
    error::ApiError,
    tokens::TokenPair,
    types::{AuthResponse, ChangePasswordRequest, LoginRequest, RegisterRequest, User, UserUpdate},
};
use serde_json::Value;

/// Login, registration and the current user's profile.
#[derive(Debug, Clone)]
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    /// Wrap a client.
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// The underlying client.
    #[must_use]
    pub const fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Exchange credentials for tokens and the user. The tokens are stored
    /// in the client.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the credentials are rejected or the call fails.
    #[tracing::instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub async fn login(&self, credentials: &LoginRequest) -> Result<AuthResponse, ApiError> {
        let response: AuthResponse = self.client.post_public(auth::LOGIN, credentials).await?;
        self.client
            .set_tokens(TokenPair::new(response.access.clone(), response.refresh.clone()));
        tracing::info!(user_id = response.user.id, "Logged in");
        Ok(response)
    }

    /// Create an account. Does not log in.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`]; field-level rejections are in its `data`.
    #[tracing::instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register(&self, request: &RegisterRequest) -> Result<User, ApiError> {
        self.client.post_public(auth::REGISTER, request).await
    }

    /// Fetch the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns a 401 [`ApiError`] without touching the network when no
    /// access token is held, otherwise whatever the call returns.
    pub async fn current_user(&self) -> Result<User, ApiError> {
        if !self.client.is_authenticated() {
            return Err(ApiError::from_response(
                401,
                Some(serde_json::json!({ "detail": "no access token" })),
            ));
        }
        self.client.get(auth::PROFILE, Vec::new()).await
    }

    /// Update profile fields. Only set fields are sent.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the update is rejected or the call fails.
    pub async fn update_profile(&self, update: &UserUpdate) -> Result<User, ApiError> {
        self.client.patch(auth::PROFILE, update).await
    }

    /// Change the password.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the old password is wrong or the call fails.
    pub async fn change_password(&self, request: &ChangePasswordRequest) -> Result<(), ApiError> {
        let _: Value = self.client.post(auth::CHANGE_PASSWORD, request).await?;
        Ok(())
    }

    /// Forget the tokens locally. No network call.
    pub fn logout(&self) {
        self.client.clear_tokens();
    }

    /// Whether an access token is held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.client.is_authenticated()
    }
}
