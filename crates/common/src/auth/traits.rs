//! Seam between the token lifecycle and the HTTP side
//!
//! The token manager only needs two things from the outside world: a way to
//! run the refresh round-trip and a way to make the new access token visible
//! to subsequent requests. Abstracting both keeps the manager testable with
//! [`crate::testing::MockOAuthClient`].

use async_trait::async_trait;

use super::types::TokenSet;
use crate::error::ClientError;

/// Trait for OAuth client operations
#[async_trait]
pub trait OAuthClientTrait: Send + Sync {
    /// Refresh access token using refresh token
    ///
    /// # Arguments
    /// * `refresh_token` - Refresh token from the current credential pair
    ///
    /// # Returns
    /// A complete new `TokenSet`; the old refresh token must not be reused
    ///
    /// # Errors
    /// Classified API error if the token endpoint rejects the refresh,
    /// `Protocol` if the response lacks either token
    async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenSet, ClientError>;

    /// Install `access_token` as the bearer credential for later requests.
    fn apply_access_token(&self, access_token: &str);
}
