//! Token manager with proactive refresh
//!
//! Manages the credential pair for one API client:
//! - Expiry detection from the access token's `exp` claim (unverified JWT)
//! - Refresh round-trip through an [`OAuthClientTrait`] implementation
//! - Bearer header propagation and an optional persistence callback
//!
//! Refreshes are single-flight: concurrent callers that observe the same
//! expiring token wait on one refresh instead of racing the refresh token.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::jwt::is_token_expiring_soon;
use super::traits::OAuthClientTrait;
use super::types::TokenSet;
use crate::error::ClientError;

/// Default proactive refresh window (10 minutes).
pub const DEFAULT_REFRESH_BUFFER_SECONDS: i64 = 600;

/// Listener invoked with every newly issued credential pair.
pub type TokenRefreshCallback = Arc<dyn Fn(&TokenSet) + Send + Sync>;

/// Token manager with refresh-on-demand
pub struct TokenManager<C: OAuthClientTrait + 'static> {
    oauth_client: Arc<C>,
    current_tokens: RwLock<Option<TokenSet>>,
    refresh_guard: Mutex<()>,
    refresh_buffer_seconds: i64,
    on_refresh: Option<TokenRefreshCallback>,
}

impl<C: OAuthClientTrait + 'static> TokenManager<C> {
    /// Create a new token manager
    ///
    /// # Arguments
    /// * `oauth_client` - Client performing the refresh round-trip
    /// * `tokens` - Initial credential pair, if any
    /// * `refresh_buffer_seconds` - Refresh this many seconds before `exp`
    #[must_use]
    pub fn new(oauth_client: Arc<C>, tokens: Option<TokenSet>, refresh_buffer_seconds: i64) -> Self {
        Self {
            oauth_client,
            current_tokens: RwLock::new(tokens),
            refresh_guard: Mutex::new(()),
            refresh_buffer_seconds,
            on_refresh: None,
        }
    }

    /// Register the listener that receives refreshed tokens.
    #[must_use]
    pub fn with_refresh_callback(mut self, callback: TokenRefreshCallback) -> Self {
        self.on_refresh = Some(callback);
        self
    }

    /// Current token set (without refreshing)
    pub async fn tokens(&self) -> Option<TokenSet> {
        self.current_tokens.read().await.clone()
    }

    /// Current access token (without refreshing)
    pub async fn access_token(&self) -> Option<String> {
        self.current_tokens.read().await.as_ref().map(|t| t.access_token.clone())
    }

    /// Check if an access token is held
    pub async fn is_authenticated(&self) -> bool {
        self.current_tokens.read().await.is_some()
    }

    /// Replace the credential pair and install its access token.
    pub async fn set_tokens(&self, tokens: TokenSet) {
        self.oauth_client.apply_access_token(&tokens.access_token);
        *self.current_tokens.write().await = Some(tokens);
    }

    fn is_expiring(&self, access_token: &str) -> bool {
        is_token_expiring_soon(access_token, self.refresh_buffer_seconds, Utc::now())
    }

    /// Make sure the held access token is usable for the next request.
    ///
    /// No-op without an access token. An expiring token with no refresh
    /// token is logged and used as is; the eventual 401 surfaces to the
    /// caller.
    ///
    /// # Errors
    /// Propagates refresh failures.
    pub async fn ensure_valid(&self) -> Result<(), ClientError> {
        match self.access_token().await {
            Some(token) if self.is_expiring(&token) => {}
            _ => return Ok(()),
        }

        let _guard = self.refresh_guard.lock().await;

        let refresh_token = {
            let tokens = self.current_tokens.read().await;
            let Some(tokens) = tokens.as_ref() else {
                return Ok(());
            };
            if !self.is_expiring(&tokens.access_token) {
                debug!("Access token already refreshed by a concurrent caller");
                return Ok(());
            }
            tokens.refresh_token.clone()
        };

        let Some(refresh_token) = refresh_token else {
            warn!("Access token is expiring but no refresh token is available");
            return Ok(());
        };

        debug!("Access token expiring soon, refreshing");
        self.refresh_with(&refresh_token).await.map(|_| ())
    }

    /// Refresh the credential pair unconditionally.
    ///
    /// # Errors
    /// `NoRefreshToken` if none is held, otherwise the refresh failure.
    pub async fn refresh(&self) -> Result<TokenSet, ClientError> {
        let _guard = self.refresh_guard.lock().await;

        let refresh_token = self
            .current_tokens
            .read()
            .await
            .as_ref()
            .and_then(|t| t.refresh_token.clone())
            .ok_or(ClientError::NoRefreshToken)?;

        self.refresh_with(&refresh_token).await
    }

    // Caller holds `refresh_guard`.
    async fn refresh_with(&self, refresh_token: &str) -> Result<TokenSet, ClientError> {
        let new_tokens = self.oauth_client.refresh_access_token(refresh_token).await?;

        self.set_tokens(new_tokens.clone()).await;

        if let Some(callback) = &self.on_refresh {
            callback(&new_tokens);
        }

        info!("Successfully refreshed access token");
        Ok(new_tokens)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::Utc;

    use super::*;
    use crate::error::{ApiError, ApiErrorKind, ResponseBody};
    use crate::testing::{jwt_with_exp, jwt_without_exp, MockOAuthClient};

    fn manager_with(
        client: &Arc<MockOAuthClient>,
        access_token: String,
        refresh_token: Option<&str>,
    ) -> TokenManager<MockOAuthClient> {
        TokenManager::new(
            Arc::clone(client),
            Some(TokenSet::new(access_token, refresh_token.map(str::to_string))),
            DEFAULT_REFRESH_BUFFER_SECONDS,
        )
    }

    /// Validates that a token five minutes from expiry is refreshed.
    ///
    /// Assertions:
    /// - Refresh is called exactly once.
    /// - The new access token is installed on the client.
    #[tokio::test]
    async fn test_ensure_valid_refreshes_expiring_token() {
        let client = Arc::new(MockOAuthClient::new());
        client.set_refresh_response(TokenSet::new("new-access", Some("new-refresh".into())));
        let manager = manager_with(&client, jwt_with_exp(Utc::now().timestamp() + 300), Some("R"));

        manager.ensure_valid().await.expect("ensure_valid");

        assert_eq!(client.refresh_count(), 1);
        assert_eq!(client.last_refresh_token().as_deref(), Some("R"));
        assert_eq!(client.applied_tokens(), vec!["new-access".to_string()]);
        let tokens = manager.tokens().await.expect("tokens");
        assert_eq!(tokens.refresh_token.as_deref(), Some("new-refresh"));
    }

    #[tokio::test]
    async fn test_ensure_valid_skips_fresh_token() {
        let client = Arc::new(MockOAuthClient::new());
        let manager =
            manager_with(&client, jwt_with_exp(Utc::now().timestamp() + 7200), Some("R"));

        manager.ensure_valid().await.expect("ensure_valid");

        assert_eq!(client.refresh_count(), 0);
    }

    #[tokio::test]
    async fn test_ensure_valid_without_tokens_is_noop() {
        let client = Arc::new(MockOAuthClient::new());
        let manager = TokenManager::new(Arc::clone(&client), None, 600);

        manager.ensure_valid().await.expect("ensure_valid");

        assert_eq!(client.refresh_count(), 0);
        assert!(!manager.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_undecodable_token_is_refreshed() {
        let client = Arc::new(MockOAuthClient::new());
        let manager = manager_with(&client, "opaque".to_string(), Some("R"));

        manager.ensure_valid().await.expect("ensure_valid");
        assert_eq!(client.refresh_count(), 1);

        let client = Arc::new(MockOAuthClient::new());
        let manager = manager_with(&client, jwt_without_exp(), Some("R"));

        manager.ensure_valid().await.expect("ensure_valid");
        assert_eq!(client.refresh_count(), 1);
    }

    /// Validates best-effort degrade when no refresh token is held.
    #[tokio::test]
    async fn test_expiring_without_refresh_token_degrades() {
        let client = Arc::new(MockOAuthClient::new());
        let manager = manager_with(&client, jwt_with_exp(Utc::now().timestamp() - 10), None);

        manager.ensure_valid().await.expect("ensure_valid must not fail");

        assert_eq!(client.refresh_count(), 0);
    }

    #[tokio::test]
    async fn test_refresh_without_refresh_token_fails() {
        let client = Arc::new(MockOAuthClient::new());
        let manager = manager_with(&client, "A".to_string(), None);

        let err = manager.refresh().await.expect_err("must fail");
        assert!(matches!(err, ClientError::NoRefreshToken));

        let empty = TokenManager::new(Arc::clone(&client), None, 600);
        assert!(matches!(empty.refresh().await, Err(ClientError::NoRefreshToken)));
    }

    /// Validates the old pair survives a rejected refresh.
    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_pair() {
        let client = Arc::new(MockOAuthClient::new());
        let rejection = ApiError::from_response(&ResponseBody::Text(String::new()), 400);
        client.set_failure(rejection);
        let manager = manager_with(&client, "A".to_string(), Some("B"));

        let err = manager.refresh().await.expect_err("must fail");

        assert_eq!(err.api_kind(), Some(ApiErrorKind::Unclassified));
        let tokens = manager.tokens().await.expect("tokens");
        assert_eq!(tokens.access_token, "A");
        assert_eq!(tokens.refresh_token.as_deref(), Some("B"));
        assert!(client.applied_tokens().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_invokes_callback() {
        let client = Arc::new(MockOAuthClient::new());
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_in_callback = Arc::clone(&seen);
        let manager = manager_with(&client, "A".to_string(), Some("B")).with_refresh_callback(
            Arc::new(move |tokens: &TokenSet| {
                assert_eq!(tokens.access_token, "refreshed_access_token");
                seen_in_callback.fetch_add(1, Ordering::SeqCst);
            }),
        );

        let tokens = manager.refresh().await.expect("refresh");

        assert_eq!(tokens.refresh_token.as_deref(), Some("refreshed_refresh_token"));
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    /// Validates concurrent callers share one refresh round-trip.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_ensure_valid_is_single_flight() {
        let client = Arc::new(MockOAuthClient::new());
        client.set_refresh_response(TokenSet::new(
            jwt_with_exp(Utc::now().timestamp() + 7200),
            Some("next".into()),
        ));
        client.set_delay(std::time::Duration::from_millis(50));
        let manager = Arc::new(manager_with(
            &client,
            jwt_with_exp(Utc::now().timestamp() + 60),
            Some("R"),
        ));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let manager = Arc::clone(&manager);
                tokio::spawn(async move { manager.ensure_valid().await })
            })
            .collect();
        for handle in handles {
            handle.await.expect("join").expect("ensure_valid");
        }

        assert_eq!(client.refresh_count(), 1);
    }
}
