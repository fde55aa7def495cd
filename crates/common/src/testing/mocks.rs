//! Mock implementations of common traits

#![allow(clippy::missing_errors_doc)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::auth::{OAuthClientTrait, TokenSet};
use crate::error::{ApiError, ClientError};

/// Mock OAuth client for testing token lifecycle code
///
/// Returns a scripted token set (or failure) from `refresh_access_token`
/// and records every call.
#[derive(Clone, Default)]
pub struct MockOAuthClient {
    refresh_calls: Arc<Mutex<Vec<String>>>,
    refresh_response: Arc<Mutex<Option<TokenSet>>>,
    failure: Arc<Mutex<Option<ApiError>>>,
    delay: Arc<Mutex<Option<Duration>>>,
    applied_tokens: Arc<Mutex<Vec<String>>>,
}

impl MockOAuthClient {
    /// Create a new mock OAuth client with default state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the response returned by `refresh_access_token`.
    pub fn set_refresh_response(&self, tokens: TokenSet) {
        *self.refresh_response.lock() = Some(tokens);
    }

    /// Force the refresh call to fail with `error`.
    pub fn set_failure(&self, error: ApiError) {
        *self.failure.lock() = Some(error);
    }

    /// Sleep inside every refresh call.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    /// Number of refresh round-trips performed.
    #[must_use]
    pub fn refresh_count(&self) -> usize {
        self.refresh_calls.lock().len()
    }

    /// Refresh token sent with the most recent call.
    #[must_use]
    pub fn last_refresh_token(&self) -> Option<String> {
        self.refresh_calls.lock().last().cloned()
    }

    /// Access tokens installed through `apply_access_token`, oldest first.
    #[must_use]
    pub fn applied_tokens(&self) -> Vec<String> {
        self.applied_tokens.lock().clone()
    }
}

#[async_trait]
impl OAuthClientTrait for MockOAuthClient {
    async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenSet, ClientError> {
        self.refresh_calls.lock().push(refresh_token.to_string());

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.failure.lock().clone() {
            return Err(ClientError::Api(error));
        }

        Ok(self.refresh_response.lock().clone().unwrap_or_else(|| {
            TokenSet::new("refreshed_access_token", Some("refreshed_refresh_token".to_string()))
        }))
    }

    fn apply_access_token(&self, access_token: &str) {
        self.applied_tokens.lock().push(access_token.to_string());
    }
}
