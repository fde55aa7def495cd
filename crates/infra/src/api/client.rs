//! Composite InPost API client
//!
//! One client covers both the authenticated mobile API (parcels, profile)
//! and the public locker list. Which credentials are active is decided when
//! the client is built; authenticated calls on a client without credentials
//! fail with [`ClientError::NotAuthenticated`].

use std::sync::Arc;
use std::time::Duration;

use paczkomat_common::auth::{TokenManager, TokenRefreshCallback, TokenSet};
use paczkomat_common::error::{ClientError, ClientResult};
use paczkomat_domain::constants::{
    API_BASE_URL, API_USER_AGENT, DEFAULT_API_TIMEOUT_SECS, DEFAULT_REFRESH_BUFFER_SECS,
    OAUTH_CLIENT_ID, PARCEL_LOCKERS_URL, PROFILE_PATH, TOKEN_PATH, TRACKED_PARCELS_PATH,
};
use paczkomat_domain::{
    Config, ParcelLocker, ParcelLockerListResponse, ParcelsSummary, TrackedParcelsResponse,
    UserProfile,
};
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument};

use crate::auth::InpostTokenClient;
use crate::http::HttpClient;

/// Configuration for [`InPostApiClient`]
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Mobile API base URL (e.g. `https://api-inmobile-pl.easypack24.net`)
    pub base_url: String,
    /// Public parcel-locker list URL
    pub parcel_lockers_url: String,
    /// Client id sent with refresh requests
    pub client_id: String,
    /// Per-request time budget
    pub timeout: Duration,
    /// Refresh this many seconds before the access token expires
    pub refresh_buffer_seconds: i64,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: API_BASE_URL.to_string(),
            parcel_lockers_url: PARCEL_LOCKERS_URL.to_string(),
            client_id: OAUTH_CLIENT_ID.to_string(),
            timeout: Duration::from_secs(DEFAULT_API_TIMEOUT_SECS),
            refresh_buffer_seconds: DEFAULT_REFRESH_BUFFER_SECS,
        }
    }
}

impl From<&Config> for ApiClientConfig {
    fn from(config: &Config) -> Self {
        Self {
            base_url: config.api.base_url.trim_end_matches('/').to_string(),
            parcel_lockers_url: config.api.parcel_lockers_url.clone(),
            client_id: config.oauth.client_id.clone(),
            timeout: Duration::from_secs(config.api.timeout_seconds),
            refresh_buffer_seconds: config.auth.refresh_buffer_seconds,
        }
    }
}

/// InPost mobile API client
pub struct InPostApiClient {
    http: Arc<HttpClient>,
    public_http: HttpClient,
    tokens: Option<TokenManager<InpostTokenClient>>,
    config: ApiClientConfig,
}

impl InPostApiClient {
    /// Create a builder for fluent configuration
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Configuration the client was built with.
    pub const fn config(&self) -> &ApiClientConfig {
        &self.config
    }

    /// Whether the client was built with credentials.
    pub const fn has_credentials(&self) -> bool {
        self.tokens.is_some()
    }

    /// Current credential pair, if any.
    pub async fn tokens(&self) -> Option<TokenSet> {
        match &self.tokens {
            Some(manager) => manager.tokens().await,
            None => None,
        }
    }

    fn token_manager(&self) -> ClientResult<&TokenManager<InpostTokenClient>> {
        self.tokens.as_ref().ok_or(ClientError::NotAuthenticated)
    }

    async fn get_authenticated<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.token_manager()?.ensure_valid().await?;

        let url = format!("{}{path}", self.config.base_url);
        debug!(url = %url, "GET request");

        let response = self.http.get(&url, &[], &[]).await?;
        response.raise_for_error()?;
        response.json()
    }

    /// Tracked parcels as returned by the API.
    ///
    /// # Errors
    /// `NotAuthenticated` without credentials, a classified API error, or a
    /// transport failure.
    #[instrument(skip(self))]
    pub async fn get_tracked_parcels(&self) -> ClientResult<TrackedParcelsResponse> {
        let response: TrackedParcelsResponse = self.get_authenticated(TRACKED_PARCELS_PATH).await?;
        info!(count = response.parcels.len(), "fetched tracked parcels");
        Ok(response)
    }

    /// Tracked parcels grouped by status and pickup point.
    ///
    /// # Errors
    /// Same as [`InPostApiClient::get_tracked_parcels`].
    #[instrument(skip(self))]
    pub async fn get_parcels(&self) -> ClientResult<ParcelsSummary> {
        let response = self.get_tracked_parcels().await?;
        Ok(ParcelsSummary::from_parcels(&response.parcels))
    }

    /// Account profile, including favourite delivery points.
    ///
    /// # Errors
    /// Same as [`InPostApiClient::get_tracked_parcels`].
    #[instrument(skip(self))]
    pub async fn get_profile(&self) -> ClientResult<UserProfile> {
        self.get_authenticated(PROFILE_PATH).await
    }

    /// Public parcel-locker list. Works without credentials and never sends
    /// the bearer token.
    ///
    /// # Errors
    /// A classified API error, a transport failure, or `Protocol` for
    /// an unexpected body.
    #[instrument(skip(self))]
    pub async fn get_parcel_lockers_list(&self) -> ClientResult<Vec<ParcelLocker>> {
        let response = self.public_http.get(&self.config.parcel_lockers_url, &[], &[]).await?;
        response.raise_for_error()?;

        let list: ParcelLockerListResponse = response.json()?;
        info!(count = list.items.len(), "fetched parcel locker list");
        Ok(list.items)
    }

    /// Refresh the credential pair now, regardless of expiry.
    ///
    /// # Errors
    /// `NotAuthenticated` without credentials, `NoRefreshToken`, or the
    /// refresh failure.
    #[instrument(skip(self))]
    pub async fn refresh_tokens(&self) -> ClientResult<TokenSet> {
        self.token_manager()?.refresh().await
    }

    /// Release both HTTP sessions. Safe to call repeatedly.
    pub fn close(&self) {
        self.http.close();
        self.public_http.close();
    }
}

/// Builder for [`InPostApiClient`]
#[derive(Default)]
pub struct ApiClientBuilder {
    config: Option<ApiClientConfig>,
    credentials: Option<TokenSet>,
    on_token_refresh: Option<TokenRefreshCallback>,
}

impl ApiClientBuilder {
    /// Set the API configuration
    pub fn config(mut self, config: ApiClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Credential pair from a completed login
    pub fn credentials(mut self, tokens: TokenSet) -> Self {
        self.credentials = Some(tokens);
        self
    }

    /// Listener for refreshed tokens (for persistence)
    pub fn on_token_refresh(mut self, callback: TokenRefreshCallback) -> Self {
        self.on_token_refresh = Some(callback);
        self
    }

    /// Build the API client
    ///
    /// # Errors
    /// `Config` if the access token cannot be sent as a header.
    pub fn build(self) -> ClientResult<InPostApiClient> {
        let config = self.config.unwrap_or_default();

        let http = Arc::new(
            HttpClient::builder().timeout(config.timeout).user_agent(API_USER_AGENT).build(),
        );
        let public_http = HttpClient::builder().timeout(config.timeout).build();

        let tokens = match self.credentials {
            Some(tokens) => {
                http.set_bearer_token(&tokens.access_token)?;
                let token_client = InpostTokenClient::new(
                    Arc::clone(&http),
                    format!("{}{TOKEN_PATH}", config.base_url),
                    config.client_id.clone(),
                );
                let manager = TokenManager::new(
                    Arc::new(token_client),
                    Some(tokens),
                    config.refresh_buffer_seconds,
                );
                Some(match self.on_token_refresh {
                    Some(callback) => manager.with_refresh_callback(callback),
                    None => manager,
                })
            }
            None => None,
        };

        Ok(InPostApiClient { http, public_http, tokens, config })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_follows_app_config() {
        let mut app = Config::default();
        app.api.base_url = "http://localhost:1234/".to_string();
        app.api.timeout_seconds = 7;
        app.auth.refresh_buffer_seconds = 60;

        let config = ApiClientConfig::from(&app);

        assert_eq!(config.base_url, "http://localhost:1234");
        assert_eq!(config.timeout, Duration::from_secs(7));
        assert_eq!(config.refresh_buffer_seconds, 60);
        assert_eq!(config.client_id, "inpost-mobile");
    }

    #[tokio::test]
    async fn authenticated_calls_require_credentials() {
        let client = InPostApiClient::builder().build().expect("client");

        assert!(!client.has_credentials());
        assert!(matches!(client.get_parcels().await, Err(ClientError::NotAuthenticated)));
        assert!(matches!(client.refresh_tokens().await, Err(ClientError::NotAuthenticated)));
        assert!(client.tokens().await.is_none());
    }

    #[test]
    fn invalid_access_token_is_rejected_at_build() {
        let result = InPostApiClient::builder()
            .credentials(TokenSet::new("bad\ntoken", Some("r".to_string())))
            .build();
        assert!(matches!(result, Err(ClientError::Config(_))));
    }
}
