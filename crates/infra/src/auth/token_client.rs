//! Token endpoint client
//!
//! Both grant types (`authorization_code` during login, `refresh_token`
//! afterwards) go through [`request_tokens`] so the response validation is
//! identical for the two.

use std::sync::Arc;

use async_trait::async_trait;
use paczkomat_common::auth::{OAuthClientTrait, TokenResponse, TokenSet};
use paczkomat_common::error::{ClientError, ClientResult};
use tracing::{debug, error, warn};

use crate::http::HttpClient;

/// POST a form to the token endpoint and validate the credential pair.
///
/// # Errors
/// Classified API error for an error response, `Protocol` for a success
/// response without both tokens, transport errors unchanged.
pub async fn request_tokens(
    http: &HttpClient,
    token_url: &str,
    fields: &[(&str, &str)],
) -> ClientResult<TokenSet> {
    let response = http.post_form(token_url, fields).await?;
    response.raise_for_error()?;

    let tokens = response.json::<TokenResponse>()?.into_token_set().map_err(|err| {
        error!(status = response.status, error = %err, "token endpoint returned an incomplete response");
        err
    })?;
    debug!(expires_in = tokens.expires_in, "token endpoint issued a credential pair");
    Ok(tokens)
}

/// Refresh client for the mobile API token endpoint.
///
/// Shares the API transport so that a new access token becomes the bearer
/// header of every later authenticated request.
pub struct InpostTokenClient {
    http: Arc<HttpClient>,
    token_url: String,
    client_id: String,
}

impl InpostTokenClient {
    /// Client posting to `token_url` through `http`.
    pub fn new(http: Arc<HttpClient>, token_url: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self { http, token_url: token_url.into(), client_id: client_id.into() }
    }
}

#[async_trait]
impl OAuthClientTrait for InpostTokenClient {
    async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenSet, ClientError> {
        request_tokens(
            &self.http,
            &self.token_url,
            &[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", self.client_id.as_str()),
            ],
        )
        .await
    }

    fn apply_access_token(&self, access_token: &str) {
        if let Err(err) = self.http.set_bearer_token(access_token) {
            warn!(error = %err, "could not install refreshed access token");
        }
    }
}
