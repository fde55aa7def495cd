//! Phone-number onboarding login against the InPost account service.
//!
//! The server drives the flow: every call returns the next
//! [`OnboardingStep`](paczkomat_common::auth::OnboardingStep) and the caller
//! picks the matching transition.
//!
//! ```text
//! initialize_session ─▶ fetch_xsrf_token ─▶ PROVIDE_PHONE_NUMBER_FOR_LOGIN
//!                                              │ submit_phone_number
//!                                              ▼
//!                                           PROVIDE_PHONE_CODE
//!                                              │ submit_otp_code
//!                                              ▼
//!                  ┌──────── PROVIDE_EXISTING_EMAIL_ADDRESS ◀─┐
//!                  │ request_email_confirmation               │ get_current_step
//!                  │ wait_for_email_confirmation              │
//!                  ▼                                          │
//!               ONBOARDED ◀───────────────────────────────────┘
//!                  │ fetch_authorization_code
//!                  ▼
//!          exchange_code_for_tokens ─▶ TokenSet
//! ```
//!
//! PKCE material is generated once per [`InpostAuthFlow`]; start a new login
//! with a new instance.

use std::time::Duration;

use paczkomat_common::auth::{AuthStep, PkceMaterial, TokenSet};
use paczkomat_common::error::{ClientError, ClientResult, ErrorClassification};
use paczkomat_domain::constants::{
    API_BASE_URL, AUTHORIZE_PATH, LOCALE_COOKIE, OAUTH_BASE_URL, OAUTH_CLIENT_ID,
    OAUTH_REDIRECT_URI, OAUTH_SCOPE, OAUTH_THEME, ONBOARDING_EMAIL_PATH,
    ONBOARDING_PHONE_CODE_PATH, ONBOARDING_PHONE_NUMBER_PATH, ONBOARDING_STEPS_PATH, TOKEN_PATH,
    XSRF_COOKIE, XSRF_HEADER,
};
use paczkomat_domain::{language_code, Config};
use serde_json::{json, Value};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use url::Url;

use super::token_client::request_tokens;
use crate::http::{HttpClient, HttpResponse};

/// Endpoints and identity used by the flow.
#[derive(Debug, Clone)]
pub struct AuthFlowSettings {
    /// Account service origin, without a trailing slash.
    pub oauth_base_url: String,
    /// OAuth client id.
    pub client_id: String,
    /// Registered redirect URI.
    pub redirect_uri: String,
    /// Full token endpoint URL.
    pub token_url: String,
    /// Time budget of each flow request.
    pub request_timeout: Duration,
}

impl Default for AuthFlowSettings {
    fn default() -> Self {
        Self {
            oauth_base_url: OAUTH_BASE_URL.to_string(),
            client_id: OAUTH_CLIENT_ID.to_string(),
            redirect_uri: OAUTH_REDIRECT_URI.to_string(),
            token_url: format!("{API_BASE_URL}{TOKEN_PATH}"),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&Config> for AuthFlowSettings {
    fn from(config: &Config) -> Self {
        Self {
            oauth_base_url: config.oauth.base_url.trim_end_matches('/').to_string(),
            client_id: config.oauth.client_id.clone(),
            redirect_uri: config.oauth.redirect_uri.clone(),
            token_url: format!("{}{TOKEN_PATH}", config.api.base_url.trim_end_matches('/')),
            request_timeout: Duration::from_secs(config.auth.request_timeout_seconds),
        }
    }
}

/// One login attempt.
pub struct InpostAuthFlow {
    http: HttpClient,
    pkce: PkceMaterial,
    settings: AuthFlowSettings,
    language: String,
    locale: &'static str,
}

impl InpostAuthFlow {
    /// Flow against the production endpoints.
    pub fn new(language: impl Into<String>) -> Self {
        Self::with_settings(language, AuthFlowSettings::default())
    }

    /// Flow with endpoints and language taken from `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::with_settings(config.auth.language.clone(), AuthFlowSettings::from(config))
    }

    /// Flow with explicit endpoints.
    pub fn with_settings(language: impl Into<String>, settings: AuthFlowSettings) -> Self {
        let language = language.into();
        let locale = language_code(&language);
        let http = HttpClient::builder()
            .timeout(settings.request_timeout)
            .default_header("Accept-Language", locale)
            .build();

        Self { http, pkce: PkceMaterial::generate(), settings, language, locale }
    }

    /// PKCE material of this attempt.
    pub const fn pkce(&self) -> &PkceMaterial {
        &self.pkce
    }

    /// Language sent as the `lang` authorize parameter.
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Locale sent as `Accept-Language` and `NEXT_LOCALE`.
    pub const fn language_code(&self) -> &'static str {
        self.locale
    }

    /// Query string of both authorize requests.
    pub fn authorize_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("response_type", "code".to_string()),
            ("client_id", self.settings.client_id.clone()),
            ("redirect_uri", self.settings.redirect_uri.clone()),
            ("scope", OAUTH_SCOPE.to_string()),
            ("code_challenge", self.pkce.code_challenge.clone()),
            ("code_challenge_method", self.pkce.challenge_method().to_string()),
            ("theme", OAUTH_THEME.to_string()),
            ("state", self.pkce.flow_state.clone()),
            ("nonce", self.pkce.nonce.clone()),
            ("lang", self.language.clone()),
            ("response_mode", "query".to_string()),
        ]
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.settings.oauth_base_url)
    }

    async fn authorize(&self) -> ClientResult<HttpResponse> {
        let response = self.http.get(&self.url(AUTHORIZE_PATH), &self.authorize_params(), &[]).await?;
        response.raise_for_error()?;
        Ok(response)
    }

    /// Open the account session (cookies only, the step does not change).
    ///
    /// # Errors
    /// A classified API error or a transport failure.
    pub async fn initialize_session(&self) -> ClientResult<()> {
        info!("initializing login session");
        let response = self.authorize().await?;
        debug!(status = response.status, "authorize session established");
        Ok(())
    }

    /// Read the first onboarding step and pick up the XSRF token.
    ///
    /// # Errors
    /// A classified API error or a transport failure. `Config` if the XSRF
    /// token cannot be sent as a header.
    pub async fn fetch_xsrf_token(&self) -> ClientResult<AuthStep> {
        let url = self.url(ONBOARDING_STEPS_PATH);
        let response = self.http.get(&url, &[], &[]).await?;
        response.raise_for_error()?;

        let xsrf = response
            .cookies
            .get(XSRF_COOKIE)
            .cloned()
            .or_else(|| self.http.cookie(XSRF_COOKIE, &url));
        match xsrf {
            Some(token) => {
                self.http.set_header(XSRF_HEADER, &token)?;
                debug!("XSRF token installed");
            }
            None => warn!("onboarding response carried no XSRF cookie"),
        }
        self.http.set_cookie(LOCALE_COOKIE, self.locale, &self.settings.oauth_base_url)?;

        let step = step_of(&response);
        info!(step = %step.step, "current onboarding step");
        Ok(step)
    }

    /// Re-read the current step without changing anything.
    ///
    /// # Errors
    /// A classified API error or a transport failure.
    pub async fn get_current_step(&self) -> ClientResult<AuthStep> {
        let response = self.http.get(&self.url(ONBOARDING_STEPS_PATH), &[], &[]).await?;
        response.raise_for_error()?;

        let step = step_of(&response);
        debug!(step = %step.step, "current onboarding step");
        Ok(step)
    }

    /// Submit an E.164 phone number (e.g. `+48123456789`) to receive an SMS
    /// code.
    ///
    /// # Errors
    /// `IdentityAdditionLimitReached` or `PhoneNumberAlreadyRegistered` end
    /// this login attempt.
    pub async fn submit_phone_number(&self, phone_number: &str) -> ClientResult<AuthStep> {
        info!("submitting phone number");
        self.submit(ONBOARDING_PHONE_NUMBER_PATH, json!({ "phoneNumber": phone_number })).await
    }

    /// Submit the SMS code.
    ///
    /// # Errors
    /// `InvalidOtpCode` for a wrong or expired code; the caller may submit
    /// another one.
    pub async fn submit_otp_code(&self, code: &str) -> ClientResult<AuthStep> {
        info!("submitting verification code");
        self.submit(ONBOARDING_PHONE_CODE_PATH, json!({ "code": code })).await
    }

    async fn submit(&self, path: &str, body: Value) -> ClientResult<AuthStep> {
        let response = self.http.post_json(&self.url(path), body).await?;
        response.raise_for_error()?;

        let step = step_of(&response);
        debug!(step = %step.step, "onboarding step after submission");
        Ok(step)
    }

    /// Ask the server to send the confirmation link to the existing email.
    ///
    /// # Errors
    /// A classified API error or a transport failure.
    pub async fn request_email_confirmation(&self) -> ClientResult<HttpResponse> {
        info!("requesting email confirmation");
        let response = self
            .http
            .post_json(&self.url(ONBOARDING_EMAIL_PATH), json!({ "openEmailButtonVisible": true }))
            .await?;
        response.raise_for_error()?;
        Ok(response)
    }

    /// Poll until the account is `ONBOARDED`.
    ///
    /// Returns `false` once `timeout` has elapsed. A transient failure of a
    /// status check (server error, rate limit, timeout, connection error)
    /// counts as "not yet"; any other error ends the wait.
    ///
    /// # Errors
    /// The first non-retryable status check failure.
    pub async fn wait_for_email_confirmation(
        &self,
        poll_interval: Duration,
        timeout: Duration,
    ) -> ClientResult<bool> {
        info!(timeout = ?timeout, "waiting for email confirmation");
        let started = Instant::now();

        while started.elapsed() < timeout {
            match self.get_current_step().await {
                Ok(step) if step.is_onboarded() => {
                    info!("email confirmed");
                    return Ok(true);
                }
                Ok(step) => debug!(step = %step.step, "email not confirmed yet"),
                Err(err) if err.is_retryable() => {
                    warn!(error = %err, "status check failed, still waiting");
                }
                Err(err) => return Err(err),
            }
            tokio::time::sleep(poll_interval).await;
        }

        warn!(timeout = ?timeout, "email confirmation timed out");
        Ok(false)
    }

    /// Re-issue the authorize request and read `code` from the redirect.
    ///
    /// # Errors
    /// [`ClientError::Protocol`] when the response has no `Location` with a
    /// `code` parameter.
    pub async fn fetch_authorization_code(&self) -> ClientResult<String> {
        info!("fetching authorization code");
        let response = self.authorize().await?;

        let location = response.header("location").ok_or_else(|| {
            error!(status = response.status, "authorize response is not a redirect");
            ClientError::Protocol("authorize response has no Location header".to_string())
        })?;

        let code = code_from_location(location, &self.url(AUTHORIZE_PATH)).ok_or_else(|| {
            error!("authorization code not found in redirect location");
            ClientError::Protocol("authorization code not found in redirect location".to_string())
        })?;
        debug!("authorization code obtained");
        Ok(code)
    }

    /// Trade the authorization code (plus the PKCE verifier) for tokens.
    ///
    /// # Errors
    /// A classified API error or a transport failure. `Protocol` if the
    /// token response lacks a required field.
    pub async fn exchange_code_for_tokens(&self, code: &str) -> ClientResult<TokenSet> {
        info!("exchanging authorization code for tokens");
        let tokens = request_tokens(
            &self.http,
            &self.settings.token_url,
            &[
                ("client_id", self.settings.client_id.as_str()),
                ("code", code),
                ("code_verifier", self.pkce.code_verifier.as_str()),
                ("grant_type", "authorization_code"),
                ("redirect_uri", self.settings.redirect_uri.as_str()),
            ],
        )
        .await?;
        info!("login completed");
        Ok(tokens)
    }

    /// Release the HTTP session. Safe to call at any time.
    pub fn close(&self) {
        self.http.close();
    }
}

fn step_of(response: &HttpResponse) -> AuthStep {
    AuthStep::from_payload(response.body.as_json().cloned().unwrap_or(Value::Null))
}

// Relative locations resolve against the authorize URL.
fn code_from_location(location: &str, base: &str) -> Option<String> {
    let url = Url::parse(location)
        .or_else(|_| Url::parse(base).and_then(|base| base.join(location)))
        .ok()?;
    url.query_pairs().find(|(key, _)| key == "code").map(|(_, value)| value.into_owned())
}
