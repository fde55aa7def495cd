//! Credential and onboarding types
//!
//! [`TokenSet`] is the credential pair issued by the InPost token endpoint.
//! [`AuthStep`] is one answer from the server-driven onboarding wizard.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ClientError;

/// Token type assumed when the token endpoint omits it.
pub const DEFAULT_TOKEN_TYPE: &str = "Bearer";
/// Lifetime assumed when the token endpoint omits `expires_in`.
pub const DEFAULT_EXPIRES_IN: i64 = 7199;
/// Scope assumed when the token endpoint omits it.
pub const DEFAULT_SCOPE: &str = "openid";

/// OAuth 2.0 access and refresh tokens with metadata
///
/// Replaced as a whole on every exchange or refresh; never mutated field by
/// field.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    /// JWT access token for API authentication
    pub access_token: String,

    /// Refresh token for obtaining new access tokens
    ///
    /// Optional so callers can restore a session that only persisted the
    /// access token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Token type (always "Bearer" in practice)
    #[serde(default = "default_token_type")]
    pub token_type: String,

    /// Access token lifetime in seconds, as reported at issue time
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,

    /// Granted scopes (space-separated)
    #[serde(default = "default_scope")]
    pub scope: String,

    /// ID token (OpenID Connect)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
}

fn default_token_type() -> String {
    DEFAULT_TOKEN_TYPE.to_string()
}

const fn default_expires_in() -> i64 {
    DEFAULT_EXPIRES_IN
}

fn default_scope() -> String {
    DEFAULT_SCOPE.to_string()
}

impl TokenSet {
    /// Credential pair with default metadata.
    #[must_use]
    pub fn new(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
            token_type: default_token_type(),
            expires_in: DEFAULT_EXPIRES_IN,
            scope: default_scope(),
            id_token: None,
        }
    }
}

impl fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSet")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .field("id_token", &self.id_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Token endpoint response (RFC 6749 section 5.1)
///
/// Everything is optional at the wire level; [`TokenResponse::into_token_set`]
/// enforces what the client actually requires.
#[derive(Debug, Default, Deserialize)]
pub struct TokenResponse {
    /// Required by [`TokenResponse::into_token_set`].
    pub access_token: Option<String>,
    /// Required by [`TokenResponse::into_token_set`].
    pub refresh_token: Option<String>,
    /// Defaults to `Bearer`.
    pub token_type: Option<String>,
    /// Defaults to `7199`.
    pub expires_in: Option<i64>,
    /// Defaults to `openid`.
    pub scope: Option<String>,
    /// OpenID Connect ID token, kept as is.
    pub id_token: Option<String>,
}

impl TokenResponse {
    /// Validate and convert into a [`TokenSet`].
    ///
    /// # Errors
    /// [`ClientError::Protocol`] when `access_token` or `refresh_token` is
    /// missing or empty.
    pub fn into_token_set(self) -> Result<TokenSet, ClientError> {
        let access_token = self.access_token.filter(|t| !t.is_empty()).ok_or_else(|| {
            ClientError::Protocol("token response is missing access_token".to_string())
        })?;
        let refresh_token = self.refresh_token.filter(|t| !t.is_empty()).ok_or_else(|| {
            ClientError::Protocol("token response is missing refresh_token".to_string())
        })?;

        Ok(TokenSet {
            access_token,
            refresh_token: Some(refresh_token),
            token_type: self.token_type.unwrap_or_else(default_token_type),
            expires_in: self.expires_in.unwrap_or(DEFAULT_EXPIRES_IN),
            scope: self.scope.unwrap_or_else(default_scope),
            id_token: self.id_token,
        })
    }
}

/// Named state of the onboarding wizard.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OnboardingStep {
    /// `PROVIDE_PHONE_NUMBER_FOR_LOGIN`
    ProvidePhoneNumber,
    /// `PROVIDE_PHONE_CODE`
    ProvidePhoneCode,
    /// `PROVIDE_EXISTING_EMAIL_ADDRESS`
    ProvideExistingEmail,
    /// `ONBOARDED`, login can complete.
    Onboarded,
    /// Any step this client does not know how to drive.
    Other(String),
}

impl OnboardingStep {
    /// Wire name of the step.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::ProvidePhoneNumber => "PROVIDE_PHONE_NUMBER_FOR_LOGIN",
            Self::ProvidePhoneCode => "PROVIDE_PHONE_CODE",
            Self::ProvideExistingEmail => "PROVIDE_EXISTING_EMAIL_ADDRESS",
            Self::Onboarded => "ONBOARDED",
            Self::Other(name) => name,
        }
    }
}

impl From<&str> for OnboardingStep {
    fn from(value: &str) -> Self {
        match value {
            "PROVIDE_PHONE_NUMBER_FOR_LOGIN" => Self::ProvidePhoneNumber,
            "PROVIDE_PHONE_CODE" => Self::ProvidePhoneCode,
            "PROVIDE_EXISTING_EMAIL_ADDRESS" => Self::ProvideExistingEmail,
            "ONBOARDED" => Self::Onboarded,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for OnboardingStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One onboarding response: the step plus the payload that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthStep {
    /// Step named by the server.
    pub step: OnboardingStep,
    /// Full response body.
    pub raw_response: Value,
}

impl AuthStep {
    /// Read `step` from an onboarding payload.
    ///
    /// A payload without a `step` string yields `Other("")`.
    #[must_use]
    pub fn from_payload(raw_response: Value) -> Self {
        let step = raw_response.get("step").and_then(Value::as_str).unwrap_or_default().into();
        Self { step, raw_response }
    }

    /// Onboarding is finished.
    #[must_use]
    pub fn is_onboarded(&self) -> bool {
        self.step == OnboardingStep::Onboarded
    }

    /// The server waits for a phone number.
    #[must_use]
    pub fn requires_phone(&self) -> bool {
        self.step == OnboardingStep::ProvidePhoneNumber
    }

    /// The server waits for the SMS code.
    #[must_use]
    pub fn requires_otp(&self) -> bool {
        self.step == OnboardingStep::ProvidePhoneCode
    }

    /// Whether the server wants an existing email confirmed, with the masked
    /// address it shows for it.
    #[must_use]
    pub fn requires_email(&self) -> (bool, Option<String>) {
        if self.step != OnboardingStep::ProvideExistingEmail {
            return (false, None);
        }
        let masked =
            self.raw_response.get("hashedEmail").and_then(Value::as_str).map(str::to_string);
        (true, masked)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn token_response_defaults_metadata() {
        let response: TokenResponse =
            serde_json::from_value(json!({"access_token": "A", "refresh_token": "B"}))
                .expect("deserialize");
        let tokens = response.into_token_set().expect("token set");

        assert_eq!(tokens.access_token, "A");
        assert_eq!(tokens.refresh_token.as_deref(), Some("B"));
        assert_eq!(tokens.token_type, "Bearer");
        assert_eq!(tokens.expires_in, 7199);
        assert_eq!(tokens.scope, "openid");
    }

    #[test]
    fn token_response_requires_both_tokens() {
        let missing_refresh = TokenResponse { access_token: Some("A".into()), ..Default::default() };
        let empty_access = TokenResponse {
            access_token: Some(String::new()),
            refresh_token: Some("B".into()),
            ..Default::default()
        };

        assert!(matches!(missing_refresh.into_token_set(), Err(ClientError::Protocol(_))));
        assert!(matches!(empty_access.into_token_set(), Err(ClientError::Protocol(_))));
    }

    #[test]
    fn token_set_debug_hides_secrets() {
        let tokens = TokenSet::new("secret-access", Some("secret-refresh".into()));
        let rendered = format!("{tokens:?}");

        assert!(!rendered.contains("secret-access"));
        assert!(!rendered.contains("secret-refresh"));
    }

    #[test]
    fn token_set_round_trips_with_serde_defaults() {
        let restored: TokenSet =
            serde_json::from_value(json!({"access_token": "A"})).expect("deserialize");
        assert_eq!(restored, TokenSet::new("A", None));
    }

    #[test]
    fn step_helpers() {
        let phone = AuthStep::from_payload(json!({"step": "PROVIDE_PHONE_NUMBER_FOR_LOGIN"}));
        let otp = AuthStep::from_payload(json!({"step": "PROVIDE_PHONE_CODE"}));
        let done = AuthStep::from_payload(json!({"step": "ONBOARDED"}));

        assert!(phone.requires_phone());
        assert!(otp.requires_otp());
        assert!(done.is_onboarded());
        assert_eq!(done.requires_email(), (false, None));
    }

    #[test]
    fn email_step_exposes_masked_address() {
        let step = AuthStep::from_payload(json!({
            "step": "PROVIDE_EXISTING_EMAIL_ADDRESS",
            "hashedEmail": "j***@example.com",
        }));

        assert_eq!(step.requires_email(), (true, Some("j***@example.com".to_string())));
    }

    #[test]
    fn unknown_step_is_preserved() {
        let step = AuthStep::from_payload(json!({"step": "ACCEPT_TERMS"}));
        assert_eq!(step.step, OnboardingStep::Other("ACCEPT_TERMS".into()));
        assert_eq!(step.step.to_string(), "ACCEPT_TERMS");
    }
}
