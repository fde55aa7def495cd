//! Configuration management

use serde::{Deserialize, Serialize};

use crate::constants::{
    API_BASE_URL, DEFAULT_API_TIMEOUT_SECS, DEFAULT_AUTH_TIMEOUT_SECS,
    DEFAULT_EMAIL_CONFIRMATION_TIMEOUT_SECS, DEFAULT_EMAIL_POLL_INTERVAL_SECS, DEFAULT_LANGUAGE,
    DEFAULT_REFRESH_BUFFER_SECS, OAUTH_BASE_URL, OAUTH_CLIENT_ID, OAUTH_REDIRECT_URI,
    PARCEL_LOCKERS_URL,
};
use crate::errors::{PaczkomatError, Result};

/// Application configuration
///
/// Every field has a default, so an empty file (or no file) is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `[oauth]` section
    pub oauth: OAuthSettings,
    /// `[api]` section
    pub api: ApiSettings,
    /// `[auth]` section
    pub auth: AuthSettings,
}

impl Config {
    /// Reject values the clients cannot work with.
    ///
    /// # Errors
    /// Returns `PaczkomatError::InvalidInput` naming the first offending
    /// field.
    pub fn validate(&self) -> Result<()> {
        let urls = [
            ("oauth.base_url", &self.oauth.base_url),
            ("oauth.redirect_uri", &self.oauth.redirect_uri),
            ("api.base_url", &self.api.base_url),
            ("api.parcel_lockers_url", &self.api.parcel_lockers_url),
        ];
        for (field, value) in urls {
            if !(value.starts_with("http://") || value.starts_with("https://")) {
                return Err(invalid(field, "must be an http(s) URL"));
            }
        }
        if self.oauth.client_id.trim().is_empty() {
            return Err(invalid("oauth.client_id", "must not be empty"));
        }
        if self.api.timeout_seconds == 0 {
            return Err(invalid("api.timeout_seconds", "must be positive"));
        }
        if self.auth.request_timeout_seconds == 0 {
            return Err(invalid("auth.request_timeout_seconds", "must be positive"));
        }
        if self.auth.refresh_buffer_seconds < 0 {
            return Err(invalid("auth.refresh_buffer_seconds", "must not be negative"));
        }
        if !(self.auth.email_poll_interval_seconds.is_finite()
            && self.auth.email_poll_interval_seconds > 0.0)
        {
            return Err(invalid("auth.email_poll_interval_seconds", "must be positive"));
        }
        if !(self.auth.email_confirmation_timeout_seconds.is_finite()
            && self.auth.email_confirmation_timeout_seconds >= 0.0)
        {
            return Err(invalid("auth.email_confirmation_timeout_seconds", "must not be negative"));
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> PaczkomatError {
    PaczkomatError::InvalidInput(format!("{field} {reason}"))
}

/// Account service (authorize + onboarding) settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuthSettings {
    /// Account service origin
    pub base_url: String,
    /// OAuth client id
    pub client_id: String,
    /// Redirect URI registered for the client
    pub redirect_uri: String,
}

impl Default for OAuthSettings {
    fn default() -> Self {
        Self {
            base_url: OAUTH_BASE_URL.to_string(),
            client_id: OAUTH_CLIENT_ID.to_string(),
            redirect_uri: OAUTH_REDIRECT_URI.to_string(),
        }
    }
}

/// Mobile API settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Mobile API base URL
    pub base_url: String,
    /// Public parcel-locker list URL
    pub parcel_lockers_url: String,
    /// Per-request timeout for API calls
    pub timeout_seconds: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: API_BASE_URL.to_string(),
            parcel_lockers_url: PARCEL_LOCKERS_URL.to_string(),
            timeout_seconds: DEFAULT_API_TIMEOUT_SECS,
        }
    }
}

/// Login flow and token lifecycle settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Two-letter language (`pl`, `en`, ...)
    pub language: String,
    /// Per-request timeout for login flow calls
    pub request_timeout_seconds: u64,
    /// Refresh this many seconds before the access token's `exp`
    pub refresh_buffer_seconds: i64,
    /// Pause between email confirmation checks
    pub email_poll_interval_seconds: f64,
    /// Give up waiting for email confirmation after this long
    pub email_confirmation_timeout_seconds: f64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            request_timeout_seconds: DEFAULT_AUTH_TIMEOUT_SECS,
            refresh_buffer_seconds: DEFAULT_REFRESH_BUFFER_SECS,
            email_poll_interval_seconds: DEFAULT_EMAIL_POLL_INTERVAL_SECS,
            email_confirmation_timeout_seconds: DEFAULT_EMAIL_CONFIRMATION_TIMEOUT_SECS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"auth": {"language": "en"}}"#).expect("config");

        assert_eq!(config.auth.language, "en");
        assert_eq!(config.auth.refresh_buffer_seconds, 600);
        assert_eq!(config.api, ApiSettings::default());
        assert_eq!(config.oauth.client_id, "inpost-mobile");
    }

    #[test]
    fn defaults_are_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn rejects_unusable_values() {
        let mut config = Config::default();
        config.api.base_url = "api-inmobile-pl.easypack24.net".into();
        let err = config.validate().expect_err("scheme missing");
        assert_eq!(err.to_string(), "Invalid input: api.base_url must be an http(s) URL");

        let mut config = Config::default();
        config.auth.email_poll_interval_seconds = 0.0;
        assert!(matches!(config.validate(), Err(PaczkomatError::InvalidInput(_))));

        let mut config = Config::default();
        config.auth.refresh_buffer_seconds = -1;
        assert!(config.validate().is_err());
    }
}
