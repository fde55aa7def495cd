//! Error taxonomy shared by the transport, auth flow and API client
//!
//! Three families of failures reach callers:
//!
//! 1. **Transport** failures: timeouts ([`ClientError::RequestTimeout`]) and
//!    connection-level errors from reqwest, propagated unchanged.
//! 2. **Protocol** violations: the HTTP layer reported success but the
//!    payload breaks the contract (missing `code` in a redirect, token
//!    response without a refresh token, ...).
//! 3. **Classified API** errors: error envelopes turned into an [`ApiError`]
//!    with a concrete [`ApiErrorKind`] by [`api::classify`].
//!
//! Nothing in this crate retries on its own. [`ErrorClassification`] exposes
//! enough structure for a caller to pick its own policy.

pub mod api;

use std::fmt;
use std::time::Duration;

use thiserror::Error;

pub use api::{classify, ApiError, ApiErrorKind, ResponseBody};

/// Result alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Every failure the InPost client can surface.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Error envelope returned by the provider, already classified.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The request did not complete within its time budget.
    #[error("Request timed out after {0:?}")]
    RequestTimeout(Duration),

    /// Connection or TLS level failure.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Successful HTTP exchange whose payload violates the protocol.
    #[error("Protocol violation: {0}")]
    Protocol(String),

    /// A refresh was requested but no refresh token is held.
    #[error("No refresh token available")]
    NoRefreshToken,

    /// An authenticated endpoint was called without credentials.
    #[error("Not authenticated (no tokens)")]
    NotAuthenticated,

    /// Invalid client configuration (header names, URLs, ...).
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Classified API error, if this is one.
    #[must_use]
    pub const fn as_api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(err) => Some(err),
            _ => None,
        }
    }

    /// Kind of the classified API error, if this is one.
    #[must_use]
    pub fn api_kind(&self) -> Option<ApiErrorKind> {
        self.as_api().map(|err| err.kind)
    }
}

/// Standard classification interface for error types
///
/// Lets callers decide retry policy and severity without matching on
/// concrete variants.
pub trait ErrorClassification {
    /// Transient failure that may succeed if attempted again.
    fn is_retryable(&self) -> bool;

    /// Severity for logging and alerting decisions.
    fn severity(&self) -> ErrorSeverity;

    /// Failure that needs attention beyond the current request.
    fn is_critical(&self) -> bool;

    /// Suggested delay before a retry, when one is known.
    fn retry_after(&self) -> Option<Duration>;
}

/// Error severity levels for monitoring and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Informational, typically for debugging
    Info,
    /// Warning, should be monitored but not critical
    Warning,
    /// Error, requires attention and action
    Error,
    /// Critical, immediate action required
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

impl ErrorClassification for ClientError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Api(err) => err.is_retryable(),
            Self::RequestTimeout(_) => true,
            Self::Transport(err) => err.is_timeout() || err.is_connect(),
            Self::Protocol(_) | Self::NoRefreshToken | Self::NotAuthenticated | Self::Config(_) => {
                false
            }
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Api(err) => err.severity(),
            Self::RequestTimeout(_)
            | Self::Transport(_)
            | Self::NoRefreshToken
            | Self::NotAuthenticated => ErrorSeverity::Warning,
            Self::Protocol(_) | Self::Config(_) => ErrorSeverity::Error,
        }
    }

    fn is_critical(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Api(err) => err.retry_after(),
            Self::RequestTimeout(_) => Some(Duration::from_secs(1)),
            _ => None,
        }
    }
}
