//! Classification of provider error envelopes
//!
//! The provider answers failures in several shapes: problem-style JSON
//! envelopes (`{type, status, title, detail, instance}`), envelopes whose
//! `detail` is itself a JSON-encoded object carrying the useful `type`, and
//! plain HTML/text bodies from gateways. [`classify`] folds all of them into
//! one [`ApiError`] with a concrete [`ApiErrorKind`].
//!
//! Priority: nested detail type, then top-level error type, then HTTP status.

use std::fmt;
use std::time::Duration;

use serde_json::{Map, Value};

use super::{ErrorClassification, ErrorSeverity};

/// Upper bound on the text body kept as `detail` for non-JSON responses.
const MAX_TEXT_DETAIL_CHARS: usize = 500;

/// Titles that mark a JSON body as an error envelope even without `type`.
const KNOWN_ERROR_TITLES: &[&str] = &[
    "Unprocessable Entity",
    "Bad Request",
    "Unauthorized",
    "Forbidden",
    "Not Found",
    "Too Many Requests",
    "Internal Server Error",
];

/// Response body as received: parsed JSON, or raw text when decoding failed.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// Body decoded as JSON.
    Json(Value),
    /// Body that is not valid JSON (HTML error pages, empty bodies, ...).
    Text(String),
}

impl ResponseBody {
    /// Decode raw bytes, falling back to (lossy) text.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        serde_json::from_slice(bytes).map_or_else(
            |_| Self::Text(String::from_utf8_lossy(bytes).into_owned()),
            Self::Json,
        )
    }

    /// JSON object view, if the body is a map.
    #[must_use]
    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Json(value) => value.as_object(),
            Self::Text(_) => None,
        }
    }

    /// JSON value view, if the body was JSON at all.
    #[must_use]
    pub const fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    /// String field of a map body.
    #[must_use]
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.as_object().and_then(|map| map.get(key)).and_then(Value::as_str)
    }

    fn is_empty(&self) -> bool {
        match self {
            Self::Json(value) => value.is_null(),
            Self::Text(text) => text.is_empty(),
        }
    }
}

impl fmt::Display for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(Value::String(text)) | Self::Text(text) => f.write_str(text),
            Self::Json(value) => write!(f, "{value}"),
        }
    }
}

/// Concrete error kinds the classifier can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// The onboarding/API session is no longer valid.
    SessionExpired,
    /// Access denied; usually a missing or stale XSRF token.
    Forbidden,
    /// Authentication required.
    Unauthorized,
    /// The account cannot take another identity.
    IdentityAdditionLimitReached,
    /// The phone number belongs to another account.
    PhoneNumberAlreadyRegistered,
    /// The OTP code is wrong or has expired.
    InvalidOtpCode,
    /// Too many requests.
    RateLimit,
    /// 500/502/503 from the provider.
    ServerError,
    /// An error envelope with no more specific mapping.
    Unclassified,
}

impl ApiErrorKind {
    /// Lookup used for both nested detail types and top-level error types.
    #[must_use]
    pub fn from_error_type(error_type: &str) -> Option<Self> {
        match error_type {
            "IdentityAdditionLimitReached" => Some(Self::IdentityAdditionLimitReached),
            "PhoneNumberAlreadyRegistered" | "PhoneNumberAlreadyInUse" => {
                Some(Self::PhoneNumberAlreadyRegistered)
            }
            "InvalidVerificationCode" | "VerificationCodeExpired" => Some(Self::InvalidOtpCode),
            "TooManyRequests" => Some(Self::RateLimit),
            "SessionExpired" | "InvalidSession" => Some(Self::SessionExpired),
            _ => None,
        }
    }

    /// Lookup by HTTP status code.
    #[must_use]
    pub const fn from_status(status: u16) -> Option<Self> {
        match status {
            401 => Some(Self::Unauthorized),
            403 => Some(Self::Forbidden),
            429 => Some(Self::RateLimit),
            500 | 502 | 503 => Some(Self::ServerError),
            _ => None,
        }
    }
}

/// Structured provider error.
///
/// Carries enough context for programmatic dispatch (`kind`) and for human
/// display (`message`, `detail`). `raw_response` keeps the original body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    /// Classified kind used for dispatch.
    pub kind: ApiErrorKind,
    /// Title, suffixed with the detail type or plain-text detail.
    pub message: String,
    /// Envelope `type`, `HttpError` for non-JSON bodies.
    pub error_type: Option<String>,
    /// Envelope `status`, falling back to the HTTP status.
    pub status: Option<u16>,
    /// Envelope `detail` or (truncated) body text.
    pub detail: Option<String>,
    /// `type` of a JSON-encoded `detail`, when present.
    pub detail_type: Option<String>,
    /// Request path reported by the server.
    pub instance: Option<String>,
    /// Body exactly as received.
    pub raw_response: ResponseBody,
}

impl ApiError {
    /// Build an unclassified error from a response body and status code.
    ///
    /// This never decides whether the response *is* an error; see
    /// [`classify`] for that.
    #[must_use]
    pub fn from_response(body: &ResponseBody, status_code: u16) -> Self {
        let Some(map) = body.as_object() else {
            let detail = (!body.is_empty())
                .then(|| body.to_string().chars().take(MAX_TEXT_DETAIL_CHARS).collect());
            return Self {
                kind: ApiErrorKind::Unclassified,
                message: http_status_message(status_code),
                error_type: Some("HttpError".to_string()),
                status: Some(status_code),
                detail,
                detail_type: None,
                instance: None,
                raw_response: body.clone(),
            };
        };

        let error_type = map
            .get("type")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .unwrap_or("UnknownError")
            .to_string();
        let status = map
            .get("status")
            .and_then(Value::as_u64)
            .and_then(|s| u16::try_from(s).ok())
            .unwrap_or(status_code);
        let title = map
            .get("title")
            .and_then(Value::as_str)
            .map_or_else(|| http_status_message(status_code), str::to_string);
        let detail = map.get("detail").and_then(value_as_text).filter(|d| !d.is_empty());
        let instance = map.get("instance").and_then(value_as_text).filter(|i| !i.is_empty());
        let detail_type = detail.as_deref().and_then(nested_detail_type);

        let message = match (&detail_type, &detail) {
            (Some(nested), _) => format!("{title}: {nested}"),
            (None, Some(plain)) if !plain.starts_with('{') => format!("{title}: {plain}"),
            _ => title,
        };

        Self {
            kind: ApiErrorKind::Unclassified,
            message,
            error_type: Some(error_type),
            status: Some(status),
            detail,
            detail_type,
            instance,
            raw_response: body.clone(),
        }
    }

    /// Same error with a different kind.
    #[must_use]
    pub fn with_kind(mut self, kind: ApiErrorKind) -> Self {
        self.kind = kind;
        self
    }

    /// `true` for this kind.
    #[must_use]
    pub fn is(&self, kind: ApiErrorKind) -> bool {
        self.kind == kind
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if let Some(error_type) = &self.error_type {
            write!(f, " | type={error_type}")?;
        }
        if let Some(status) = self.status {
            write!(f, " | status={status}")?;
        }
        if let Some(detail_type) = &self.detail_type {
            write!(f, " | detail_type={detail_type}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

impl ErrorClassification for ApiError {
    fn is_retryable(&self) -> bool {
        matches!(self.kind, ApiErrorKind::RateLimit | ApiErrorKind::ServerError)
    }

    fn severity(&self) -> ErrorSeverity {
        match self.kind {
            ApiErrorKind::InvalidOtpCode | ApiErrorKind::RateLimit => ErrorSeverity::Info,
            ApiErrorKind::SessionExpired
            | ApiErrorKind::Forbidden
            | ApiErrorKind::Unauthorized
            | ApiErrorKind::PhoneNumberAlreadyRegistered
            | ApiErrorKind::IdentityAdditionLimitReached => ErrorSeverity::Warning,
            ApiErrorKind::ServerError | ApiErrorKind::Unclassified => ErrorSeverity::Error,
        }
    }

    fn is_critical(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<Duration> {
        match self.kind {
            ApiErrorKind::RateLimit => Some(Duration::from_secs(60)),
            ApiErrorKind::ServerError => Some(Duration::from_secs(10)),
            _ => None,
        }
    }
}

/// Inspect a response and return a classified error, or `None` when the
/// response is not an error.
#[must_use]
pub fn classify(body: &ResponseBody, status_code: u16) -> Option<ApiError> {
    let is_http_error = status_code >= 400;

    let Some(map) = body.as_object() else {
        if !is_http_error {
            return None;
        }
        let base = ApiError::from_response(body, status_code);
        let kind = ApiErrorKind::from_status(status_code).unwrap_or(ApiErrorKind::Unclassified);
        return Some(base.with_kind(kind));
    };

    let has_error_type = map.get("type").and_then(Value::as_str).is_some_and(|t| !t.is_empty());
    let has_error_status = map.get("status").and_then(Value::as_u64).is_some_and(|s| s >= 400);
    let has_error_title = map
        .get("title")
        .and_then(Value::as_str)
        .is_some_and(|title| KNOWN_ERROR_TITLES.contains(&title));

    if !(has_error_type || has_error_status || has_error_title || is_http_error) {
        return None;
    }

    let base = ApiError::from_response(body, status_code);
    let kind = base
        .detail_type
        .as_deref()
        .and_then(ApiErrorKind::from_error_type)
        .or_else(|| base.error_type.as_deref().and_then(ApiErrorKind::from_error_type))
        .or_else(|| ApiErrorKind::from_status(base.status.unwrap_or(status_code)))
        .unwrap_or(ApiErrorKind::Unclassified);

    Some(base.with_kind(kind))
}

/// Human-readable message for an HTTP status code.
#[must_use]
pub fn http_status_message(status_code: u16) -> String {
    let message = match status_code {
        400 => "Bad Request - Invalid request parameters",
        401 => "Unauthorized - Authentication required or session expired",
        403 => "Forbidden - Access denied, XSRF token may be missing or invalid",
        404 => "Not Found - Resource does not exist",
        422 => "Unprocessable Entity - Validation failed",
        429 => "Too Many Requests - Rate limit exceeded",
        500 => "Internal Server Error - Server encountered an error",
        502 => "Bad Gateway - Server received invalid response",
        503 => "Service Unavailable - Server is temporarily unavailable",
        other => return format!("HTTP Error {other}"),
    };
    message.to_string()
}

fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

fn nested_detail_type(detail: &str) -> Option<String> {
    let nested: Value = serde_json::from_str(detail).ok()?;
    nested.get("type").and_then(Value::as_str).map(str::to_string)
}
