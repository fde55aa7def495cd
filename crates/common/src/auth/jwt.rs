//! Unverified JWT expiry inspection
//!
//! Access tokens are decoded without signature verification, only to read
//! `exp` for the proactive-refresh heuristic. Never use these claims for
//! trust decisions.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Decode the payload segment of a JWT into JSON.
///
/// Tolerates padded and unpadded base64url. Returns `None` for anything
/// that is not a three-segment token with a JSON object payload.
#[must_use]
pub fn decode_claims(token: &str) -> Option<Value> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (segments.next(), segments.next(), segments.next(), segments.next())
    else {
        return None;
    };

    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: Value = serde_json::from_slice(&bytes).ok()?;
    claims.is_object().then_some(claims)
}

/// `exp` claim as a UTC timestamp.
#[must_use]
pub fn expires_at(token: &str) -> Option<DateTime<Utc>> {
    let exp = decode_claims(token)?.get("exp").cloned()?;
    let seconds = exp.as_i64().or_else(|| exp.as_f64().and_then(whole_seconds))?;
    DateTime::from_timestamp(seconds, 0)
}

// NumericDate may carry a fraction; it is truncated. Values outside the
// range chrono can represent are rejected.
fn whole_seconds(exp: f64) -> Option<i64> {
    const LIMIT: f64 = 1e15;
    if !exp.is_finite() || exp.abs() >= LIMIT {
        return None;
    }
    #[allow(clippy::cast_possible_truncation)] // |exp| < 1e15 fits in i64
    let seconds = exp.trunc() as i64;
    Some(seconds)
}

/// `true` when `now + buffer_secs >= exp`.
///
/// An undecodable token, or one without `exp`, counts as expiring.
#[must_use]
pub fn is_token_expiring_soon(token: &str, buffer_secs: i64, now: DateTime<Utc>) -> bool {
    expires_at(token)
        .map_or(true, |exp| now.timestamp().saturating_add(buffer_secs) >= exp.timestamp())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn token_with(claims: &Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("{header}.{payload}.signature")
    }

    #[test]
    fn reads_exp_claim() {
        let token = token_with(&json!({"sub": "user", "exp": 1_700_000_000}));
        assert_eq!(expires_at(&token).map(|t| t.timestamp()), Some(1_700_000_000));
    }

    #[test]
    fn accepts_padded_payload() {
        let header = URL_SAFE_NO_PAD.encode(b"{}");
        let payload = base64::engine::general_purpose::URL_SAFE.encode(br#"{"exp":12}"#);
        let token = format!("{header}.{payload}.sig");

        assert_eq!(expires_at(&token).map(|t| t.timestamp()), Some(12));
    }

    #[test]
    fn fractional_exp_is_truncated() {
        let token = token_with(&json!({"exp": 1_700_000_000.75}));
        assert_eq!(expires_at(&token).map(|t| t.timestamp()), Some(1_700_000_000));
    }

    #[test]
    fn out_of_range_exp_counts_as_expiring() {
        let now = Utc::now();
        let huge = token_with(&json!({"exp": 1e300}));

        assert_eq!(expires_at(&huge), None);
        assert!(is_token_expiring_soon(&huge, 600, now));
    }

    #[test]
    fn expiring_window_uses_buffer() {
        let now = Utc::now();
        let soon = token_with(&json!({"exp": now.timestamp() + 300}));
        let later = token_with(&json!({"exp": now.timestamp() + 7200}));

        assert!(is_token_expiring_soon(&soon, 600, now));
        assert!(!is_token_expiring_soon(&later, 600, now));
    }

    #[test]
    fn boundary_is_inclusive() {
        let now = Utc::now();
        let token = token_with(&json!({"exp": now.timestamp() + 600}));
        assert!(is_token_expiring_soon(&token, 600, now));
    }

    #[test]
    fn undecodable_or_missing_exp_counts_as_expiring() {
        let now = Utc::now();

        assert!(is_token_expiring_soon("not-a-jwt", 600, now));
        assert!(is_token_expiring_soon("a.%%%.c", 600, now));
        assert!(is_token_expiring_soon(&token_with(&json!({"sub": "x"})), 600, now));
        assert!(is_token_expiring_soon(&token_with(&json!("string payload")), 600, now));
    }
}
