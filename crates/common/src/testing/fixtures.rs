//! Test fixture generators

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::{json, Value};

/// Unsigned JWT carrying `claims` as its payload.
#[must_use]
pub fn jwt_with_claims(claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.")
}

/// Unsigned JWT expiring at `exp` (unix seconds).
#[must_use]
pub fn jwt_with_exp(exp: i64) -> String {
    jwt_with_claims(&json!({"sub": "test-user", "exp": exp}))
}

/// Unsigned JWT without an `exp` claim.
#[must_use]
pub fn jwt_without_exp() -> String {
    jwt_with_claims(&json!({"sub": "test-user"}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::expires_at;

    #[test]
    fn fixture_tokens_decode() {
        assert_eq!(expires_at(&jwt_with_exp(42)).map(|t| t.timestamp()), Some(42));
        assert_eq!(expires_at(&jwt_without_exp()), None);
    }
}
