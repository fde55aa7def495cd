//! PKCE (Proof Key for Code Exchange) material for OAuth 2.0
//!
//! Implements the RFC 7636 S256 method plus the `state` and `nonce` values
//! the InPost authorize endpoint expects. One [`PkceMaterial`] belongs to
//! exactly one login attempt; a new attempt must generate a new one.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::Rng;
use sha2::{Digest, Sha256};

/// Generate a cryptographically secure code verifier
///
/// Returns a URL-safe base64-encoded random string of 32 bytes (43 characters).
/// Per RFC 7636, verifiers must be 43-128 characters long.
#[must_use]
pub fn generate_code_verifier() -> String {
    let random_bytes: [u8; 32] = rand::thread_rng().gen();
    URL_SAFE_NO_PAD.encode(random_bytes)
}

/// Generate code challenge from verifier using SHA256
///
/// Per RFC 7636, the challenge is BASE64URL(SHA256(ASCII(code_verifier)))
/// without padding.
#[must_use]
pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Lowercase hex of `len` random bytes.
#[must_use]
pub fn random_hex(len: usize) -> String {
    let mut rng = rand::thread_rng();
    let bytes: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
    hex::encode(bytes)
}

/// PKCE parameters for one authorization attempt
///
/// The verifier stays local until the token exchange; only the challenge,
/// state and nonce go out with the authorize request.
#[derive(Clone)]
pub struct PkceMaterial {
    /// Random secret, sent only with the final token exchange
    pub code_verifier: String,

    /// SHA256 of the verifier, sent with every authorize request
    pub code_challenge: String,

    /// Opaque value echoed back on the callback redirect
    pub flow_state: String,

    /// Replay protection for the ID token
    pub nonce: String,
}

impl PkceMaterial {
    /// Generate fresh material.
    ///
    /// # Examples
    /// ```
    /// use paczkomat_common::auth::pkce::{generate_code_challenge, PkceMaterial};
    ///
    /// let pkce = PkceMaterial::generate();
    /// assert_eq!(pkce.code_challenge, generate_code_challenge(&pkce.code_verifier));
    /// assert_eq!(pkce.flow_state.len(), 16);
    /// ```
    #[must_use]
    pub fn generate() -> Self {
        let code_verifier = generate_code_verifier();
        let code_challenge = generate_code_challenge(&code_verifier);

        Self { code_verifier, code_challenge, flow_state: random_hex(8), nonce: random_hex(8) }
    }

    /// Get the challenge method (always "S256" for SHA256)
    #[must_use]
    pub const fn challenge_method(&self) -> &'static str {
        "S256"
    }
}

impl std::fmt::Debug for PkceMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PkceMaterial")
            .field("code_verifier", &"<redacted>")
            .field("code_challenge", &self.code_challenge)
            .field("flow_state", &self.flow_state)
            .field("nonce", &self.nonce)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for auth::pkce.
    use super::*;

    /// Validates `PkceMaterial::generate` output shape.
    ///
    /// Assertions:
    /// - Verifier length is within RFC 7636 bounds (43-128).
    /// - State and nonce are 16 lowercase hex characters.
    #[test]
    fn test_generate_pkce_material() {
        let pkce = PkceMaterial::generate();

        assert!(
            (43..=128).contains(&pkce.code_verifier.len()),
            "code_verifier length out of range: {}",
            pkce.code_verifier.len()
        );
        assert_eq!(pkce.flow_state.len(), 16);
        assert_eq!(pkce.nonce.len(), 16);
        assert!(pkce.flow_state.chars().all(|c| c.is_ascii_hexdigit() && !c.is_uppercase()));
    }

    /// Validates the challenge is recomputable from the verifier.
    ///
    /// Assertions:
    /// - Recomputing the challenge yields the stored value, twice.
    #[test]
    fn test_code_challenge_deterministic() {
        let pkce = PkceMaterial::generate();

        let first = generate_code_challenge(&pkce.code_verifier);
        let second = generate_code_challenge(&pkce.code_verifier);

        assert_eq!(pkce.code_challenge, first);
        assert_eq!(first, second);
    }

    /// Validates against the RFC 7636 appendix B test vector.
    #[test]
    fn test_rfc7636_vector() {
        assert_eq!(
            generate_code_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    /// Validates base64url alphabet without padding.
    #[test]
    fn test_base64url_encoding() {
        let pkce = PkceMaterial::generate();

        for value in [&pkce.code_verifier, &pkce.code_challenge] {
            assert!(!value.contains('='));
            assert!(!value.contains('+'));
            assert!(!value.contains('/'));
        }
    }

    /// Validates each generation produces unique values.
    #[test]
    fn test_unique_material() {
        let a = PkceMaterial::generate();
        let b = PkceMaterial::generate();

        assert_ne!(a.code_verifier, b.code_verifier);
        assert_ne!(a.flow_state, b.flow_state);
        assert_ne!(a.nonce, b.nonce);
    }

    #[test]
    fn test_debug_redacts_verifier() {
        let pkce = PkceMaterial::generate();
        let rendered = format!("{pkce:?}");

        assert!(!rendered.contains(&pkce.code_verifier));
        assert_eq!(pkce.challenge_method(), "S256");
    }
}
