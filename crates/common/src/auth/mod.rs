//! OAuth 2.0 + PKCE building blocks for the InPost account flow
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │  TokenManager    │  Credential pair + single-flight refresh
//! └────────┬─────────┘
//!          │
//!          ├──► OAuthClientTrait   (refresh round-trip, bearer install)
//!          │
//!          └──► jwt                (unverified `exp` inspection)
//!
//! PkceMaterial   verifier / challenge / state / nonce per login attempt
//! AuthStep       one answer from the onboarding wizard
//! ```
//!
//! The HTTP side (transport, onboarding flow, token endpoint) lives in
//! `paczkomat-infra`.
//!
//! # Usage Example
//!
//! ```no_run
//! use paczkomat_common::auth::{OAuthClientTrait, TokenManager};
//!
//! async fn call_api<C: OAuthClientTrait>(
//!     manager: &TokenManager<C>,
//! ) -> Result<(), Box<dyn std::error::Error>> {
//!     // Refreshes first if the access token expires within the buffer
//!     manager.ensure_valid().await?;
//!     // ... issue the authenticated request ...
//!     Ok(())
//! }
//! ```

pub mod jwt;
pub mod pkce;
pub mod token_manager;
pub mod traits;
pub mod types;

pub use jwt::{decode_claims, expires_at, is_token_expiring_soon};
pub use pkce::{generate_code_challenge, generate_code_verifier, PkceMaterial};
pub use token_manager::{TokenManager, TokenRefreshCallback, DEFAULT_REFRESH_BUFFER_SECONDS};
pub use traits::OAuthClientTrait;
pub use types::{AuthStep, OnboardingStep, TokenResponse, TokenSet};
