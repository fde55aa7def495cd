//! Reusable building blocks for the InPost parcel-locker client.
//!
//! - [`auth`]: PKCE material, credential pair, onboarding steps, token
//!   lifecycle
//! - [`error`]: client error taxonomy and the provider error classifier
//! - `testing` (feature `test-utils`): mocks and JWT fixtures

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod auth;
pub mod error;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "test-utils", test))]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
pub use auth::{AuthStep, OAuthClientTrait, OnboardingStep, PkceMaterial, TokenManager, TokenSet};
pub use error::{
    classify, ApiError, ApiErrorKind, ClientError, ClientResult, ErrorClassification,
    ErrorSeverity, ResponseBody,
};
