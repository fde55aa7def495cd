//! Testing utilities and helpers
//!
//! - **[`mocks`]**: [`MockOAuthClient`], a scripted refresh client
//! - **[`fixtures`]**: unsigned JWT builders for expiry tests
//!
//! Available to other crates through the `test-utils` feature.

pub mod fixtures;
pub mod mocks;

pub use fixtures::{jwt_with_claims, jwt_with_exp, jwt_without_exp};
pub use mocks::MockOAuthClient;
