//! # Paczkomat Infrastructure
//!
//! I/O side of the InPost client.
//!
//! This crate contains:
//! - HTTP transport with a private cookie/session per client
//! - Phone-number onboarding login (PKCE authorization code flow)
//! - Token endpoint client behind `OAuthClientTrait`
//! - Composite API client (parcels, profile, public locker list)
//! - Configuration loading and logging bootstrap
//!
//! ## Architecture
//! - Implements the seams defined in `paczkomat-common`
//! - Depends on `paczkomat-common` and `paczkomat-domain`
//! - Contains all "impure" code (network, files, environment)

pub mod api;
pub mod auth;
pub mod config;
pub mod http;
pub mod observability;

// Re-export commonly used items
pub use api::{ApiClientBuilder, ApiClientConfig, InPostApiClient};
pub use auth::{AuthFlowSettings, InpostAuthFlow, InpostTokenClient};
pub use http::{HttpClient, HttpClientBuilder, HttpResponse, RequestBody};
pub use observability::{init_tracing, LogFormat};
