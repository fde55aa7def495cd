//! InPost mobile API client
//!
//! # Architecture
//!
//! - Uses the crate's [`HttpClient`](crate::http::HttpClient) (no direct
//!   reqwest)
//! - Bearer token kept fresh by a [`TokenManager`](paczkomat_common::TokenManager)
//!   before every authenticated call
//! - Public endpoints go through a separate session without credentials

pub mod client;

pub use client::{ApiClientBuilder, ApiClientConfig, InPostApiClient};
