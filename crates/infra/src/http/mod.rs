//! HTTP transport
//!
//! One private session per [`HttpClient`]: cookie jar, connection pool and
//! layered headers. Redirects are surfaced to the caller, never followed.

pub mod client;

pub use client::{HttpClient, HttpClientBuilder, HttpResponse, RequestBody};
