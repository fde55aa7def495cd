//! # Paczkomat Domain
//!
//! Business domain types for the InPost parcel-locker client.
//!
//! This crate contains:
//! - Parcel, profile and locker types with the status aggregation
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Provider constants
//!
//! ## Architecture
//! - No dependencies on other Paczkomat crates
//! - Pure data and logic, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
pub use utils::language_code;
