//! Error types for configuration and domain validation

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Domain-level error type
#[derive(Error, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum PaczkomatError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for domain operations
pub type Result<T> = std::result::Result<T, PaczkomatError>;
