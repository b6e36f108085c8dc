//! Core error types for the GMA client.

use thiserror::Error;

/// Core error type for model construction and parsing.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A report date code was not a valid `YYYYMMDD` date.
    #[error("Invalid date code: {0}")]
    InvalidDateCode(String),

    /// An unknown assignment role name.
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// Invalid data from an API response.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
