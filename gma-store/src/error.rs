//! Store error types.

use gma_fetch::TransportError;
use thiserror::Error;

/// Errors that can occur in the profile store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No profile exists under the key.
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    /// The key is neither an index nor `custom`.
    #[error("Invalid profile key: {0:?}")]
    InvalidProfileKey(String),

    /// The profile authority answered with something other than a list.
    #[error("Unexpected profile data")]
    UnexpectedProfileData,

    /// Fetching profiles failed.
    #[error("Fetch failed: {0}")]
    Fetch(#[from] TransportError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Returns true if this is a transient error that might succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Fetch(_) | StoreError::Io(_))
    }
}
