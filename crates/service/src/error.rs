//! Typed error enum for the service layer.
//!
//! Unifies storage, provider, and gateway failures into a single error type,
//! enabling callers to match on specific failure modes instead of downcasting
//! opaque boxes.

use simtrack_goip::GoipError;
use simtrack_provider::ProviderError;
use simtrack_storage::StorageError;
use thiserror::Error;

/// Service-layer error unifying storage, provider, and gateway failures.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage operation failed (DB, not found, duplicate, etc.).
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    /// Provider gateway call failed.
    #[error("provider: {0}")]
    Provider(#[from] ProviderError),

    /// GOIP gateway call failed.
    #[error("goip: {0}")]
    Goip(#[from] GoipError),

    /// Caller provided invalid input (empty list, malformed data).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Serialization/deserialization failed in the service layer.
    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ServiceError {
    /// Whether this error is likely transient (worth retrying).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Storage(e) => e.is_transient(),
            Self::Provider(e) => e.is_transient(),
            Self::Goip(e) => e.is_transient(),
            _ => false,
        }
    }

    /// Whether this error represents a not-found condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Storage(StorageError::NotFound { .. }))
    }

    /// Whether this error represents a duplicate/conflict.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Storage(e) if e.is_duplicate())
    }
}
