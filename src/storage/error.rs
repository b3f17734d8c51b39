//! Storage error types.

use super::Key;
use thiserror::Error;

/// Errors raised by a storage backend.
///
/// Errors returned by a caller's update closure are not wrapped in this
/// type; [`Storage::put`](super::Storage::put) hands them back untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The key does not exist or has expired
    #[error("key not found: {0}")]
    KeyNotFound(Key),
}

impl StorageError {
    pub fn is_key_not_found(&self) -> bool {
        matches!(self, StorageError::KeyNotFound(_))
    }
}

/// Result type for storage operations.
pub type Result<T, E = StorageError> = std::result::Result<T, E>;
