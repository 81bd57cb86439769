//! Error types for pitlane-state

use thiserror::Error;

/// Errors that can occur in the persistence layer
#[derive(Error, Debug)]
pub enum StorageError {
    /// A key contains characters that cannot be mapped onto the backend
    #[error("invalid storage key: {key}")]
    InvalidKey { key: String },

    /// A write lock stayed held by another writer
    #[error("write conflict on {resource} after {attempts} attempts")]
    Conflict { resource: String, attempts: u32 },

    /// Serialization error
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Filesystem error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Backend-specific failure (poisoned lock, corrupt file, ...)
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_error_names_resource() {
        let err = StorageError::Conflict {
            resource: "records.json".to_string(),
            attempts: 8,
        };
        let msg = err.to_string();
        assert!(msg.contains("records.json"));
        assert!(msg.contains('8'));
    }

    #[test]
    fn serde_error_maps_to_serialization() {
        let bad = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: StorageError = bad.into();
        assert!(matches!(err, StorageError::Serialization(_)));
    }
}
