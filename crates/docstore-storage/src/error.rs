use docstore_blob::BlobError;
use docstore_types::ObjectType;

use crate::config::ConfigError;

/// Errors from storage service operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No document exists at the computed backend key.
    #[error("{object_type} {key} not found")]
    NotFound { object_type: ObjectType, key: String },

    /// The document could not be encoded as JSON.
    #[error("serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The blob at `key` is not a valid document of the requested type.
    #[error("failed to deserialize {key}: {source}")]
    Deserialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Failure reported by the blob client.
    #[error("backend error: {0}")]
    Backend(#[from] BlobError),

    /// The version index for `key` could not be read.
    ///
    /// Distinct from an empty history, which is `Ok(vec![])`.
    #[error("version history unavailable for {key}: {source}")]
    VersionsUnavailable {
        key: String,
        #[source]
        source: BlobError,
    },

    /// One listed revision could not be fetched or decoded.
    #[error("failed to read version {version_id} of {key}: {source}")]
    VersionFetch {
        key: String,
        version_id: String,
        #[source]
        source: Box<StorageError>,
    },

    /// A document was written but its group's last-modified marker was not.
    #[error("failed to update last-modified marker {key}: {source}")]
    MarkerWrite {
        key: String,
        #[source]
        source: Box<StorageError>,
    },

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
