/// Errors from blob client operations.
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    /// The bucket does not exist.
    #[error("no such bucket: {0}")]
    NoSuchBucket(String),

    /// No current object exists at the key.
    #[error("no such key: {bucket}/{key}")]
    NoSuchKey { bucket: String, key: String },

    /// The key exists but not at the requested version.
    #[error("no such version {version_id} of {bucket}/{key}")]
    NoSuchVersion {
        bucket: String,
        key: String,
        version_id: String,
    },

    /// Attempted to create a bucket that is already present.
    #[error("bucket already exists: {0}")]
    BucketAlreadyExists(String),

    /// The uploaded bytes do not match the declared content MD5.
    #[error("content digest mismatch: expected {expected}, computed {computed}")]
    BadDigest { expected: String, computed: String },

    /// The request is malformed (bad key, zero page size, length mismatch).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The backend does not offer this capability.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    /// I/O error from a filesystem-backed store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other failure reported by the service (transport, auth, quota).
    #[error("service error {code}: {message}")]
    Service { code: String, message: String },
}

impl BlobError {
    /// Returns `true` for the missing-bucket, missing-key and missing-version
    /// variants.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NoSuchBucket(_) | Self::NoSuchKey { .. } | Self::NoSuchVersion { .. }
        )
    }
}

/// Result alias for blob operations.
pub type BlobResult<T> = Result<T, BlobError>;
