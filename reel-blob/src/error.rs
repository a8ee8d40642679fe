use thiserror::Error;

/// Result type for blob operations
pub type BlobResult<T> = Result<T, BlobError>;

/// Errors that can occur during blob operations
#[derive(Error, Debug)]
pub enum BlobError {
    #[error("Blob not found: {key}")]
    NotFound { key: String },

    #[error("Invalid request: {message}")]
    Invalid { message: String },

    #[error("Blob already exists: {key}")]
    AlreadyExists { key: String },

    #[error("Requested range not satisfiable for blob of {total_size} bytes")]
    RangeNotSatisfiable { total_size: u64 },

    #[error("Blob exceeds maximum size of {max_bytes} bytes")]
    TooLarge { max_bytes: u64 },

    #[error("Operation not supported by this store")]
    Unsupported,

    #[error("Storage backend error: {source}")]
    Backend {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl BlobError {
    pub fn backend<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend {
            source: Box::new(error),
        }
    }

    pub fn invalid<S: Into<String>>(message: S) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    pub fn not_found<S: Into<String>>(key: S) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Maps `io::ErrorKind::NotFound` to [`BlobError::NotFound`] for `key`.
    pub fn from_io(err: std::io::Error, key: &str) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::not_found(key)
        } else {
            Self::Io { source: err }
        }
    }

    /// True for failures of the storage medium itself, as opposed to bad
    /// keys, missing blobs or unsatisfiable ranges.
    pub fn is_storage_failure(&self) -> bool {
        matches!(
            self,
            BlobError::Io { .. } | BlobError::Backend { .. } | BlobError::Unsupported
        )
    }
}
