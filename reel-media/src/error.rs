use std::collections::BTreeMap;

use reel_blob::BlobError;
use reel_core::ReelError;
use serde_json::json;
use thiserror::Error;

use crate::MediaStatus;

pub type MediaResult<T> = Result<T, MediaError>;

/// Why an upload was refused. Checked in declaration order; the first
/// failing rule is the one reported.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("media type {mime} is not accepted here")]
    UnsupportedType { mime: String },

    #[error("upload of {size_bytes} bytes exceeds the {max_bytes} byte limit")]
    TooLarge { size_bytes: u64, max_bytes: u64 },

    #[error("video runs {duration_secs:.1}s, longer than the {max_secs}s limit")]
    TooLong { duration_secs: f64, max_secs: u64 },
}

impl ValidationError {
    pub fn unsupported<S: Into<String>>(mime: S) -> Self {
        Self::UnsupportedType { mime: mime.into() }
    }

    /// Stable machine-readable reason.
    pub fn reason(&self) -> &'static str {
        match self {
            ValidationError::UnsupportedType { .. } => "UnsupportedType",
            ValidationError::TooLarge { .. } => "TooLarge",
            ValidationError::TooLong { .. } => "TooLong",
        }
    }
}

#[derive(Debug, Error)]
pub enum MediaError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{what} not found: {id}")]
    NotFound { what: &'static str, id: String },

    #[error("media {id} is already {status}")]
    Conflict { id: String, status: MediaStatus },

    #[error("{message}")]
    Invalid {
        message: String,
        errors: BTreeMap<String, Vec<String>>,
    },

    #[error("{message}")]
    Forbidden { message: String },

    #[error("storage failure: {source}")]
    Storage {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl MediaError {
    pub fn not_found<S: Into<String>>(what: &'static str, id: S) -> Self {
        Self::NotFound {
            what,
            id: id.into(),
        }
    }

    pub fn conflict<S: Into<String>>(id: S, status: MediaStatus) -> Self {
        Self::Conflict {
            id: id.into(),
            status,
        }
    }

    pub fn invalid_field(field: &str, problem: &str) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(field.to_string(), vec![problem.to_string()]);
        Self::Invalid {
            message: "Invalid upload".to_string(),
            errors,
        }
    }

    pub fn forbidden<S: Into<String>>(message: S) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub fn storage<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            source: Box::new(error),
        }
    }

    /// Only storage failures are operational incidents.
    pub fn is_incident(&self) -> bool {
        matches!(self, MediaError::Storage { .. })
    }

    /// Logs incidents at `error!` and passes the error through.
    pub fn reported(self, operation: &'static str) -> Self {
        if self.is_incident() {
            tracing::error!(operation, error = %self, "storage failure");
        } else {
            tracing::debug!(operation, error = %self, "request refused");
        }
        self
    }
}

impl From<BlobError> for MediaError {
    fn from(err: BlobError) -> Self {
        match err {
            BlobError::NotFound { key } => MediaError::not_found("blob", key),
            // Malformed keys come from the outside; do not confirm anything.
            BlobError::Invalid { .. } => MediaError::not_found("blob", "<invalid key>"),
            other => MediaError::storage(other),
        }
    }
}

impl From<std::io::Error> for MediaError {
    fn from(err: std::io::Error) -> Self {
        MediaError::storage(err)
    }
}

impl From<MediaError> for ReelError {
    fn from(err: MediaError) -> Self {
        let message = err.to_string();
        match err {
            MediaError::Validation(v) => {
                let reel = match &v {
                    ValidationError::UnsupportedType { .. } => {
                        ReelError::unsupported_media_type(message)
                    }
                    ValidationError::TooLarge { max_bytes, .. } => {
                        ReelError::payload_too_large(message)
                            .with_data(json!({ "reason": v.reason(), "maxBytes": max_bytes }))
                    }
                    ValidationError::TooLong { max_secs, .. } => ReelError::unprocessable(message)
                        .with_data(json!({ "reason": v.reason(), "maxDurationSecs": max_secs })),
                };
                if reel.data.is_some() {
                    reel
                } else {
                    reel.with_data(json!({ "reason": v.reason() }))
                }
            }
            MediaError::NotFound { what, .. } => ReelError::not_found(format!("{what} not found")),
            MediaError::Conflict { status, .. } => {
                ReelError::conflict(message).with_data(json!({ "status": status }))
            }
            MediaError::Invalid { message, errors } => {
                ReelError::unprocessable(message).with_errors(json!(errors))
            }
            MediaError::Forbidden { message } => ReelError::forbidden(message),
            storage @ MediaError::Storage { .. } => {
                ReelError::general_error(message).with_source(anyhow::Error::new(storage))
            }
        }
    }
}
