//! # Errors (Feathers-style)
//!
//! Every failure that crosses a crate boundary in reel ends up as a
//! [`ReelError`]: a kind with a fixed status code and class name, a
//! client-safe message, and optional structured `data` / `errors` payloads.
//!
//! `ReelError` implements `std::error::Error`, so it can travel inside
//! `anyhow::Error` and be recovered by the transport with
//! [`ReelError::from_anyhow`]. Transports decide how to serialize it;
//! with feature `serde` enabled, [`ReelError::to_json`] produces the
//! Feathers shape `{ name, message, code, className, data?, errors? }`.

use std::fmt;

use anyhow::Error as AnyError;

pub type ReelResult<T> = std::result::Result<T, AnyError>;

/// Error classes with their HTTP status and Feathers names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,
    NotAuthenticated,
    Forbidden,
    NotFound,
    Conflict,
    PayloadTooLarge,
    UnsupportedMediaType,
    Unprocessable,
    GeneralError,
    Unavailable,
}

impl ErrorKind {
    fn meta(&self) -> (u16, &'static str, &'static str) {
        match self {
            ErrorKind::BadRequest => (400, "BadRequest", "bad-request"),
            ErrorKind::NotAuthenticated => (401, "NotAuthenticated", "not-authenticated"),
            ErrorKind::Forbidden => (403, "Forbidden", "forbidden"),
            ErrorKind::NotFound => (404, "NotFound", "not-found"),
            ErrorKind::Conflict => (409, "Conflict", "conflict"),
            ErrorKind::PayloadTooLarge => (413, "PayloadTooLarge", "payload-too-large"),
            ErrorKind::UnsupportedMediaType => {
                (415, "UnsupportedMediaType", "unsupported-media-type")
            }
            ErrorKind::Unprocessable => (422, "Unprocessable", "unprocessable"),
            ErrorKind::GeneralError => (500, "GeneralError", "general-error"),
            ErrorKind::Unavailable => (503, "Unavailable", "unavailable"),
        }
    }

    pub fn status_code(&self) -> u16 {
        self.meta().0
    }

    /// Feathers error `name` (e.g. "NotFound")
    pub fn name(&self) -> &'static str {
        self.meta().1
    }

    /// Feathers error `className` (kebab-cased)
    pub fn class_name(&self) -> &'static str {
        self.meta().2
    }

    /// Server-side failures; everything else is the caller's fault.
    pub fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }
}

#[cfg(feature = "serde")]
pub type ErrorValue = serde_json::Value;

#[cfg(not(feature = "serde"))]
pub type ErrorValue = std::sync::Arc<dyn std::any::Any + Send + Sync>;

/// A structured error that can live inside `anyhow::Error`.
#[derive(Debug)]
pub struct ReelError {
    pub kind: ErrorKind,
    pub message: String,
    pub data: Option<ErrorValue>,
    pub errors: Option<ErrorValue>,
    pub source: Option<AnyError>,
}

impl ReelError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            data: None,
            errors: None,
            source: None,
        }
    }

    pub fn with_data(mut self, data: ErrorValue) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_errors(mut self, errors: ErrorValue) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn with_source(mut self, source: AnyError) -> Self {
        self.source = Some(source);
        self
    }

    pub fn code(&self) -> u16 {
        self.kind.status_code()
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn class_name(&self) -> &'static str {
        self.kind.class_name()
    }

    pub fn into_anyhow(self) -> AnyError {
        AnyError::new(self)
    }

    /// Finds a `ReelError` anywhere in an `anyhow` context chain.
    pub fn from_anyhow(err: &AnyError) -> Option<&ReelError> {
        err.chain().find_map(|e| e.downcast_ref::<ReelError>())
    }

    /// Keeps an existing `ReelError`, wraps anything else as `GeneralError`.
    pub fn normalize(err: AnyError) -> ReelError {
        match err.downcast::<ReelError>() {
            Ok(reel) => reel,
            Err(other) => {
                ReelError::new(ErrorKind::GeneralError, other.to_string()).with_source(other)
            }
        }
    }

    /// Copy without the `source` chain, safe to hand to clients.
    ///
    /// Server errors also lose their message: the inner text may name paths
    /// or backend details.
    pub fn sanitize_for_client(&self) -> ReelError {
        let message = if self.kind.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.message.clone()
        };
        ReelError {
            kind: self.kind,
            message,
            data: self.data.clone(),
            errors: self.errors.clone(),
            source: None,
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, msg)
    }
    pub fn not_authenticated(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotAuthenticated, msg)
    }
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, msg)
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, msg)
    }
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, msg)
    }
    pub fn payload_too_large(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::PayloadTooLarge, msg)
    }
    pub fn unsupported_media_type(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnsupportedMediaType, msg)
    }
    pub fn unprocessable(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unprocessable, msg)
    }
    pub fn general_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::GeneralError, msg)
    }
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unavailable, msg)
    }
}

impl fmt::Display for ReelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.name(), self.code(), self.message)
    }
}

impl std::error::Error for ReelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

#[cfg(feature = "serde")]
impl ReelError {
    /// Feathers-ish JSON payload.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::json;

        let mut base = json!({
            "name": self.name(),
            "message": self.message,
            "code": self.code(),
            "className": self.class_name(),
        });

        if let Some(d) = &self.data {
            base["data"] = d.clone();
        }
        if let Some(e) = &self.errors {
            base["errors"] = e.clone();
        }
        base
    }
}

/// Early-return with a `ReelError` built from one of its constructors.
#[macro_export]
macro_rules! bail_reel {
    ($ctor:ident, $msg:expr) => {
        return Err($crate::errors::ReelError::$ctor($msg).into_anyhow());
    };
    ($ctor:ident, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::errors::ReelError::$ctor(format!($fmt, $($arg)*)).into_anyhow());
    };
}
