//! Application error types.
//!
//! Designed to be serializable and not depend on external error types
//! like `std::io::Error` — I/O errors capture their kind and message as
//! strings so the error itself can travel across a JSON boundary.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The user-visible error kind vocabulary.
///
/// Every use case either succeeds or fails with exactly one of these.
/// `medifetch-http` is the only layer that knows about HTTP status
/// codes; it maps each variant to one.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum AppError {
    #[error("invalid url: {reason}")]
    InvalidUrl { reason: String },

    #[error("an active download already exists for this url")]
    DuplicateActive,

    #[error("download queue is full (max {max_pending} pending)")]
    QueueFull { max_pending: u32 },

    #[error("insufficient storage: {available_gb} GB available, {required_gb} GB required")]
    InsufficientStorage { available_gb: f64, required_gb: f64 },

    #[error("not found: {what}")]
    NotFound { what: String },

    #[error("invalid state: {reason}")]
    InvalidState { reason: String },

    #[error("bad pagination: {reason}")]
    BadPagination { reason: String },

    #[error("immutable field: {field}")]
    ImmutableField { field: String },

    #[error("internal error: {message}")]
    Internal { message: String },
}

impl AppError {
    #[must_use]
    pub fn invalid_url(reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub const fn duplicate_active() -> Self {
        Self::DuplicateActive
    }

    #[must_use]
    pub const fn queue_full(max_pending: u32) -> Self {
        Self::QueueFull { max_pending }
    }

    #[must_use]
    pub const fn insufficient_storage(available_gb: f64, required_gb: f64) -> Self {
        Self::InsufficientStorage {
            available_gb,
            required_gb,
        }
    }

    #[must_use]
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    #[must_use]
    pub fn invalid_state(reason: impl Into<String>) -> Self {
        Self::InvalidState {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn bad_pagination(reason: impl Into<String>) -> Self {
        Self::BadPagination {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn immutable_field(field: impl Into<String>) -> Self {
        Self::ImmutableField {
            field: field.into(),
        }
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Short, stable kind string — used as the `code`/`kind` field in
    /// error JSON bodies and log metadata.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidUrl { .. } => "invalid_url",
            Self::DuplicateActive => "duplicate_active",
            Self::QueueFull { .. } => "queue_full",
            Self::InsufficientStorage { .. } => "insufficient_storage",
            Self::NotFound { .. } => "not_found",
            Self::InvalidState { .. } => "invalid_state",
            Self::BadPagination { .. } => "bad_pagination",
            Self::ImmutableField { .. } => "immutable_field",
            Self::Internal { .. } => "internal",
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(format!("io error: {err}"))
    }
}

/// Convenience result type for domain and use-case operations.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_strings_are_stable() {
        assert_eq!(AppError::duplicate_active().kind(), "duplicate_active");
        assert_eq!(AppError::queue_full(10).kind(), "queue_full");
        assert_eq!(
            AppError::insufficient_storage(2.0, 5.0).kind(),
            "insufficient_storage"
        );
    }

    #[test]
    fn serializes_and_roundtrips() {
        let err = AppError::not_found("download 1");
        let json = serde_json::to_string(&err).unwrap();
        let parsed: AppError = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, err);
    }
}
