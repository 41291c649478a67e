//! HTTP-specific error mapping.
//!
//! Maps [`medifetch_core::AppError`] onto `(StatusCode, JSON body)`,
//! the only place in the workspace that knows about HTTP status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use medifetch_core::AppError;

/// Thin wrapper so handlers can `?`-propagate `AppError` and get a
/// correctly-coded JSON response for free via `IntoResponse`.
#[derive(Debug)]
pub struct HttpError(pub AppError);

impl From<AppError> for HttpError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(rename = "type")]
    error_type: &'static str,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::InvalidUrl { .. }
            | AppError::DuplicateActive
            | AppError::QueueFull { .. }
            | AppError::InvalidState { .. }
            | AppError::BadPagination { .. }
            | AppError::ImmutableField { .. } => StatusCode::BAD_REQUEST,
            AppError::InsufficientStorage { .. } => StatusCode::INSUFFICIENT_STORAGE,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = ErrorBody {
            error: self.0.to_string(),
            error_type: self.0.kind(),
        };

        (status, Json(body)).into_response()
    }
}
