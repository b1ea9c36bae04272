//! # Error Handling Middleware
//!
//! Maps domain errors onto HTTP status codes and JSON error responses so
//! every endpoint fails the same way. A slot conflict is the one error
//! with a structured body: it names the exact cells the caller lost, so
//! the client can re-render availability instead of showing a generic
//! "try again".

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use courtbook_core::errors::BookingError;
use serde_json::json;

/// Application error wrapper that provides HTTP status code mapping.
///
/// `AppError` wraps domain-specific [`BookingError`] instances and
/// implements `IntoResponse` to convert them into HTTP responses with
/// appropriate status codes and JSON payloads.
#[derive(Debug)]
pub struct AppError(pub BookingError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Map error types to HTTP status codes
        let status = match &self.0 {
            BookingError::NotFound(_) => StatusCode::NOT_FOUND,
            BookingError::Validation(_) => StatusCode::BAD_REQUEST,
            BookingError::SlotConflict(_) => StatusCode::CONFLICT,
            BookingError::IllegalTransition { .. } => StatusCode::CONFLICT,
            BookingError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            BookingError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = self.0.to_string();
        let body = match &self.0 {
            BookingError::SlotConflict(cells) => Json(json!({
                "error": message,
                "conflicts": cells,
            })),
            _ => Json(json!({ "error": message })),
        };

        (status, body).into_response()
    }
}

/// Automatic conversion from BookingError to AppError.
///
/// Allows using the `?` operator with functions that return
/// `Result<T, BookingError>` in handlers returning `Result<T, AppError>`.
impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        AppError(err)
    }
}

/// Automatic conversion from eyre::Report to AppError, wrapping the
/// report in a `BookingError::Database` variant.
impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        AppError(BookingError::Database(err))
    }
}
