use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;

use crate::state::session::TransitionError;

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Requested session (or resource inside it) was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Host-only operation attempted by a caller that is not the host,
    /// or a submission from a caller that never joined.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Operation cannot be performed in the current session status.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Submission references a question index that is no longer current.
    #[error("stale question: submitted index {submitted}, current index {current}")]
    StaleQuestion {
        /// Index the submission targeted.
        submitted: usize,
        /// Index the session is currently on.
        current: usize,
    },
    /// Submission arrived after the question's time window plus grace period.
    #[error("time window expired for the current question")]
    TimeExpired,
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl From<TransitionError> for ServiceError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::Invalid(invalid) => ServiceError::InvalidState(invalid.to_string()),
            TransitionError::VersionMismatch { expected, actual } => ServiceError::InvalidState(
                format!("session changed during transition (expected version {expected}, got {actual})"),
            ),
        }
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Caller identity is missing or could not be resolved.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Caller is known but not allowed to perform the operation.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// The targeted time window has already closed.
    #[error("gone: {0}")]
    Gone(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::Unauthorized(message) => AppError::Forbidden(message),
            ServiceError::InvalidState(message) => AppError::Conflict(message),
            stale @ ServiceError::StaleQuestion { .. } => AppError::Conflict(stale.to_string()),
            ServiceError::TimeExpired => AppError::Gone(ServiceError::TimeExpired.to_string()),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Gone(_) => StatusCode::GONE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}
