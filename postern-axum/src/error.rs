use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use postern::Error;
use postern_core::error::{AuthError, ValidationError};
use serde_json::json;
use thiserror::Error as ThisError;

/// API-facing error type.
///
/// The mapping from internal errors is deliberately lossy: anything touching
/// account existence or token state flattens to the one generic reset-token
/// message, and storage failures surface as an opaque 500.
#[derive(Debug, ThisError)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid or expired reset token")]
    InvalidResetToken,

    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Internal server error")]
    InternalError,
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            // Field-level validation detail is safe to reveal
            Error::Validation(ValidationError::InvalidEmail(msg)) => ApiError::InvalidRequest(msg),
            Error::Validation(ValidationError::InvalidPassword(msg)) => {
                ApiError::InvalidRequest(msg)
            }
            Error::Validation(ValidationError::MissingField(msg)) => ApiError::InvalidRequest(msg),
            // Not-found, expired, and already-used all collapse to the same
            // message; so does a user lookup that came back empty
            Error::Auth(AuthError::InvalidResetToken) | Error::Auth(AuthError::UserNotFound) => {
                ApiError::InvalidResetToken
            }
            other => {
                tracing::error!(error = %other, "Request failed");
                ApiError::InternalError
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::InvalidResetToken => (
                StatusCode::BAD_REQUEST,
                "Invalid or expired reset token".to_string(),
            ),
            ApiError::MissingParameter(name) => (
                StatusCode::BAD_REQUEST,
                format!("Missing required parameter: {name}"),
            ),
            ApiError::InternalError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "success": false,
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
