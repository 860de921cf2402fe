use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::supabase::AuthError;
use crate::llm_client::LlmError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Every error is caught at the handler that issued the call and rendered as a
/// transient notice; nothing is retried on the caller's behalf.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or malformed user input, raised before any network call.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Store or endpoint unreachable, or a non-success status.
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// AI payload not parseable as the expected JSON shape.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Identity or session absent when required.
    #[error("Permission error: {0}")]
    Permission(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable code for the error body.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Backend(_) | AppError::Database(_) => "BACKEND_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::MalformedResponse(_) => "MALFORMED_RESPONSE",
            AppError::Permission(_) => "PERMISSION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message safe to show the user as a toast.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg)
            | AppError::Backend(msg)
            | AppError::NotFound(msg)
            | AppError::MalformedResponse(msg)
            | AppError::Permission(msg) => msg.clone(),
            AppError::Database(_) => "A database error occurred".to_string(),
            AppError::Internal(_) => "An internal server error occurred".to_string(),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Permission(_) => StatusCode::UNAUTHORIZED,
            AppError::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
            AppError::Backend(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<LlmError> for AppError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::Unreachable(inner) => AppError::Backend(format!(
                "Text-generation endpoint is unreachable: {inner}"
            )),
            LlmError::Api { status, message } => AppError::Backend(format!(
                "Text-generation endpoint returned status {status}: {message}"
            )),
            LlmError::EmptyContent => {
                AppError::MalformedResponse("AI response contained no content".to_string())
            }
            LlmError::Parse(inner) => AppError::MalformedResponse(format!(
                "Unable to parse AI response as JSON: {inner}"
            )),
            LlmError::Schema(msg) => AppError::MalformedResponse(msg),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::MissingEmail => AppError::Permission(e.to_string()),
            AuthError::Unreachable(_) | AuthError::Api { .. } | AuthError::Url(_) => {
                AppError::Backend(format!("Identity provider request failed: {e}"))
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Backend(msg) => tracing::error!("Backend error: {msg}"),
            AppError::Database(e) => tracing::error!("Database error: {e}"),
            AppError::MalformedResponse(msg) => tracing::warn!("Malformed AI response: {msg}"),
            AppError::Internal(e) => tracing::error!("Internal error: {e:?}"),
            _ => {}
        }

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": self.user_message()
            }
        }));

        (self.status(), body).into_response()
    }
}
