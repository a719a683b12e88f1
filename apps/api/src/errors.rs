use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid folder path: {0}")]
    InvalidFolderPath(String),

    #[error("Authentication required: {0}")]
    Unauthorized(String),

    #[error("Folder not found: {0}")]
    FolderNotFound(String),

    #[error("Job role with title \"{0}\" already exists")]
    DuplicateJobRole(String),

    #[error("Resume file is {size} bytes, limit is {limit} bytes")]
    SizeLimitExceeded { size: u64, limit: u64 },

    #[error("Unsupported resume format: {0}")]
    UnsupportedResumeFormat(String),

    #[error("Download confirmation failed: {0}")]
    DownloadConfirmationFailed(String),

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error("Evaluation parse error: {0}")]
    EvaluationParse(String),

    #[error("Upstream service error: {0}")]
    Upstream(String),

    #[error("Upstream timeout: {0}")]
    Timeout(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Maps a transport failure from any outbound reqwest call.
    pub fn from_transport(service: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Timeout(format!("{service} did not respond in time"))
        } else {
            AppError::Upstream(format!("{service} request failed: {err}"))
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::InvalidFolderPath(msg) => {
                (StatusCode::BAD_REQUEST, "INVALID_FOLDER_PATH", msg.clone())
            }
            AppError::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                "AUTHENTICATION_REQUIRED",
                msg.clone(),
            ),
            AppError::FolderNotFound(segment) => (
                StatusCode::NOT_FOUND,
                "FOLDER_NOT_FOUND",
                format!("Folder segment \"{segment}\" was not found"),
            ),
            AppError::DuplicateJobRole(_) => {
                (StatusCode::CONFLICT, "DUPLICATE_JOB_ROLE", self.to_string())
            }
            AppError::SizeLimitExceeded { .. } => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "SIZE_LIMIT_EXCEEDED",
                self.to_string(),
            ),
            AppError::UnsupportedResumeFormat(msg) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "UNSUPPORTED_RESUME_FORMAT",
                msg.clone(),
            ),
            AppError::DownloadConfirmationFailed(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "DOWNLOAD_CONFIRMATION_FAILED",
                msg.clone(),
            ),
            AppError::UnprocessableEntity(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNPROCESSABLE_ENTITY",
                msg.clone(),
            ),
            AppError::EvaluationParse(msg) => {
                tracing::error!("Evaluation parse error: {msg}");
                (StatusCode::BAD_GATEWAY, "EVALUATION_PARSE_ERROR", msg.clone())
            }
            AppError::Upstream(msg) => {
                tracing::error!("Upstream error: {msg}");
                (StatusCode::BAD_GATEWAY, "UPSTREAM_SERVICE_ERROR", msg.clone())
            }
            AppError::Timeout(msg) => {
                tracing::error!("Upstream timeout: {msg}");
                (StatusCode::GATEWAY_TIMEOUT, "UPSTREAM_TIMEOUT", msg.clone())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
