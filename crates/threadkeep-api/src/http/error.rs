//! Application error type mapping to HTTP status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use uuid::Uuid;

use threadkeep_types::error::{RepositoryError, ThreadStoreError};

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Thread message store errors.
    ThreadStore(ThreadStoreError),
    /// Ownership store errors.
    Repository(RepositoryError),
    /// Validation error.
    Validation(String),
}

impl From<ThreadStoreError> for AppError {
    fn from(e: ThreadStoreError) -> Self {
        AppError::ThreadStore(e)
    }
}

impl From<RepositoryError> for AppError {
    fn from(e: RepositoryError) -> Self {
        AppError::Repository(e)
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::ThreadStore(e @ ThreadStoreError::DuplicateId(_)) => {
                (StatusCode::CONFLICT, "DUPLICATE_ID", e.to_string())
            }
            AppError::ThreadStore(e @ ThreadStoreError::CorruptRecord { .. }) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "CORRUPT_RECORD", e.to_string())
            }
            AppError::ThreadStore(e @ ThreadStoreError::StorageUnavailable(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "STORAGE_UNAVAILABLE", e.to_string())
            }
            AppError::Repository(RepositoryError::NotFound) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", "Not found".to_string())
            }
            AppError::Repository(RepositoryError::Conflict(msg)) => {
                (StatusCode::CONFLICT, "CONFLICT", msg.clone())
            }
            AppError::Repository(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "REPOSITORY_ERROR", e.to_string())
            }
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        let request_id = Uuid::now_v7().to_string();

        if status.is_server_error() {
            tracing::error!(%request_id, code, "{message}");
        } else {
            tracing::debug!(%request_id, code, "{message}");
        }

        let body = json!({
            "errors": [{
                "code": code,
                "message": message,
            }],
            "meta": {
                "request_id": request_id,
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}
