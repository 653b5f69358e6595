//! API Error Types
//!
//! Maps queue, intake and backend failures to HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::backend::{BackendError, IntakeError};
use crate::dashboard::TriageError;
use crate::queue::QueueError;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Request validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Intake(#[from] IntakeError),

    #[error("Triage backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<TriageError> for ApiError {
    fn from(err: TriageError) -> Self {
        match err {
            TriageError::Intake(e) => ApiError::Intake(e),
            TriageError::Backend(e) => ApiError::Backend(e),
        }
    }
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
    pub request_id: String,
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Queue(QueueError::PageOutOfRange { .. }) => {
                (StatusCode::BAD_REQUEST, "PAGE_OUT_OF_RANGE")
            }
            ApiError::Queue(_) => (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_SNAPSHOT"),
            ApiError::Intake(_) => (StatusCode::UNPROCESSABLE_ENTITY, "INTAKE_ERROR"),
            ApiError::Backend(e) => match e {
                BackendError::Timeout => (StatusCode::GATEWAY_TIMEOUT, "BACKEND_TIMEOUT"),
                BackendError::Unavailable => {
                    (StatusCode::SERVICE_UNAVAILABLE, "BACKEND_UNAVAILABLE")
                }
                BackendError::ApiError { status: 404, .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                _ => (StatusCode::BAD_GATEWAY, "BACKEND_ERROR"),
            },
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let request_id = uuid::Uuid::new_v4().to_string();

        if status.is_server_error() {
            tracing::error!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "API error occurred"
            );
        } else {
            tracing::debug!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "Request rejected"
            );
        }

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: self.to_string(),
            },
            request_id,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                ApiError::from(QueueError::PageOutOfRange {
                    requested: 3,
                    total_pages: 2,
                }),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::from(IntakeError::Missing("Gender")),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (ApiError::from(BackendError::Timeout), StatusCode::GATEWAY_TIMEOUT),
            (
                ApiError::from(BackendError::Unavailable),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                ApiError::from(BackendError::ApiError {
                    status: 404,
                    message: "Doctor not found".into(),
                }),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::from(BackendError::Malformed("not a list".into())),
                StatusCode::BAD_GATEWAY,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_triage_error_keeps_kind() {
        let err = ApiError::from(TriageError::Intake(IntakeError::NotPdf("a.txt".into())));
        assert!(matches!(err, ApiError::Intake(_)));
    }
}
