use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use docreq_shared::{IdError, RequestId, ValidationError};
use docreq_store::StoreError;
use thiserror::Error;

use crate::submission::SubmitError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Request not found: {0}")]
    RequestNotFound(RequestId),

    #[error("Attachment not found: {0}")]
    AttachmentNotFound(RequestId),

    #[error("Attachment too large: {size} bytes (max {max})")]
    AttachmentTooLarge { size: usize, max: usize },

    #[error("Blob storage error: {0}")]
    BlobStorage(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Submission(SubmitError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Background task failed: {0}")]
    Task(String),
}

impl From<IdError> for ServerError {
    fn from(err: IdError) -> Self {
        ServerError::BadRequest(err.to_string())
    }
}

impl From<SubmitError> for ServerError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Validation(v) => ServerError::Validation(v),
            other => ServerError::Submission(other),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::RequestNotFound(_)
            | ServerError::AttachmentNotFound(_)
            | ServerError::NotFound(_)
            | ServerError::Store(StoreError::NotFound) => (StatusCode::NOT_FOUND, self.to_string()),
            ServerError::AttachmentTooLarge { .. } => {
                (StatusCode::PAYLOAD_TOO_LARGE, self.to_string())
            }
            ServerError::Validation(_) | ServerError::BadRequest(_) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            ServerError::Forbidden(_) => (StatusCode::FORBIDDEN, self.to_string()),
            ServerError::Submission(SubmitError::Partial { created, .. }) => {
                tracing::error!(error = %self, "request submission failed");
                let body = serde_json::json!({
                    "error": "Failed to create document. Please try again later.",
                    "created": created,
                });
                return (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(body)).into_response();
            }
            ServerError::Store(StoreError::AlreadyExists(_)) => {
                (StatusCode::CONFLICT, self.to_string())
            }
            ServerError::BlobStorage(_) => {
                tracing::error!(error = %self, "blob storage failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "Blob storage error".to_string())
            }
            ServerError::Submission(_) | ServerError::Store(_) | ServerError::Task(_) => {
                tracing::error!(error = %self, "internal failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = serde_json::json!({
            "error": message,
        });

        (status, axum::Json(body)).into_response()
    }
}
