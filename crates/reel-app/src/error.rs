use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use reel_core::{JobId, ValidationError};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Provider is not configured: {0}")]
    Configuration(String),
    #[error("Transient provider failure: {0}")]
    Transient(String),
    #[error("Error from provider: {0}")]
    Provider(String),
    #[error("Job not found: {0}")]
    NotFound(JobId),
}

impl JobError {
    /// Transient failures are retried by rescheduling, never surfaced as job failures
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Error returned from HTTP handlers, rendered as `{ "error": message }`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<JobError> for ApiError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::Validation(e) => Self::bad_request(e.to_string()),
            JobError::NotFound(_) => Self::not_found(err.to_string()),
            JobError::Configuration(_) | JobError::Transient(_) | JobError::Provider(_) => {
                error!("Provider call failed: {}", err);
                Self::internal("Failed to reach the generation provider")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_error_status_mapping() {
        assert_eq!(
            ApiError::from(JobError::Validation(ValidationError::EmptyPrompt)).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(JobError::NotFound(JobId::new("g1"))).status(),
            StatusCode::NOT_FOUND
        );
        for err in [
            JobError::Configuration("no key".into()),
            JobError::Transient("reset".into()),
            JobError::Provider("HTTP 400".into()),
        ] {
            assert_eq!(ApiError::from(err).status(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[test]
    fn test_only_transient_is_transient() {
        assert!(JobError::Transient("reset".into()).is_transient());
        assert!(!JobError::Provider("HTTP 400".into()).is_transient());
        assert!(!JobError::NotFound(JobId::new("g1")).is_transient());
    }
}
