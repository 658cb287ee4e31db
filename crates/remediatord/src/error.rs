//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use remediator_core::ServiceError;
use serde_json::json;
use thiserror::Error;

/// Startup configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unknown REMEDIATOR_BACKEND '{0}' (expected servicenow or memory)")]
    UnknownBackend(String),

    #[error("failed to build incident backend: {0}")]
    Backend(#[from] remediator_core::incident_state::IncidentError),
}

/// Error returned by handlers, rendered as `{"detail": ...}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, detail)
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let status = match &err {
            ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
            ServiceError::InvalidTransition(_) => StatusCode::BAD_REQUEST,
            ServiceError::ManualIntervention(_) | ServiceError::Backend(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, detail = %self.detail, "request failed");
        }
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remediator_core::incident_state::IncidentError;

    #[test]
    fn test_service_error_status_mapping() {
        let not_found: ApiError = ServiceError::NotFound {
            sys_id: "x".into(),
            source: IncidentError::NotFound("x".into()),
        }
        .into();
        assert_eq!(not_found.status, StatusCode::NOT_FOUND);

        let invalid: ApiError =
            ServiceError::InvalidTransition("Plan is not awaiting approval.".into()).into();
        assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
        assert_eq!(invalid.detail, "Plan is not awaiting approval.");

        let backend: ApiError = ServiceError::Backend(IncidentError::MissingCredentials).into();
        assert_eq!(backend.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
