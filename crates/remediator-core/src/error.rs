//! Error types for the approval workflow.

use incident_state::IncidentError;
use thiserror::Error;

/// Errors surfaced by [`crate::service::RemediationService`].
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Incident could not be read
    #[error("Incident not found or not accessible: {source}")]
    NotFound {
        sys_id: String,
        #[source]
        source: IncidentError,
    },

    /// Cached workflow state forbids the transition
    #[error("{0}")]
    InvalidTransition(String),

    /// Posting the rejection note failed
    #[error("Failed to mark manual intervention: {0}")]
    ManualIntervention(#[source] IncidentError),

    /// Any other backend failure
    #[error(transparent)]
    Backend(#[from] IncidentError),
}

impl ServiceError {
    /// Map a failed read: HTTP and not-found errors mean the record is
    /// unavailable, anything else is a backend fault.
    pub fn from_read(sys_id: &str, err: IncidentError) -> Self {
        match err {
            IncidentError::NotFound(_) | IncidentError::Http { .. } => ServiceError::NotFound {
                sys_id: sys_id.to_string(),
                source: err,
            },
            other => ServiceError::Backend(other),
        }
    }
}

/// Result type for workflow operations.
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
