//! Error types for incident-state

use thiserror::Error;

/// Errors raised by an incident backend
#[derive(Error, Debug)]
pub enum IncidentError {
    /// Record does not exist (or is not readable with these credentials)
    #[error("incident not found: {0}")]
    NotFound(String),

    /// Instance URL, username or password not configured
    #[error(
        "missing ServiceNow credentials: set SERVICENOW_INSTANCE_URL, \
         SERVICENOW_USERNAME and SERVICENOW_PASSWORD"
    )]
    MissingCredentials,

    /// Update issued without a record id
    #[error("update requested without an incident id")]
    MissingId,

    /// Non-success HTTP status from the backend
    #[error("backend returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Connection, TLS or timeout failure
    #[error("backend request failed: {0}")]
    Transport(String),

    /// Response body did not have the expected shape
    #[error("unexpected backend response: {0}")]
    Decode(String),

    /// Backend refused the operation
    #[error("backend rejected the request: {0}")]
    Rejected(String),
}

impl IncidentError {
    /// Whether this error means the record is absent or inaccessible.
    pub fn is_not_found(&self) -> bool {
        matches!(self, IncidentError::NotFound(_))
            || matches!(self, IncidentError::Http { status, .. } if *status == 403 || *status == 404)
    }
}

impl From<reqwest::Error> for IncidentError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            IncidentError::Decode(err.to_string())
        } else {
            IncidentError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for IncidentError {
    fn from(err: serde_json::Error) -> Self {
        IncidentError::Decode(err.to_string())
    }
}

/// Result type for incident backend operations
pub type IncidentResult<T> = std::result::Result<T, IncidentError>;
