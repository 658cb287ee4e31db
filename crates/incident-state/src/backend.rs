//! Incident backend contract
//!
//! The orchestrator only needs to create a record, read it back, append work
//! notes, move it between states and list its journal. Everything else about
//! the ticketing system stays behind [`IncidentBackend`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::IncidentResult;

// ---------------------------------------------------------------------------
// Record types
// ---------------------------------------------------------------------------

/// Incident lifecycle state, keyed by the backend's numeric code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IncidentState {
    New,
    InProgress,
    OnHold,
    Resolved,
    Closed,
    Canceled,
    /// Any code this crate does not model (may be empty).
    Other(String),
}

impl IncidentState {
    /// Map a backend state code to a state.
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "1" => IncidentState::New,
            "2" => IncidentState::InProgress,
            "3" => IncidentState::OnHold,
            "6" => IncidentState::Resolved,
            "7" => IncidentState::Closed,
            "8" => IncidentState::Canceled,
            other => IncidentState::Other(other.to_string()),
        }
    }

    /// Backend state code.
    pub fn code(&self) -> String {
        match self {
            IncidentState::New => "1".to_string(),
            IncidentState::InProgress => "2".to_string(),
            IncidentState::OnHold => "3".to_string(),
            IncidentState::Resolved => "6".to_string(),
            IncidentState::Closed => "7".to_string(),
            IncidentState::Canceled => "8".to_string(),
            IncidentState::Other(code) => code.clone(),
        }
    }

    /// Display label.
    pub fn label(&self) -> String {
        match self {
            IncidentState::New => "New".to_string(),
            IncidentState::InProgress => "In Progress".to_string(),
            IncidentState::OnHold => "On Hold".to_string(),
            IncidentState::Resolved => "Resolved".to_string(),
            IncidentState::Closed => "Closed".to_string(),
            IncidentState::Canceled => "Canceled".to_string(),
            IncidentState::Other(code) if code.is_empty() => "State unknown".to_string(),
            IncidentState::Other(code) => format!("State {code}"),
        }
    }

    /// Resolved or Closed.
    pub fn is_completed(&self) -> bool {
        matches!(self, IncidentState::Resolved | IncidentState::Closed)
    }
}

impl From<String> for IncidentState {
    fn from(code: String) -> Self {
        IncidentState::from_code(&code)
    }
}

impl From<IncidentState> for String {
    fn from(state: IncidentState) -> Self {
        state.code()
    }
}

impl std::fmt::Display for IncidentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}

/// Fields needed to open a new incident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewIncident {
    pub short_description: String,
    pub description: String,
    /// Username of the caller; resolved to a user id by the backend.
    pub caller: String,
}

/// Identifiers of a freshly created incident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentRef {
    pub sys_id: String,
    pub number: String,
}

/// The slice of an incident the orchestrator reads back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentRecord {
    pub sys_id: String,
    pub number: String,
    pub state: IncidentState,
    pub short_description: String,
    pub description: String,
}

/// A partial update. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentUpdate {
    pub work_notes: Option<String>,
    pub state: Option<IncidentState>,
    pub close_code: Option<String>,
    pub close_notes: Option<String>,
}

impl IncidentUpdate {
    /// Append a work note and nothing else.
    pub fn note(text: impl Into<String>) -> Self {
        Self {
            work_notes: Some(text.into()),
            ..Self::default()
        }
    }

    /// Also move the record to `state`.
    pub fn with_state(mut self, state: IncidentState) -> Self {
        self.state = Some(state);
        self
    }

    /// Move to Resolved with resolution code and close notes.
    pub fn resolved(
        work_notes: impl Into<String>,
        close_code: impl Into<String>,
        close_notes: impl Into<String>,
    ) -> Self {
        Self {
            work_notes: Some(work_notes.into()),
            state: Some(IncidentState::Resolved),
            close_code: Some(close_code.into()),
            close_notes: Some(close_notes.into()),
        }
    }
}

/// One work note or comment on the record's journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub timestamp: Option<String>,
    pub author: Option<String>,
    /// `work_notes` or `comments`
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub text: String,
}

// ---------------------------------------------------------------------------
// IncidentBackend
// ---------------------------------------------------------------------------

/// External incident-tracking system.
///
/// Guarantees expected from implementations:
/// - `read` fails with a not-found error when the id is unknown.
/// - `update` with a Resolved state populates resolution fields.
/// - Concurrent updates to one record are last-write-wins.
#[async_trait]
pub trait IncidentBackend: Send + Sync {
    /// Open a new incident.
    async fn create(&self, incident: NewIncident) -> IncidentResult<IncidentRef>;

    /// Read an incident by id.
    async fn read(&self, sys_id: &str) -> IncidentResult<IncidentRecord>;

    /// Apply a partial update.
    async fn update(&self, sys_id: &str, update: IncidentUpdate) -> IncidentResult<()>;

    /// Work notes and comments, oldest first.
    async fn journal(&self, sys_id: &str) -> IncidentResult<Vec<JournalEntry>>;
}
