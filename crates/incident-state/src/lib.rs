//! Incident State - the external incident record behind the remediation flow
//!
//! Provides:
//! - The [`IncidentBackend`] trait and the record/update/journal types
//! - A ServiceNow Table API implementation
//! - An in-memory implementation for tests and offline runs

pub mod backend;
pub mod error;
pub mod fakes;
pub mod servicenow;

// Re-export key types
pub use backend::{
    IncidentBackend, IncidentRecord, IncidentRef, IncidentState, IncidentUpdate, JournalEntry,
    NewIncident,
};
pub use error::{IncidentError, IncidentResult};
pub use fakes::MemoryIncidentBackend;
pub use servicenow::{
    ServiceNowClient, ServiceNowConfig, DEFAULT_CALLER, DEFAULT_CLOSE_NOTES,
    DEFAULT_RESOLUTION_CODE,
};
