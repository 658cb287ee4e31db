//! In-memory incident backend
//!
//! Satisfies the [`IncidentBackend`] contract without a ticketing system.
//! Used by tests, the CLI's offline mode and `REMEDIATOR_BACKEND=memory`.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::backend::{
    IncidentBackend, IncidentRecord, IncidentRef, IncidentState, IncidentUpdate, JournalEntry,
    NewIncident,
};
use crate::error::{IncidentError, IncidentResult};

const FIRST_NUMBER: u64 = 10001;

#[derive(Debug)]
struct StoredIncident {
    record: IncidentRecord,
    caller: String,
    close_code: Option<String>,
    close_notes: Option<String>,
    journal: Vec<JournalEntry>,
}

#[derive(Debug, Default)]
struct Inner {
    incidents: HashMap<String, StoredIncident>,
    next_number: u64,
    fail_notes_containing: Vec<String>,
    fail_state_updates: bool,
}

/// In-memory incident store backed by a `HashMap<sys_id, incident>`.
#[derive(Debug, Default)]
pub struct MemoryIncidentBackend {
    inner: Mutex<Inner>,
}

impl MemoryIncidentBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Fail any update whose work note contains `needle`.
    pub fn fail_notes_containing(&self, needle: &str) {
        let mut inner = self.lock();
        inner.fail_notes_containing.push(needle.to_string());
    }

    /// Fail every update that changes state.
    pub fn fail_state_updates(&self) {
        self.lock().fail_state_updates = true;
    }

    /// Journal texts for a record, oldest first. Empty for unknown ids.
    pub fn journal_texts(&self, sys_id: &str) -> Vec<String> {
        let inner = self.lock();
        inner
            .incidents
            .get(sys_id)
            .map(|stored| stored.journal.iter().map(|e| e.text.clone()).collect())
            .unwrap_or_default()
    }

    /// `(close_code, close_notes)` recorded on the incident.
    pub fn resolution(&self, sys_id: &str) -> Option<(Option<String>, Option<String>)> {
        let inner = self.lock();
        inner
            .incidents
            .get(sys_id)
            .map(|stored| (stored.close_code.clone(), stored.close_notes.clone()))
    }

    /// Caller username recorded at creation.
    pub fn caller(&self, sys_id: &str) -> Option<String> {
        let inner = self.lock();
        inner.incidents.get(sys_id).map(|stored| stored.caller.clone())
    }

    pub fn len(&self) -> usize {
        self.lock().incidents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl IncidentBackend for MemoryIncidentBackend {
    async fn create(&self, incident: NewIncident) -> IncidentResult<IncidentRef> {
        let mut inner = self.lock();
        let sequence = FIRST_NUMBER + inner.next_number;
        inner.next_number += 1;

        let created = IncidentRef {
            sys_id: Uuid::new_v4().simple().to_string(),
            number: format!("INC{sequence:07}"),
        };
        let record = IncidentRecord {
            sys_id: created.sys_id.clone(),
            number: created.number.clone(),
            state: IncidentState::New,
            short_description: incident.short_description,
            description: incident.description,
        };
        inner.incidents.insert(
            created.sys_id.clone(),
            StoredIncident {
                record,
                caller: incident.caller,
                close_code: None,
                close_notes: None,
                journal: Vec::new(),
            },
        );
        Ok(created)
    }

    async fn read(&self, sys_id: &str) -> IncidentResult<IncidentRecord> {
        let inner = self.lock();
        inner
            .incidents
            .get(sys_id)
            .map(|stored| stored.record.clone())
            .ok_or_else(|| IncidentError::NotFound(sys_id.to_string()))
    }

    async fn update(&self, sys_id: &str, update: IncidentUpdate) -> IncidentResult<()> {
        if sys_id.trim().is_empty() {
            return Err(IncidentError::MissingId);
        }
        let mut inner = self.lock();

        if let Some(note) = update.work_notes.as_deref() {
            if inner
                .fail_notes_containing
                .iter()
                .any(|needle| note.contains(needle.as_str()))
            {
                return Err(IncidentError::Rejected(
                    "injected failure for work note".to_string(),
                ));
            }
        }
        if update.state.is_some() && inner.fail_state_updates {
            return Err(IncidentError::Rejected(
                "injected failure for state update".to_string(),
            ));
        }

        let stored = inner
            .incidents
            .get_mut(sys_id)
            .ok_or_else(|| IncidentError::NotFound(sys_id.to_string()))?;

        if let Some(note) = update.work_notes.filter(|n| !n.is_empty()) {
            stored.journal.push(JournalEntry {
                timestamp: Some(Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()),
                author: Some(stored.caller.clone()),
                kind: Some("work_notes".to_string()),
                text: note,
            });
        }
        if let Some(state) = update.state {
            if state == IncidentState::Resolved {
                stored.close_code = update.close_code;
                stored.close_notes = update.close_notes;
            }
            stored.record.state = state;
        }
        Ok(())
    }

    async fn journal(&self, sys_id: &str) -> IncidentResult<Vec<JournalEntry>> {
        let inner = self.lock();
        inner
            .incidents
            .get(sys_id)
            .map(|stored| stored.journal.clone())
            .ok_or_else(|| IncidentError::NotFound(sys_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> NewIncident {
        NewIncident {
            short_description: "AI Automation Request".into(),
            description: "[AUTOMATION REQUEST] cpu at 95%".into(),
            caller: "integration.incidentuser".into(),
        }
    }

    #[tokio::test]
    async fn test_numbers_are_sequential() {
        let backend = MemoryIncidentBackend::new();
        let first = backend.create(request()).await.unwrap();
        let second = backend.create(request()).await.unwrap();
        assert_eq!(first.number, "INC0010001");
        assert_eq!(second.number, "INC0010002");
        assert_ne!(first.sys_id, second.sys_id);
        assert_eq!(backend.len(), 2);
    }

    #[tokio::test]
    async fn test_new_incident_reads_back_as_new() {
        let backend = MemoryIncidentBackend::new();
        let created = backend.create(request()).await.unwrap();
        let record = backend.read(&created.sys_id).await.unwrap();
        assert_eq!(record.state, IncidentState::New);
        assert_eq!(record.description, "[AUTOMATION REQUEST] cpu at 95%");
        assert_eq!(
            backend.caller(&created.sys_id).as_deref(),
            Some("integration.incidentuser")
        );
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let backend = MemoryIncidentBackend::new();
        let err = backend.read("missing").await.unwrap_err();
        assert!(err.is_not_found());
        let err = backend
            .update("missing", IncidentUpdate::note("x"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_notes_become_journal_entries() {
        let backend = MemoryIncidentBackend::new();
        let id = backend.create(request()).await.unwrap().sys_id;
        backend.update(&id, IncidentUpdate::note("one")).await.unwrap();
        backend.update(&id, IncidentUpdate::note("two")).await.unwrap();

        let journal = backend.journal(&id).await.unwrap();
        assert_eq!(journal.len(), 2);
        assert_eq!(journal[0].text, "one");
        assert_eq!(journal[1].kind.as_deref(), Some("work_notes"));
        assert_eq!(backend.journal_texts(&id), vec!["one", "two"]);
    }

    #[tokio::test]
    async fn test_resolve_records_resolution_fields() {
        let backend = MemoryIncidentBackend::new();
        let id = backend.create(request()).await.unwrap().sys_id;
        backend
            .update(
                &id,
                IncidentUpdate::resolved("done", "Resolved by caller", "closing"),
            )
            .await
            .unwrap();

        let record = backend.read(&id).await.unwrap();
        assert_eq!(record.state, IncidentState::Resolved);
        assert_eq!(
            backend.resolution(&id),
            Some((
                Some("Resolved by caller".to_string()),
                Some("closing".to_string())
            ))
        );
    }

    #[tokio::test]
    async fn test_injected_note_failure() {
        let backend = MemoryIncidentBackend::new();
        let id = backend.create(request()).await.unwrap().sys_id;
        backend.fail_notes_containing("Generating");

        let err = backend
            .update(&id, IncidentUpdate::note("Generating remediation script."))
            .await
            .unwrap_err();
        assert!(matches!(err, IncidentError::Rejected(_)));
        backend.update(&id, IncidentUpdate::note("other")).await.unwrap();
        assert_eq!(backend.journal_texts(&id), vec!["other"]);
    }

    #[tokio::test]
    async fn test_injected_state_failure_leaves_record_untouched() {
        let backend = MemoryIncidentBackend::new();
        let id = backend.create(request()).await.unwrap().sys_id;
        backend.fail_state_updates();

        let update = IncidentUpdate::note("final").with_state(IncidentState::Resolved);
        assert!(backend.update(&id, update).await.is_err());
        assert_eq!(backend.read(&id).await.unwrap().state, IncidentState::New);
        assert!(backend.journal_texts(&id).is_empty());
    }
}
