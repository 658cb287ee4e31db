//! Approval workflow over the orchestrator.
//!
//! An automation request either runs immediately or waits for approval.
//! Approval runs the plan and records completion; rejection flags the
//! incident for manual work. Task views merge the backend record with the
//! cached workflow state.

use std::sync::Arc;

use incident_state::{
    IncidentBackend, IncidentState, IncidentUpdate, JournalEntry, NewIncident, DEFAULT_CALLER,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::agents::ScriptRunner;
use crate::error::{ServiceError, ServiceResult};
use crate::orchestrator::{
    Orchestrator, RemediationOutcome, APPROVAL_NOTE, AUTOMATION_MARKERS, REJECTION_NOTE,
};
use crate::task_store::{ApprovalPlan, TaskEntry, TaskStatus, TaskStore};

/// Description prefix marking the original automation request.
pub const REQUEST_PREFIX: &str = "[AUTOMATION REQUEST]";
/// Short description of every automation incident.
pub const AUTOMATION_SHORT_DESCRIPTION: &str = "AI Automation Request";
/// Request used when none can be recovered from the record.
pub const DEFAULT_REQUEST: &str = "Run diagnostic & remediation and produce a summary email.";

const WAITING_MESSAGE: &str =
    "The incident has been reported. Awaiting approval before initiating automation.";
const REJECTED_MESSAGE: &str = "Plan rejected. Incident flagged for manual investigation.";

/// Returned by `execute` when the run waits for approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingApproval {
    pub incident_sys_id: String,
    pub status: TaskStatus,
    pub plan: ApprovalPlan,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExecuteResponse {
    Pending(PendingApproval),
    Completed(RemediationOutcome),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub id: String,
    pub status: TaskStatus,
    pub message: String,
}

/// Task status view combining the record, its journal and the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskView {
    pub incident_sys_id: String,
    pub number: String,
    pub short_description: String,
    /// Backend state code
    pub state: String,
    pub state_label: String,
    pub status: TaskStatus,
    pub updates: Vec<JournalEntry>,
    pub plan: Option<ApprovalPlan>,
    pub result: Option<RemediationOutcome>,
}

/// Strip the request prefix (case-insensitive) from a description.
pub fn extract_request(text: &str) -> String {
    let trimmed = text.trim();
    match trimmed.get(..REQUEST_PREFIX.len()) {
        Some(head) if head.eq_ignore_ascii_case(REQUEST_PREFIX) => {
            trimmed[REQUEST_PREFIX.len()..].trim().to_string()
        }
        _ => trimmed.to_string(),
    }
}

/// Status of a record with no cached workflow state.
///
/// Resolved or Closed is completed. A New record that automation never
/// touched is still waiting for approval. Everything else is active.
pub fn derive_status(state: &IncidentState, journal: &[JournalEntry]) -> TaskStatus {
    if state.is_completed() {
        return TaskStatus::Completed;
    }
    let touched = journal
        .iter()
        .any(|entry| AUTOMATION_MARKERS.iter().any(|m| entry.text.contains(m)));
    if *state == IncidentState::New && !touched {
        TaskStatus::WaitingApproval
    } else {
        TaskStatus::Active
    }
}

/// Workflow entry points shared by the HTTP daemon and the CLI.
pub struct RemediationService {
    backend: Arc<dyn IncidentBackend>,
    tasks: Arc<dyn TaskStore>,
    orchestrator: Orchestrator,
    caller: String,
}

impl RemediationService {
    pub fn new(
        backend: Arc<dyn IncidentBackend>,
        scripts: Arc<dyn ScriptRunner>,
        tasks: Arc<dyn TaskStore>,
    ) -> Self {
        Self {
            orchestrator: Orchestrator::new(Arc::clone(&backend), scripts),
            backend,
            tasks,
            caller: DEFAULT_CALLER.to_string(),
        }
    }

    /// Caller username for created incidents.
    pub fn with_caller(mut self, caller: impl Into<String>) -> Self {
        self.caller = caller.into();
        self
    }

    pub fn with_resolution_code(mut self, code: impl Into<String>) -> Self {
        self.orchestrator = self.orchestrator.with_resolution_code(code);
        self
    }

    /// Open an incident for `request` and run it, or park it for approval.
    pub async fn execute(
        &self,
        request: &str,
        require_approval: bool,
    ) -> ServiceResult<ExecuteResponse> {
        let created = self
            .backend
            .create(NewIncident {
                short_description: AUTOMATION_SHORT_DESCRIPTION.to_string(),
                description: format!("{REQUEST_PREFIX} {request}"),
                caller: self.caller.clone(),
            })
            .await?;
        info!(sys_id = %created.sys_id, number = %created.number, require_approval, "Automation request received");

        if require_approval {
            let plan = ApprovalPlan::standard();
            self.tasks
                .set(&created.sys_id, TaskEntry::waiting(plan.clone()))
                .await;
            return Ok(ExecuteResponse::Pending(PendingApproval {
                incident_sys_id: created.sys_id,
                status: TaskStatus::WaitingApproval,
                plan,
                message: WAITING_MESSAGE.to_string(),
            }));
        }

        let outcome = self.orchestrator.run(&created.sys_id, request).await?;
        Ok(ExecuteResponse::Completed(outcome))
    }

    /// Approve a waiting plan and run it.
    pub async fn approve(&self, sys_id: &str) -> ServiceResult<RemediationOutcome> {
        let cached = self.tasks.get(sys_id).await;
        if cached
            .as_ref()
            .is_some_and(|e| e.status != TaskStatus::WaitingApproval)
        {
            return Err(ServiceError::InvalidTransition(
                "Plan is not awaiting approval.".to_string(),
            ));
        }

        let record = self
            .backend
            .read(sys_id)
            .await
            .map_err(|e| ServiceError::from_read(sys_id, e))?;

        let request = [&record.description, &record.short_description]
            .into_iter()
            .map(|text| extract_request(text))
            .find(|text| !text.is_empty())
            .unwrap_or_else(|| DEFAULT_REQUEST.to_string());

        self.backend
            .update(sys_id, IncidentUpdate::note(APPROVAL_NOTE))
            .await?;
        info!(sys_id, "Plan approved");

        let outcome = self.orchestrator.run(sys_id, &request).await?;
        self.tasks
            .set(
                sys_id,
                TaskEntry::completed(cached.and_then(|e| e.plan), outcome.clone()),
            )
            .await;
        Ok(outcome)
    }

    /// Reject a waiting plan and leave the incident for humans.
    pub async fn reject(&self, sys_id: &str) -> ServiceResult<Rejection> {
        self.backend
            .read(sys_id)
            .await
            .map_err(|e| ServiceError::from_read(sys_id, e))?;

        let cached = self.tasks.get(sys_id).await;
        if cached
            .as_ref()
            .is_some_and(|e| e.status != TaskStatus::WaitingApproval)
        {
            return Err(ServiceError::InvalidTransition(
                "Plan is not waiting for approval.".to_string(),
            ));
        }

        self.backend
            .update(
                sys_id,
                IncidentUpdate::note(REJECTION_NOTE).with_state(IncidentState::New),
            )
            .await
            .map_err(ServiceError::ManualIntervention)?;
        info!(sys_id, "Plan rejected");

        self.tasks
            .set(
                sys_id,
                TaskEntry::manual_intervention(cached.and_then(|e| e.plan), "rejected"),
            )
            .await;

        Ok(Rejection {
            id: sys_id.to_string(),
            status: TaskStatus::ManualInterventionRequired,
            message: REJECTED_MESSAGE.to_string(),
        })
    }

    /// Current status and timeline of an incident's automation.
    pub async fn task_status(&self, sys_id: &str) -> ServiceResult<TaskView> {
        let cached = self.tasks.get(sys_id).await;
        let record = self
            .backend
            .read(sys_id)
            .await
            .map_err(|e| ServiceError::from_read(sys_id, e))?;

        let updates = match self.backend.journal(sys_id).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(sys_id, error = %e, "Journal unavailable; returning no updates");
                Vec::new()
            }
        };

        let cached_status = cached.as_ref().map(|e| e.status);
        let status = if record.state.is_completed() {
            TaskStatus::Completed
        } else if cached_status == Some(TaskStatus::ManualInterventionRequired) {
            TaskStatus::ManualInterventionRequired
        } else if cached_status == Some(TaskStatus::WaitingApproval) {
            TaskStatus::WaitingApproval
        } else {
            derive_status(&record.state, &updates)
        };

        let (plan, result) = cached.map(|e| (e.plan, e.result)).unwrap_or_default();
        Ok(TaskView {
            incident_sys_id: sys_id.to_string(),
            number: record.number,
            short_description: record.short_description,
            state: record.state.code(),
            state_label: record.state.label(),
            status,
            updates,
            plan,
            result,
        })
    }
}
