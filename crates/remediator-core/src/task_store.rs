//! Approval-workflow status cache keyed by incident `sys_id`.
//!
//! Lives for the process lifetime only. The incident backend remains the
//! source of truth for terminal states.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::orchestrator::RemediationOutcome;

/// API-level status of an automation task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Active,
    #[serde(alias = "awaiting_approval")]
    WaitingApproval,
    Completed,
    #[serde(alias = "rejected")]
    ManualInterventionRequired,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Active => "active",
            TaskStatus::WaitingApproval => "waiting_approval",
            TaskStatus::Completed => "completed",
            TaskStatus::ManualInterventionRequired => "manual_intervention_required",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(TaskStatus::Active),
            "waiting_approval" | "awaiting_approval" => Ok(TaskStatus::WaitingApproval),
            "completed" => Ok(TaskStatus::Completed),
            "manual_intervention_required" | "rejected" => {
                Ok(TaskStatus::ManualInterventionRequired)
            }
            other => Err(format!("unknown task status: {other}")),
        }
    }
}

/// The human-readable plan shown while a run awaits approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalPlan {
    pub steps: Vec<String>,
    pub summary: String,
}

impl ApprovalPlan {
    /// The fixed plan presented for every approval request.
    pub fn standard() -> Self {
        Self {
            steps: [
                "Run diagnostics",
                "Generate remediation script",
                "Draft summary",
                "Resolve incident",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            summary: "Agentic plan prepared. Awaiting approval to execute.".to_string(),
        }
    }
}

/// Cached workflow state for one incident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEntry {
    pub status: TaskStatus,
    pub plan: Option<ApprovalPlan>,
    pub result: Option<RemediationOutcome>,
    pub reason: Option<String>,
}

impl TaskEntry {
    pub fn waiting(plan: ApprovalPlan) -> Self {
        Self {
            status: TaskStatus::WaitingApproval,
            plan: Some(plan),
            result: None,
            reason: None,
        }
    }

    pub fn completed(plan: Option<ApprovalPlan>, result: RemediationOutcome) -> Self {
        Self {
            status: TaskStatus::Completed,
            plan,
            result: Some(result),
            reason: None,
        }
    }

    pub fn manual_intervention(plan: Option<ApprovalPlan>, reason: impl Into<String>) -> Self {
        Self {
            status: TaskStatus::ManualInterventionRequired,
            plan,
            result: None,
            reason: Some(reason.into()),
        }
    }
}

/// Process-local status cache.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn get(&self, sys_id: &str) -> Option<TaskEntry>;

    /// Insert or replace the entry for `sys_id`.
    async fn set(&self, sys_id: &str, entry: TaskEntry);
}

/// [`TaskStore`] backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    entries: Mutex<HashMap<String, TaskEntry>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn get(&self, sys_id: &str) -> Option<TaskEntry> {
        let entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        entries.get(sys_id).cloned()
    }

    async fn set(&self, sys_id: &str, entry: TaskEntry) {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        entries.insert(sys_id.to_string(), entry);
    }
}
