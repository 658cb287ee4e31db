//! Remediator Core - incident remediation planning and orchestration
//!
//! This crate provides:
//! - The keyword planner and the deterministic step agents
//! - The orchestrator that runs a plan against an incident record
//! - The approval workflow and its task-status cache
//! - Tracing setup and lifecycle event emitters

pub mod agents;
pub mod error;
pub mod obs;
pub mod orchestrator;
pub mod planner;
pub mod service;
pub mod task_store;
pub mod telemetry;

pub use agents::{
    diagnose, generate_and_lint, management_email, Confidence, Diagnosis, ScriptResult,
    ScriptRunner, Solution, TemplateScriptRunner, PERF_COLLECTOR_TEMPLATE,
};
pub use error::{ServiceError, ServiceResult};
pub use obs::{
    emit_incident_resolved, emit_lint_verdict, emit_plan_built, emit_step_failed,
    emit_step_finished, IncidentSpan,
};
pub use orchestrator::{
    resolution_note, Orchestrator, RemediationOutcome, APPROVAL_NOTE, AUTOMATION_MARKERS,
    PLAN_STARTED_NOTE, REJECTION_NOTE, STATUS_RESOLVED,
};
pub use planner::{build_plan, Plan, PlanStep};
pub use service::{
    derive_status, extract_request, ExecuteResponse, PendingApproval, Rejection,
    RemediationService, TaskView, DEFAULT_REQUEST,
};
pub use task_store::{ApprovalPlan, MemoryTaskStore, TaskEntry, TaskStatus, TaskStore};
pub use telemetry::{init_tracing, json_requested};

// Re-export the lower layers for binaries
pub use incident_state;
pub use script_lint;
