//! Plan execution against an incident record.
//!
//! The orchestrator posts the plan, runs each step in order, leaves progress
//! notes on the record and finally resolves it with a composed summary note.
//! A failing step never aborts the run: it leaves a breadcrumb note and a
//! placeholder result, and the next step runs.

use std::sync::Arc;
use std::time::Instant;

use incident_state::{
    IncidentBackend, IncidentResult, IncidentUpdate, DEFAULT_CLOSE_NOTES, DEFAULT_RESOLUTION_CODE,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::agents::{diagnose, management_email, Diagnosis, ScriptResult, ScriptRunner};
use crate::obs::{
    emit_incident_resolved, emit_plan_built, emit_step_failed, emit_step_finished, IncidentSpan,
};
use crate::planner::{build_plan, PlanStep};

/// First note of the diagnose step. Marks that automation has started.
pub const PLAN_STARTED_NOTE: &str = "Plan started: running diagnostics.";
pub const GENERATING_SCRIPT_NOTE: &str = "Generating remediation script.";
pub const EMAIL_DRAFTED_NOTE: &str = "Drafted summary email.";
/// Posted when an approved plan starts executing.
pub const APPROVAL_NOTE: &str = "Approval received. Executing agentic plan.";
/// Posted when a plan is rejected.
pub const REJECTION_NOTE: &str = "Automation was rejected. Flagged for manual investigation.";
/// Final note when nothing else was composed.
pub const EMPTY_RUN_NOTE: &str = "Automation completed.";

/// Journal notes showing that automation has touched a record.
pub const AUTOMATION_MARKERS: &[&str] = &[PLAN_STARTED_NOTE, APPROVAL_NOTE];

/// Status reported for every completed run.
pub const STATUS_RESOLVED: &str = "resolved";

/// Result of one remediation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemediationOutcome {
    pub incident_sys_id: String,
    pub status: String,
    pub diagnosis: Option<Diagnosis>,
    pub script: Option<ScriptResult>,
    pub email_draft: String,
    /// Whether the final resolve update was accepted by the backend.
    pub servicenow_updated: bool,
}

#[derive(Debug, Default)]
struct StepResults {
    diagnosis: Option<Diagnosis>,
    script: Option<ScriptResult>,
    email: Option<String>,
}

/// Runs plans against one incident backend.
pub struct Orchestrator {
    backend: Arc<dyn IncidentBackend>,
    scripts: Arc<dyn ScriptRunner>,
    resolution_code: String,
}

impl Orchestrator {
    pub fn new(backend: Arc<dyn IncidentBackend>, scripts: Arc<dyn ScriptRunner>) -> Self {
        Self {
            backend,
            scripts,
            resolution_code: DEFAULT_RESOLUTION_CODE.to_string(),
        }
    }

    /// Resolution code sent when resolving the record.
    pub fn with_resolution_code(mut self, code: impl Into<String>) -> Self {
        self.resolution_code = code.into();
        self
    }

    /// Run the plan for `request` against the incident `sys_id`.
    ///
    /// Only posting the initial plan note can fail; step failures are
    /// absorbed and a failed resolve shows up as `servicenow_updated = false`.
    pub async fn run(&self, sys_id: &str, request: &str) -> IncidentResult<RemediationOutcome> {
        IncidentSpan::new(sys_id)
            .scope(self.run_inner(sys_id, request))
            .await
    }

    async fn run_inner(&self, sys_id: &str, request: &str) -> IncidentResult<RemediationOutcome> {
        let plan = build_plan(request);
        emit_plan_built(sys_id, &plan);
        self.note(sys_id, format!("Plan: {plan}")).await?;

        let mut results = StepResults::default();
        for step in plan.steps.iter().copied() {
            let started = Instant::now();
            let outcome = match step {
                PlanStep::Diagnose => self
                    .diagnose_step(sys_id, request)
                    .await
                    .map(|d| results.diagnosis = Some(d)),
                PlanStep::Script => self
                    .script_step(sys_id, request)
                    .await
                    .map(|s| results.script = Some(s)),
                PlanStep::Email => {
                    let email = self.email_step(sys_id, &results).await;
                    email.map(|e| results.email = Some(e))
                }
            };

            match outcome {
                Ok(()) => emit_step_finished(sys_id, step, started.elapsed().as_millis() as u64),
                Err(e) => {
                    let message = format!("{e:#}");
                    emit_step_failed(sys_id, step, &message);
                    if let Err(note_err) = self
                        .note(sys_id, format!("Step '{step}' failed: {message}"))
                        .await
                    {
                        warn!(sys_id, step = %step, error = %note_err, "Could not record step failure");
                    }
                    match step {
                        PlanStep::Diagnose => results.diagnosis = Some(Diagnosis::failed(message)),
                        PlanStep::Script => results.script = Some(ScriptResult::failed(message)),
                        PlanStep::Email => results.email = Some(String::new()),
                    }
                }
            }
        }

        let email_draft = results.email.unwrap_or_default();
        let final_note = resolution_note(
            results.diagnosis.as_ref(),
            results.script.as_ref(),
            &email_draft,
        );
        let servicenow_updated = match self
            .backend
            .update(
                sys_id,
                IncidentUpdate::resolved(final_note, &self.resolution_code, DEFAULT_CLOSE_NOTES),
            )
            .await
        {
            Ok(()) => true,
            Err(e) => {
                error!(sys_id, error = %e, "Failed to resolve incident");
                false
            }
        };
        emit_incident_resolved(sys_id, servicenow_updated);

        Ok(RemediationOutcome {
            incident_sys_id: sys_id.to_string(),
            status: STATUS_RESOLVED.to_string(),
            diagnosis: results.diagnosis,
            script: results.script,
            email_draft,
            servicenow_updated,
        })
    }

    async fn note(&self, sys_id: &str, text: impl Into<String>) -> IncidentResult<()> {
        let text = text.into();
        debug!(sys_id, note = %text, "Posting work note");
        self.backend.update(sys_id, IncidentUpdate::note(text)).await
    }

    async fn diagnose_step(&self, sys_id: &str, request: &str) -> anyhow::Result<Diagnosis> {
        self.note(sys_id, PLAN_STARTED_NOTE).await?;
        let diagnosis = diagnose(request);
        self.note(sys_id, format!("Diagnosis complete: {}.", diagnosis.root_cause))
            .await?;
        Ok(diagnosis)
    }

    async fn script_step(&self, sys_id: &str, request: &str) -> anyhow::Result<ScriptResult> {
        self.note(sys_id, GENERATING_SCRIPT_NOTE).await?;
        let script = self.scripts.generate(request).await?;
        self.note(sys_id, format!("Script ready; lint_passed={}.", script.lint_passed))
            .await?;
        Ok(script)
    }

    async fn email_step(&self, sys_id: &str, results: &StepResults) -> anyhow::Result<String> {
        let email = management_email(results.diagnosis.as_ref(), results.script.as_ref());
        self.note(sys_id, EMAIL_DRAFTED_NOTE).await?;
        Ok(email)
    }
}

/// Compose the work note attached to the resolve update.
pub fn resolution_note(
    diagnosis: Option<&Diagnosis>,
    script: Option<&ScriptResult>,
    email_draft: &str,
) -> String {
    let mut notes = Vec::new();

    if let Some(diagnosis) = diagnosis {
        if !diagnosis.root_cause.is_empty() {
            notes.push(format!("Root Cause: {}", diagnosis.root_cause));
        }
        if !diagnosis.evidence.is_empty() {
            notes.push(format!("Evidence:\n- {}", diagnosis.evidence.join("\n- ")));
        }
    }

    let language = script
        .and_then(|s| s.language)
        .map_or("unknown", |l| l.name());
    let lint = script.map_or_else(|| "n/a".to_string(), |s| s.lint_passed.to_string());
    notes.push(format!("Script generated in {language}; Lint passed: {lint}"));

    if !email_draft.is_empty() {
        notes.push(format!("Summary Draft:\n{email_draft}"));
    }

    if notes.is_empty() {
        EMPTY_RUN_NOTE.to_string()
    } else {
        notes.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use script_lint::{CheckMode, LintVerdict, ScriptLanguage};

    #[test]
    fn test_resolution_note_full() {
        let diagnosis = diagnose("cpu 95% on vm-node1");
        let script = ScriptResult::linted(
            ScriptLanguage::PowerShell,
            "x",
            &LintVerdict::pass(CheckMode::Interpreter),
        );
        let note = resolution_note(Some(&diagnosis), Some(&script), "Hello");

        assert!(note.starts_with("Root Cause: Wsappx process consuming abnormal CPU\n"));
        assert!(note.contains("Evidence:\n- Task Manager"));
        assert!(note.contains("Script generated in powershell; Lint passed: true"));
        assert!(note.ends_with("Summary Draft:\nHello"));
    }

    #[test]
    fn test_resolution_note_without_steps() {
        let note = resolution_note(None, None, "");
        assert_eq!(note, "Script generated in unknown; Lint passed: n/a");
    }

    #[test]
    fn test_resolution_note_with_failed_script() {
        let note = resolution_note(None, Some(&ScriptResult::failed("boom")), "");
        assert_eq!(note, "Script generated in unknown; Lint passed: false");
    }

    #[test]
    fn test_markers_include_started_and_approval() {
        assert!(AUTOMATION_MARKERS.contains(&PLAN_STARTED_NOTE));
        assert!(AUTOMATION_MARKERS.contains(&APPROVAL_NOTE));
        assert!(!AUTOMATION_MARKERS.contains(&REJECTION_NOTE));
    }
}
