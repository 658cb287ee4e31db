//! Structured observability hooks for the remediation lifecycle.
//!
//! This module provides:
//! - An incident-scoped span via [`IncidentSpan`]
//! - Emission functions for plan, step, resolve and lint events
//!
//! Events are emitted at `info!` level, failures at `warn!`.
//! For JSON output, set `REMEDIATOR_LOG_FORMAT=json`.

use std::future::Future;

use script_lint::LintVerdict;
use tracing::instrument::Instrumented;
use tracing::{info, warn, Instrument};

use crate::planner::{Plan, PlanStep};

/// Span tagging every event of one incident's run with its `sys_id`.
///
/// Use [`IncidentSpan::scope`] for async work; [`IncidentSpan::enter`]
/// must not be held across an `.await`.
#[derive(Debug, Clone)]
pub struct IncidentSpan {
    span: tracing::Span,
}

impl IncidentSpan {
    pub fn new(sys_id: &str) -> Self {
        Self {
            span: tracing::info_span!("remediator.incident", sys_id = %sys_id),
        }
    }

    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }

    /// Run `fut` inside this span.
    pub fn scope<F: Future>(&self, fut: F) -> Instrumented<F> {
        fut.instrument(self.span.clone())
    }
}

/// Emit event: plan built for an incident.
pub fn emit_plan_built(sys_id: &str, plan: &Plan) {
    info!(event = "plan.built", sys_id = %sys_id, steps = %plan, step_count = plan.len());
}

/// Emit event: step finished.
pub fn emit_step_finished(sys_id: &str, step: PlanStep, duration_ms: u64) {
    info!(event = "step.finished", sys_id = %sys_id, step = %step, duration_ms = duration_ms);
}

/// Emit event: step failed and a placeholder was recorded (warning level).
pub fn emit_step_failed(sys_id: &str, step: PlanStep, error: &dyn std::fmt::Display) {
    warn!(event = "step.failed", sys_id = %sys_id, step = %step, error = %error);
}

/// Emit event: resolve attempted; `updated` is whether the backend accepted it.
pub fn emit_incident_resolved(sys_id: &str, updated: bool) {
    if updated {
        info!(event = "incident.resolved", sys_id = %sys_id, updated = updated);
    } else {
        warn!(event = "incident.resolved", sys_id = %sys_id, updated = updated);
    }
}

/// Emit event: lint verdict for a generated script.
pub fn emit_lint_verdict(language: &str, verdict: &LintVerdict) {
    info!(
        event = "lint.verdict",
        language = %language,
        passed = verdict.passed,
        mode = ?verdict.mode,
        degraded = verdict.is_degraded(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::build_plan;
    use script_lint::CheckMode;

    #[test]
    fn test_incident_span_enter() {
        let span = IncidentSpan::new("abc123");
        let _guard = span.enter();
        emit_plan_built("abc123", &build_plan("diagnose"));
        emit_step_finished("abc123", PlanStep::Diagnose, 3);
    }

    #[test]
    fn test_failure_emitters() {
        emit_step_failed("abc123", PlanStep::Script, &"boom");
        emit_incident_resolved("abc123", false);
        emit_lint_verdict("powershell", &LintVerdict::fail(CheckMode::Unavailable, "none"));
    }

    #[tokio::test]
    async fn test_scoped_future_runs() {
        let span = IncidentSpan::new("abc123");
        let value = span.scope(async { 7 }).await;
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_scope_with_instrument_trait_in_scope() {
        let span = IncidentSpan::new("abc123");
        let inner = async { "done" }.instrument(tracing::info_span!("inner"));
        assert_eq!(span.scope(inner).await, "done");
    }
}
