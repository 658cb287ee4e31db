//! Remediation script generation.
//!
//! The generator emits a fixed, conservative PowerShell performance-counter
//! collector and lints it without running it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use script_lint::{CheckMode, LintVerdict, ScriptLanguage, SyntaxChecker};

use crate::obs::emit_lint_verdict;

/// Collects processor and `wsappx` counters into `C:\logs` via `logman`.
pub const PERF_COLLECTOR_TEMPLATE: &str = r#"New-Item -ItemType Directory -Path C:\logs -Force | Out-Null
$setName = 'Processor'
try {
    $null = (Get-Counter -ListSet $setName -ErrorAction Stop)
} catch {
    Write-Host "Perf counter set not found: $setName"
}
$counters = @("\Processor(_Total)\% Processor Time", "\Process(wsappx)\% Processor Time")
$logName = "PerfLog"
$outDir = "C:\logs\perf-$env:COMPUTERNAME"
try { logman stop $logName -ets 2>$null } catch {}
try { logman delete $logName 2>$null } catch {}
logman create counter $logName -f csv -o $outDir -si 00:00:15 -v mmddhhmm -c $counters -max 200 -cnf 01:00:00
logman start $logName"#;

/// Output of the script step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptResult {
    /// `None` only on the placeholder recorded when the step failed.
    pub language: Option<ScriptLanguage>,
    pub code: String,
    pub lint_passed: bool,
    #[serde(default)]
    pub lint_error: Option<String>,
    /// `"OK"`, a degraded-mode notice, or the diagnostic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lint_output: Option<String>,
    /// How the verdict was reached; absent on the failure placeholder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lint_mode: Option<CheckMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScriptResult {
    /// Script result for `code` in `language` with the given verdict.
    pub fn linted(language: ScriptLanguage, code: impl Into<String>, verdict: &LintVerdict) -> Self {
        Self {
            language: Some(language),
            code: code.into(),
            lint_passed: verdict.passed,
            lint_error: verdict.diagnostic.clone(),
            lint_output: Some(verdict.output()),
            lint_mode: Some(verdict.mode),
            error: None,
        }
    }

    /// Placeholder for a script step that raised.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            language: None,
            code: String::new(),
            lint_passed: false,
            lint_error: None,
            lint_output: None,
            lint_mode: None,
            error: Some(error.into()),
        }
    }
}

/// Produces a remediation script for a request.
///
/// Lint failures belong in the returned [`ScriptResult`]; an `Err` means the
/// step itself broke and the orchestrator records a placeholder.
#[async_trait]
pub trait ScriptRunner: Send + Sync {
    async fn generate(&self, request: &str) -> anyhow::Result<ScriptResult>;
}

/// Emits the fixed collector template and lints it as PowerShell.
pub async fn generate_and_lint(checker: &SyntaxChecker, _request: &str) -> ScriptResult {
    let language = ScriptLanguage::PowerShell;
    let verdict = checker.lint(PERF_COLLECTOR_TEMPLATE, Some(language)).await;
    emit_lint_verdict(language.name(), &verdict);
    ScriptResult::linted(language, PERF_COLLECTOR_TEMPLATE, &verdict)
}

/// Production [`ScriptRunner`] backed by the fixed template.
pub struct TemplateScriptRunner {
    checker: SyntaxChecker,
}

impl TemplateScriptRunner {
    pub fn new(checker: SyntaxChecker) -> Self {
        Self { checker }
    }
}

#[async_trait]
impl ScriptRunner for TemplateScriptRunner {
    async fn generate(&self, request: &str) -> anyhow::Result<ScriptResult> {
        Ok(generate_and_lint(&self.checker, request).await)
    }
}
