//! Lint verdicts.

use serde::{Deserialize, Serialize};

/// How a verdict was reached.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CheckMode {
    /// A real interpreter parsed the snippet.
    Interpreter,

    /// No interpreter; the bracket/quote balance heuristic was used.
    Heuristic,

    /// No interpreter and no fallback for this grammar.
    Unavailable,
}

/// Result of a syntax check.
///
/// A passing verdict never carries a diagnostic; a failing one always carries
/// a non-empty diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintVerdict {
    /// Whether the snippet parsed.
    pub passed: bool,

    /// Reason for failure (absent when passed).
    pub diagnostic: Option<String>,

    /// Which level of checking produced this verdict.
    pub mode: CheckMode,
}

const GENERIC_FAILURE: &str = "lint failed";

impl LintVerdict {
    /// A passing verdict.
    pub fn pass(mode: CheckMode) -> Self {
        Self {
            passed: true,
            diagnostic: None,
            mode,
        }
    }

    /// A failing verdict. Blank diagnostics are replaced with a generic reason.
    pub fn fail(mode: CheckMode, diagnostic: impl Into<String>) -> Self {
        let diagnostic = diagnostic.into();
        let diagnostic = if diagnostic.trim().is_empty() {
            GENERIC_FAILURE.to_string()
        } else {
            diagnostic
        };
        Self {
            passed: false,
            diagnostic: Some(diagnostic),
            mode,
        }
    }

    /// Whether this verdict was produced without a real interpreter.
    pub fn is_degraded(&self) -> bool {
        self.mode != CheckMode::Interpreter
    }

    /// Human-readable one-liner: `OK`, a degraded-mode notice, or the diagnostic.
    pub fn output(&self) -> String {
        match (self.passed, self.mode) {
            (true, CheckMode::Heuristic) => "OK (bash not found; heuristic passed)".to_string(),
            (true, _) => "OK".to_string(),
            (false, _) => self
                .diagnostic
                .clone()
                .unwrap_or_else(|| GENERIC_FAILURE.to_string()),
        }
    }
}
