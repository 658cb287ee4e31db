//! Error types for interpreter invocation.
//!
//! These never escape [`crate::SyntaxChecker`]; they are folded into failed
//! verdicts.

use std::time::Duration;

/// Faults while preparing or running an interpreter.
#[derive(Debug, thiserror::Error)]
pub enum LintError {
    #[error("failed to stage snippet in a temporary file: {0}")]
    TempFile(#[source] std::io::Error),

    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} timed out after {timeout:?}")]
    Timeout { program: String, timeout: Duration },

    #[error("failed waiting for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for interpreter invocation.
pub type LintResult<T> = std::result::Result<T, LintError>;
