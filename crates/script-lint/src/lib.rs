//! Script Lint - syntax-only validation of generated remediation scripts
//!
//! Provides:
//! - A surface-token classifier that guesses Bash vs PowerShell
//! - `bash -n` and PSParser-based checks run against a scoped temp file
//! - A bracket/quote balance heuristic when no shell interpreter is installed
//!
//! Every failure, including a missing toolchain or an interpreter timeout, is
//! reported as a failed [`LintVerdict`] rather than an error.

pub mod checker;
pub mod error;
pub mod heuristic;
pub mod language;
pub mod runner;
pub mod toolchain;
pub mod verdict;

// Re-export key types
pub use checker::{LintConfig, SyntaxChecker, DEFAULT_LINT_TIMEOUT};
pub use error::{LintError, LintResult};
pub use heuristic::{check_balance, Imbalance};
pub use language::{classify, ScriptLanguage, UnknownLanguage};
pub use toolchain::Toolchain;
pub use verdict::{CheckMode, LintVerdict};
