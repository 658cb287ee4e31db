//! The syntax checker.
//!
//! Snippets are staged in a per-call temporary file and handed to the
//! interpreter in parse-only mode. The file is removed when the staging
//! handle drops, on every path.

use crate::error::{LintError, LintResult};
use crate::heuristic::check_balance;
use crate::language::{classify, ScriptLanguage};
use crate::runner::{run_with_timeout, ProcessOutput};
use crate::toolchain::Toolchain;
use crate::verdict::{CheckMode, LintVerdict};
use std::ffi::OsStr;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tempfile::NamedTempFile;
use tracing::debug;

/// Wall-clock bound on a single interpreter run.
pub const DEFAULT_LINT_TIMEOUT: Duration = Duration::from_secs(30);

const NO_POWERSHELL: &str = "No PowerShell interpreter found (pwsh/powershell). Lint skipped.";
const UNKNOWN_LANGUAGE: &str = "Unknown language and no linter available.";

/// Checker settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintConfig {
    /// Timeout applied to each interpreter invocation.
    pub timeout: Duration,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_LINT_TIMEOUT,
        }
    }
}

impl LintConfig {
    /// Read `REMEDIATOR_LINT_TIMEOUT_SECS`, falling back to the default.
    pub fn from_env() -> Self {
        let timeout = std::env::var("REMEDIATOR_LINT_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_LINT_TIMEOUT);
        Self { timeout }
    }

    /// Override the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Validates Bash and PowerShell snippets without executing them.
#[derive(Debug, Clone)]
pub struct SyntaxChecker {
    toolchain: Toolchain,
    config: LintConfig,
}

impl SyntaxChecker {
    /// Create a checker over an explicit toolchain.
    pub fn new(toolchain: Toolchain, config: LintConfig) -> Self {
        Self { toolchain, config }
    }

    /// Create a checker using interpreters found on `PATH` and env config.
    pub fn discover() -> Self {
        Self::new(Toolchain::discover(), LintConfig::from_env())
    }

    /// Interpreters this checker will use.
    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    /// Lint `snippet` as `hint`, or try Bash then PowerShell when no hint is given.
    pub async fn lint(&self, snippet: &str, hint: Option<ScriptLanguage>) -> LintVerdict {
        let verdict = match hint {
            Some(language) => self.lint_as(snippet, language).await,
            None => self.lint_any(snippet).await,
        };
        debug!(
            hint = ?hint,
            passed = verdict.passed,
            mode = ?verdict.mode,
            "lint finished"
        );
        verdict
    }

    /// Lint using the classifier's guess as the grammar.
    pub async fn lint_guessed(&self, snippet: &str) -> LintVerdict {
        self.lint(snippet, Some(classify(snippet))).await
    }

    /// Lint against one specific grammar.
    pub async fn lint_as(&self, snippet: &str, language: ScriptLanguage) -> LintVerdict {
        match language {
            ScriptLanguage::Bash => self.lint_bash(snippet).await,
            ScriptLanguage::PowerShell => self.lint_powershell(snippet).await,
        }
    }

    async fn lint_any(&self, snippet: &str) -> LintVerdict {
        let bash = self.lint_bash(snippet).await;
        if bash.passed {
            return bash;
        }
        let powershell = self.lint_powershell(snippet).await;
        if powershell.passed {
            return powershell;
        }

        let diagnostic = [&bash.diagnostic, &powershell.diagnostic]
            .into_iter()
            .flatten()
            .find(|d| !d.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| UNKNOWN_LANGUAGE.to_string());
        LintVerdict::fail(bash.mode, diagnostic)
    }

    /// `bash -n`, or the balance heuristic when bash is missing.
    pub async fn lint_bash(&self, snippet: &str) -> LintVerdict {
        let Some(bash) = self.toolchain.bash.as_deref() else {
            return match check_balance(snippet) {
                Ok(()) => LintVerdict::pass(CheckMode::Heuristic),
                Err(imbalance) => LintVerdict::fail(
                    CheckMode::Heuristic,
                    format!("bash not found and heuristic balance check failed: {imbalance}"),
                ),
            };
        };

        match self.run_bash(bash, snippet).await {
            Ok(output) if output.succeeded() => LintVerdict::pass(CheckMode::Interpreter),
            Ok(output) => LintVerdict::fail(
                CheckMode::Interpreter,
                output.diagnostic_or("bash -n reported an error"),
            ),
            Err(e) => LintVerdict::fail(CheckMode::Interpreter, format!("bash lint exception: {e}")),
        }
    }

    /// PSParser tokenization. Fails outright when no PowerShell is installed.
    pub async fn lint_powershell(&self, snippet: &str) -> LintVerdict {
        let Some(exe) = self.toolchain.powershell.as_deref() else {
            return LintVerdict::fail(CheckMode::Unavailable, NO_POWERSHELL);
        };

        match self.run_powershell(exe, snippet).await {
            // The parser can report problems on stderr with exit code 0.
            Ok(output) if output.succeeded() && output.stderr.trim().is_empty() => {
                LintVerdict::pass(CheckMode::Interpreter)
            }
            Ok(output) => LintVerdict::fail(
                CheckMode::Interpreter,
                output.diagnostic_or("PowerShell parser reported an error"),
            ),
            Err(e) => LintVerdict::fail(
                CheckMode::Interpreter,
                format!("powershell lint exception: {e}"),
            ),
        }
    }

    async fn run_bash(&self, bash: &Path, snippet: &str) -> LintResult<ProcessOutput> {
        let staged = stage_snippet(snippet, ScriptLanguage::Bash)?;
        let args = [OsStr::new("-n"), staged.path().as_os_str()];
        run_with_timeout(bash, args, self.config.timeout).await
    }

    async fn run_powershell(&self, exe: &Path, snippet: &str) -> LintResult<ProcessOutput> {
        let staged = stage_snippet(snippet, ScriptLanguage::PowerShell)?;
        let command = powershell_parse_command(staged.path());
        let args = [
            "-NoLogo",
            "-NoProfile",
            "-NonInteractive",
            "-Command",
            command.as_str(),
        ];
        run_with_timeout(exe, args, self.config.timeout).await
    }
}

/// Write the snippet to a fresh temp file that is deleted on drop.
fn stage_snippet(snippet: &str, language: ScriptLanguage) -> LintResult<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("lint-")
        .suffix(language.file_suffix())
        .tempfile()
        .map_err(LintError::TempFile)?;
    file.write_all(snippet.as_bytes())
        .map_err(LintError::TempFile)?;
    file.flush().map_err(LintError::TempFile)?;
    Ok(file)
}

/// Parse-only PowerShell command for the file at `path`, under strict mode.
///
/// `Tokenize` does not throw on syntax errors; it collects them into the
/// `[ref]` argument, so they are written to stderr and the exit code is 1.
fn powershell_parse_command(path: &Path) -> String {
    let quoted = path.display().to_string().replace('\'', "''");
    format!(
        "Set-StrictMode -Version Latest; \
         $errs = $null; \
         $null = [System.Management.Automation.PSParser]::Tokenize(\
         (Get-Content -Raw '{quoted}'), [ref]$errs); \
         if ($errs -and $errs.Count -gt 0) {{ \
         $errs | ForEach-Object {{ [Console]::Error.WriteLine($_.Message) }}; exit 1 }}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn degraded() -> SyntaxChecker {
        SyntaxChecker::new(Toolchain::none(), LintConfig::default())
    }

    #[test]
    fn test_powershell_command_is_parse_only() {
        let cmd = powershell_parse_command(Path::new("/tmp/it's.ps1"));
        assert!(cmd.starts_with("Set-StrictMode -Version Latest;"));
        assert!(cmd.contains("PSParser]::Tokenize("));
        assert!(cmd.contains("Get-Content -Raw '/tmp/it''s.ps1'"));
        assert!(cmd.contains("[ref]$errs"));
        assert!(!cmd.contains("[ref]$null"));
        assert!(cmd.contains("[Console]::Error.WriteLine($_.Message)"));
        assert!(cmd.contains("exit 1"));
        assert!(!cmd.contains("Invoke-Expression"));
    }

    #[test]
    fn test_stage_snippet_is_removed_on_drop() {
        let staged = stage_snippet("echo hi", ScriptLanguage::Bash).unwrap();
        let path = staged.path().to_path_buf();
        assert!(path.exists());
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("sh"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "echo hi");
        drop(staged);
        assert!(!path.exists());
    }

    #[test]
    fn test_lint_config_default_timeout() {
        assert_eq!(LintConfig::default().timeout, Duration::from_secs(30));
        let cfg = LintConfig::default().with_timeout(Duration::from_secs(5));
        assert_eq!(cfg.timeout, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_heuristic_pass_when_bash_missing() {
        let v = degraded()
            .lint_bash("mkdir -p /tmp/logs\nuptime > /tmp/logs/sys_status.log")
            .await;
        assert!(v.passed);
        assert_eq!(v.mode, CheckMode::Heuristic);
        assert!(v.diagnostic.is_none());
        assert_eq!(v.output(), "OK (bash not found; heuristic passed)");
    }

    #[tokio::test]
    async fn test_heuristic_failure_says_so() {
        let v = degraded().lint_bash("echo \"unterminated").await;
        assert!(!v.passed);
        let diag = v.diagnostic.unwrap();
        assert!(diag.contains("heuristic balance check failed"));
    }

    #[tokio::test]
    async fn test_powershell_missing_interpreter_fails() {
        let v = degraded().lint_powershell("Write-Host 'hi'").await;
        assert!(!v.passed);
        assert_eq!(v.mode, CheckMode::Unavailable);
        assert_eq!(v.diagnostic.as_deref(), Some(NO_POWERSHELL));
    }

    #[tokio::test]
    async fn test_no_hint_returns_bash_diagnostic_when_both_fail() {
        let v = degraded().lint("echo )", None).await;
        assert!(!v.passed);
        assert_eq!(v.mode, CheckMode::Heuristic);
        assert!(v
            .diagnostic
            .unwrap()
            .starts_with("bash not found and heuristic balance check failed"));
    }

    #[tokio::test]
    async fn test_no_hint_accepts_bash_pass() {
        let v = degraded().lint("uptime", None).await;
        assert!(v.passed);
    }

    #[tokio::test]
    async fn test_guess_routes_powershell_snippets() {
        let v = degraded()
            .lint_guessed("New-Item -Path \"C:\\Logs\" -ItemType Directory -Force")
            .await;
        assert_eq!(v.mode, CheckMode::Unavailable);
    }

    #[tokio::test]
    async fn test_spawn_failure_becomes_verdict() {
        let checker = SyntaxChecker::new(
            Toolchain::none().with_bash("/definitely/not/bash"),
            LintConfig::default(),
        );
        let v = checker.lint_bash("echo hi").await;
        assert!(!v.passed);
        assert!(v.diagnostic.unwrap().starts_with("bash lint exception:"));
    }
}
