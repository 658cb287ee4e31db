//! Bounded interpreter invocation.

use crate::error::{LintError, LintResult};
use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::debug;

/// Captured result of an interpreter run.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Exit code (-1 when terminated by a signal).
    pub exit_code: i32,

    /// Captured stdout.
    pub stdout: String,

    /// Captured stderr.
    pub stderr: String,

    /// Duration in milliseconds.
    pub duration_ms: u64,
}

impl ProcessOutput {
    /// Whether the process exited with code 0.
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }

    /// First non-blank stream (stderr, then stdout), or `fallback`.
    pub fn diagnostic_or(&self, fallback: &str) -> String {
        [&self.stderr, &self.stdout]
            .into_iter()
            .find(|s| !s.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| fallback.to_string())
    }
}

/// Run `program args...` with stdin closed and both streams captured.
///
/// The child is killed if `timeout` elapses before it exits.
pub async fn run_with_timeout<I, S>(
    program: &Path,
    args: I,
    timeout: Duration,
) -> LintResult<ProcessOutput>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let start = Instant::now();
    let name = program.display().to_string();

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| LintError::Spawn {
            program: name.clone(),
            source,
        })?;

    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| LintError::Timeout {
            program: name.clone(),
            timeout,
        })?
        .map_err(|source| LintError::Wait {
            program: name.clone(),
            source,
        })?;

    let duration_ms = start.elapsed().as_millis() as u64;
    let exit_code = output.status.code().unwrap_or(-1);
    debug!(program = %name, exit_code, duration_ms, "interpreter finished");

    Ok(ProcessOutput {
        exit_code,
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        duration_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(stdout: &str, stderr: &str) -> ProcessOutput {
        ProcessOutput {
            exit_code: 1,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            duration_ms: 1,
        }
    }

    #[test]
    fn test_diagnostic_prefers_stderr() {
        assert_eq!(output("out", "err").diagnostic_or("fallback"), "err");
    }

    #[test]
    fn test_diagnostic_falls_back_to_stdout_then_message() {
        assert_eq!(output("out", "  ").diagnostic_or("fallback"), "out");
        assert_eq!(output("", "").diagnostic_or("fallback"), "fallback");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_simple_command() {
        let result = run_with_timeout(Path::new("echo"), ["hello"], Duration::from_secs(10))
            .await
            .expect("echo should run");
        assert!(result.succeeded());
        assert!(result.stdout.contains("hello"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_failing_command() {
        let result = run_with_timeout(Path::new("false"), Vec::<&str>::new(), Duration::from_secs(10))
            .await
            .expect("false should run");
        assert!(!result.succeeded());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_is_reported() {
        let err = run_with_timeout(Path::new("sleep"), ["5"], Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, LintError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let err = run_with_timeout(
            Path::new("/definitely/not/a/real/interpreter"),
            Vec::<&str>::new(),
            Duration::from_secs(1),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, LintError::Spawn { .. }));
    }
}
