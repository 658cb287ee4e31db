//! Incident remediator CLI
//!
//! The `remediator` command exposes the remediation pipeline locally.
//!
//! ## Commands
//!
//! - `lint`: Syntax-check a Bash or PowerShell file
//! - `plan`: Show the steps a request would run
//! - `diagnose`: Print the diagnosis for a request
//! - `run`: Open an incident and run the full remediation
//! - `toolchain`: Show which interpreters the linter can use

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use remediator_core::incident_state::{
    IncidentBackend, MemoryIncidentBackend, ServiceNowClient, ServiceNowConfig,
};
use remediator_core::script_lint::{
    classify, LintConfig, LintVerdict, ScriptLanguage, SyntaxChecker, Toolchain,
};
use remediator_core::{
    build_plan, diagnose, ExecuteResponse, MemoryTaskStore, RemediationService,
    TemplateScriptRunner,
};
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "remediator")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Automated incident remediation", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Syntax-check a script file without running it
    Lint {
        /// Script file to check
        file: PathBuf,

        /// Grammar to check against
        #[arg(short, long, value_enum, default_value_t = LanguageArg::Auto)]
        language: LanguageArg,

        /// Interpreter timeout in seconds
        #[arg(short, long)]
        timeout: Option<u64>,
    },

    /// Show the plan a request would produce
    Plan {
        /// Free-text automation request
        request: String,
    },

    /// Print the diagnosis for a request as JSON
    Diagnose {
        /// Free-text automation request
        request: String,
    },

    /// Open an incident and run the full remediation
    Run {
        /// Free-text automation request
        request: String,

        /// Use the in-memory incident backend instead of ServiceNow
        #[arg(long)]
        offline: bool,
    },

    /// Show which lint interpreters were found
    Toolchain,
}

/// Grammar selection for `lint`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LanguageArg {
    /// Use the classifier's guess
    Auto,
    /// Try Bash, then PowerShell
    Any,
    Bash,
    Powershell,
}

impl LanguageArg {
    fn hint(self, snippet: &str) -> Option<ScriptLanguage> {
        match self {
            LanguageArg::Auto => Some(classify(snippet)),
            LanguageArg::Any => None,
            LanguageArg::Bash => Some(ScriptLanguage::Bash),
            LanguageArg::Powershell => Some(ScriptLanguage::PowerShell),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    remediator_core::init_tracing(cli.json || remediator_core::json_requested(), level);

    match cli.command {
        Commands::Lint {
            file,
            language,
            timeout,
        } => {
            let checker = SyntaxChecker::new(Toolchain::discover(), lint_config(timeout));
            let verdict = cmd_lint(&checker, &file, language).await?;
            println!("{}", render_verdict(&verdict));
            if !verdict.passed {
                bail!("lint failed for {}", file.display());
            }
            Ok(())
        }
        Commands::Plan { request } => {
            println!("{}", cmd_plan(&request));
            Ok(())
        }
        Commands::Diagnose { request } => {
            println!("{}", cmd_diagnose(&request)?);
            Ok(())
        }
        Commands::Run { request, offline } => {
            let service = build_service(offline)?;
            let response = cmd_run(&service, &request).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Commands::Toolchain => {
            print!("{}", render_toolchain(SyntaxChecker::discover().toolchain()));
            Ok(())
        }
    }
}

fn lint_config(timeout: Option<u64>) -> LintConfig {
    let config = LintConfig::from_env();
    match timeout {
        Some(secs) => config.with_timeout(Duration::from_secs(secs)),
        None => config,
    }
}

/// Lint the contents of `path`.
async fn cmd_lint(
    checker: &SyntaxChecker,
    path: &Path,
    language: LanguageArg,
) -> Result<LintVerdict> {
    let snippet = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read script {}", path.display()))?;
    let hint = language.hint(&snippet);
    info!(file = %path.display(), hint = ?hint, "linting script");
    Ok(checker.lint(&snippet, hint).await)
}

fn render_verdict(verdict: &LintVerdict) -> String {
    let status = if verdict.passed { "PASS" } else { "FAIL" };
    format!("{status} [{:?}] {}", verdict.mode, verdict.output())
}

fn cmd_plan(request: &str) -> String {
    let plan = build_plan(request);
    let mut out = format!("Plan: {plan}\n");
    for (i, step) in plan.steps.iter().enumerate() {
        out.push_str(&format!("  {}. {step}\n", i + 1));
    }
    out
}

fn cmd_diagnose(request: &str) -> Result<String> {
    serde_json::to_string_pretty(&diagnose(request)).context("Failed to encode diagnosis")
}

fn build_service(offline: bool) -> Result<RemediationService> {
    let snow = ServiceNowConfig::from_env();
    let backend: Arc<dyn IncidentBackend> = if offline {
        Arc::new(MemoryIncidentBackend::new())
    } else {
        Arc::new(
            ServiceNowClient::new(snow.clone()).context("Failed to build ServiceNow client")?,
        )
    };
    let checker = SyntaxChecker::new(Toolchain::discover(), LintConfig::from_env());

    Ok(RemediationService::new(
        backend,
        Arc::new(TemplateScriptRunner::new(checker)),
        Arc::new(MemoryTaskStore::new()),
    )
    .with_caller(snow.caller)
    .with_resolution_code(snow.default_resolution_code))
}

/// Open an incident for `request` and run it to completion.
async fn cmd_run(service: &RemediationService, request: &str) -> Result<ExecuteResponse> {
    service
        .execute(request, false)
        .await
        .context("Remediation run failed")
}

fn render_toolchain(toolchain: &Toolchain) -> String {
    let show = |path: &Option<PathBuf>| {
        path.as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(not found)".to_string())
    };
    format!(
        "bash:       {}\npowershell: {}\n",
        show(&toolchain.bash),
        show(&toolchain.powershell)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use remediator_core::script_lint::CheckMode;

    fn degraded_checker() -> SyntaxChecker {
        SyntaxChecker::new(Toolchain::none(), LintConfig::default())
    }

    #[test]
    fn test_cli_parses_lint_flags() {
        let cli = Cli::try_parse_from([
            "remediator",
            "--json",
            "lint",
            "fix.ps1",
            "--language",
            "powershell",
            "--timeout",
            "5",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Lint {
                file,
                language,
                timeout,
            } => {
                assert_eq!(file, PathBuf::from("fix.ps1"));
                assert_eq!(language, LanguageArg::Powershell);
                assert_eq!(timeout, Some(5));
            }
            _ => panic!("expected lint"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_language() {
        assert!(Cli::try_parse_from(["remediator", "lint", "x", "--language", "ruby"]).is_err());
    }

    #[test]
    fn test_language_hints() {
        assert_eq!(
            LanguageArg::Auto.hint("New-Item -Path C:\\temp"),
            Some(ScriptLanguage::PowerShell)
        );
        assert_eq!(LanguageArg::Auto.hint("uptime"), Some(ScriptLanguage::Bash));
        assert_eq!(LanguageArg::Any.hint("uptime"), None);
        assert_eq!(LanguageArg::Bash.hint("New-Item"), Some(ScriptLanguage::Bash));
    }

    #[test]
    fn test_lint_config_timeout_override() {
        assert_eq!(lint_config(Some(3)).timeout, Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_cmd_lint_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ok.sh");
        std::fs::write(&path, "mkdir -p /tmp/logs\nuptime > /tmp/logs/sys_status.log").unwrap();

        let verdict = cmd_lint(&degraded_checker(), &path, LanguageArg::Bash)
            .await
            .unwrap();
        assert!(verdict.passed);
        assert_eq!(verdict.mode, CheckMode::Heuristic);
        assert!(render_verdict(&verdict).starts_with("PASS"));
    }

    #[tokio::test]
    async fn test_cmd_lint_reports_imbalance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.sh");
        std::fs::write(&path, "echo \"unterminated").unwrap();

        let verdict = cmd_lint(&degraded_checker(), &path, LanguageArg::Bash)
            .await
            .unwrap();
        assert!(!verdict.passed);
        assert!(render_verdict(&verdict).starts_with("FAIL"));
    }

    #[tokio::test]
    async fn test_cmd_lint_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = cmd_lint(&degraded_checker(), &dir.path().join("nope.sh"), LanguageArg::Any)
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("Failed to read script"));
    }

    #[test]
    fn test_cmd_plan_lists_steps() {
        let out = cmd_plan("write an email summary");
        assert!(out.starts_with("Plan: email\n"));
        assert!(out.contains("  1. email"));
    }

    #[test]
    fn test_cmd_diagnose_is_json() {
        let out = cmd_diagnose("high cpu on windows server").unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["root_cause"], "Wsappx process consuming abnormal CPU");
    }

    #[tokio::test]
    async fn test_cmd_run_offline_resolves() {
        let service = build_service(true).unwrap();
        let response = cmd_run(&service, "diagnose cpu on vm-node1 and fix it")
            .await
            .unwrap();
        match response {
            ExecuteResponse::Completed(outcome) => {
                assert_eq!(outcome.status, "resolved");
                assert!(outcome.servicenow_updated);
                assert!(outcome.diagnosis.is_some());
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn test_render_toolchain() {
        let checker = SyntaxChecker::new(
            Toolchain::none().with_bash("/bin/bash"),
            LintConfig::default(),
        );
        let out = render_toolchain(checker.toolchain());
        assert!(out.contains("bash:       /bin/bash"));
        assert!(out.contains("powershell: (not found)"));
    }
}
