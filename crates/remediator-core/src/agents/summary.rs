//! Management summary email.

use crate::agents::diagnosis::Diagnosis;
use crate::agents::script::ScriptResult;

/// Render the management email for the run's diagnosis and script.
///
/// Missing inputs degrade to `unknown` root cause, `powershell` language and a
/// `fail/skip` lint line.
pub fn management_email(diagnosis: Option<&Diagnosis>, script: Option<&ScriptResult>) -> String {
    let root = diagnosis.map_or("unknown", |d| d.root_cause.as_str());
    let evidence = diagnosis.map(|d| d.evidence.as_slice()).unwrap_or_default();
    let lint_passed = script.is_some_and(|s| s.lint_passed);
    let language = script
        .and_then(|s| s.language)
        .map_or("powershell", |l| l.name());

    let mut lines = vec![
        "Subject: CPU spike incident - analysis & remediation".to_string(),
        String::new(),
        "Hello Team,".to_string(),
        String::new(),
        "We investigated the high CPU alerts reported on the Windows Server VM.".to_string(),
        format!("Root cause (preliminary): {root}."),
    ];

    if !evidence.is_empty() {
        lines.push(String::new());
        lines.push("Key evidence:".to_string());
        lines.extend(evidence.iter().map(|e| format!("- {e}")));
    }

    lines.extend([
        String::new(),
        "Remediation script:".to_string(),
        format!("- Language: {language}"),
        format!(
            "- Syntax check (lint): {}",
            if lint_passed { "pass" } else { "fail/skip" }
        ),
        String::new(),
        "Action items:".to_string(),
        "- Continue monitoring perf counters for the next 24 hours.".to_string(),
        "- Apply latest cumulative updates during the next maintenance window.".to_string(),
        String::new(),
        "Regards,".to_string(),
        "Ops Automation".to_string(),
    ]);

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::diagnosis::diagnose;
    use script_lint::{CheckMode, LintVerdict, ScriptLanguage};

    #[test]
    fn test_email_with_everything() {
        let diagnosis = diagnose("cpu 95% on windows server");
        let script = ScriptResult::linted(
            ScriptLanguage::PowerShell,
            "Write-Host hi",
            &LintVerdict::pass(CheckMode::Interpreter),
        );
        let email = management_email(Some(&diagnosis), Some(&script));

        assert!(email.starts_with("Subject: CPU spike incident - analysis & remediation\n"));
        assert!(email.contains("Root cause (preliminary): Wsappx process consuming abnormal CPU."));
        assert!(email.contains("Key evidence:\n- Task Manager"));
        assert!(email.contains("- Language: powershell"));
        assert!(email.contains("- Syntax check (lint): pass"));
        assert!(email.ends_with("Regards,\nOps Automation"));
    }

    #[test]
    fn test_email_with_nothing() {
        let email = management_email(None, None);
        assert!(email.contains("Root cause (preliminary): unknown."));
        assert!(!email.contains("Key evidence:"));
        assert!(email.contains("- Language: powershell"));
        assert!(email.contains("- Syntax check (lint): fail/skip"));
    }

    #[test]
    fn test_failed_script_reads_as_fail_skip() {
        let script = ScriptResult::failed("boom");
        let email = management_email(None, Some(&script));
        assert!(email.contains("- Syntax check (lint): fail/skip"));
    }
}
