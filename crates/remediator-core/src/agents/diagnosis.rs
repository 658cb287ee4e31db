//! Deterministic root-cause heuristic over the request text.

use serde::{Deserialize, Serialize};

const CPU_TERMS: &[&str] = &["cpu", "95%", "100%"];
const WINDOWS_TERMS: &[&str] = &[
    "windows",
    "windows server",
    "win2019",
    "win2022",
    "ws2019",
    "ws2022",
];
const HOST_HINTS: &[&str] = &[
    "server", "vm", "vm-", "vm_", "vmnode", "vm-node", "node", "node1", "vm-node1",
];

pub const WSAPPX_ROOT_CAUSE: &str = "Wsappx process consuming abnormal CPU";
pub const UNKNOWN_ROOT_CAUSE: &str = "Unknown — insufficient data";
pub const FAILED_ROOT_CAUSE: &str = "Unknown — error";

/// Confidence attached to a suggested solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    pub title: String,
    pub confidence: Confidence,
}

impl Solution {
    fn new(title: &str, confidence: Confidence) -> Self {
        Self {
            title: title.to_string(),
            confidence,
        }
    }
}

/// Output of the diagnose step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub root_cause: String,
    #[serde(default)]
    pub evidence: Vec<String>,
    #[serde(default)]
    pub solutions: Vec<Solution>,
    /// Set only on the placeholder recorded when the step failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Diagnosis {
    /// Placeholder for a diagnose step that raised.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            root_cause: FAILED_ROOT_CAUSE.to_string(),
            evidence: Vec::new(),
            solutions: Vec::new(),
            error: Some(error.into()),
        }
    }
}

fn has_any(text: &str, terms: &[&str]) -> bool {
    terms.iter().any(|term| text.contains(term))
}

/// Diagnose a free-text request.
///
/// A CPU symptom on a Windows or generic host (server/vm/node) is attributed
/// to `wsappx`; anything else is reported as unknown.
pub fn diagnose(request: &str) -> Diagnosis {
    let text = request.to_lowercase();

    if has_any(&text, CPU_TERMS) && (has_any(&text, WINDOWS_TERMS) || has_any(&text, HOST_HINTS)) {
        Diagnosis {
            root_cause: WSAPPX_ROOT_CAUSE.to_string(),
            evidence: vec![
                "Task Manager shows high CPU in wsappx during Store operations".to_string(),
                "Perfmon counters for \\Process(wsappx)\\% Processor Time spike with disk activity"
                    .to_string(),
            ],
            solutions: vec![
                Solution::new("Apply latest cumulative updates", Confidence::High),
                Solution::new(
                    "Disable Microsoft Store auto-updates via policy",
                    Confidence::Medium,
                ),
                Solution::new("Schedule Store maintenance off-peak", Confidence::Medium),
            ],
            error: None,
        }
    } else {
        Diagnosis {
            root_cause: UNKNOWN_ROOT_CAUSE.to_string(),
            evidence: vec!["No high-confidence signature detected in request text.".to_string()],
            solutions: vec![Solution::new(
                "Collect perf counters and review top processes",
                Confidence::Low,
            )],
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_on_windows_is_wsappx() {
        let d = diagnose("Windows Server 2019 CPU at 95%");
        assert_eq!(d.root_cause, WSAPPX_ROOT_CAUSE);
        assert_eq!(d.evidence.len(), 2);
        let confidences: Vec<_> = d.solutions.iter().map(|s| s.confidence).collect();
        assert_eq!(
            confidences,
            vec![Confidence::High, Confidence::Medium, Confidence::Medium]
        );
    }

    #[test]
    fn test_cpu_on_generic_host_is_wsappx() {
        assert_eq!(diagnose("CPU pegged on vm-node1").root_cause, WSAPPX_ROOT_CAUSE);
        assert_eq!(diagnose("load 100% on node").root_cause, WSAPPX_ROOT_CAUSE);
    }

    #[test]
    fn test_cpu_without_host_is_unknown() {
        let d = diagnose("cpu is high");
        assert_eq!(d.root_cause, UNKNOWN_ROOT_CAUSE);
        assert_eq!(d.evidence.len(), 1);
        assert_eq!(d.solutions.len(), 1);
        assert_eq!(d.solutions[0].confidence, Confidence::Low);
    }

    #[test]
    fn test_host_without_cpu_is_unknown() {
        assert_eq!(
            diagnose("windows server disk is full").root_cause,
            UNKNOWN_ROOT_CAUSE
        );
        assert_eq!(diagnose("").root_cause, UNKNOWN_ROOT_CAUSE);
    }

    #[test]
    fn test_confidence_serializes_lowercase() {
        let json = serde_json::to_string(&Confidence::High).unwrap();
        assert_eq!(json, "\"high\"");
    }

    #[test]
    fn test_failed_placeholder_carries_error() {
        let d = Diagnosis::failed("boom");
        assert_eq!(d.root_cause, FAILED_ROOT_CAUSE);
        assert_eq!(d.error.as_deref(), Some("boom"));
        let value = serde_json::to_value(&d).unwrap();
        assert_eq!(value["error"], "boom");
        assert!(serde_json::to_value(diagnose("x")).unwrap().get("error").is_none());
    }
}
