//! Keyword planner: which steps a request asks for.

use std::fmt;

use serde::{Deserialize, Serialize};

const DIAGNOSE_KEYWORDS: &[&str] = &["diagnose", "rca", "why", "root cause", "investigate", "analysis"];
const SCRIPT_KEYWORDS: &[&str] = &[
    "script",
    "powershell",
    "bash",
    "az cli",
    "collector",
    "automation",
    "remediation",
    "fix",
];
const EMAIL_KEYWORDS: &[&str] = &["email", "summary", "report", "sop", "write", "draft"];

/// One unit of work in a remediation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanStep {
    Diagnose,
    Script,
    Email,
}

impl PlanStep {
    pub fn name(&self) -> &'static str {
        match self {
            PlanStep::Diagnose => "diagnose",
            PlanStep::Script => "script",
            PlanStep::Email => "email",
        }
    }

    fn keywords(&self) -> &'static [&'static str] {
        match self {
            PlanStep::Diagnose => DIAGNOSE_KEYWORDS,
            PlanStep::Script => SCRIPT_KEYWORDS,
            PlanStep::Email => EMAIL_KEYWORDS,
        }
    }
}

impl fmt::Display for PlanStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered steps. Always diagnose before script before email, each at most once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub steps: Vec<PlanStep>,
}

impl Plan {
    pub fn contains(&self, step: PlanStep) -> bool {
        self.steps.contains(&step)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.steps.iter().map(PlanStep::name).collect();
        f.write_str(&names.join(", "))
    }
}

/// Build the plan for a request by case-insensitive substring match.
///
/// Nothing matched means `[diagnose, script]`. The email step is appended
/// whenever it is missing.
pub fn build_plan(request: &str) -> Plan {
    let text = request.to_lowercase();
    let mut steps: Vec<PlanStep> = [PlanStep::Diagnose, PlanStep::Script, PlanStep::Email]
        .into_iter()
        .filter(|step| step.keywords().iter().any(|k| text.contains(k)))
        .collect();

    if steps.is_empty() {
        steps = vec![PlanStep::Diagnose, PlanStep::Script];
    }
    if !steps.contains(&PlanStep::Email) {
        steps.push(PlanStep::Email);
    }
    Plan { steps }
}
