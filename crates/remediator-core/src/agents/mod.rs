//! Deterministic step agents: diagnosis, script generation and the summary email.

pub mod diagnosis;
pub mod script;
pub mod summary;

pub use diagnosis::{diagnose, Confidence, Diagnosis, Solution};
pub use script::{
    generate_and_lint, ScriptResult, ScriptRunner, TemplateScriptRunner, PERF_COLLECTOR_TEMPLATE,
};
pub use summary::management_email;
