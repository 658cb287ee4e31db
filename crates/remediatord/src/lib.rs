//! remediatord: HTTP surface for automated incident remediation.

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;

use std::sync::Arc;

use remediator_core::incident_state::{IncidentBackend, MemoryIncidentBackend, ServiceNowClient};
use remediator_core::script_lint::{SyntaxChecker, Toolchain};
use remediator_core::{MemoryTaskStore, RemediationService, TemplateScriptRunner};

pub use config::{BackendKind, DaemonConfig};
pub use error::{ApiError, ConfigError};
pub use handlers::AppState;
pub use router::build_router;

/// Wire the backend, script runner and task store selected by `config`.
pub fn build_state(config: &DaemonConfig) -> Result<Arc<AppState>, ConfigError> {
    let backend: Arc<dyn IncidentBackend> = match config.backend {
        BackendKind::ServiceNow => Arc::new(ServiceNowClient::new(config.servicenow.clone())?),
        BackendKind::Memory => Arc::new(MemoryIncidentBackend::new()),
    };
    let checker = SyntaxChecker::new(Toolchain::discover(), config.lint.clone());
    let service = RemediationService::new(
        backend,
        Arc::new(TemplateScriptRunner::new(checker)),
        Arc::new(MemoryTaskStore::new()),
    )
    .with_caller(config.servicenow.caller.clone())
    .with_resolution_code(config.servicenow.default_resolution_code.clone());

    Ok(Arc::new(AppState { service }))
}
