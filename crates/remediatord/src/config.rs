//! Daemon configuration from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `REMEDIATOR_BIND_ADDR` | `0.0.0.0:8000` |
//! | `REMEDIATOR_BACKEND` | `servicenow` (or `memory`) |
//! | `REMEDIATOR_LOG_FORMAT` | text (`json` for JSON lines) |
//! | `REMEDIATOR_LINT_TIMEOUT_SECS` | `30` |
//! | `SERVICENOW_*`, `DEFAULT_RESOLUTION_CODE` | see `ServiceNowConfig` |

use std::fmt;
use std::str::FromStr;

use remediator_core::incident_state::ServiceNowConfig;
use remediator_core::script_lint::LintConfig;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

/// Which incident backend the daemon talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    ServiceNow,
    Memory,
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "servicenow" | "snow" => Ok(BackendKind::ServiceNow),
            "memory" | "in-memory" => Ok(BackendKind::Memory),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::ServiceNow => f.write_str("servicenow"),
            BackendKind::Memory => f.write_str("memory"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub bind_addr: String,
    pub backend: BackendKind,
    pub servicenow: ServiceNowConfig,
    pub lint: LintConfig,
    pub json_logs: bool,
}

impl DaemonConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let backend = match std::env::var("REMEDIATOR_BACKEND") {
            Ok(value) if !value.trim().is_empty() => value.parse()?,
            _ => BackendKind::ServiceNow,
        };
        Ok(Self {
            bind_addr: std::env::var("REMEDIATOR_BIND_ADDR")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            backend,
            servicenow: ServiceNowConfig::from_env(),
            lint: LintConfig::from_env(),
            json_logs: remediator_core::json_requested(),
        })
    }

    /// In-memory backend with default settings; used by tests.
    pub fn memory() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            backend: BackendKind::Memory,
            servicenow: ServiceNowConfig::unconfigured(),
            lint: LintConfig::default(),
            json_logs: false,
        }
    }

    pub fn with_bind_addr(mut self, addr: impl Into<String>) -> Self {
        self.bind_addr = addr.into();
        self
    }

    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }
}
