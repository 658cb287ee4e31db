//! remediatord: serves the remediation API.
//!
//! Reads config from env vars (optionally from `.env`); see
//! [`remediatord::DaemonConfig`].

use anyhow::{Context, Result};
use remediatord::{build_router, build_state, BackendKind, DaemonConfig};
use tokio::net::TcpListener;
use tracing::{info, warn, Level};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = DaemonConfig::from_env()?;
    remediator_core::init_tracing(config.json_logs, Level::INFO);

    match config.backend {
        BackendKind::ServiceNow if !config.servicenow.is_configured() => {
            warn!("ServiceNow credentials are not set; backend calls will fail");
        }
        BackendKind::Memory => warn!("Using in-memory incident backend; nothing is persisted"),
        _ => {}
    }

    let state = build_state(&config)?;
    let app = build_router(state);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, backend = %config.backend, "remediatord listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
