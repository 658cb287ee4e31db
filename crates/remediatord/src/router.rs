//! Router construction for the remediator daemon.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{self, AppState};

/// Build the full router: API routes under `/api/v1` plus `/health`.
pub fn build_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/execute", post(handlers::execute))
        .route("/plans/:id/approve", post(handlers::approve))
        .route("/plans/:id/reject", post(handlers::reject))
        .route("/tasks/:id", get(handlers::get_task));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
