//! Combines the route tables of every module into the application router.

use axum::{extract::State, response::Json, routing::get, Router};
use std::sync::Arc;

use crate::shared::state::AppState;

pub fn configure_api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(crate::identity::configure_identity_routes())
        .merge(crate::directory::router::configure())
        .merge(crate::tickets::configure_tickets_routes())
        .merge(crate::tickets::assignment::configure_assignment_routes())
        .route("/health", get(handle_health))
        .route("/healthz", get(handle_healthz))
}

/// Liveness plus a database round-trip. Reports degraded instead of failing
/// so load balancers can tell "up but unhappy" from "down".
async fn handle_health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let database = match state.conn.get() {
        Ok(_) => "healthy",
        Err(_) => "degraded",
    };
    Json(serde_json::json!({
        "status": database,
        "service": "deskserver",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn handle_healthz() -> &'static str {
    "ok"
}
