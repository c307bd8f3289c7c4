use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::server::state::AppState;

/// Health check endpoint (liveness)
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "vitrine",
        "version": vitrine_core::VERSION,
        "uptime_seconds": state.started.elapsed().as_secs(),
        "catalog_size": state.vitrine.catalog_size(),
        "credits_enabled": state.gate.is_some(),
    }))
}
