//! API route handlers
//!
//! - `search`: catalog retrieval by image, text or both
//! - `classify`: zero-shot label scoring
//! - `detect`: fashion object detection
//! - `segment`: ATR/LIP human parsing overlays
//! - `health`: liveness

pub mod classify;
pub mod detect;
pub mod health;
pub mod search;
pub mod segment;

use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use super::error::{ApiError, ApiResult};

/// Run model inference on the blocking pool.
pub(crate) async fn run_blocking<T, F>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> vitrine_core::PipelineResult<T> + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(f).await??)
}

/// Service name, version and endpoints.
pub async fn api_info() -> impl IntoResponse {
    Json(json!({
        "name": "Vitrine",
        "version": vitrine_core::VERSION,
        "api_version": "v1",
        "endpoints": [
            "/api/v1/search/",
            "/api/v1/classify/",
            "/api/v1/segment/",
            "/api/v1/detect/",
            "/health",
            "/static/"
        ]
    }))
}

/// 404 Not Found handler
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
