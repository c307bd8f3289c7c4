//! Server initialization and routing
//!
//! - Router with the `/api/v1` endpoints, health and static catalog images
//! - Middleware stack (credit gate, request id, logging, CORS, tracing)
//! - Graceful shutdown on Ctrl+C / SIGTERM

pub mod error;
pub mod form;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

use std::net::SocketAddr;

use axum::extract::DefaultBodyLimit;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use self::middleware::{credit_gate, log_requests, request_id};
use self::routes::{api_info, classify, detect, health, not_found, search, segment};

/// Room for multipart framing and text fields on top of the image itself.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Build the router.
///
/// Public: `/`, `/health`, `/static/*`. API routes under `/api/v1` sit behind
/// the credit gate when one is configured, and accept a trailing slash.
pub fn build_router(state: AppState) -> Router {
    let config = state.vitrine.config();

    let cors = if config.server.enable_cors {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    let body_limit =
        config.limits.max_file_size_mb as usize * 1024 * 1024 + MULTIPART_OVERHEAD_BYTES;

    let api_routes = Router::new()
        .route("/api/v1/search", post(search::search))
        .route("/api/v1/search/", post(search::search))
        .route("/api/v1/classify", post(classify::classify))
        .route("/api/v1/classify/", post(classify::classify))
        .route("/api/v1/segment", post(segment::segment))
        .route("/api/v1/segment/", post(segment::segment))
        .route("/api/v1/detect", post(detect::detect))
        .route("/api/v1/detect/", post(detect::detect))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(from_fn_with_state(state.clone(), credit_gate));

    let public_routes = Router::new()
        .route("/", get(api_info))
        .route("/health", get(health::health_check))
        .nest_service("/static", ServeDir::new(config.data_dir()));

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .fallback(not_found)
        .layer(cors)
        .layer(from_fn(log_requests))
        .layer(from_fn(request_id))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until Ctrl+C or SIGTERM.
pub async fn start_server(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state.clone());

    tracing::info!("Starting Vitrine server on {}", addr);
    tracing::info!(
        "Catalog: {} items, credits: {}, CORS: {}",
        state.vitrine.catalog_size(),
        if state.gate.is_some() { "enabled" } else { "disabled" },
        state.vitrine.config().server.enable_cors
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Shutdown signal handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
