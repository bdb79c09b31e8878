use crate::handler::{self, AppState};
use axum::Json;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

/// Build the public ingestion router.
///
/// `/api/log-request` and `/api/requests` are aliases for the same handler;
/// CORS is permissive; telemetry arrives from arbitrary origins.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/log-request", post(handler::log_request))
        .route("/api/requests", post(handler::log_request))
        .route("/api/health", get(health_check))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

/// Bind and serve until the process exits.
pub async fn serve(listen_addr: &str, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %listen_addr, "Starting ingestion server");

    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
