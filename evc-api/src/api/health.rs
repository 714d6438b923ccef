//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::source::SourceMode;
use crate::AppState;

/// Health check response
///
/// Reports whether live provider credentials are configured and which data
/// mode the service is running in.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub module: String,
    pub version: String,
    pub composio_configured: bool,
    pub mode: SourceMode,
    pub message: String,
}

/// GET /api/health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let mode = state.search.mode();
    let message = match mode {
        SourceMode::Live => "Using live SeatGeek data via Composio",
        SourceMode::Mock => "Using mock data - set COMPOSIO_API_KEY for live data",
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now().to_rfc3339(),
        module: "evc-api".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        composio_configured: mode == SourceMode::Live,
        mode,
        message: message.to_string(),
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/health", get(health_check))
}
