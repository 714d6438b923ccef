//! evc-api library - Event Concierge HTTP service
//!
//! Event search, recommendation views and the preference/onboarding surface,
//! served over axum. The remote event source is injected so the same router
//! runs against the live provider, the demo catalog, or a test double.

use axum::{http::StatusCode, response::IntoResponse, Json, Router};
use evc_common::db::PreferenceStore;
use evc_common::OnboardingState;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod source;

use services::{EventSearchService, RecommendationEngine};
use source::EventSource;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub search: EventSearchService,
    pub engine: RecommendationEngine,
    /// Preference store, opened by the composition root
    pub store: Arc<PreferenceStore>,
    /// In-progress onboarding wizard
    pub onboarding: Arc<RwLock<OnboardingState>>,
}

impl AppState {
    pub fn new(
        source: Arc<dyn EventSource>,
        store: Arc<PreferenceStore>,
        onboarding: OnboardingState,
    ) -> Self {
        Self {
            search: EventSearchService::new(Arc::clone(&source)),
            engine: RecommendationEngine::new(source),
            store,
            onboarding: Arc::new(RwLock::new(onboarding)),
        }
    }
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "success": false, "error": "Not found" })),
    )
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::event_routes())
        .merge(api::taxonomy_routes())
        .merge(api::recommendation_routes())
        .merge(api::user_routes())
        .fallback(not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
