//! Recommendation endpoints
//!
//! Thin adapters from query strings to [`RecommendationEngine`] views. Mood
//! axes are validated here so invalid values never reach the engine.
//!
//! [`RecommendationEngine`]: crate::services::RecommendationEngine

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use evc_common::models::{
    Event, MoodParams, RecommendationMeta, RecommendationParams, RecommendationResult,
};
use serde::Serialize;
use tracing::{debug, info};

use super::{query_flag, query_list, query_number, query_string, ApiResponse, QueryParams};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

type RecommendationResponse = ApiResult<Json<ApiResponse<RecommendationResult>>>;

/// Location, scope, interests and paging shared by every view
fn parse_params(query: &QueryParams) -> ApiResult<RecommendationParams> {
    Ok(RecommendationParams {
        lat: query_number(query, "lat")?,
        lon: query_number(query, "lon")?,
        city: query_string(query, "city"),
        state: query_string(query, "state"),
        interests: query_list(query, "interests"),
        performer_ids: query_list(query, "performer_ids")
            .iter()
            .map(|id| {
                id.parse()
                    .map_err(|_| ApiError::BadRequest("Invalid performer_ids parameter".to_string()))
            })
            .collect::<ApiResult<Vec<i64>>>()?,
        event_id: None,
        page: query_number(query, "page")?,
        per_page: query_number(query, "per_page")?,
    })
}

/// Fill unseeded requests from the stored preferences
async fn apply_stored_preferences(
    state: &AppState,
    params: &mut RecommendationParams,
) -> ApiResult<()> {
    let unseeded = params.location().is_none()
        && params.city.is_none()
        && params.interests.is_empty()
        && params.performer_ids.is_empty();
    if !unseeded {
        return Ok(());
    }

    let Some(prefs) = state.store.get_default_user_preferences().await? else {
        return Ok(());
    };

    if let Some(location) = &prefs.location {
        params.lat = Some(location.lat);
        params.lon = Some(location.lng);
        params.city = Some(location.city.clone());
        params.state = location.state.clone();
    }
    params.interests = prefs.taxonomy_interests();

    debug!(
        city = ?params.city,
        interests = ?params.interests,
        "Recommendation request filled from stored preferences"
    );
    Ok(())
}

/// GET /api/recommendations
///
/// Query: lat, lon, city, state, interests, performer_ids, per_page, page,
/// resolve_performers.
pub async fn personalized(
    State(state): State<AppState>,
    Query(query): Query<QueryParams>,
) -> RecommendationResponse {
    let mut params = parse_params(&query)?;
    apply_stored_preferences(&state, &mut params).await?;

    if query_flag(&query, "resolve_performers")
        && params.location().is_none()
        && params.performer_ids.is_empty()
        && !params.interests.is_empty()
    {
        params.performer_ids = state
            .engine
            .resolve_interests_to_performers(&params.interests)
            .await;
        debug!(performers = params.performer_ids.len(), "Resolved interests to performers");
    }

    let result = state
        .engine
        .personalized(&params)
        .await
        .map_err(|e| ApiError::upstream("Failed to fetch recommendations", e))?;
    Ok(ApiResponse::ok(result))
}

/// GET /api/recommendations/trending
pub async fn trending(
    State(state): State<AppState>,
    Query(query): Query<QueryParams>,
) -> RecommendationResponse {
    let params = parse_params(&query)?;
    let result = state
        .engine
        .trending(&params)
        .await
        .map_err(|e| ApiError::upstream("Failed to fetch trending events", e))?;
    Ok(ApiResponse::ok(result))
}

/// GET /api/recommendations/similar/:event_id
pub async fn similar(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    Query(query): Query<QueryParams>,
) -> RecommendationResponse {
    let event_id: i64 = event_id
        .trim()
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid event ID".to_string()))?;

    let params = RecommendationParams {
        event_id: Some(event_id),
        page: query_number(&query, "page")?,
        per_page: query_number(&query, "per_page")?,
        ..Default::default()
    };

    Ok(ApiResponse::ok(state.engine.similar(event_id, &params).await))
}

/// GET /api/recommendations/hidden-gems
pub async fn hidden_gems(
    State(state): State<AppState>,
    Query(query): Query<QueryParams>,
) -> RecommendationResponse {
    let params = parse_params(&query)?;
    let result = state
        .engine
        .hidden_gems(&params)
        .await
        .map_err(|e| ApiError::upstream("Failed to fetch hidden gems", e))?;
    Ok(ApiResponse::ok(result))
}

#[derive(Debug, Serialize)]
pub struct MoodMeta {
    #[serde(flatten)]
    pub result: RecommendationMeta,
    pub mood: MoodParams,
}

#[derive(Debug, Serialize)]
pub struct MoodResult {
    pub events: Vec<Event>,
    pub meta: MoodMeta,
}

/// GET /api/recommendations/mood
///
/// Query: energy (high|low|any), social (group|intimate|any),
/// budget (low|medium|high|any), each defaulting to `any`.
pub async fn mood(
    State(state): State<AppState>,
    Query(query): Query<QueryParams>,
) -> ApiResult<Json<ApiResponse<MoodResult>>> {
    let axis = |key: &str| query_string(&query, key).unwrap_or_else(|| "any".to_string());
    let mood = MoodParams::parse(&axis("energy"), &axis("social"), &axis("budget"))?;
    let params = parse_params(&query)?;

    info!(mood = ?mood, city = ?params.city, "Mood-based recommendations requested");

    let result = state.engine.mood_based(&mood, &params).await;
    Ok(ApiResponse::ok(MoodResult {
        events: result.events,
        meta: MoodMeta {
            result: result.meta,
            mood,
        },
    }))
}

pub fn recommendation_routes() -> Router<AppState> {
    Router::new()
        .route("/api/recommendations", get(personalized))
        .route("/api/recommendations/trending", get(trending))
        .route("/api/recommendations/similar/:event_id", get(similar))
        .route("/api/recommendations/hidden-gems", get(hidden_gems))
        .route("/api/recommendations/mood", get(mood))
}
