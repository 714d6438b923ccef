//! Event search and detail endpoints

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use evc_common::models::Event;
use serde::Serialize;
use tracing::debug;

use super::{query_number, query_string, ApiResponse, QueryParams};
use crate::error::{ApiError, ApiResult};
use crate::services::{filter_events_by_price, sort_events_by_score};
use crate::source::{EventSearchParams, SearchMeta};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct EventListMeta {
    #[serde(flatten)]
    pub upstream: SearchMeta,
    /// Events left after the local price filter
    pub filtered_count: usize,
}

#[derive(Debug, Serialize)]
pub struct EventList {
    pub events: Vec<Event>,
    pub meta: EventListMeta,
}

/// GET /api/events
///
/// Query: q, city, state, date_from, date_to, taxonomy, per_page, page, sort,
/// min_price, max_price. `sort=score` is sent upstream as `score.desc` and
/// re-applied locally.
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<QueryParams>,
) -> ApiResult<Json<ApiResponse<EventList>>> {
    let sort = query_string(&query, "sort");
    let sort_by_score = sort.as_deref() == Some("score");
    let min_price: Option<f64> = query_number(&query, "min_price")?;
    let max_price: Option<f64> = query_number(&query, "max_price")?;

    let params = EventSearchParams {
        q: query_string(&query, "q"),
        venue_city: query_string(&query, "city"),
        venue_state: query_string(&query, "state"),
        datetime_utc_gte: query_string(&query, "date_from"),
        datetime_utc_lte: query_string(&query, "date_to"),
        taxonomies_name: query_string(&query, "taxonomy"),
        per_page: query_number(&query, "per_page")?,
        page: query_number(&query, "page")?,
        sort: if sort_by_score {
            Some("score.desc".to_string())
        } else {
            sort
        },
    };

    let response = state
        .search
        .search_events(&params)
        .await
        .map_err(|e| ApiError::upstream("Failed to fetch events", e))?;

    let mut events = response.events;
    if min_price.is_some() || max_price.is_some() {
        events = filter_events_by_price(&events, min_price, max_price);
    }
    if sort_by_score {
        events = sort_events_by_score(&events, false);
    }

    debug!(returned = events.len(), total = response.meta.total, "Event search complete");

    Ok(ApiResponse::ok(EventList {
        meta: EventListMeta {
            upstream: response.meta,
            filtered_count: events.len(),
        },
        events,
    }))
}

/// GET /api/events/:id
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Event>>> {
    let event_id: i64 = id
        .trim()
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid event ID".to_string()))?;

    state
        .search
        .get_event_by_id(event_id)
        .await
        .map_err(|e| ApiError::upstream("Failed to fetch event details", e))?
        .map(ApiResponse::ok)
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))
}

pub fn event_routes() -> Router<AppState> {
    Router::new()
        .route("/api/events", get(list_events))
        .route("/api/events/:id", get(get_event))
}
