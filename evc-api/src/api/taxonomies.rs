//! Category listing

use axum::{extract::State, routing::get, Json, Router};
use evc_common::models::Taxonomy;
use serde::Serialize;

use super::ApiResponse;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct TaxonomyList {
    pub taxonomies: Vec<Taxonomy>,
}

/// GET /api/taxonomies
///
/// Always 200; the service substitutes the built-in categories when the
/// provider cannot list them.
pub async fn list_taxonomies(State(state): State<AppState>) -> Json<ApiResponse<TaxonomyList>> {
    let taxonomies = state.search.get_taxonomies().await;
    ApiResponse::ok(TaxonomyList { taxonomies })
}

pub fn taxonomy_routes() -> Router<AppState> {
    Router::new().route("/api/taxonomies", get(list_taxonomies))
}
