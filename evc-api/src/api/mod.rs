//! HTTP API handlers for evc-api

pub mod events;
pub mod health;
pub mod recommendations;
pub mod taxonomies;
pub mod user;

pub use events::event_routes;
pub use health::health_routes;
pub use recommendations::recommendation_routes;
pub use taxonomies::taxonomy_routes;
pub use user::user_routes;

use axum::Json;
use serde::Serialize;
use std::collections::HashMap;
use std::str::FromStr;

use crate::error::{ApiError, ApiResult};

/// Success envelope: `{success: true, data}`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

/// Raw query string parameters
///
/// Handlers parse values themselves so malformed input becomes a JSON 400
/// instead of axum's plain-text rejection.
pub type QueryParams = HashMap<String, String>;

/// Non-empty, trimmed string parameter
pub(crate) fn query_string(params: &QueryParams, key: &str) -> Option<String> {
    params
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Parsed numeric parameter; present but unparsable is a 400
pub(crate) fn query_number<T: FromStr>(params: &QueryParams, key: &str) -> ApiResult<Option<T>> {
    match query_string(params, key) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ApiError::BadRequest(format!("Invalid {} parameter", key))),
    }
}

/// Comma-separated list parameter
pub(crate) fn query_list(params: &QueryParams, key: &str) -> Vec<String> {
    query_string(params, key)
        .map(|raw| {
            raw.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

pub(crate) fn query_flag(params: &QueryParams, key: &str) -> bool {
    matches!(
        query_string(params, key).as_deref(),
        Some("true") | Some("1") | Some("yes")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_blank_values_are_absent() {
        let q = params(&[("city", "  "), ("state", " NY ")]);
        assert_eq!(query_string(&q, "city"), None);
        assert_eq!(query_string(&q, "state").as_deref(), Some("NY"));
    }

    #[test]
    fn test_bad_number_is_bad_request() {
        let q = params(&[("per_page", "ten"), ("page", "2")]);
        assert!(matches!(
            query_number::<u32>(&q, "per_page"),
            Err(ApiError::BadRequest(msg)) if msg == "Invalid per_page parameter"
        ));
        assert_eq!(query_number::<u32>(&q, "page").unwrap(), Some(2));
        assert_eq!(query_number::<u32>(&q, "missing").unwrap(), None);
    }

    #[test]
    fn test_list_and_flag() {
        let q = params(&[("interests", "sports, ,comedy"), ("resolve_performers", "true")]);
        assert_eq!(query_list(&q, "interests"), vec!["sports", "comedy"]);
        assert!(query_flag(&q, "resolve_performers"));
        assert!(!query_flag(&q, "other"));
    }
}
