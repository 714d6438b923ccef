//! Profile, onboarding and search history endpoints
//!
//! The onboarding wizard state lives in memory (one per process) and reaches
//! the preference store only on completion.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    routing::{get, post},
    Json, Router,
};
use evc_common::models::{
    BudgetRange, GroupSize, InterestCategory, SearchFilters, SearchHistoryEntry, UserLocation,
    UserPreferences, UserProfile,
};
use evc_common::OnboardingState;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;

use super::{query_number, ApiResponse, QueryParams};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

const DEFAULT_HISTORY_LIMIT: u32 = 10;

#[derive(Debug, Serialize)]
pub struct UserSnapshot {
    pub profile: UserProfile,
    pub preferences: Option<UserPreferences>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Navigate {
    Next,
    Previous,
}

/// Partial onboarding update
///
/// Absent fields are left alone. `location` and `groupSize` may be sent as
/// `null` to clear them.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingPatch {
    pub current_step: Option<u8>,
    pub navigate: Option<Navigate>,
    #[serde(default, deserialize_with = "present")]
    pub location: Option<Option<UserLocation>>,
    pub interests: Option<Vec<InterestCategory>>,
    pub toggle_interest: Option<InterestCategory>,
    pub budget_range: Option<BudgetRange>,
    #[serde(default, deserialize_with = "present")]
    pub group_size: Option<Option<GroupSize>>,
}

/// Distinguish an explicit `null` from a missing field
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl OnboardingPatch {
    fn apply(self, state: &mut OnboardingState) -> evc_common::Result<()> {
        if let Some(step) = self.current_step {
            state.set_step(step)?;
        }
        match self.navigate {
            Some(Navigate::Next) => state.next_step(),
            Some(Navigate::Previous) => state.previous_step(),
            None => {}
        }
        if let Some(location) = self.location {
            state.set_location(location);
        }
        if let Some(interests) = self.interests {
            state.set_interests(interests);
        }
        if let Some(interest) = self.toggle_interest {
            state.toggle_interest(interest);
        }
        if let Some(range) = self.budget_range {
            state.set_budget_range(range)?;
        }
        if let Some(size) = self.group_size {
            state.set_group_size(size);
        }
        Ok(())
    }
}

/// GET /api/user
pub async fn get_user(State(state): State<AppState>) -> ApiResult<Json<ApiResponse<UserSnapshot>>> {
    let profile = state.store.ensure_default_user().await?;
    let preferences = state.store.get_default_user_preferences().await?;
    Ok(ApiResponse::ok(UserSnapshot {
        profile,
        preferences,
    }))
}

/// GET /api/user/onboarding
pub async fn get_onboarding(State(state): State<AppState>) -> Json<ApiResponse<OnboardingState>> {
    let onboarding = state.onboarding.read().await.clone();
    ApiResponse::ok(onboarding)
}

/// PATCH /api/user/onboarding
///
/// All-or-nothing: a rejected field leaves the wizard untouched.
pub async fn update_onboarding(
    State(state): State<AppState>,
    payload: Result<Json<OnboardingPatch>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<OnboardingState>>> {
    let Json(patch) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let mut guard = state.onboarding.write().await;
    let mut updated = guard.clone();
    patch.apply(&mut updated)?;
    *guard = updated.clone();

    Ok(ApiResponse::ok(updated))
}

/// POST /api/user/onboarding/complete
pub async fn complete_onboarding(
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<UserSnapshot>>> {
    let onboarding = state.onboarding.read().await.clone();
    let existing = state.store.get_default_user_preferences().await?;
    let prefs = onboarding.to_preferences(existing.as_ref());

    let (profile, preferences) = state.store.complete_onboarding(&prefs).await?;
    Ok(ApiResponse::ok(UserSnapshot {
        profile,
        preferences: Some(preferences),
    }))
}

/// POST /api/user/onboarding/reset
pub async fn reset_onboarding(State(state): State<AppState>) -> Json<ApiResponse<OnboardingState>> {
    let mut guard = state.onboarding.write().await;
    guard.reset();
    ApiResponse::ok(guard.clone())
}

/// POST /api/user/reset
///
/// Wipes every stored record, then re-creates the default user.
pub async fn reset_user(State(state): State<AppState>) -> ApiResult<Json<ApiResponse<UserSnapshot>>> {
    state.store.clear_all_data().await?;
    let profile = state.store.ensure_default_user().await?;
    state.onboarding.write().await.reset();

    info!("User data reset");
    Ok(ApiResponse::ok(UserSnapshot {
        profile,
        preferences: None,
    }))
}

/// GET /api/user/history?limit=
pub async fn get_history(
    State(state): State<AppState>,
    Query(query): Query<QueryParams>,
) -> ApiResult<Json<ApiResponse<Vec<SearchHistoryEntry>>>> {
    let limit = query_number(&query, "limit")?.unwrap_or(DEFAULT_HISTORY_LIMIT);
    let entries = state.store.recent_search_history(limit).await?;
    Ok(ApiResponse::ok(entries))
}

#[derive(Debug, Deserialize)]
pub struct NewHistoryEntry {
    pub query: String,
    #[serde(default)]
    pub filters: SearchFilters,
}

/// POST /api/user/history
pub async fn add_history(
    State(state): State<AppState>,
    payload: Result<Json<NewHistoryEntry>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<SearchHistoryEntry>>> {
    let Json(entry) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    if entry.query.trim().is_empty() {
        return Err(ApiError::BadRequest("Search query cannot be empty".to_string()));
    }

    let saved = state
        .store
        .add_search_history(entry.query.trim(), &entry.filters)
        .await?;
    Ok(ApiResponse::ok(saved))
}

#[derive(Debug, Serialize)]
pub struct Cleared {
    pub cleared: bool,
}

/// DELETE /api/user/history
pub async fn clear_history(State(state): State<AppState>) -> ApiResult<Json<ApiResponse<Cleared>>> {
    state.store.clear_search_history().await?;
    Ok(ApiResponse::ok(Cleared { cleared: true }))
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/api/user", get(get_user))
        .route(
            "/api/user/onboarding",
            get(get_onboarding).patch(update_onboarding),
        )
        .route("/api/user/onboarding/complete", post(complete_onboarding))
        .route("/api/user/onboarding/reset", post(reset_onboarding))
        .route("/api/user/reset", post(reset_user))
        .route(
            "/api/user/history",
            get(get_history).post(add_history).delete(clear_history),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn patch(value: serde_json::Value) -> OnboardingPatch {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_null_clears_but_absent_keeps() {
        let mut state = OnboardingState::new();
        state.set_group_size(Some(GroupSize::Couple));

        patch(json!({ "currentStep": 3 })).apply(&mut state).unwrap();
        assert_eq!(state.group_size, Some(GroupSize::Couple));
        assert_eq!(state.current_step, 3);

        patch(json!({ "groupSize": null })).apply(&mut state).unwrap();
        assert_eq!(state.group_size, None);
    }

    #[test]
    fn test_navigation_and_toggle() {
        let mut state = OnboardingState::new();
        patch(json!({ "navigate": "next", "toggleInterest": "jazz" }))
            .apply(&mut state)
            .unwrap();

        assert_eq!(state.current_step, 2);
        assert_eq!(state.interests, vec![InterestCategory::Jazz]);
    }

    #[test]
    fn test_invalid_budget_is_rejected() {
        let mut state = OnboardingState::new();
        let err = patch(json!({ "budgetRange": { "min": 300, "max": 100 } }))
            .apply(&mut state)
            .unwrap_err();
        assert!(matches!(err, evc_common::Error::InvalidInput(_)));
    }
}
