//! Recommendation Aggregation Engine
//!
//! Five derived views over the event source (personalized, trending, similar,
//! hidden gems and mood-based) plus the best-effort interest→performer lookup
//! that feeds personalized seeds. All views are stateless and return a
//! [`RecommendationResult`] whose `meta.source` records provenance only.

use evc_common::models::{
    Event, MoodParams, RecommendationParams, RecommendationResult, ResultSource,
};
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::event_search::{filter_events_by_price, sort_events_by_score};
use super::mood::{budget_band, resolve_categories};
use crate::source::{
    EventSearchParams, EventSource, PerformerQuery, RecommendationSeed, SourceError, SourceMode,
};

pub const PERSONALIZED_PER_PAGE: u32 = 12;
pub const TRENDING_PER_PAGE: u32 = 10;
pub const SIMILAR_PER_PAGE: u32 = 6;
pub const HIDDEN_GEMS_PER_PAGE: u32 = 10;
pub const MOOD_PER_PAGE: u32 = 12;

/// Inclusive score band defining a hidden gem
pub const HIDDEN_GEM_MIN_SCORE: f64 = 0.20;
pub const HIDDEN_GEM_MAX_SCORE: f64 = 0.65;

/// Minimum upstream page size for the hidden-gems over-fetch
const HIDDEN_GEMS_MIN_FETCH: u32 = 50;

/// Performer ids forwarded as recommendation seeds
const MAX_SEED_PERFORMERS: usize = 5;

const MAX_RESOLVED_INTERESTS: usize = 3;
const PERFORMERS_PER_INTEREST: u32 = 3;
const MAX_RESOLVED_PERFORMERS: usize = 10;

#[derive(Clone)]
pub struct RecommendationEngine {
    source: Arc<dyn EventSource>,
}

impl RecommendationEngine {
    pub fn new(source: Arc<dyn EventSource>) -> Self {
        Self { source }
    }

    /// Provenance tag, overridden to `mock` when serving the demo catalog
    fn tag(&self, source: ResultSource) -> ResultSource {
        match self.source.mode() {
            SourceMode::Mock => ResultSource::Mock,
            SourceMode::Live => source,
        }
    }

    /// Seeded recommendations when a location or performers are known,
    /// otherwise a score-ordered search
    pub async fn personalized(
        &self,
        params: &RecommendationParams,
    ) -> Result<RecommendationResult, SourceError> {
        let (page, per_page) = params.paging(PERSONALIZED_PER_PAGE);
        let interests = normalized_interests(&params.interests);

        let location = params.location();
        if location.is_some() || !params.performer_ids.is_empty() {
            let mut seed = RecommendationSeed::default()
                .with_performers(&params.performer_ids, MAX_SEED_PERFORMERS)
                .with_paging(page, per_page);
            if let Some((lat, lon)) = location {
                seed = seed.with_location(lat, lon);
            }

            debug!(seed = ?seed, "Requesting seeded recommendations");
            let events = self.source.get_recommendations(&seed).await?.into_events();

            let mut events = filter_by_interests(events, &interests);
            let total = events.len() as u64;
            events.truncate(per_page as usize);

            return Ok(RecommendationResult::new(
                events,
                total,
                page,
                per_page,
                self.tag(ResultSource::Recommendations),
            ));
        }

        let search = EventSearchParams {
            venue_city: params.city.clone(),
            venue_state: params.state.clone(),
            taxonomies_name: single_taxonomy(&interests),
            per_page: Some(per_page),
            page: Some(page),
            sort: Some("score.desc".to_string()),
            ..Default::default()
        };
        let response = self.source.search_events(&search).await?;

        let (events, total) = if interests.len() > 1 {
            let filtered = filter_by_interests(response.events, &interests);
            let total = filtered.len() as u64;
            (filtered, total)
        } else {
            (response.events, response.meta.total)
        };

        Ok(RecommendationResult::new(
            sort_events_by_score(&events, false),
            total,
            page,
            per_page,
            self.tag(ResultSource::Search),
        ))
    }

    /// Popularity-ordered search, optionally scoped to a city/state
    pub async fn trending(
        &self,
        params: &RecommendationParams,
    ) -> Result<RecommendationResult, SourceError> {
        let (page, per_page) = params.paging(TRENDING_PER_PAGE);

        let search = EventSearchParams {
            venue_city: params.city.clone(),
            venue_state: params.state.clone(),
            per_page: Some(per_page),
            page: Some(page),
            sort: Some("score.desc".to_string()),
            ..Default::default()
        };
        let response = self.source.search_events(&search).await?;

        Ok(RecommendationResult::new(
            sort_events_by_score(&response.events, false),
            response.meta.total,
            page,
            per_page,
            self.tag(ResultSource::Search),
        ))
    }

    /// Events related to `event_id`, never including it
    ///
    /// Remote failures degrade to an empty result.
    pub async fn similar(&self, event_id: i64, params: &RecommendationParams) -> RecommendationResult {
        let (page, per_page) = params.paging(SIMILAR_PER_PAGE);
        let seed = RecommendationSeed::for_event(event_id).with_paging(page, per_page);

        match self.source.get_recommendations(&seed).await {
            Ok(payload) => {
                let mut events: Vec<Event> = payload
                    .into_events()
                    .into_iter()
                    .filter(|e| e.id != event_id)
                    .collect();
                let total = events.len() as u64;
                events.truncate(per_page as usize);

                RecommendationResult::new(
                    events,
                    total,
                    page,
                    per_page,
                    self.tag(ResultSource::Recommendations),
                )
            }
            Err(e) => {
                warn!(event_id, error = %e, "Similar events lookup failed, returning empty result");
                RecommendationResult::empty(page, per_page, self.tag(ResultSource::Search))
            }
        }
    }

    /// Heavily listed events whose score sits inside the hidden-gem band
    pub async fn hidden_gems(
        &self,
        params: &RecommendationParams,
    ) -> Result<RecommendationResult, SourceError> {
        let (page, per_page) = params.paging(HIDDEN_GEMS_PER_PAGE);
        let interests = normalized_interests(&params.interests);

        let search = EventSearchParams {
            venue_city: params.city.clone(),
            venue_state: params.state.clone(),
            taxonomies_name: single_taxonomy(&interests),
            per_page: Some(per_page.saturating_mul(3).max(HIDDEN_GEMS_MIN_FETCH)),
            page: Some(page),
            sort: Some("listing_count.desc".to_string()),
            ..Default::default()
        };
        let response = self.source.search_events(&search).await?;

        let mut gems: Vec<Event> = filter_by_interests(response.events, &interests)
            .into_iter()
            .filter(|e| (HIDDEN_GEM_MIN_SCORE..=HIDDEN_GEM_MAX_SCORE).contains(&e.score))
            .collect();
        let total = gems.len() as u64;
        gems.truncate(per_page as usize);

        Ok(RecommendationResult::new(
            gems,
            total,
            page,
            per_page,
            self.tag(ResultSource::Search),
        ))
    }

    /// Mood-matched events
    ///
    /// One search per resolved category, issued concurrently. Failed
    /// categories are skipped. Results merge in category order so the first
    /// category to return an event id owns it.
    pub async fn mood_based(
        &self,
        mood: &MoodParams,
        params: &RecommendationParams,
    ) -> RecommendationResult {
        let (page, per_page) = params.paging(MOOD_PER_PAGE);
        let categories = resolve_categories(mood.energy, mood.social);
        let per_category = per_page.saturating_mul(2).div_ceil(categories.len() as u32);

        info!(
            energy = ?mood.energy,
            social = ?mood.social,
            budget = ?mood.budget,
            categories = ?categories,
            per_category,
            "Fetching mood-based events"
        );

        let searches = categories.iter().map(|category| {
            let search = EventSearchParams {
                venue_city: params.city.clone(),
                venue_state: params.state.clone(),
                taxonomies_name: Some((*category).to_string()),
                per_page: Some(per_category),
                page: Some(page),
                sort: Some("score.desc".to_string()),
                ..Default::default()
            };
            async move { (*category, self.source.search_events(&search).await) }
        });

        let mut seen = HashSet::new();
        let mut merged = Vec::new();
        for (category, outcome) in join_all(searches).await {
            match outcome {
                Ok(response) => {
                    debug!(category, count = response.events.len(), "Category search returned");
                    merged.extend(response.events.into_iter().filter(|e| seen.insert(e.id)));
                }
                Err(e) => warn!(category, error = %e, "Category search failed, skipping"),
            }
        }

        let mut events = sort_events_by_score(&merged, false);
        if let Some((min, max)) = budget_band(mood.budget) {
            events = filter_events_by_price(&events, Some(min), Some(max));
        }

        let total = events.len() as u64;
        events.truncate(per_page as usize);
        debug!(total, returned = events.len(), "Mood-based events ready");

        RecommendationResult::new(events, total, page, per_page, self.tag(ResultSource::Search))
    }

    /// Top performer ids for the first few interests, best effort
    ///
    /// Any lookup failure yields an empty list.
    pub async fn resolve_interests_to_performers(&self, interests: &[String]) -> Vec<i64> {
        if interests.is_empty() {
            return Vec::new();
        }

        let lookups = interests.iter().take(MAX_RESOLVED_INTERESTS).map(|interest| {
            let query = PerformerQuery {
                q: interest.clone(),
                per_page: PERFORMERS_PER_INTEREST,
            };
            async move { self.source.search_performers(&query).await }
        });

        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        for outcome in join_all(lookups).await {
            match outcome {
                Ok(performers) => {
                    ids.extend(performers.into_iter().map(|p| p.id).filter(|id| seen.insert(*id)))
                }
                Err(e) => {
                    warn!(error = %e, "Performer lookup failed, skipping performer seeds");
                    return Vec::new();
                }
            }
        }

        ids.truncate(MAX_RESOLVED_PERFORMERS);
        ids
    }
}

fn normalized_interests(interests: &[String]) -> Vec<String> {
    interests
        .iter()
        .map(|i| i.trim().to_lowercase())
        .filter(|i| !i.is_empty())
        .collect()
}

/// Upstream ANDs comma-joined taxonomies, so only a lone interest is forwarded
fn single_taxonomy(interests: &[String]) -> Option<String> {
    match interests {
        [only] => Some(only.clone()),
        _ => None,
    }
}

fn filter_by_interests(events: Vec<Event>, interests: &[String]) -> Vec<Event> {
    if interests.is_empty() {
        return events;
    }
    events
        .into_iter()
        .filter(|e| e.matches_any_interest(interests))
        .collect()
}
