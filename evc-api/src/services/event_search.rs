//! Event Search Service
//!
//! Thin layer over the event source: fills search defaults, degrades the
//! taxonomy listing to the built-in categories, and provides the price and
//! score post-processing helpers the HTTP layer and the engine share.

use evc_common::models::{Event, Taxonomy};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::source::{EventSearchParams, EventSource, SearchResponse, SourceError, SourceMode};

pub const DEFAULT_PER_PAGE: u32 = 20;

#[derive(Clone)]
pub struct EventSearchService {
    source: Arc<dyn EventSource>,
}

impl EventSearchService {
    pub fn new(source: Arc<dyn EventSource>) -> Self {
        Self { source }
    }

    pub fn mode(&self) -> SourceMode {
        self.source.mode()
    }

    /// Pass-through search; no filtering happens here
    pub async fn search_events(&self, params: &EventSearchParams) -> Result<SearchResponse, SourceError> {
        let mut params = params.clone();
        params.per_page = Some(params.per_page.unwrap_or(DEFAULT_PER_PAGE));
        params.page = Some(params.page.unwrap_or(1));

        debug!(params = ?params, "Searching events");
        self.source.search_events(&params).await
    }

    pub async fn get_event_by_id(&self, id: i64) -> Result<Option<Event>, SourceError> {
        debug!(event_id = id, "Fetching event");
        self.source.get_event(id).await
    }

    /// Category listing; never fails
    pub async fn get_taxonomies(&self) -> Vec<Taxonomy> {
        match self.source.get_taxonomies().await {
            Ok(taxonomies) if !taxonomies.is_empty() => taxonomies,
            Ok(_) => {
                warn!("Event source returned no taxonomies, using defaults");
                Taxonomy::defaults()
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch taxonomies, using defaults");
                Taxonomy::defaults()
            }
        }
    }
}

/// Keep events priced within `[min, max]` on whichever bounds are given
///
/// An unknown lowest price always passes.
pub fn filter_events_by_price(events: &[Event], min: Option<f64>, max: Option<f64>) -> Vec<Event> {
    events
        .iter()
        .filter(|event| match event.lowest_price() {
            None => true,
            Some(price) => {
                min.map_or(true, |min| price >= min) && max.map_or(true, |max| price <= max)
            }
        })
        .cloned()
        .collect()
}

/// Stable sort by score into a new list; descending unless `ascending`
pub fn sort_events_by_score(events: &[Event], ascending: bool) -> Vec<Event> {
    let mut sorted = events.to_vec();
    if ascending {
        sorted.sort_by(|a, b| a.score.total_cmp(&b.score));
    } else {
        sorted.sort_by(|a, b| b.score.total_cmp(&a.score));
    }
    sorted
}
