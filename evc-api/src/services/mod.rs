//! Domain services between the HTTP handlers and the event source

pub mod event_search;
pub mod mood;
pub mod recommendations;

pub use event_search::{filter_events_by_price, sort_events_by_score, EventSearchService};
pub use recommendations::RecommendationEngine;
