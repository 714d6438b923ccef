//! Remote event source
//!
//! The ticketing provider is reached through a tool-execution platform. Each
//! logical operation is one typed method here; envelope handling lives in
//! [`envelope`] and the wire protocol in [`composio`]. [`mock`] serves a fixed
//! demo catalog when no credentials are configured.

use async_trait::async_trait;
use evc_common::models::{Event, Taxonomy};
use serde::Serialize;
use thiserror::Error;

pub mod composio;
pub mod envelope;
pub mod mock;
pub mod types;

pub use composio::ComposioEventSource;
pub use mock::MockEventSource;
pub use types::{
    EventSearchParams, PerformerQuery, PerformerSummary, RecommendationPayload,
    RecommendationSeed, ScoredEvent, SearchMeta, SearchResponse,
};

/// Remote event source errors
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Event source not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// The platform ran the tool but reported `successful: false`
    #[error("Action {action} failed: {message}")]
    Action { action: String, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Whether results come from the live provider or the demo catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    Live,
    Mock,
}

impl SourceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceMode::Live => "live",
            SourceMode::Mock => "mock",
        }
    }
}

/// One method per provider operation
#[async_trait]
pub trait EventSource: Send + Sync {
    fn mode(&self) -> SourceMode;

    async fn search_events(&self, params: &EventSearchParams) -> Result<SearchResponse, SourceError>;

    /// `Ok(None)` when the provider has no such event
    async fn get_event(&self, id: i64) -> Result<Option<Event>, SourceError>;

    async fn get_taxonomies(&self) -> Result<Vec<Taxonomy>, SourceError>;

    async fn get_recommendations(
        &self,
        seed: &RecommendationSeed,
    ) -> Result<RecommendationPayload, SourceError>;

    async fn search_performers(
        &self,
        query: &PerformerQuery,
    ) -> Result<Vec<PerformerSummary>, SourceError>;
}
