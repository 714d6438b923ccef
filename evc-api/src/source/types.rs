//! Request and response types for the remote event source

use evc_common::models::Event;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Search criteria forwarded to the event provider
///
/// Unset fields are left out of the argument map entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventSearchParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue_city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datetime_utc_gte: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datetime_utc_lte: Option<String>,
    /// Single taxonomy name. Comma-joined names are ANDed upstream.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taxonomies_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Provider sort key such as `score.desc` or `listing_count.desc`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchMeta {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub took: u64,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

impl SearchMeta {
    /// Placeholder used when the provider omits `meta`
    pub fn fallback(page: Option<u32>, per_page: Option<u32>) -> Self {
        Self {
            total: 0,
            took: 0,
            page: page.unwrap_or_else(default_page),
            per_page: per_page.unwrap_or_else(default_per_page),
        }
    }
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub events: Vec<Event>,
    pub meta: SearchMeta,
}

/// Seeds for the provider's recommendation endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationSeed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    /// Comma-joined performer ids
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performers_id: Option<String>,
    /// Seed event id, sent as a string
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl RecommendationSeed {
    pub fn for_event(event_id: i64) -> Self {
        Self {
            events_id: Some(event_id.to_string()),
            ..Default::default()
        }
    }

    pub fn with_location(mut self, lat: f64, lon: f64) -> Self {
        self.lat = Some(lat);
        self.lon = Some(lon);
        self
    }

    /// Seed with at most `limit` performer ids; an empty list sets nothing
    pub fn with_performers(mut self, ids: &[i64], limit: usize) -> Self {
        if !ids.is_empty() {
            let joined = ids
                .iter()
                .take(limit)
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(",");
            self.performers_id = Some(joined);
        }
        self
    }

    pub fn with_paging(mut self, page: u32, per_page: u32) -> Self {
        self.page = Some(page);
        self.per_page = Some(per_page);
        self
    }

    /// Performer ids parsed back out of `performers_id`
    pub fn performer_ids(&self) -> Vec<i64> {
        self.performers_id
            .as_deref()
            .map(|s| s.split(',').filter_map(|p| p.trim().parse().ok()).collect())
            .unwrap_or_default()
    }

    pub fn event_id(&self) -> Option<i64> {
        self.events_id.as_deref().and_then(|s| s.trim().parse().ok())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredEvent {
    #[serde(default)]
    pub event: Option<Event>,
    #[serde(default)]
    pub score: Option<f64>,
}

/// Recommendation response in either of the provider's two shapes
///
/// The shape is chosen by the presence of a `recommendations` key. Entries
/// are decoded one at a time so a malformed entry costs only itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RecommendationPayload {
    /// `{recommendations: [{event, score}, ...]}`
    Nested { recommendations: Vec<ScoredEvent> },
    /// `{events: [...]}`
    Flat {
        #[serde(default)]
        events: Vec<Event>,
    },
}

impl<'de> Deserialize<'de> for RecommendationPayload {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut object = Map::<String, Value>::deserialize(deserializer)?;
        if let Some(entries) = object.remove("recommendations") {
            return Ok(RecommendationPayload::Nested {
                recommendations: decode_entries(entries, "recommendation"),
            });
        }
        let events = object
            .remove("events")
            .map(|entries| decode_entries(entries, "event"))
            .unwrap_or_default();
        Ok(RecommendationPayload::Flat { events })
    }
}

/// Decode each element of a JSON list, skipping (and logging) the bad ones
fn decode_entries<T: DeserializeOwned>(value: Value, kind: &str) -> Vec<T> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .filter_map(|(index, item)| match serde_json::from_value(item) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping malformed {} entry {}: {}", kind, index, e);
                    None
                }
            })
            .collect(),
        Value::Null => Vec::new(),
        other => {
            warn!("Expected a {} list, got {}", kind, other);
            Vec::new()
        }
    }
}

impl RecommendationPayload {
    /// Flatten to an event list, dropping entries that carry no event
    pub fn into_events(self) -> Vec<Event> {
        match self {
            RecommendationPayload::Nested { recommendations } => {
                recommendations.into_iter().filter_map(|r| r.event).collect()
            }
            RecommendationPayload::Flat { events } => events,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformerQuery {
    pub q: String,
    pub per_page: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformerSummary {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub score: Option<f64>,
}
