//! Tool-execution platform client
//!
//! Every provider operation is a POST to `{base_url}/tools/execute/{ACTION}`
//! authenticated with the `x-api-key` header. The request body carries the
//! flat argument map under `arguments`.

use async_trait::async_trait;
use evc_common::models::{Event, Taxonomy};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::envelope::{decode_payload, unwrap_payload};
use super::types::{
    EventSearchParams, PerformerQuery, PerformerSummary, RecommendationPayload,
    RecommendationSeed, SearchMeta, SearchResponse,
};
use super::{EventSource, SourceError, SourceMode};
use crate::config::ComposioSettings;

pub const SEARCH_EVENTS_ACTION: &str = "SEAT_GEEK_SEARCH_EVENTS";
pub const GET_EVENT_ACTION: &str = "SEAT_GEEK_GET_EVENT_DETAILS";
pub const GET_TAXONOMIES_ACTION: &str = "SEAT_GEEK_GET_TAXONOMIES";
pub const GET_RECOMMENDATIONS_ACTION: &str = "SEAT_GEEK_GET_EVENT_RECOMMENDATIONS";
pub const SEARCH_PERFORMERS_ACTION: &str = "SEAT_GEEK_SEARCH_PERFORMERS";

const USER_AGENT: &str = concat!("event-concierge/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct RawSearch {
    #[serde(default)]
    events: Vec<Event>,
    #[serde(default)]
    meta: Option<SearchMeta>,
}

#[derive(Debug, Deserialize)]
struct RawTaxonomies {
    #[serde(default)]
    taxonomies: Vec<Taxonomy>,
}

#[derive(Debug, Deserialize)]
struct RawPerformers {
    #[serde(default)]
    performers: Vec<PerformerSummary>,
}

/// Live event source backed by the tool-execution platform
pub struct ComposioEventSource {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    user_id: Option<String>,
}

impl ComposioEventSource {
    pub fn new(settings: &ComposioSettings) -> Result<Self, SourceError> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| SourceError::NotConfigured("COMPOSIO_API_KEY is not set".to_string()))?;

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(settings.timeout)
            .build()
            .map_err(|e| SourceError::Network(e.to_string()))?;

        info!(
            base_url = %settings.base_url,
            timeout_secs = settings.timeout.as_secs(),
            "Tool-execution client configured"
        );

        Ok(Self {
            http_client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key,
            user_id: settings.user_id.clone(),
        })
    }

    fn action_url(&self, action: &str) -> String {
        format!("{}/tools/execute/{}", self.base_url, action)
    }

    fn request_body(&self, arguments: Value) -> Value {
        let mut body = json!({ "arguments": arguments });
        if let Some(user_id) = &self.user_id {
            body["user_id"] = json!(user_id);
        }
        body
    }

    /// Run one tool action and return the raw (still wrapped) response body
    async fn execute(&self, action: &str, arguments: Value) -> Result<Value, SourceError> {
        debug!(action, arguments = %arguments, "Executing tool action");

        let response = self
            .http_client
            .post(self.action_url(action))
            .header("x-api-key", &self.api_key)
            .json(&self.request_body(arguments))
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SourceError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))?;

        check_successful(action, &body)?;
        Ok(body)
    }
}

fn to_arguments<T: serde::Serialize>(value: &T) -> Result<Value, SourceError> {
    serde_json::to_value(value).map_err(|e| SourceError::Parse(e.to_string()))
}

/// Map a `successful: false` tool result to an error
fn check_successful(action: &str, body: &Value) -> Result<(), SourceError> {
    if body.get("successful").and_then(Value::as_bool) != Some(false) {
        return Ok(());
    }

    let message = match body.get("error") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "unknown error".to_string(),
        Some(other) => other.to_string(),
    };

    Err(SourceError::Action {
        action: action.to_string(),
        message,
    })
}

/// Interpret an event-details payload
///
/// The provider returns the event object itself; some responses nest it in
/// an `events` list instead. Anything without an id means "no such event".
fn parse_event_payload(value: Value) -> Result<Option<Event>, SourceError> {
    let payload = unwrap_payload(value);

    if payload.get("id").is_some() {
        return serde_json::from_value(payload)
            .map(Some)
            .map_err(|e| SourceError::Parse(format!("{}: {}", GET_EVENT_ACTION, e)));
    }

    match payload.get("events").and_then(Value::as_array).and_then(|a| a.first()) {
        Some(first) => serde_json::from_value(first.clone())
            .map(Some)
            .map_err(|e| SourceError::Parse(format!("{}: {}", GET_EVENT_ACTION, e))),
        None => Ok(None),
    }
}

#[async_trait]
impl EventSource for ComposioEventSource {
    fn mode(&self) -> SourceMode {
        SourceMode::Live
    }

    async fn search_events(&self, params: &EventSearchParams) -> Result<SearchResponse, SourceError> {
        let body = self
            .execute(SEARCH_EVENTS_ACTION, to_arguments(params)?)
            .await?;
        let raw: RawSearch = decode_payload(SEARCH_EVENTS_ACTION, body)?;

        Ok(SearchResponse {
            events: raw.events,
            meta: raw
                .meta
                .unwrap_or_else(|| SearchMeta::fallback(params.page, params.per_page)),
        })
    }

    async fn get_event(&self, id: i64) -> Result<Option<Event>, SourceError> {
        let arguments = json!({ "event_id": id.to_string() });
        match self.execute(GET_EVENT_ACTION, arguments).await {
            Ok(body) => parse_event_payload(body),
            Err(SourceError::Api { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn get_taxonomies(&self) -> Result<Vec<Taxonomy>, SourceError> {
        let body = self.execute(GET_TAXONOMIES_ACTION, json!({})).await?;
        let raw: RawTaxonomies = decode_payload(GET_TAXONOMIES_ACTION, body)?;
        Ok(raw.taxonomies)
    }

    async fn get_recommendations(
        &self,
        seed: &RecommendationSeed,
    ) -> Result<RecommendationPayload, SourceError> {
        let body = self
            .execute(GET_RECOMMENDATIONS_ACTION, to_arguments(seed)?)
            .await?;
        decode_payload(GET_RECOMMENDATIONS_ACTION, body)
    }

    async fn search_performers(
        &self,
        query: &PerformerQuery,
    ) -> Result<Vec<PerformerSummary>, SourceError> {
        let body = self
            .execute(SEARCH_PERFORMERS_ACTION, to_arguments(query)?)
            .await?;
        let raw: RawPerformers = decode_payload(SEARCH_PERFORMERS_ACTION, body)?;
        Ok(raw.performers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn settings(api_key: Option<&str>) -> ComposioSettings {
        ComposioSettings {
            api_key: api_key.map(str::to_string),
            base_url: "https://tools.example.test/api/v3/".to_string(),
            user_id: Some("tester".to_string()),
            timeout: Duration::from_secs(2),
        }
    }

    #[test]
    fn test_missing_key_is_not_configured() {
        assert!(matches!(
            ComposioEventSource::new(&settings(None)),
            Err(SourceError::NotConfigured(_))
        ));
        assert!(matches!(
            ComposioEventSource::new(&settings(Some("   "))),
            Err(SourceError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_action_url_and_body() {
        let source = ComposioEventSource::new(&settings(Some("key"))).unwrap();
        assert_eq!(
            source.action_url(SEARCH_EVENTS_ACTION),
            "https://tools.example.test/api/v3/tools/execute/SEAT_GEEK_SEARCH_EVENTS"
        );

        let body = source.request_body(json!({ "q": "jazz" }));
        assert_eq!(body, json!({ "arguments": { "q": "jazz" }, "user_id": "tester" }));
    }

    #[test]
    fn test_unsuccessful_result_is_an_error() {
        let body = json!({ "successful": false, "error": "connection expired", "data": {} });
        match check_successful(GET_EVENT_ACTION, &body) {
            Err(SourceError::Action { action, message }) => {
                assert_eq!(action, GET_EVENT_ACTION);
                assert_eq!(message, "connection expired");
            }
            other => panic!("expected action error, got {:?}", other),
        }

        assert!(check_successful(GET_EVENT_ACTION, &json!({ "data": {} })).is_ok());
        assert!(check_successful(GET_EVENT_ACTION, &json!({ "successful": true })).is_ok());
    }

    #[test]
    fn test_event_payload_shapes() {
        let event = parse_event_payload(json!({ "data": { "id": 77, "title": "Show" } }))
            .unwrap()
            .unwrap();
        assert_eq!(event.id, 77);

        let event = parse_event_payload(json!({ "data": { "events": [{ "id": 78 }] } }))
            .unwrap()
            .unwrap();
        assert_eq!(event.id, 78);

        assert!(parse_event_payload(json!({ "data": {} })).unwrap().is_none());
        assert!(parse_event_payload(json!("not json")).unwrap().is_none());
    }
}
