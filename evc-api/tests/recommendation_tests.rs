//! Recommendation engine tests against a scripted event source

use async_trait::async_trait;
use evc_api::services::RecommendationEngine;
use evc_api::source::{
    EventSearchParams, EventSource, PerformerQuery, PerformerSummary, RecommendationPayload,
    RecommendationSeed, ScoredEvent, SearchMeta, SearchResponse, SourceError, SourceMode,
};
use evc_common::models::{
    Budget, Energy, Event, MoodParams, RecommendationParams, ResultSource, Social, Taxonomy,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn event(id: i64, title: &str, score: f64, taxonomy: &str, price: Option<f64>) -> Event {
    serde_json::from_value(json!({
        "id": id,
        "title": title,
        "score": score,
        "taxonomies": [{ "id": 1, "name": taxonomy }],
        "stats": { "lowest_price": price, "listing_count": 100 }
    }))
    .unwrap()
}

/// Answers searches per taxonomy name and records every request
#[derive(Default)]
struct ScriptedSource {
    mode: Option<SourceMode>,
    by_taxonomy: HashMap<String, Vec<Event>>,
    failing_taxonomies: Vec<String>,
    /// Taxonomy searches held back before answering
    delays: HashMap<String, Duration>,
    search_result: Vec<Event>,
    search_total: u64,
    recommendations: Option<RecommendationPayload>,
    performers: HashMap<String, Vec<i64>>,
    fail_performers: bool,
    searches: Mutex<Vec<EventSearchParams>>,
    seeds: Mutex<Vec<RecommendationSeed>>,
    /// Taxonomy names in the order their searches finished
    completed: Mutex<Vec<String>>,
}

impl ScriptedSource {
    fn searches(&self) -> Vec<EventSearchParams> {
        self.searches.lock().unwrap().clone()
    }

    fn seeds(&self) -> Vec<RecommendationSeed> {
        self.seeds.lock().unwrap().clone()
    }

    fn completed(&self) -> Vec<String> {
        self.completed.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventSource for ScriptedSource {
    fn mode(&self) -> SourceMode {
        self.mode.unwrap_or(SourceMode::Live)
    }

    async fn search_events(&self, params: &EventSearchParams) -> Result<SearchResponse, SourceError> {
        self.searches.lock().unwrap().push(params.clone());

        if let Some(delay) = params.taxonomies_name.as_ref().and_then(|n| self.delays.get(n)) {
            tokio::time::sleep(*delay).await;
        }
        if let Some(name) = &params.taxonomies_name {
            self.completed.lock().unwrap().push(name.clone());
        }

        let events = match params.taxonomies_name.as_deref() {
            Some(name) if self.failing_taxonomies.iter().any(|f| f == name) => {
                return Err(SourceError::Network(format!("{} unavailable", name)));
            }
            Some(name) if self.by_taxonomy.contains_key(name) => self.by_taxonomy[name].clone(),
            _ => self.search_result.clone(),
        };

        Ok(SearchResponse {
            meta: SearchMeta {
                total: self.search_total.max(events.len() as u64),
                took: 1,
                page: params.page.unwrap_or(1),
                per_page: params.per_page.unwrap_or(20),
            },
            events,
        })
    }

    async fn get_event(&self, _id: i64) -> Result<Option<Event>, SourceError> {
        Ok(None)
    }

    async fn get_taxonomies(&self) -> Result<Vec<Taxonomy>, SourceError> {
        Ok(Taxonomy::defaults())
    }

    async fn get_recommendations(
        &self,
        seed: &RecommendationSeed,
    ) -> Result<RecommendationPayload, SourceError> {
        self.seeds.lock().unwrap().push(seed.clone());
        self.recommendations.clone().ok_or(SourceError::Api {
            status: 502,
            message: "bad gateway".to_string(),
        })
    }

    async fn search_performers(
        &self,
        query: &PerformerQuery,
    ) -> Result<Vec<PerformerSummary>, SourceError> {
        if self.fail_performers && query.q == "comedy" {
            return Err(SourceError::Network("timeout".to_string()));
        }
        Ok(self
            .performers
            .get(&query.q)
            .map(|ids| {
                ids.iter()
                    .map(|id| PerformerSummary {
                        id: *id,
                        name: format!("Performer {}", id),
                        score: None,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}

fn engine(source: ScriptedSource) -> (RecommendationEngine, Arc<ScriptedSource>) {
    let source = Arc::new(source);
    (RecommendationEngine::new(source.clone()), source)
}

fn ids(events: &[Event]) -> Vec<i64> {
    events.iter().map(|e| e.id).collect()
}

#[tokio::test]
async fn similar_events_never_include_the_seed() {
    let (engine, source) = engine(ScriptedSource {
        recommendations: Some(RecommendationPayload::Nested {
            recommendations: vec![
                ScoredEvent { event: Some(event(7, "Seed", 0.9, "concert", None)), score: Some(1.0) },
                ScoredEvent { event: Some(event(8, "Other", 0.8, "concert", None)), score: Some(0.9) },
                ScoredEvent { event: None, score: Some(0.5) },
                ScoredEvent { event: Some(event(9, "Third", 0.7, "concert", None)), score: Some(0.4) },
            ],
        }),
        ..Default::default()
    });

    let result = engine.similar(7, &RecommendationParams::default()).await;

    assert_eq!(ids(&result.events), vec![8, 9]);
    assert_eq!(result.meta.total, 2);
    assert_eq!(result.meta.per_page, 6);
    assert_eq!(result.meta.source, ResultSource::Recommendations);
    assert_eq!(source.seeds()[0].events_id.as_deref(), Some("7"));
}

#[tokio::test]
async fn similar_events_degrade_to_empty_on_failure() {
    let (engine, _) = engine(ScriptedSource::default());

    let result = engine.similar(7, &RecommendationParams::default()).await;

    assert!(result.events.is_empty());
    assert_eq!(result.meta.total, 0);
    assert_eq!(result.meta.source, ResultSource::Search);
}

#[tokio::test]
async fn mood_merge_keeps_first_category_copy() {
    let mut by_taxonomy = HashMap::new();
    by_taxonomy.insert(
        "concert".to_string(),
        vec![event(42, "From concerts", 0.9, "concert", None), event(1, "Gig", 0.5, "concert", None)],
    );
    by_taxonomy.insert(
        "sports".to_string(),
        vec![event(42, "From sports", 0.1, "sports", None), event(2, "Match", 0.7, "sports", None)],
    );

    let (engine, source) = engine(ScriptedSource {
        by_taxonomy,
        ..Default::default()
    });

    let mood = MoodParams::new(Energy::High, Social::Group, Budget::Any);
    let result = engine.mood_based(&mood, &RecommendationParams::default()).await;

    let copies: Vec<&Event> = result.events.iter().filter(|e| e.id == 42).collect();
    assert_eq!(copies.len(), 1);
    assert_eq!(copies[0].title, "From concerts");
    assert_eq!(ids(&result.events), vec![42, 2, 1]);

    // high x group resolves to three categories, ceil(12 * 2 / 3) each
    let searches = source.searches();
    assert_eq!(searches.len(), 3);
    assert!(searches.iter().all(|s| s.per_page == Some(8)));
    assert!(searches.iter().all(|s| s.sort.as_deref() == Some("score.desc")));
}

#[tokio::test]
async fn mood_merge_order_ignores_completion_order() {
    let mut by_taxonomy = HashMap::new();
    by_taxonomy.insert(
        "concert".to_string(),
        vec![event(42, "From concerts", 0.9, "concert", None)],
    );
    by_taxonomy.insert(
        "sports".to_string(),
        vec![event(42, "From sports", 0.1, "sports", None), event(2, "Match", 0.7, "sports", None)],
    );
    by_taxonomy.insert(
        "festival".to_string(),
        vec![event(42, "From festivals", 0.3, "festival", None)],
    );
    let mut delays = HashMap::new();
    delays.insert("concert".to_string(), Duration::from_millis(150));

    let (engine, source) = engine(ScriptedSource {
        by_taxonomy,
        delays,
        ..Default::default()
    });

    let mood = MoodParams::new(Energy::High, Social::Group, Budget::Any);
    let result = engine.mood_based(&mood, &RecommendationParams::default()).await;

    // concert is queried first but answers last
    assert_eq!(source.completed().last().map(String::as_str), Some("concert"));

    let copies: Vec<&Event> = result.events.iter().filter(|e| e.id == 42).collect();
    assert_eq!(copies.len(), 1);
    assert_eq!(copies[0].title, "From concerts");
    assert_eq!(copies[0].score, 0.9);
    assert_eq!(ids(&result.events), vec![42, 2]);
}

#[tokio::test]
async fn mood_skips_failed_categories_and_applies_budget() {
    let mut by_taxonomy = HashMap::new();
    by_taxonomy.insert(
        "theater".to_string(),
        vec![
            event(1, "Cheap play", 0.6, "theater", Some(40.0)),
            event(2, "Pricey play", 0.9, "theater", Some(300.0)),
            event(3, "Unknown price", 0.4, "theater", None),
        ],
    );

    let (engine, _) = engine(ScriptedSource {
        by_taxonomy,
        failing_taxonomies: vec!["classical".to_string(), "comedy".to_string()],
        ..Default::default()
    });

    let mood = MoodParams::new(Energy::Low, Social::Intimate, Budget::Low);
    let result = engine.mood_based(&mood, &RecommendationParams::default()).await;

    assert_eq!(ids(&result.events), vec![1, 3]);
    assert_eq!(result.meta.total, 2);
    assert_eq!(result.meta.source, ResultSource::Search);
}

#[tokio::test]
async fn mood_with_every_category_failing_is_empty() {
    let (engine, _) = engine(ScriptedSource {
        failing_taxonomies: ["concert", "sports", "theater", "comedy"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        ..Default::default()
    });

    let mood = MoodParams::new(Energy::Any, Social::Any, Budget::Any);
    let result = engine.mood_based(&mood, &RecommendationParams::default()).await;

    assert!(result.events.is_empty());
    assert_eq!(result.meta.total, 0);
}

#[tokio::test]
async fn hidden_gems_stay_inside_score_band() {
    let (engine, source) = engine(ScriptedSource {
        search_result: vec![
            event(1, "Mainstream", 0.95, "concert", None),
            event(2, "Gem", 0.5, "concert", None),
            event(3, "Edge low", 0.20, "concert", None),
            event(4, "Edge high", 0.65, "concert", None),
            event(5, "Obscure", 0.1, "concert", None),
        ],
        search_total: 500,
        ..Default::default()
    });

    let params = RecommendationParams {
        per_page: Some(2),
        ..Default::default()
    };
    let result = engine.hidden_gems(&params).await.unwrap();

    assert_eq!(ids(&result.events), vec![2, 3]);
    assert_eq!(result.meta.total, 3);
    assert!(result
        .events
        .iter()
        .all(|e| (0.20..=0.65).contains(&e.score)));

    let search = &source.searches()[0];
    assert_eq!(search.per_page, Some(50));
    assert_eq!(search.sort.as_deref(), Some("listing_count.desc"));
}

#[tokio::test]
async fn personalized_with_location_uses_seeded_recommendations() {
    let (engine, source) = engine(ScriptedSource {
        recommendations: Some(RecommendationPayload::Flat {
            events: vec![
                event(1, "Gig", 0.8, "concert", None),
                event(2, "Match", 0.7, "sports", None),
                event(3, "Play", 0.6, "theater", None),
            ],
        }),
        ..Default::default()
    });

    let params = RecommendationParams {
        lat: Some(40.7),
        lon: Some(-73.9),
        interests: vec!["Sports".to_string(), "theater".to_string()],
        performer_ids: vec![1, 2, 3, 4, 5, 6],
        ..Default::default()
    };
    let result = engine.personalized(&params).await.unwrap();

    assert_eq!(ids(&result.events), vec![2, 3]);
    assert_eq!(result.meta.total, 2);
    assert_eq!(result.meta.source, ResultSource::Recommendations);

    let seed = &source.seeds()[0];
    assert_eq!(seed.lat, Some(40.7));
    assert_eq!(seed.performers_id.as_deref(), Some("1,2,3,4,5"));
}

#[tokio::test]
async fn personalized_without_seed_falls_back_to_search() {
    let (engine, source) = engine(ScriptedSource {
        search_result: vec![
            event(1, "Low", 0.3, "comedy", None),
            event(2, "High", 0.9, "comedy", None),
        ],
        search_total: 40,
        ..Default::default()
    });

    let params = RecommendationParams {
        city: Some("Boston".to_string()),
        interests: vec!["comedy".to_string()],
        ..Default::default()
    };
    let result = engine.personalized(&params).await.unwrap();

    assert_eq!(ids(&result.events), vec![2, 1]);
    assert_eq!(result.meta.total, 40);
    assert_eq!(result.meta.source, ResultSource::Search);

    let search = &source.searches()[0];
    assert_eq!(search.venue_city.as_deref(), Some("Boston"));
    assert_eq!(search.taxonomies_name.as_deref(), Some("comedy"));
}

#[tokio::test]
async fn trending_is_tagged_mock_over_demo_source() {
    let (engine, _) = engine(ScriptedSource {
        mode: Some(SourceMode::Mock),
        search_result: vec![event(1, "A", 0.2, "concert", None), event(2, "B", 0.8, "sports", None)],
        ..Default::default()
    });

    let result = engine.trending(&RecommendationParams::default()).await.unwrap();

    assert_eq!(ids(&result.events), vec![2, 1]);
    assert_eq!(result.meta.source, ResultSource::Mock);
    assert_eq!(result.meta.per_page, 10);
}

#[tokio::test]
async fn interests_resolve_to_limited_performers() {
    let mut performers = HashMap::new();
    performers.insert("sports".to_string(), vec![1, 2, 3]);
    performers.insert("comedy".to_string(), vec![3, 4, 5]);
    performers.insert("theater".to_string(), vec![6, 7, 8]);
    performers.insert("jazz".to_string(), vec![9]);

    let (engine, _) = engine(ScriptedSource {
        performers,
        ..Default::default()
    });

    let interests: Vec<String> = ["sports", "comedy", "theater", "jazz"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let ids = engine.resolve_interests_to_performers(&interests).await;

    assert_eq!(ids, vec![1, 2, 3, 4, 5, 6, 7, 8]);
}

#[tokio::test]
async fn interest_resolution_failure_yields_nothing() {
    let mut performers = HashMap::new();
    performers.insert("sports".to_string(), vec![1, 2, 3]);

    let (engine, _) = engine(ScriptedSource {
        performers,
        fail_performers: true,
        ..Default::default()
    });

    let interests = vec!["sports".to_string(), "comedy".to_string()];
    assert!(engine.resolve_interests_to_performers(&interests).await.is_empty());
}
