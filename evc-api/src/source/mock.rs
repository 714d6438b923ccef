//! In-process demo catalog
//!
//! Used when no tool-execution credentials are configured. It answers every
//! provider operation from a fixed set of fourteen events spread over all
//! default categories, with start times relative to construction time.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use evc_common::models::{
    Event, EventStats, GeoPoint, Performer, PerformerImages, Taxonomy, Venue,
};
use std::collections::HashSet;
use tracing::debug;

use super::types::{
    EventSearchParams, PerformerQuery, PerformerSummary, RecommendationPayload,
    RecommendationSeed, ScoredEvent, SearchMeta, SearchResponse,
};
use super::{EventSource, SourceError, SourceMode};

const IMAGE_BASE: &str = "https://chairnerd.global.ssl.fastly.net/images/performers-landscape";

pub struct MockEventSource {
    catalog: Vec<Event>,
}

impl MockEventSource {
    pub fn new() -> Self {
        Self {
            catalog: build_catalog(),
        }
    }

    pub fn catalog(&self) -> &[Event] {
        &self.catalog
    }

    fn find(&self, id: i64) -> Option<&Event> {
        self.catalog.iter().find(|e| e.id == id)
    }
}

impl Default for MockEventSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventSource for MockEventSource {
    fn mode(&self) -> SourceMode {
        SourceMode::Mock
    }

    async fn search_events(&self, params: &EventSearchParams) -> Result<SearchResponse, SourceError> {
        let taxonomy_names: Vec<String> = params
            .taxonomies_name
            .as_deref()
            .map(|names| {
                names
                    .split(',')
                    .map(|n| n.trim().to_lowercase())
                    .filter(|n| !n.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        let query = params.q.as_deref().map(str::to_lowercase);

        // Comma-joined taxonomy names are ANDed, like the live provider
        let mut matches: Vec<Event> = self
            .catalog
            .iter()
            .filter(|e| taxonomy_names.iter().all(|n| e.has_taxonomy(n)))
            .filter(|e| match &query {
                Some(q) => {
                    e.title.to_lowercase().contains(q)
                        || e.performers.iter().any(|p| p.name.to_lowercase().contains(q))
                }
                None => true,
            })
            .cloned()
            .collect();

        match params.sort.as_deref() {
            Some("score.desc") => matches.sort_by(|a, b| b.score.total_cmp(&a.score)),
            Some("listing_count.desc") => matches.sort_by(|a, b| {
                b.stats
                    .listing_count
                    .unwrap_or(0)
                    .cmp(&a.stats.listing_count.unwrap_or(0))
            }),
            Some("datetime_utc.asc") => {
                matches.sort_by(|a, b| a.datetime_utc.cmp(&b.datetime_utc))
            }
            _ => {}
        }

        let page = params.page.unwrap_or(1).max(1);
        let per_page = params.per_page.unwrap_or(20);
        let total = matches.len() as u64;
        let events: Vec<Event> = matches
            .into_iter()
            .skip(page_offset(page, per_page))
            .take(per_page as usize)
            .collect();

        debug!(total, returned = events.len(), "Mock search");

        Ok(SearchResponse {
            events,
            meta: SearchMeta {
                total,
                took: 1,
                page,
                per_page,
            },
        })
    }

    async fn get_event(&self, id: i64) -> Result<Option<Event>, SourceError> {
        Ok(self.find(id).cloned())
    }

    async fn get_taxonomies(&self) -> Result<Vec<Taxonomy>, SourceError> {
        Ok(Taxonomy::defaults())
    }

    /// Related events share a taxonomy with the seed event or with the seed
    /// performers' events; a location seed orders them by distance.
    async fn get_recommendations(
        &self,
        seed: &RecommendationSeed,
    ) -> Result<RecommendationPayload, SourceError> {
        let mut related: HashSet<String> = HashSet::new();

        if let Some(event) = seed.event_id().and_then(|id| self.find(id)) {
            related.extend(event.taxonomies.iter().map(|t| t.name.to_lowercase()));
        }

        let performer_ids = seed.performer_ids();
        for event in &self.catalog {
            if event.performers.iter().any(|p| performer_ids.contains(&p.id)) {
                related.extend(event.taxonomies.iter().map(|t| t.name.to_lowercase()));
            }
        }

        let mut candidates: Vec<&Event> = self
            .catalog
            .iter()
            .filter(|e| related.is_empty() || e.taxonomies.iter().any(|t| related.contains(&t.name.to_lowercase())))
            .collect();

        match (seed.lat, seed.lon) {
            (Some(lat), Some(lon)) => candidates.sort_by(|a, b| {
                distance_sq(a, lat, lon).total_cmp(&distance_sq(b, lat, lon))
            }),
            _ => candidates.sort_by(|a, b| b.score.total_cmp(&a.score)),
        }

        let page = seed.page.unwrap_or(1).max(1);
        let per_page = seed.per_page.unwrap_or(10);
        let recommendations = candidates
            .into_iter()
            .skip(page_offset(page, per_page))
            .take(per_page as usize)
            .map(|e| ScoredEvent {
                event: Some(e.clone()),
                score: Some(e.score),
            })
            .collect();

        Ok(RecommendationPayload::Nested { recommendations })
    }

    /// Matches performer names, or every performer of events in a matching category
    async fn search_performers(
        &self,
        query: &PerformerQuery,
    ) -> Result<Vec<PerformerSummary>, SourceError> {
        let q = query.q.to_lowercase();
        let mut seen = HashSet::new();
        let mut found = Vec::new();

        for event in &self.catalog {
            let category_match = event.has_taxonomy(&q);
            for performer in &event.performers {
                if (category_match || performer.name.to_lowercase().contains(&q))
                    && seen.insert(performer.id)
                {
                    found.push(PerformerSummary {
                        id: performer.id,
                        name: performer.name.clone(),
                        score: performer.score,
                    });
                }
            }
        }

        found.truncate(query.per_page as usize);
        Ok(found)
    }
}

fn distance_sq(event: &Event, lat: f64, lon: f64) -> f64 {
    match event.venue.location {
        Some(loc) => (loc.lat - lat).powi(2) + (loc.lon - lon).powi(2),
        None => f64::MAX,
    }
}

struct CatalogVenue {
    id: i64,
    name: &'static str,
    city: &'static str,
    state: &'static str,
    lat: f64,
    lon: f64,
}

struct CatalogEntry {
    id: i64,
    title: &'static str,
    short_title: &'static str,
    days_ahead: i64,
    venue: CatalogVenue,
    performers: &'static [(i64, &'static str, Option<&'static str>)],
    prices: (f64, f64),
    listing_count: i64,
    score: f64,
    slug: &'static str,
    event_type: &'static str,
    taxonomies: &'static [(i64, &'static str)],
}

fn build_event(entry: CatalogEntry) -> Event {
    let start = (Utc::now() + Duration::days(entry.days_ahead))
        .format("%Y-%m-%dT%H:%M:%S")
        .to_string();

    let performers = entry
        .performers
        .iter()
        .enumerate()
        .map(|(i, (id, name, image))| {
            let image = image.map(|path| format!("{}/{}/huge.jpg", IMAGE_BASE, path));
            Performer {
                id: *id,
                name: (*name).to_string(),
                images: image.as_ref().map(|huge| PerformerImages {
                    huge: Some(huge.clone()),
                    ..Default::default()
                }),
                image,
                primary: i == 0,
                score: (i == 0).then_some(entry.score),
            }
        })
        .collect();

    let (lowest, highest) = entry.prices;
    Event {
        id: entry.id,
        title: entry.title.to_string(),
        short_title: Some(entry.short_title.to_string()),
        datetime_local: Some(start.clone()),
        datetime_utc: Some(start),
        venue: Venue {
            id: entry.venue.id,
            name: entry.venue.name.to_string(),
            city: entry.venue.city.to_string(),
            state: entry.venue.state.to_string(),
            country: "US".to_string(),
            address: None,
            postal_code: None,
            location: Some(GeoPoint {
                lat: entry.venue.lat,
                lon: entry.venue.lon,
            }),
        },
        performers,
        stats: EventStats {
            lowest_price: Some(lowest),
            highest_price: Some(highest),
            average_price: Some(((lowest + highest) / 2.0).round()),
            listing_count: Some(entry.listing_count),
        },
        score: entry.score,
        url: format!("https://seatgeek.com/{}-tickets", entry.slug),
        event_type: entry.event_type.to_string(),
        taxonomies: entry
            .taxonomies
            .iter()
            .map(|(id, name)| Taxonomy {
                id: *id,
                name: (*name).to_string(),
                parent_id: None,
            })
            .collect(),
    }
}

fn build_catalog() -> Vec<Event> {
    let msg = || CatalogVenue {
        id: 1,
        name: "Madison Square Garden",
        city: "New York",
        state: "NY",
        lat: 40.7505,
        lon: -73.9934,
    };

    let entries = vec![
        CatalogEntry {
            id: 1001,
            title: "Taylor Swift | The Eras Tour",
            short_title: "Taylor Swift",
            days_ahead: 2,
            venue: msg(),
            performers: &[(101, "Taylor Swift", Some("taylor-swift-a0e4a6/14"))],
            prices: (250.0, 1500.0),
            listing_count: 1234,
            score: 0.95,
            slug: "taylor-swift",
            event_type: "concert",
            taxonomies: &[(1, "concert")],
        },
        CatalogEntry {
            id: 1002,
            title: "New York Knicks vs Los Angeles Lakers",
            short_title: "Knicks vs Lakers",
            days_ahead: 1,
            venue: msg(),
            performers: &[
                (201, "New York Knicks", Some("new-york-knicks-a3accc/15301")),
                (202, "Los Angeles Lakers", Some("los-angeles-lakers-6add5c/15275")),
            ],
            prices: (89.0, 850.0),
            listing_count: 567,
            score: 0.88,
            slug: "nba",
            event_type: "nba",
            taxonomies: &[(2, "sports")],
        },
        CatalogEntry {
            id: 1003,
            title: "Hamilton - The Musical",
            short_title: "Hamilton",
            days_ahead: 3,
            venue: CatalogVenue {
                id: 2,
                name: "Richard Rodgers Theatre",
                city: "New York",
                state: "NY",
                lat: 40.7590,
                lon: -73.9870,
            },
            performers: &[(301, "Hamilton", Some("hamilton-new-york-1d7d63/529030"))],
            prices: (199.0, 899.0),
            listing_count: 245,
            score: 0.92,
            slug: "hamilton",
            event_type: "broadway",
            taxonomies: &[(3, "theater")],
        },
        CatalogEntry {
            id: 1004,
            title: "Dave Chappelle Live",
            short_title: "Dave Chappelle",
            days_ahead: 5,
            venue: CatalogVenue {
                id: 3,
                name: "Radio City Music Hall",
                city: "New York",
                state: "NY",
                lat: 40.7600,
                lon: -73.9800,
            },
            performers: &[(401, "Dave Chappelle", Some("dave-chappelle-3e1e4e/29735"))],
            prices: (125.0, 450.0),
            listing_count: 189,
            score: 0.85,
            slug: "dave-chappelle",
            event_type: "comedy",
            taxonomies: &[(4, "comedy")],
        },
        CatalogEntry {
            id: 1005,
            title: "New York Philharmonic - Beethoven's 9th",
            short_title: "NY Philharmonic",
            days_ahead: 4,
            venue: CatalogVenue {
                id: 4,
                name: "David Geffen Hall",
                city: "New York",
                state: "NY",
                lat: 40.7725,
                lon: -73.9835,
            },
            performers: &[(501, "New York Philharmonic", None)],
            prices: (45.0, 225.0),
            listing_count: 312,
            score: 0.75,
            slug: "philharmonic",
            event_type: "classical_orchestral_instrumental",
            taxonomies: &[(5, "classical")],
        },
        CatalogEntry {
            id: 1006,
            title: "Disney On Ice: Find Your Hero",
            short_title: "Disney On Ice",
            days_ahead: 6,
            venue: CatalogVenue {
                id: 5,
                name: "Barclays Center",
                city: "Brooklyn",
                state: "NY",
                lat: 40.6828,
                lon: -73.9758,
            },
            performers: &[(601, "Disney On Ice", None)],
            prices: (35.0, 150.0),
            listing_count: 456,
            score: 0.78,
            slug: "disney-on-ice",
            event_type: "family",
            taxonomies: &[(6, "family")],
        },
        CatalogEntry {
            id: 2001,
            title: "Coldplay | Music of the Spheres Tour",
            short_title: "Coldplay",
            days_ahead: 3,
            venue: CatalogVenue {
                id: 10,
                name: "MetLife Stadium",
                city: "East Rutherford",
                state: "NJ",
                lat: 40.8128,
                lon: -74.0742,
            },
            performers: &[(1001, "Coldplay", Some("coldplay-e9c676/9"))],
            prices: (150.0, 750.0),
            listing_count: 2500,
            score: 0.92,
            slug: "coldplay",
            event_type: "concert",
            taxonomies: &[(1, "concert")],
        },
        CatalogEntry {
            id: 2002,
            title: "NBA Finals Game 7",
            short_title: "NBA Finals",
            days_ahead: 7,
            venue: CatalogVenue {
                id: 11,
                name: "Chase Center",
                city: "San Francisco",
                state: "CA",
                lat: 37.768,
                lon: -122.3877,
            },
            performers: &[
                (1002, "Golden State Warriors", None),
                (1003, "Boston Celtics", None),
            ],
            prices: (500.0, 5000.0),
            listing_count: 1800,
            score: 0.98,
            slug: "nba-finals",
            event_type: "nba",
            taxonomies: &[(2, "sports")],
        },
        CatalogEntry {
            id: 2003,
            title: "The Phantom of the Opera",
            short_title: "Phantom",
            days_ahead: 2,
            venue: CatalogVenue {
                id: 12,
                name: "Majestic Theatre",
                city: "New York",
                state: "NY",
                lat: 40.7581,
                lon: -73.9876,
            },
            performers: &[(1004, "Phantom of the Opera", None)],
            prices: (79.0, 350.0),
            listing_count: 400,
            score: 0.65,
            slug: "phantom",
            event_type: "broadway",
            taxonomies: &[(3, "theater")],
        },
        CatalogEntry {
            id: 2004,
            title: "John Mulaney: Everybody's in L.A.",
            short_title: "John Mulaney",
            days_ahead: 5,
            venue: CatalogVenue {
                id: 13,
                name: "The Forum",
                city: "Inglewood",
                state: "CA",
                lat: 33.9583,
                lon: -118.3419,
            },
            performers: &[(1005, "John Mulaney", None)],
            prices: (65.0, 250.0),
            listing_count: 320,
            score: 0.82,
            slug: "john-mulaney",
            event_type: "comedy",
            taxonomies: &[(4, "comedy")],
        },
        CatalogEntry {
            id: 2005,
            title: "Vienna Philharmonic Orchestra",
            short_title: "Vienna Philharmonic",
            days_ahead: 4,
            venue: CatalogVenue {
                id: 14,
                name: "Carnegie Hall",
                city: "New York",
                state: "NY",
                lat: 40.765,
                lon: -73.9799,
            },
            performers: &[(1006, "Vienna Philharmonic", None)],
            prices: (85.0, 400.0),
            listing_count: 180,
            score: 0.55,
            slug: "vienna-philharmonic",
            event_type: "classical_orchestral_instrumental",
            taxonomies: &[(5, "classical")],
        },
        CatalogEntry {
            id: 2006,
            title: "EDC Las Vegas",
            short_title: "EDC Vegas",
            days_ahead: 14,
            venue: CatalogVenue {
                id: 15,
                name: "Las Vegas Motor Speedway",
                city: "Las Vegas",
                state: "NV",
                lat: 36.2722,
                lon: -115.0115,
            },
            performers: &[(1007, "EDC Las Vegas", None)],
            prices: (350.0, 1500.0),
            listing_count: 890,
            score: 0.89,
            slug: "edc",
            event_type: "edm",
            taxonomies: &[(1, "concert"), (7, "festival")],
        },
        CatalogEntry {
            id: 2007,
            title: "Blue Note Jazz Festival",
            short_title: "Blue Note Jazz",
            days_ahead: 6,
            venue: CatalogVenue {
                id: 16,
                name: "Blue Note Jazz Club",
                city: "New York",
                state: "NY",
                lat: 40.7308,
                lon: -74.0005,
            },
            performers: &[(1008, "Blue Note All-Stars", None)],
            prices: (45.0, 150.0),
            listing_count: 75,
            score: 0.48,
            slug: "blue-note",
            event_type: "jazz",
            taxonomies: &[(1, "concert"), (8, "jazz")],
        },
        CatalogEntry {
            id: 2008,
            title: "Cirque du Soleil: KOOZA",
            short_title: "Cirque KOOZA",
            days_ahead: 8,
            venue: CatalogVenue {
                id: 17,
                name: "Grand Chapiteau",
                city: "Atlanta",
                state: "GA",
                lat: 33.749,
                lon: -84.388,
            },
            performers: &[(1009, "Cirque du Soleil", None)],
            prices: (55.0, 200.0),
            listing_count: 350,
            score: 0.72,
            slug: "cirque",
            event_type: "family",
            taxonomies: &[(6, "family")],
        },
    ];

    entries.into_iter().map(build_event).collect()
}

/// Index of the first item on a 1-based page; saturates instead of overflowing
fn page_offset(page: u32, per_page: u32) -> usize {
    let offset = u64::from(page.saturating_sub(1)).saturating_mul(u64::from(per_page));
    usize::try_from(offset).unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_covers_default_categories() {
        let source = MockEventSource::new();
        assert_eq!(source.catalog().len(), 14);

        for category in evc_common::models::DEFAULT_CATEGORIES {
            assert!(
                source.catalog().iter().any(|e| e.has_taxonomy(category)),
                "no mock event for {}",
                category
            );
        }
    }

    #[tokio::test]
    async fn test_taxonomy_filter_is_and() {
        let source = MockEventSource::new();

        let params = EventSearchParams {
            taxonomies_name: Some("concert".to_string()),
            ..Default::default()
        };
        let concerts = source.search_events(&params).await.unwrap();
        assert_eq!(concerts.meta.total, 4);

        let params = EventSearchParams {
            taxonomies_name: Some("concert,festival".to_string()),
            ..Default::default()
        };
        let both = source.search_events(&params).await.unwrap();
        let ids: Vec<i64> = both.events.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![2006]);
    }

    #[tokio::test]
    async fn test_search_sort_and_paging() {
        let source = MockEventSource::new();
        let params = EventSearchParams {
            sort: Some("score.desc".to_string()),
            per_page: Some(3),
            page: Some(2),
            ..Default::default()
        };
        let result = source.search_events(&params).await.unwrap();

        assert_eq!(result.meta.total, 14);
        assert_eq!(result.meta.page, 2);
        assert_eq!(result.events.len(), 3);
        assert!(result.events.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[tokio::test]
    async fn test_paging_far_past_the_end_is_empty() {
        let source = MockEventSource::new();
        let params = EventSearchParams {
            page: Some(70_000),
            per_page: Some(70_000),
            ..Default::default()
        };
        let result = source.search_events(&params).await.unwrap();
        assert!(result.events.is_empty());
        assert_eq!(result.meta.total, 14);
        assert_eq!(result.meta.page, 70_000);

        let seed = RecommendationSeed::for_event(2003).with_paging(u32::MAX, u32::MAX);
        let events = source.get_recommendations(&seed).await.unwrap().into_events();
        assert!(events.is_empty());
    }

    #[test]
    fn test_page_offset_saturates() {
        assert_eq!(page_offset(1, 20), 0);
        assert_eq!(page_offset(3, 5), 10);
        assert_eq!(page_offset(0, 5), 0);
        assert!(page_offset(u32::MAX, u32::MAX) > 1_000_000);
    }

    #[tokio::test]
    async fn test_query_matches_performer() {
        let source = MockEventSource::new();
        let params = EventSearchParams {
            q: Some("lakers".to_string()),
            ..Default::default()
        };
        let result = source.search_events(&params).await.unwrap();
        assert_eq!(result.events.len(), 1);
        assert_eq!(result.events[0].id, 1002);
    }

    #[tokio::test]
    async fn test_recommendations_by_event_share_category() {
        let source = MockEventSource::new();
        let seed = RecommendationSeed::for_event(2003).with_paging(1, 10);
        let events = source.get_recommendations(&seed).await.unwrap().into_events();

        assert!(!events.is_empty());
        assert!(events.iter().all(|e| e.has_taxonomy("theater")));
    }

    #[tokio::test]
    async fn test_performer_search_by_category() {
        let source = MockEventSource::new();
        let found = source
            .search_performers(&PerformerQuery {
                q: "sports".to_string(),
                per_page: 3,
            })
            .await
            .unwrap();

        assert_eq!(found.len(), 3);
        assert_eq!(found[0].id, 201);
    }
}
