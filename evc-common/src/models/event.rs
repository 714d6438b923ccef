//! Event catalog models
//!
//! Shapes follow the ticketing provider's event documents. Upstream payloads are
//! loosely typed, so every field except `id` tolerates being absent or `null`.

use serde::{Deserialize, Deserializer, Serialize};

/// Category names used whenever the provider's taxonomy listing is unavailable
pub const DEFAULT_CATEGORIES: [&str; 7] = [
    "concert",
    "sports",
    "theater",
    "comedy",
    "classical",
    "family",
    "festival",
];

/// A ticketed event as returned by the remote event source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Stable identifier assigned by the provider
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_title: Option<String>,
    /// Local start time as reported upstream (no offset)
    #[serde(default)]
    pub datetime_local: Option<String>,
    /// UTC start time as reported upstream
    #[serde(default)]
    pub datetime_utc: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub venue: Venue,
    /// Ordered performer list; the headliner carries `primary = true`
    #[serde(default, deserialize_with = "null_as_default")]
    pub performers: Vec<Performer>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stats: EventStats,
    /// Popularity score in [0, 1]. Missing upstream reads as 0.
    #[serde(default, deserialize_with = "null_as_default")]
    pub score: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    /// Free-text type label ("concert", "nba", "broadway", ...)
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub event_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub taxonomies: Vec<Taxonomy>,
}

impl Event {
    /// Lowest listed price, `None` when the provider doesn't know it
    pub fn lowest_price(&self) -> Option<f64> {
        self.stats.lowest_price
    }

    /// Case-insensitive check against the event's taxonomy tags
    pub fn has_taxonomy(&self, name: &str) -> bool {
        self.taxonomies
            .iter()
            .any(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// Loose OR match: true when any taxonomy tag equals any of `interests`
    pub fn matches_any_interest<S: AsRef<str>>(&self, interests: &[S]) -> bool {
        interests.iter().any(|i| self.has_taxonomy(i.as_ref()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub city: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub state: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub location: Option<GeoPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Performer {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<PerformerImages>,
    /// Headliner flag
    #[serde(default, deserialize_with = "null_as_default")]
    pub primary: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformerImages {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub huge: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub large: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medium: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub small: Option<String>,
}

/// Ticket listing statistics. `None` prices mean "unknown".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventStats {
    #[serde(default)]
    pub lowest_price: Option<f64>,
    #[serde(default)]
    pub highest_price: Option<f64>,
    #[serde(default)]
    pub average_price: Option<f64>,
    #[serde(default)]
    pub listing_count: Option<i64>,
}

/// Event category; `name` is the lowercase canonical string ("concert", "sports")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taxonomy {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<i64>,
}

impl Taxonomy {
    /// The fixed fallback category list (ids 1..=7)
    pub fn defaults() -> Vec<Taxonomy> {
        DEFAULT_CATEGORIES
            .iter()
            .enumerate()
            .map(|(i, name)| Taxonomy {
                id: i as i64 + 1,
                name: (*name).to_string(),
                parent_id: None,
            })
            .collect()
    }
}

/// Treat an explicit JSON `null` the same as a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
