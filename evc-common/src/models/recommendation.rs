//! Recommendation request/response types and the mood vector

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::event::Event;
use crate::Error;

/// Energy axis of the mood vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Energy {
    High,
    Low,
    Any,
}

/// Social axis of the mood vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Social {
    Group,
    Intimate,
    Any,
}

/// Spending axis of the mood vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Budget {
    Low,
    Medium,
    High,
    Any,
}

impl FromStr for Energy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Energy::High),
            "low" => Ok(Energy::Low),
            "any" => Ok(Energy::Any),
            _ => Err(Error::InvalidInput(
                "Invalid energy parameter. Must be 'high', 'low', or 'any'".to_string(),
            )),
        }
    }
}

impl FromStr for Social {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "group" => Ok(Social::Group),
            "intimate" => Ok(Social::Intimate),
            "any" => Ok(Social::Any),
            _ => Err(Error::InvalidInput(
                "Invalid social parameter. Must be 'group', 'intimate', or 'any'".to_string(),
            )),
        }
    }
}

impl FromStr for Budget {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Budget::Low),
            "medium" => Ok(Budget::Medium),
            "high" => Ok(Budget::High),
            "any" => Ok(Budget::Any),
            _ => Err(Error::InvalidInput(
                "Invalid budget parameter. Must be 'low', 'medium', 'high', or 'any'".to_string(),
            )),
        }
    }
}

/// Three-axis mood vector driving mood-based matching
///
/// Always fully specified; the HTTP layer defaults each missing axis to `any`
/// before constructing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodParams {
    pub energy: Energy,
    pub social: Social,
    pub budget: Budget,
}

impl MoodParams {
    pub fn new(energy: Energy, social: Social, budget: Budget) -> Self {
        Self {
            energy,
            social,
            budget,
        }
    }

    /// Parse the three raw axis values, reporting the first invalid one
    pub fn parse(energy: &str, social: &str, budget: &str) -> crate::Result<Self> {
        Ok(Self {
            energy: energy.parse()?,
            social: social.parse()?,
            budget: budget.parse()?,
        })
    }
}

/// Seeds, filters and paging for every recommendation view
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationParams {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub city: Option<String>,
    pub state: Option<String>,
    /// Category names; matched case-insensitively against taxonomy tags
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub performer_ids: Vec<i64>,
    pub event_id: Option<i64>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl RecommendationParams {
    /// Resolved `(page, per_page)` with the view's default page size
    pub fn paging(&self, default_per_page: u32) -> (u32, u32) {
        (
            self.page.unwrap_or(1).max(1),
            self.per_page.unwrap_or(default_per_page),
        )
    }

    /// Both coordinates present
    pub fn location(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

/// Provenance of a recommendation result. Informational only, never used for ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultSource {
    Recommendations,
    Search,
    Mock,
}

impl fmt::Display for ResultSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResultSource::Recommendations => "recommendations",
            ResultSource::Search => "search",
            ResultSource::Mock => "mock",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationMeta {
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub source: ResultSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub events: Vec<Event>,
    pub meta: RecommendationMeta,
}

impl RecommendationResult {
    pub fn new(events: Vec<Event>, total: u64, page: u32, per_page: u32, source: ResultSource) -> Self {
        Self {
            events,
            meta: RecommendationMeta {
                total,
                page,
                per_page,
                source,
            },
        }
    }

    pub fn empty(page: u32, per_page: u32, source: ResultSource) -> Self {
        Self::new(Vec::new(), 0, page, per_page, source)
    }
}
