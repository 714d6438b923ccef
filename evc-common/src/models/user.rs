//! User profile and preference models
//!
//! Single-tenant: every record is keyed by [`DEFAULT_USER_ID`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::Error;

/// Fixed record id of the one implicit user
pub const DEFAULT_USER_ID: &str = "default-user";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub is_onboarded: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Fresh, not yet onboarded profile for the default user
    pub fn new_default() -> Self {
        let now = Utc::now();
        Self {
            id: DEFAULT_USER_ID.to_string(),
            name: None,
            email: None,
            is_onboarded: false,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserLocation {
    pub lat: f64,
    pub lng: f64,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetRange {
    pub min: f64,
    pub max: f64,
}

impl Default for BudgetRange {
    fn default() -> Self {
        Self { min: 0.0, max: 200.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupSize {
    Solo,
    Couple,
    SmallGroup,
    LargeGroup,
}

impl GroupSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupSize::Solo => "solo",
            GroupSize::Couple => "couple",
            GroupSize::SmallGroup => "small-group",
            GroupSize::LargeGroup => "large-group",
        }
    }

    /// Inclusive head-count range the option stands for
    pub fn people(&self) -> (u32, u32) {
        match self {
            GroupSize::Solo => (1, 1),
            GroupSize::Couple => (2, 2),
            GroupSize::SmallGroup => (3, 5),
            GroupSize::LargeGroup => (6, 20),
        }
    }
}

impl FromStr for GroupSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "solo" => Ok(GroupSize::Solo),
            "couple" => Ok(GroupSize::Couple),
            "small-group" => Ok(GroupSize::SmallGroup),
            "large-group" => Ok(GroupSize::LargeGroup),
            other => Err(Error::InvalidInput(format!("Unknown group size: {}", other))),
        }
    }
}

/// Interest categories offered during onboarding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterestCategory {
    Concerts,
    Sports,
    Theater,
    Comedy,
    Jazz,
    Classical,
    Edm,
    Family,
    Festivals,
}

impl InterestCategory {
    /// Provider taxonomy name for this interest. Jazz and EDM are filed under concerts.
    pub fn taxonomy(&self) -> &'static str {
        match self {
            InterestCategory::Concerts => "concert",
            InterestCategory::Sports => "sports",
            InterestCategory::Theater => "theater",
            InterestCategory::Comedy => "comedy",
            InterestCategory::Jazz => "concert",
            InterestCategory::Classical => "classical",
            InterestCategory::Edm => "concert",
            InterestCategory::Family => "family",
            InterestCategory::Festivals => "festival",
        }
    }
}

/// Distinct taxonomy names for a set of interests, first occurrence order
pub fn interests_to_taxonomies(interests: &[InterestCategory]) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(interests.len());
    for interest in interests {
        let name = interest.taxonomy();
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    pub id: String,
    pub location: Option<UserLocation>,
    pub interests: Vec<InterestCategory>,
    pub budget_range: BudgetRange,
    pub group_size: GroupSize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserPreferences {
    /// Preferences used before onboarding has stored anything
    pub fn new_default() -> Self {
        let now = Utc::now();
        Self {
            id: DEFAULT_USER_ID.to_string(),
            location: None,
            interests: Vec::new(),
            budget_range: BudgetRange::default(),
            group_size: GroupSize::Solo,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn taxonomy_interests(&self) -> Vec<String> {
        interests_to_taxonomies(&self.interests)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_range: Option<BudgetRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<UserLocation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHistoryEntry {
    pub id: String,
    pub query: String,
    pub filters: SearchFilters,
    pub timestamp: DateTime<Utc>,
}
