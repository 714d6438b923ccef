//! Domain models shared by the store and the HTTP service

pub mod event;
pub mod recommendation;
pub mod user;

pub use event::{
    Event, EventStats, GeoPoint, Performer, PerformerImages, Taxonomy, Venue, DEFAULT_CATEGORIES,
};
pub use recommendation::{
    Budget, Energy, MoodParams, RecommendationMeta, RecommendationParams, RecommendationResult,
    ResultSource, Social,
};
pub use user::{
    interests_to_taxonomies, BudgetRange, GroupSize, InterestCategory, SearchFilters,
    SearchHistoryEntry, UserLocation, UserPreferences, UserProfile, DEFAULT_USER_ID,
};
