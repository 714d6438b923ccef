//! # Event Concierge Common Library
//!
//! Shared code for the Event Concierge service including:
//! - Event catalog models (events, venues, performers, taxonomies)
//! - Recommendation request/response types and the mood vector
//! - User profile and preference models
//! - Onboarding state machine
//! - Configuration loading and root folder resolution
//! - The local preference store (SQLite)

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod onboarding;

pub use error::{Error, Result};
pub use onboarding::OnboardingState;
