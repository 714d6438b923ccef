//! Mood vector to category mapping
//!
//! Energy picks a base category set and social narrows it by intersection.
//! When neither axis constrains anything, or the intersection comes out empty,
//! the broad default set applies. The rule is materialised as a nine-row
//! table so each combination can be checked directly.

use evc_common::models::{Budget, Energy, Social};

pub const HIGH_ENERGY: &[&str] = &["concert", "sports", "edm", "festival"];
pub const LOW_ENERGY: &[&str] = &["theater", "classical", "comedy", "jazz"];
pub const GROUP: &[&str] = &["sports", "concert", "festival", "family"];
pub const INTIMATE: &[&str] = &["theater", "classical", "comedy", "jazz"];

/// Used when the axes leave no category
pub const BROAD: &[&str] = &["concert", "sports", "theater", "comedy"];

/// energy × social → ordered category list
///
/// Category order is the base set's order, which decides duplicate
/// precedence during the fan-out merge.
pub const MOOD_TABLE: [(Energy, Social, &[&str]); 9] = [
    (Energy::High, Social::Group, &["concert", "sports", "festival"]),
    (Energy::High, Social::Intimate, BROAD),
    (Energy::High, Social::Any, HIGH_ENERGY),
    (Energy::Low, Social::Group, BROAD),
    (Energy::Low, Social::Intimate, LOW_ENERGY),
    (Energy::Low, Social::Any, LOW_ENERGY),
    (Energy::Any, Social::Group, GROUP),
    (Energy::Any, Social::Intimate, INTIMATE),
    (Energy::Any, Social::Any, BROAD),
];

pub fn resolve_categories(energy: Energy, social: Social) -> &'static [&'static str] {
    MOOD_TABLE
        .iter()
        .find(|(e, s, _)| *e == energy && *s == social)
        .map(|(_, _, categories)| *categories)
        .unwrap_or(BROAD)
}

/// Inclusive price band for a budget level; `None` for `any`
///
/// Bands overlap on purpose (medium shares 50..=75 with low and 150..=200
/// with high).
pub fn budget_band(budget: Budget) -> Option<(f64, f64)> {
    match budget {
        Budget::Low => Some((0.0, 75.0)),
        Budget::Medium => Some((50.0, 200.0)),
        Budget::High => Some((150.0, 1000.0)),
        Budget::Any => None,
    }
}
