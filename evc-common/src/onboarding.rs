//! Onboarding wizard state
//!
//! Held in memory while the user walks through the five onboarding steps and
//! copied into [`UserPreferences`] only when onboarding completes. Intermediate
//! states may be incomplete (no group size chosen yet, no location).

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::models::{BudgetRange, GroupSize, InterestCategory, UserLocation, UserPreferences};
use crate::{Error, Result};

pub const FIRST_STEP: u8 = 1;
pub const LAST_STEP: u8 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingState {
    pub current_step: u8,
    pub location: Option<UserLocation>,
    pub interests: Vec<InterestCategory>,
    pub budget_range: BudgetRange,
    pub group_size: Option<GroupSize>,
}

impl Default for OnboardingState {
    fn default() -> Self {
        Self {
            current_step: FIRST_STEP,
            location: None,
            interests: Vec::new(),
            budget_range: BudgetRange::default(),
            group_size: None,
        }
    }
}

impl OnboardingState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the wizard from stored preferences (step resets to the first one)
    pub fn from_preferences(prefs: &UserPreferences) -> Self {
        Self {
            current_step: FIRST_STEP,
            location: prefs.location.clone(),
            interests: prefs.interests.clone(),
            budget_range: prefs.budget_range,
            group_size: Some(prefs.group_size),
        }
    }

    pub fn set_step(&mut self, step: u8) -> Result<()> {
        if !(FIRST_STEP..=LAST_STEP).contains(&step) {
            return Err(Error::InvalidInput(format!(
                "Onboarding step must be between {} and {}, got {}",
                FIRST_STEP, LAST_STEP, step
            )));
        }
        self.current_step = step;
        Ok(())
    }

    pub fn next_step(&mut self) {
        self.current_step = (self.current_step + 1).min(LAST_STEP);
    }

    pub fn previous_step(&mut self) {
        self.current_step = self.current_step.saturating_sub(1).max(FIRST_STEP);
    }

    pub fn is_last_step(&self) -> bool {
        self.current_step == LAST_STEP
    }

    pub fn set_location(&mut self, location: Option<UserLocation>) {
        self.location = location;
    }

    /// Replace the interest list, dropping repeats but keeping first-seen order
    pub fn set_interests(&mut self, interests: Vec<InterestCategory>) {
        let mut unique = Vec::with_capacity(interests.len());
        for interest in interests {
            if !unique.contains(&interest) {
                unique.push(interest);
            }
        }
        self.interests = unique;
    }

    /// Add the interest if absent, remove it otherwise
    pub fn toggle_interest(&mut self, interest: InterestCategory) {
        if let Some(pos) = self.interests.iter().position(|i| *i == interest) {
            self.interests.remove(pos);
        } else {
            self.interests.push(interest);
        }
    }

    pub fn set_budget_range(&mut self, range: BudgetRange) -> Result<()> {
        if range.min < 0.0 || range.max < 0.0 {
            return Err(Error::InvalidInput(
                "Budget range cannot be negative".to_string(),
            ));
        }
        if range.min > range.max {
            return Err(Error::InvalidInput(format!(
                "Budget minimum {} exceeds maximum {}",
                range.min, range.max
            )));
        }
        self.budget_range = range;
        Ok(())
    }

    pub fn set_group_size(&mut self, size: Option<GroupSize>) {
        self.group_size = size;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Build the preferences record to persist on completion
    ///
    /// `existing` supplies the id and creation time when preferences were
    /// stored before. A group size that was never picked becomes solo.
    pub fn to_preferences(&self, existing: Option<&UserPreferences>) -> UserPreferences {
        let now = Utc::now();
        let base = existing.cloned().unwrap_or_else(UserPreferences::new_default);
        UserPreferences {
            id: base.id,
            location: self.location.clone(),
            interests: self.interests.clone(),
            budget_range: self.budget_range,
            group_size: self.group_size.unwrap_or(GroupSize::Solo),
            created_at: base.created_at,
            updated_at: now,
        }
    }
}
