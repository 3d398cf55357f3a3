//! Habit domain model.
//!
//! # Invariants
//! - `name` is stored trimmed and is never empty.
//! - `completed_dates` holds each calendar date at most once.

use crate::calc::streak::current_streak;
use crate::model::id::EntityId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A recurring daily habit and the days it was done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub completed_dates: BTreeSet<NaiveDate>,
}

impl Habit {
    pub fn is_completed_on(&self, date: NaiveDate) -> bool {
        self.completed_dates.contains(&date)
    }

    /// Flips completion for `date` and returns the new state.
    pub fn toggle(&mut self, date: NaiveDate) -> bool {
        if self.completed_dates.remove(&date) {
            false
        } else {
            self.completed_dates.insert(date);
            true
        }
    }

    /// Consecutive completed days ending at `today`.
    pub fn streak(&self, today: NaiveDate) -> u32 {
        current_streak(&self.completed_dates, today)
    }
}

/// Input for creating a habit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HabitDraft {
    pub name: String,
}

impl HabitDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Partial update for a habit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HabitPatch {
    pub name: Option<String>,
    pub completed_dates: Option<BTreeSet<NaiveDate>>,
}
