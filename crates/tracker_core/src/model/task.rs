//! Task domain model.
//!
//! # Invariants
//! - `text` is stored trimmed and is never empty.
//! - `id` is assigned by the repository and never changes.

use crate::model::id::EntityId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Task urgency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

/// Planning horizon a task belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

/// One to-do item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: EntityId,
    pub text: String,
    pub completed: bool,
    pub due_date: NaiveDate,
    pub priority: Priority,
    pub category: Category,
}

/// Input for creating a task. Unset fields take the defaults
/// (due today, medium priority, daily).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub text: String,
    pub due_date: Option<NaiveDate>,
    pub priority: Option<Priority>,
    pub category: Option<Category>,
}

impl TaskDraft {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn due(mut self, date: NaiveDate) -> Self {
        self.due_date = Some(date);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }
}

/// Partial update for a task; `None` fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub text: Option<String>,
    pub completed: Option<bool>,
    pub due_date: Option<NaiveDate>,
    pub priority: Option<Priority>,
    pub category: Option<Category>,
}
