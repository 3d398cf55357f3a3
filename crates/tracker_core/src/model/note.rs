//! Note domain model.
//!
//! # Invariants
//! - `title` is never blank once saved; blank titles become [`UNTITLED_NOTE`].
//! - `updated_at >= created_at`, and every save refreshes `updated_at`.

use crate::model::id::EntityId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title given to notes saved without one.
pub const UNTITLED_NOTE: &str = "Untitled Note";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: EntityId,
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a note. The default draft is an empty untitled note.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
}

impl NoteDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}

/// Partial update for a note. Saving always bumps `updated_at`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
}

/// Trims `title`, falling back to [`UNTITLED_NOTE`] when blank.
pub fn normalize_title(title: &str) -> String {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        UNTITLED_NOTE.to_string()
    } else {
        trimmed.to_string()
    }
}
