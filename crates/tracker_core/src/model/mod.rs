//! Domain model for the tracker collections.
//!
//! # Responsibility
//! - Define the persisted shapes of tasks, habits, notes and settings.
//! - Own field-level validation that runs before anything is persisted.
//!
//! # Invariants
//! - Every entity carries an `EntityId` unique within its collection.
//! - Serialized field names are camelCase to stay compatible with backups.

pub mod habit;
pub mod id;
pub mod note;
pub mod settings;
pub mod task;
pub mod validation;

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// One persisted slot of the tracker store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    Tasks,
    Habits,
    Notes,
    Settings,
}

impl CollectionKind {
    pub const ALL: [CollectionKind; 4] = [
        CollectionKind::Tasks,
        CollectionKind::Habits,
        CollectionKind::Notes,
        CollectionKind::Settings,
    ];

    /// Short key under which the collection is stored (before namespacing).
    pub fn slot(self) -> &'static str {
        match self {
            Self::Tasks => "tasks",
            Self::Habits => "habits",
            Self::Notes => "notes",
            Self::Settings => "settings",
        }
    }
}

impl Display for CollectionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slot())
    }
}
