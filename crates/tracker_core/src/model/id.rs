//! Opaque entity identifiers.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Identifier of a task, habit or note.
///
/// Freshly created entities get a random UUID v4; identifiers read from
/// storage or backups are kept verbatim whatever their shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for EntityId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::EntityId;

    #[test]
    fn generated_ids_differ() {
        assert_ne!(EntityId::generate(), EntityId::generate());
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = EntityId::from("1705312800000");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"1705312800000\"");
    }
}
