//! User settings: a flat option-name to value map.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Flat settings mapping. No cross-field invariants are enforced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings(BTreeMap<String, Value>);

impl Default for Settings {
    fn default() -> Self {
        let mut values = BTreeMap::new();
        values.insert("theme".to_string(), Value::from("minimal"));
        values.insert("defaultView".to_string(), Value::from("daily"));
        values.insert("showCompleted".to_string(), Value::from(true));
        values.insert("autoSave".to_string(), Value::from(true));
        values.insert("reminderTime".to_string(), Value::from("09:00"));
        values.insert("exportFormat".to_string(), Value::from("pdf"));
        Self(values)
    }
}

impl Settings {
    /// Settings with no options at all.
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Sets one option and returns the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl From<BTreeMap<String, Value>> for Settings {
    fn from(value: BTreeMap<String, Value>) -> Self {
        Self(value)
    }
}
