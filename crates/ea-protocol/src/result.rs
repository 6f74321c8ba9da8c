//! The uniform key/value result handed to the presentation layer.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Message used whenever a query matched no rows.
pub const NO_DATA_MESSAGE: &str = "No data found for the given query.";

/// A string-keyed mapping, never a bare table or list.
///
/// Three shapes occur in practice: `{"message": ...}`, `{"data": ...}`,
/// or a flat row of `"Emission Date"` plus industry values. Key order is
/// insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedResult(Map<String, Value>);

impl NormalizedResult {
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// `{"message": text}`
    pub fn message(text: impl Into<String>) -> Self {
        let mut map = Map::new();
        map.insert("message".into(), Value::String(text.into()));
        Self(map)
    }

    /// `{"data": text}`
    pub fn data(text: impl Into<String>) -> Self {
        let mut map = Map::new();
        map.insert("data".into(), Value::String(text.into()));
        Self(map)
    }

    pub fn no_data() -> Self {
        Self::message(NO_DATA_MESSAGE)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The `message` field, if this is a message result.
    pub fn message_text(&self) -> Option<&str> {
        self.0.get("message").and_then(Value::as_str)
    }

    /// The `data` field, if this is a flattened list result.
    pub fn data_text(&self) -> Option<&str> {
        self.0.get("data").and_then(Value::as_str)
    }

    pub fn is_no_data(&self) -> bool {
        self.0.len() == 1 && self.message_text() == Some(NO_DATA_MESSAGE)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for NormalizedResult {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
