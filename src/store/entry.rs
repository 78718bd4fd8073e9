//! Stored entry representation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single versioned value owned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Store-assigned or caller-chosen identifier.
    pub id: String,
    /// JSON payload.
    pub value: Value,
    /// Store-wide monotonic version of the last mutation.
    pub version: u64,
    /// Wall-clock time of the last mutation.
    pub modified_at: DateTime<Utc>,
}

impl Entry {
    /// Rebuild an entry previously placed into a request context.
    pub fn from_value(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }

    /// Public view of the entry: id, version and payload.
    pub fn summary(&self) -> Value {
        let mut map = Map::new();
        map.insert("id".into(), Value::String(self.id.clone()));
        map.insert("version".into(), Value::from(self.version));
        map.insert("value".into(), self.value.clone());
        Value::Object(map)
    }
}

impl From<Entry> for Value {
    fn from(entry: Entry) -> Self {
        let mut map = Map::new();
        map.insert("id".into(), Value::String(entry.id));
        map.insert("value".into(), entry.value);
        map.insert("version".into(), Value::from(entry.version));
        map.insert(
            "modified_at".into(),
            Value::String(entry.modified_at.to_rfc3339()),
        );
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_context_value_round_trip() {
        let entry = Entry {
            id: "7".into(),
            value: json!({"title": "hello"}),
            version: 3,
            modified_at: Utc::now(),
        };

        let value: Value = entry.clone().into();
        assert_eq!(value["id"], "7");
        assert_eq!(Entry::from_value(&value), Some(entry));
    }

    #[test]
    fn test_summary_hides_timestamp() {
        let entry = Entry {
            id: "1".into(),
            value: json!(42),
            version: 9,
            modified_at: Utc::now(),
        };
        assert_eq!(entry.summary(), json!({"id": "1", "version": 9, "value": 42}));
    }
}
