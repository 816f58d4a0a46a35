//! Timeline entity records published by applications.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A single time-series record published to the collector.
///
/// The collector treats the record as opaque beyond its identity fields;
/// storage encoding is the writer's concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntity {
    /// Entity identifier, unique within its type
    pub id: String,

    /// Entity type, grouping related records
    #[serde(rename = "type")]
    pub entity_type: String,

    /// Creation time in epoch milliseconds
    #[serde(default)]
    pub created_time: i64,

    /// Free-form key/value payload
    #[serde(default)]
    pub info: HashMap<String, serde_json::Value>,
}

impl TimelineEntity {
    /// Creates an entity with an empty info map
    pub fn new(id: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entity_type: entity_type.into(),
            created_time: 0,
            info: HashMap::new(),
        }
    }

    /// Adds an info key/value pair
    pub fn add_info(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.info.insert(key.into(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_serde_shape() {
        let mut entity = TimelineEntity::new("entity1", "dummy_type");
        entity.add_info("attempts", serde_json::json!(3));

        let json = serde_json::to_value(&entity).unwrap();
        assert_eq!(json["id"], "entity1");
        assert_eq!(json["type"], "dummy_type");

        let parsed: TimelineEntity = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, entity);
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let parsed: TimelineEntity =
            serde_json::from_str(r#"{"id":"e","type":"t"}"#).unwrap();
        assert_eq!(parsed.created_time, 0);
        assert!(parsed.info.is_empty());
    }
}
