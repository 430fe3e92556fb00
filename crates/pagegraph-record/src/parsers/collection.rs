//! Collections (databases) and their views

use super::{nullable, plain_text};
use crate::id::RecordId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Typed collection payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub id: RecordId,

    #[serde(default)]
    pub version: Option<i64>,

    /// Rich-text name
    #[serde(default)]
    pub name: Option<Value>,

    /// Property ID → column definition
    #[serde(default, deserialize_with = "nullable")]
    pub schema: Map<String, Value>,

    #[serde(default)]
    pub icon: Option<String>,

    #[serde(default)]
    pub parent_id: Option<RecordId>,

    #[serde(default)]
    pub parent_table: Option<String>,

    #[serde(default)]
    pub alive: Option<bool>,
}

impl Collection {
    /// Name as plain text
    #[must_use]
    pub fn name_text(&self) -> String {
        self.name.as_ref().map(plain_text).unwrap_or_default()
    }
}

/// Typed collection view payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionView {
    pub id: RecordId,

    #[serde(rename = "type", default)]
    pub kind: String,

    #[serde(default)]
    pub version: Option<i64>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "nullable")]
    pub format: Map<String, Value>,

    #[serde(default)]
    pub parent_id: Option<RecordId>,

    #[serde(default)]
    pub parent_table: Option<String>,

    /// Manually ordered rows
    #[serde(default, deserialize_with = "nullable")]
    pub page_sort: Vec<RecordId>,

    #[serde(default)]
    pub alive: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ID: &str = "7d1f3a1f9c2a4c5e8f0a1b2c3d4e5f60";

    #[test]
    fn decodes_collection() {
        let c: Collection = serde_json::from_value(json!({
            "id": ID,
            "name": [["Reading list"]],
            "schema": {"title": {"name": "Name", "type": "title"}},
            "parent_table": "block"
        }))
        .unwrap();

        assert_eq!(c.name_text(), "Reading list");
        assert!(c.schema.contains_key("title"));
    }

    #[test]
    fn decodes_view() {
        let v: CollectionView = serde_json::from_value(json!({
            "id": ID,
            "type": "table",
            "name": "All",
            "page_sort": [ID]
        }))
        .unwrap();

        assert_eq!(v.kind, "table");
        assert_eq!(v.page_sort.len(), 1);
    }

    #[test]
    fn schema_must_be_an_object() {
        let result: Result<Collection, _> = serde_json::from_value(json!({
            "id": ID,
            "schema": [1, 2, 3]
        }));
        assert!(result.is_err());
    }
}
