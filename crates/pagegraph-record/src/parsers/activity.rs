//! Activity feed entries

use super::nullable;
use crate::id::RecordId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Typed activity payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: RecordId,

    #[serde(rename = "type", default)]
    pub kind: String,

    #[serde(default)]
    pub version: Option<i64>,

    #[serde(default)]
    pub parent_id: Option<RecordId>,

    #[serde(default)]
    pub parent_table: Option<String>,

    #[serde(default)]
    pub space_id: Option<RecordId>,

    // the service sends these as numeric strings
    #[serde(default)]
    pub start_time: Option<String>,

    #[serde(default)]
    pub end_time: Option<String>,

    #[serde(default)]
    pub index: Option<i64>,

    #[serde(default)]
    pub invalid: Option<bool>,

    #[serde(default, deserialize_with = "nullable")]
    pub edits: Vec<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_activity() {
        let a: Activity = serde_json::from_value(json!({
            "id": "22222222222222222222222222222222",
            "type": "block-edited",
            "start_time": "1570000000000",
            "edits": [{"type": "block-changed"}]
        }))
        .unwrap();
        assert_eq!(a.kind, "block-edited");
        assert_eq!(a.edits.len(), 1);
    }
}
