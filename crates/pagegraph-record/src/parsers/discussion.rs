//! Discussions and the comments inside them

use super::{nullable, plain_text};
use crate::id::RecordId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Typed discussion payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discussion {
    pub id: RecordId,

    #[serde(default)]
    pub version: Option<i64>,

    #[serde(default)]
    pub parent_id: Option<RecordId>,

    #[serde(default)]
    pub parent_table: Option<String>,

    #[serde(default)]
    pub resolved: Option<bool>,

    /// Comment IDs, oldest first
    #[serde(default, deserialize_with = "nullable")]
    pub comments: Vec<RecordId>,
}

/// Typed comment payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: RecordId,

    #[serde(default)]
    pub version: Option<i64>,

    #[serde(default)]
    pub parent_id: Option<RecordId>,

    #[serde(default)]
    pub parent_table: Option<String>,

    #[serde(default)]
    pub text: Option<Value>,

    #[serde(default)]
    pub created_by_id: Option<String>,

    #[serde(default)]
    pub created_time: Option<i64>,

    #[serde(default)]
    pub alive: Option<bool>,
}

impl Comment {
    /// Comment body as plain text
    #[must_use]
    pub fn text_plain(&self) -> String {
        self.text.as_ref().map(plain_text).unwrap_or_default()
    }
}
