//! Workspace records

use super::nullable;
use crate::id::RecordId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Typed space payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Space {
    pub id: RecordId,

    #[serde(default)]
    pub version: Option<i64>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub domain: Option<String>,

    /// Top-level pages
    #[serde(default, deserialize_with = "nullable")]
    pub pages: Vec<RecordId>,

    #[serde(default, deserialize_with = "nullable")]
    pub permissions: Vec<Value>,
}
