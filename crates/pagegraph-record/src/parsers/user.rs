//! User records: profile, root and settings

use super::nullable;
use crate::id::RecordId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Typed user profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotionUser {
    pub id: RecordId,

    #[serde(default)]
    pub version: Option<i64>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub given_name: Option<String>,

    #[serde(default)]
    pub family_name: Option<String>,

    #[serde(default)]
    pub profile_photo: Option<String>,
}

impl NotionUser {
    /// "Given Family", skipping missing parts
    #[must_use]
    pub fn display_name(&self) -> String {
        [self.given_name.as_deref(), self.family_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Typed user root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRoot {
    pub id: RecordId,

    #[serde(default)]
    pub version: Option<i64>,

    #[serde(default, deserialize_with = "nullable")]
    pub space_views: Vec<RecordId>,
}

/// Typed user settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSetting {
    pub id: RecordId,

    #[serde(default)]
    pub version: Option<i64>,

    #[serde(default, deserialize_with = "nullable")]
    pub settings: Map<String, Value>,
}
