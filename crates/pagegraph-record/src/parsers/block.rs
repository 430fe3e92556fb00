//! Block records
//!
//! Blocks carry the document content: pages, paragraphs, toggles, embedded
//! collections. They are also where references to other records live.

use super::{nullable, plain_text};
use crate::id::RecordId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Block type names used when walking the graph
pub mod kind {
    /// Page
    pub const PAGE: &str = "page";
    /// Inline database
    pub const COLLECTION_VIEW: &str = "collection_view";
    /// Full-page database
    pub const COLLECTION_VIEW_PAGE: &str = "collection_view_page";
    /// Link to another page
    pub const ALIAS: &str = "alias";
    /// Paragraph
    pub const TEXT: &str = "text";
}

/// Typed block payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: RecordId,

    #[serde(rename = "type", default)]
    pub kind: String,

    #[serde(default)]
    pub version: Option<i64>,

    #[serde(default)]
    pub alive: Option<bool>,

    #[serde(default)]
    pub parent_id: Option<RecordId>,

    #[serde(default)]
    pub parent_table: Option<String>,

    /// Child block IDs, in display order
    #[serde(default, deserialize_with = "nullable")]
    pub content: Vec<RecordId>,

    #[serde(default, deserialize_with = "nullable")]
    pub properties: Map<String, Value>,

    #[serde(default, deserialize_with = "nullable")]
    pub format: Map<String, Value>,

    #[serde(default)]
    pub collection_id: Option<RecordId>,

    #[serde(default, deserialize_with = "nullable")]
    pub view_ids: Vec<RecordId>,

    #[serde(default, deserialize_with = "nullable")]
    pub discussions: Vec<RecordId>,

    #[serde(default)]
    pub space_id: Option<RecordId>,

    #[serde(default)]
    pub created_time: Option<i64>,

    #[serde(default)]
    pub last_edited_time: Option<i64>,
}

impl Block {
    /// Pages and full-page databases own their own chunk stream
    #[inline]
    #[must_use]
    pub fn is_page_like(&self) -> bool {
        self.kind == kind::PAGE || self.kind == kind::COLLECTION_VIEW_PAGE
    }

    /// Deleted blocks stay in the map with `alive: false`
    #[inline]
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive.unwrap_or(true)
    }

    /// Title as plain text
    #[must_use]
    pub fn title(&self) -> String {
        self.properties
            .get("title")
            .map(plain_text)
            .unwrap_or_default()
    }

    /// Target of a link-to-page / alias block
    #[must_use]
    pub fn alias_target(&self) -> Option<RecordId> {
        let id = self.format.get("alias_pointer")?.get("id")?.as_str()?;
        RecordId::parse(id).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PAGE: &str = "246e2166e2d6439682b5559c723f57f9";
    const CHILD: &str = "00000000000000000000000000000001";

    #[test]
    fn decodes_page_block() {
        let block: Block = serde_json::from_value(json!({
            "id": PAGE,
            "type": "page",
            "version": 12,
            "alive": true,
            "content": [CHILD],
            "properties": {"title": [["My ", [["b"]]], ["page"]]},
            "parent_table": "space",
            "created_time": 1_570_000_000_000_i64,
            "unknown_field": {"kept": "in raw payload only"}
        }))
        .unwrap();

        assert!(block.is_page_like());
        assert!(block.is_alive());
        assert_eq!(block.title(), "My page");
        assert_eq!(block.content, vec![RecordId::parse(CHILD).unwrap()]);
        assert_eq!(block.parent_table.as_deref(), Some("space"));
    }

    #[test]
    fn null_lists_decode_as_empty() {
        let block: Block = serde_json::from_value(json!({
            "id": PAGE,
            "type": "text",
            "content": null,
            "format": null,
            "view_ids": null
        }))
        .unwrap();

        assert!(block.content.is_empty());
        assert!(block.format.is_empty());
        assert!(block.view_ids.is_empty());
        assert!(!block.is_page_like());
    }

    #[test]
    fn alias_target_reads_pointer() {
        let block: Block = serde_json::from_value(json!({
            "id": PAGE,
            "type": "alias",
            "format": {"alias_pointer": {"id": "00000000-0000-0000-0000-000000000001", "table": "block"}}
        }))
        .unwrap();

        assert_eq!(block.alias_target(), Some(RecordId::parse(CHILD).unwrap()));
    }

    #[test]
    fn bad_child_id_fails() {
        let result: Result<Block, _> = serde_json::from_value(json!({
            "id": PAGE,
            "content": ["not-an-id"]
        }));
        assert!(result.is_err());
    }
}
