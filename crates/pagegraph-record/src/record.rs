//! A single record
//!
//! A [`Record`] keeps the payload exactly as received next to its typed
//! decoding, so the raw form can be written back out unchanged.

use crate::id::RecordId;
use crate::parsers::{
    Activity, Block, Collection, CollectionView, Comment, Discussion, NotionUser, Space,
    TypedValue, UserRoot, UserSetting,
};
use crate::table::Table;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One addressable unit of content
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    id: RecordId,
    table: Table,
    role: Option<String>,
    value: Value,
    typed: Option<TypedValue>,
}

impl Record {
    /// Create an unparsed record
    #[inline]
    #[must_use]
    pub fn new(table: Table, id: RecordId, value: Value) -> Self {
        Self {
            id,
            table,
            role: None,
            value,
            typed: None,
        }
    }

    /// With the access role reported by the service
    #[inline]
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Record ID
    #[inline]
    #[must_use]
    pub fn id(&self) -> &RecordId {
        &self.id
    }

    /// Table the record belongs to
    #[inline]
    #[must_use]
    pub fn table(&self) -> Table {
        self.table
    }

    /// Access role (`reader`, `editor`, `none`, ...)
    #[inline]
    #[must_use]
    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }

    /// Raw payload as received
    #[inline]
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Typed payload, once parsed
    #[inline]
    #[must_use]
    pub fn typed(&self) -> Option<&TypedValue> {
        self.typed.as_ref()
    }

    /// Whether the parse pass has run over this record
    ///
    /// Inaccessible records have nothing to parse and stay unparsed.
    #[inline]
    #[must_use]
    pub fn is_parsed(&self) -> bool {
        self.typed.is_some()
    }

    /// Records the caller may not read come back without a value
    #[inline]
    #[must_use]
    pub fn is_accessible(&self) -> bool {
        !self.value.is_null()
    }

    /// Same role and same raw payload
    ///
    /// The typed value is derived from the payload and is not compared.
    #[inline]
    #[must_use]
    pub fn same_payload(&self, other: &Record) -> bool {
        self.role == other.role && self.value == other.value
    }

    pub(crate) fn set_typed(&mut self, typed: TypedValue) {
        self.typed = Some(typed);
    }

    pub(crate) fn from_wire(table: Table, id: RecordId, wire: WireRecord) -> Self {
        Self {
            id,
            table,
            role: wire.role,
            value: wire.value.unwrap_or(Value::Null),
            typed: None,
        }
    }

    pub(crate) fn to_wire(&self) -> WireRecord {
        WireRecord {
            role: self.role.clone(),
            value: (!self.value.is_null()).then(|| self.value.clone()),
        }
    }

    /// Typed block, if this is a parsed block record
    #[must_use]
    pub fn as_block(&self) -> Option<&Block> {
        match self.typed.as_ref()? {
            TypedValue::Block(b) => Some(b),
            _ => None,
        }
    }

    /// Typed collection
    #[must_use]
    pub fn as_collection(&self) -> Option<&Collection> {
        match self.typed.as_ref()? {
            TypedValue::Collection(c) => Some(c),
            _ => None,
        }
    }

    /// Typed collection view
    #[must_use]
    pub fn as_collection_view(&self) -> Option<&CollectionView> {
        match self.typed.as_ref()? {
            TypedValue::CollectionView(v) => Some(v),
            _ => None,
        }
    }

    /// Typed discussion
    #[must_use]
    pub fn as_discussion(&self) -> Option<&Discussion> {
        match self.typed.as_ref()? {
            TypedValue::Discussion(d) => Some(d),
            _ => None,
        }
    }

    /// Typed comment
    #[must_use]
    pub fn as_comment(&self) -> Option<&Comment> {
        match self.typed.as_ref()? {
            TypedValue::Comment(c) => Some(c),
            _ => None,
        }
    }

    /// Typed space
    #[must_use]
    pub fn as_space(&self) -> Option<&Space> {
        match self.typed.as_ref()? {
            TypedValue::Space(s) => Some(s),
            _ => None,
        }
    }

    /// Typed user
    #[must_use]
    pub fn as_notion_user(&self) -> Option<&NotionUser> {
        match self.typed.as_ref()? {
            TypedValue::NotionUser(u) => Some(u),
            _ => None,
        }
    }

    /// Typed user root
    #[must_use]
    pub fn as_user_root(&self) -> Option<&UserRoot> {
        match self.typed.as_ref()? {
            TypedValue::UserRoot(u) => Some(u),
            _ => None,
        }
    }

    /// Typed user settings
    #[must_use]
    pub fn as_user_setting(&self) -> Option<&UserSetting> {
        match self.typed.as_ref()? {
            TypedValue::UserSetting(u) => Some(u),
            _ => None,
        }
    }

    /// Typed activity
    #[must_use]
    pub fn as_activity(&self) -> Option<&Activity> {
        match self.typed.as_ref()? {
            TypedValue::Activity(a) => Some(a),
            _ => None,
        }
    }
}

/// Record as it appears on the wire: `{"role": ..., "value": {...}}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct WireRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) value: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn id() -> RecordId {
        RecordId::parse("246e2166e2d6439682b5559c723f57f9").unwrap()
    }

    #[test]
    fn same_payload_ignores_typed_value() {
        let a = Record::new(Table::Block, id(), json!({"id": id().as_str()}));
        let mut b = a.clone();
        let block: Block = serde_json::from_value(a.value().clone()).unwrap();
        b.set_typed(TypedValue::Block(block));

        assert!(a.same_payload(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn role_is_part_of_payload() {
        let a = Record::new(Table::Space, id(), json!({})).with_role("reader");
        let b = Record::new(Table::Space, id(), json!({})).with_role("editor");
        assert!(!a.same_payload(&b));
    }

    #[test]
    fn missing_value_is_inaccessible() {
        let wire = WireRecord {
            role: Some("none".to_string()),
            value: None,
        };
        let rec = Record::from_wire(Table::Block, id(), wire.clone());

        assert!(!rec.is_accessible());
        assert_eq!(rec.to_wire(), wire);
    }
}
