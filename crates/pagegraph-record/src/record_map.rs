//! Record maps
//!
//! A [`RecordMap`] is one snapshot of the graph: ten per-table maps from
//! [`RecordId`] to [`Record`], as returned by a single request. Maps from
//! successive requests overlap; [`RecordMap::merge`] folds them together.
//!
//! # Merge rule
//!
//! - unseen `(table, id)`: inserted
//! - same payload: no-op
//! - different payload: the incoming record replaces the stored one whole

use crate::error::RecordError;
use crate::id::RecordId;
use crate::parsers::{self, nullable, ParserRegistry, TypedValue};
use crate::record::{Record, WireRecord};
use crate::table::Table;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Address of a record in the graph
pub type RecordKey = (Table, RecordId);

/// One snapshot of records, keyed by table then ID
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireRecordMap", into = "WireRecordMap")]
pub struct RecordMap {
    version: i64,
    tables: BTreeMap<Table, BTreeMap<RecordId, Record>>,
}

/// What a merge changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Keys that were not present before
    pub inserted: Vec<RecordKey>,
    /// Keys whose payload was replaced
    pub replaced: Vec<RecordKey>,
    /// Records that matched what was stored
    pub unchanged: usize,
}

impl MergeReport {
    /// Inserted and replaced keys
    pub fn changed(&self) -> impl Iterator<Item = &RecordKey> {
        self.inserted.iter().chain(self.replaced.iter())
    }

    /// Merge left the target untouched
    #[inline]
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.inserted.is_empty() && self.replaced.is_empty()
    }
}

impl RecordMap {
    /// Create empty map
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a format version
    #[inline]
    #[must_use]
    pub fn with_version(mut self, version: i64) -> Self {
        self.version = version;
        self
    }

    /// Format version (`__version__`)
    #[inline]
    #[must_use]
    pub fn version(&self) -> i64 {
        self.version
    }

    /// Insert a record, returning the one it replaced
    pub fn insert(&mut self, record: Record) -> Option<Record> {
        self.tables
            .entry(record.table())
            .or_default()
            .insert(record.id().clone(), record)
    }

    /// Look up a record
    #[must_use]
    pub fn get(&self, table: Table, id: &RecordId) -> Option<&Record> {
        self.tables.get(&table)?.get(id)
    }

    /// Whether `(table, id)` is present
    #[inline]
    #[must_use]
    pub fn contains(&self, table: Table, id: &RecordId) -> bool {
        self.get(table, id).is_some()
    }

    /// Records of one table, ordered by ID
    pub fn records(&self, table: Table) -> impl Iterator<Item = &Record> {
        self.tables.get(&table).into_iter().flat_map(|t| t.values())
    }

    /// All records, table by table
    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.tables.values().flat_map(|t| t.values())
    }

    /// Number of records in one table
    #[must_use]
    pub fn table_len(&self, table: Table) -> usize {
        self.tables.get(&table).map_or(0, BTreeMap::len)
    }

    /// Total number of records
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.values().map(BTreeMap::len).sum()
    }

    /// No records at all
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fold another snapshot into this one
    ///
    /// Idempotent: merging the same map twice leaves `self` unchanged the
    /// second time. A differing payload replaces the stored record entirely.
    pub fn merge(&mut self, other: RecordMap) -> MergeReport {
        let mut report = MergeReport::default();
        self.version = self.version.max(other.version);

        for (table, records) in other.tables {
            let target = self.tables.entry(table).or_default();
            for (id, incoming) in records {
                match target.get_mut(&id) {
                    Some(existing) if existing.same_payload(&incoming) => {
                        if !existing.is_parsed() {
                            if let Some(typed) = incoming.typed() {
                                existing.set_typed(typed.clone());
                            }
                        }
                        report.unchanged += 1;
                    }
                    Some(existing) => {
                        *existing = incoming;
                        report.replaced.push((table, id));
                    }
                    None => {
                        target.insert(id.clone(), incoming);
                        report.inserted.push((table, id));
                    }
                }
            }
        }
        report
    }

    /// Parse every record with the default parsers
    ///
    /// # Errors
    /// See [`RecordMap::parse_with`].
    pub fn parse_all(&mut self) -> Result<(), RecordError> {
        self.parse_with(parsers::global())
    }

    /// Parse every record, all or nothing
    ///
    /// Tables are visited in [`Table::PARSE_ORDER`]. Typed values are staged
    /// first and only written back once every record has decoded, so a
    /// failure leaves the map exactly as it was.
    ///
    /// # Errors
    /// The first [`RecordError::Parse`] encountered, naming table and ID.
    pub fn parse_with(&mut self, registry: &ParserRegistry) -> Result<(), RecordError> {
        let mut staged: Vec<(Table, RecordId, TypedValue)> = Vec::with_capacity(self.len());

        for table in Table::PARSE_ORDER {
            let Some(records) = self.tables.get(&table) else {
                continue;
            };
            for (id, record) in records {
                if !record.is_accessible() {
                    continue;
                }
                let typed = registry.parse(table, id, record.value())?;
                staged.push((table, id.clone(), typed));
            }
        }

        for (table, id, typed) in staged {
            if let Some(record) = self.tables.get_mut(&table).and_then(|t| t.get_mut(&id)) {
                record.set_typed(typed);
            }
        }
        Ok(())
    }
}

impl FromIterator<Record> for RecordMap {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        let mut map = RecordMap::new();
        for record in iter {
            map.insert(record);
        }
        map
    }
}

/// Wire envelope: one JSON object per table plus `__version__`
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct WireRecordMap {
    #[serde(rename = "__version__", default, deserialize_with = "nullable")]
    version: i64,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "BTreeMap::is_empty")]
    activity: BTreeMap<String, WireRecord>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "BTreeMap::is_empty")]
    block: BTreeMap<String, WireRecord>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "BTreeMap::is_empty")]
    space: BTreeMap<String, WireRecord>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "BTreeMap::is_empty")]
    notion_user: BTreeMap<String, WireRecord>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "BTreeMap::is_empty")]
    user_root: BTreeMap<String, WireRecord>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "BTreeMap::is_empty")]
    user_setting: BTreeMap<String, WireRecord>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "BTreeMap::is_empty")]
    collection: BTreeMap<String, WireRecord>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "BTreeMap::is_empty")]
    collection_view: BTreeMap<String, WireRecord>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "BTreeMap::is_empty")]
    comment: BTreeMap<String, WireRecord>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "BTreeMap::is_empty")]
    discussion: BTreeMap<String, WireRecord>,
}

impl WireRecordMap {
    fn table_mut(&mut self, table: Table) -> &mut BTreeMap<String, WireRecord> {
        match table {
            Table::Activity => &mut self.activity,
            Table::Block => &mut self.block,
            Table::Space => &mut self.space,
            Table::NotionUser => &mut self.notion_user,
            Table::UserRoot => &mut self.user_root,
            Table::UserSetting => &mut self.user_setting,
            Table::Collection => &mut self.collection,
            Table::CollectionView => &mut self.collection_view,
            Table::Comment => &mut self.comment,
            Table::Discussion => &mut self.discussion,
        }
    }
}

impl TryFrom<WireRecordMap> for RecordMap {
    type Error = RecordError;

    fn try_from(mut wire: WireRecordMap) -> Result<Self, Self::Error> {
        let mut map = RecordMap::new().with_version(wire.version);
        for table in Table::ALL {
            for (raw_id, record) in std::mem::take(wire.table_mut(table)) {
                let id = RecordId::parse(&raw_id)?;
                map.insert(Record::from_wire(table, id, record));
            }
        }
        Ok(map)
    }
}

impl From<RecordMap> for WireRecordMap {
    fn from(map: RecordMap) -> Self {
        let mut wire = WireRecordMap {
            version: map.version,
            ..WireRecordMap::default()
        };
        for (table, records) in &map.tables {
            let target = wire.table_mut(*table);
            for (id, record) in records {
                target.insert(id.to_dashed(), record.to_wire());
            }
        }
        wire
    }
}
