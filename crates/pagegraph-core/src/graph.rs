//! Finished page graph
//!
//! The closed set of records reachable from a root page, handed to
//! renderers read-only once resolution completes.

use pagegraph_record::{Block, Record, RecordId, RecordMap, Table};

/// Read-only result of a resolution
#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    root: RecordId,
    records: RecordMap,
}

impl Graph {
    /// Wrap a closed record map
    #[must_use]
    pub fn new(root: RecordId, records: RecordMap) -> Self {
        Self { root, records }
    }

    /// ID the resolution started from
    #[inline]
    #[must_use]
    pub fn root_id(&self) -> &RecordId {
        &self.root
    }

    /// Root block, if it was accessible
    #[must_use]
    pub fn root(&self) -> Option<&Block> {
        self.block(&self.root)
    }

    /// Record by table and ID
    #[inline]
    #[must_use]
    pub fn get(&self, table: Table, id: &RecordId) -> Option<&Record> {
        self.records.get(table, id)
    }

    /// All records of one table, ordered by ID
    pub fn records(&self, table: Table) -> impl Iterator<Item = &Record> {
        self.records.records(table)
    }

    /// Typed block by ID
    #[must_use]
    pub fn block(&self, id: &RecordId) -> Option<&Block> {
        self.get(Table::Block, id).and_then(Record::as_block)
    }

    /// Child blocks of `id` in content order
    ///
    /// Children that are missing or inaccessible are skipped.
    #[must_use]
    pub fn children(&self, id: &RecordId) -> Vec<&Block> {
        self.block(id)
            .map(|parent| parent.content.iter().filter_map(|c| self.block(c)).collect())
            .unwrap_or_default()
    }

    /// Page-like blocks (pages and full-page databases)
    pub fn pages(&self) -> impl Iterator<Item = &Block> {
        self.records
            .records(Table::Block)
            .filter_map(Record::as_block)
            .filter(|b| b.is_page_like())
    }

    /// Plain-text title of a block
    #[must_use]
    pub fn title(&self, id: &RecordId) -> Option<String> {
        self.block(id).map(Block::title)
    }

    /// Total records across all tables
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// No records at all
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Underlying record map
    #[inline]
    #[must_use]
    pub fn record_map(&self) -> &RecordMap {
        &self.records
    }

    /// Take the record map
    #[inline]
    #[must_use]
    pub fn into_record_map(self) -> RecordMap {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn id(n: u32) -> RecordId {
        RecordId::parse(&format!("{n:032x}")).unwrap()
    }

    fn block(n: u32, kind: &str, title: &str, content: &[u32]) -> Record {
        let content: Vec<String> = content.iter().map(|c| id(*c).to_dashed()).collect();
        Record::new(
            Table::Block,
            id(n),
            json!({
                "id": id(n).to_dashed(),
                "type": kind,
                "properties": {"title": [[title]]},
                "content": content
            }),
        )
    }

    fn graph() -> Graph {
        let mut map: RecordMap = [
            block(1, "page", "Root", &[3, 2, 9]),
            block(2, "text", "second", &[]),
            block(3, "page", "Sub", &[]),
        ]
        .into_iter()
        .collect();
        map.parse_all().unwrap();
        Graph::new(id(1), map)
    }

    #[test]
    fn children_follow_content_order() {
        let graph = graph();
        let children: Vec<String> = graph.children(&id(1)).iter().map(|b| b.title()).collect();
        assert_eq!(children, vec!["Sub", "second"]);
        assert!(graph.children(&id(42)).is_empty());
    }

    #[test]
    fn root_and_titles() {
        let graph = graph();
        assert_eq!(graph.root().map(Block::title).as_deref(), Some("Root"));
        assert_eq!(graph.title(&id(3)).as_deref(), Some("Sub"));
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.records(Table::Block).count(), 3);
        assert_eq!(graph.pages().count(), 2);
    }
}
