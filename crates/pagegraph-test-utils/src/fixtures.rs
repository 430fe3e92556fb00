//! Record and response builders

use pagegraph_record::{RecordId, Table};
use serde_json::{json, Map, Value};

/// Root page used across the resolver tests
pub const ROOT_ID: &str = "246e2166e2d6439682b5559c723f57f9";

pub fn root_id() -> RecordId {
    RecordId::parse(ROOT_ID).unwrap()
}

/// Deterministic ID from a number
pub fn id(n: u32) -> RecordId {
    RecordId::parse(&format!("{n:032x}")).unwrap()
}

fn dashed(ids: &[RecordId]) -> Vec<String> {
    ids.iter().map(RecordId::to_dashed).collect()
}

pub fn page_block(id: &RecordId, title: &str, content: &[RecordId]) -> Value {
    json!({
        "id": id.to_dashed(),
        "type": "page",
        "version": 1,
        "alive": true,
        "properties": {"title": [[title]]},
        "content": dashed(content),
        "parent_table": "space"
    })
}

pub fn text_block(id: &RecordId, parent: &RecordId, text: &str) -> Value {
    json!({
        "id": id.to_dashed(),
        "type": "text",
        "version": 1,
        "alive": true,
        "properties": {"title": [[text]]},
        "parent_id": parent.to_dashed(),
        "parent_table": "block"
    })
}

/// Non-page container block (toggle) with children
pub fn toggle_block(id: &RecordId, parent: &RecordId, content: &[RecordId]) -> Value {
    json!({
        "id": id.to_dashed(),
        "type": "toggle",
        "version": 1,
        "alive": true,
        "content": dashed(content),
        "parent_id": parent.to_dashed(),
        "parent_table": "block"
    })
}

/// Link-to-page block pointing at `target`
pub fn alias_block(id: &RecordId, parent: &RecordId, target: &RecordId) -> Value {
    json!({
        "id": id.to_dashed(),
        "type": "alias",
        "version": 1,
        "format": {"alias_pointer": {"id": target.to_dashed(), "table": "block"}},
        "parent_id": parent.to_dashed(),
        "parent_table": "block"
    })
}

/// Full-page database block
pub fn collection_view_page(
    id: &RecordId,
    parent: &RecordId,
    collection: &RecordId,
    views: &[RecordId],
) -> Value {
    json!({
        "id": id.to_dashed(),
        "type": "collection_view_page",
        "version": 1,
        "collection_id": collection.to_dashed(),
        "view_ids": dashed(views),
        "parent_id": parent.to_dashed(),
        "parent_table": "block"
    })
}

pub fn collection(id: &RecordId, parent: &RecordId, name: &str) -> Value {
    json!({
        "id": id.to_dashed(),
        "version": 1,
        "name": [[name]],
        "schema": {"title": {"name": "Name", "type": "title"}},
        "parent_id": parent.to_dashed(),
        "parent_table": "block"
    })
}

pub fn collection_view(id: &RecordId, parent: &RecordId) -> Value {
    json!({
        "id": id.to_dashed(),
        "version": 1,
        "type": "table",
        "name": "Default view",
        "parent_id": parent.to_dashed(),
        "parent_table": "block"
    })
}

pub fn discussion(id: &RecordId, parent: &RecordId, comments: &[RecordId]) -> Value {
    json!({
        "id": id.to_dashed(),
        "version": 1,
        "parent_id": parent.to_dashed(),
        "parent_table": "block",
        "resolved": false,
        "comments": dashed(comments)
    })
}

pub fn comment(id: &RecordId, parent: &RecordId, text: &str) -> Value {
    json!({
        "id": id.to_dashed(),
        "version": 1,
        "parent_id": parent.to_dashed(),
        "parent_table": "discussion",
        "text": [[text]],
        "alive": true
    })
}

/// Builds a wire record map
#[derive(Debug, Clone, Default)]
pub struct RecordMapBuilder {
    tables: Map<String, Value>,
}

impl RecordMapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a readable record; the key is taken from `value.id`
    pub fn record(mut self, table: Table, value: Value) -> Self {
        let key = value["id"].as_str().unwrap_or_default().to_string();
        self.entries(table).insert(key, json!({"role": "reader", "value": value}));
        self
    }

    pub fn block(self, value: Value) -> Self {
        self.record(Table::Block, value)
    }

    /// Add a record the caller may not read (no value)
    pub fn inaccessible(mut self, table: Table, id: &RecordId) -> Self {
        self.entries(table).insert(id.to_dashed(), json!({"role": "none"}));
        self
    }

    pub fn build(self) -> Value {
        let mut map = self.tables;
        map.insert("__version__".to_string(), json!(3));
        Value::Object(map)
    }

    fn entries(&mut self, table: Table) -> &mut Map<String, Value> {
        let entry = self
            .tables
            .entry(table.as_str().to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        match entry {
            Value::Object(map) => map,
            _ => unreachable!("table entries are always objects"),
        }
    }
}

/// Cursor with nothing left
pub fn exhausted() -> Value {
    json!({"stack": []})
}

/// Cursor pointing into `page` content at `index`
pub fn cursor_at(page: &RecordId, index: i64) -> Value {
    json!({"stack": [[{"id": page.to_dashed(), "index": index, "table": "block"}]]})
}

/// `loadCachedPageChunk` response
pub fn chunk_response(record_map: Value, cursor: Value) -> Value {
    json!({"recordMap": record_map, "cursor": cursor})
}

/// Single-chunk page: the page block plus text children, cursor exhausted
pub fn single_chunk_page(page: &RecordId, title: &str, children: &[RecordId]) -> Value {
    let mut builder = RecordMapBuilder::new().block(page_block(page, title, children));
    for (i, child) in children.iter().enumerate() {
        builder = builder.block(text_block(child, page, &format!("paragraph {i}")));
    }
    chunk_response(builder.build(), exhausted())
}
