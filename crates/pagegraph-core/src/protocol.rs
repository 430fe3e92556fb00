//! Wire protocol
//!
//! Two routes are used:
//!
//! - [`LOAD_PAGE_CHUNK`]: one page of a page's content, driven by a
//!   [`Cursor`]. The first request carries an empty cursor; every later
//!   request echoes the cursor the previous response returned. An empty
//!   returned stack means the page is exhausted.
//! - [`SYNC_RECORD_VALUES`]: a single record by `(table, id)`.
//!
//! Both answer with a `recordMap` envelope.

use crate::config::ResolverConfig;
use crate::error::ResolveError;
use pagegraph_record::{RecordId, RecordMap, Table};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

pub use pagegraph_cache::routes::{LOAD_PAGE_CHUNK, SYNC_RECORD_VALUES};

/// One unit of resolution work
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Branch {
    /// Chunk-paged load of a page (or block subtree)
    Page(RecordId),
    /// Single fetch of a non-block record
    Record(Table, RecordId),
}

impl Branch {
    /// Table of the record the branch is rooted at
    #[must_use]
    pub fn table(&self) -> Table {
        match self {
            Self::Page(_) => Table::Block,
            Self::Record(table, _) => *table,
        }
    }

    /// ID of the record the branch is rooted at
    #[must_use]
    pub fn id(&self) -> &RecordId {
        match self {
            Self::Page(id) | Self::Record(_, id) => id,
        }
    }

    /// Route the branch is fetched from
    #[must_use]
    pub fn route(&self) -> &'static str {
        match self {
            Self::Page(_) => LOAD_PAGE_CHUNK,
            Self::Record(..) => SYNC_RECORD_VALUES,
        }
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Page(id) => write!(f, "page {id}"),
            Self::Record(table, id) => write!(f, "{table} {id}"),
        }
    }
}

/// One frame of a cursor stack
///
/// Unknown fields are carried through untouched so the cursor can be
/// echoed back exactly as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursorFrame {
    /// Record the frame points into (dashed ID)
    pub id: String,
    /// Position inside that record's content
    pub index: i64,
    /// Table of the record
    pub table: String,
    /// Fields this client does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CursorFrame {
    /// Create frame
    #[must_use]
    pub fn new(id: impl Into<String>, index: i64, table: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            index,
            table: table.into(),
            extra: Map::new(),
        }
    }
}

/// Pagination state for one page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
    /// Frames still to be walked; empty once the page is exhausted
    #[serde(default)]
    pub stack: Vec<Vec<CursorFrame>>,
}

impl Cursor {
    /// Cursor for the first request of a page
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// No further chunks
    #[inline]
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.stack.is_empty()
    }
}

/// Page addressed by a chunk request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRef {
    /// Dashed page ID
    pub id: String,
}

/// Request body for [`LOAD_PAGE_CHUNK`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadPageChunkRequest {
    /// Page being paged through
    pub page: PageRef,
    /// 0 for the first request, then one more per call
    pub chunk_number: u32,
    /// Maximum records the server should return
    pub limit: u32,
    /// Empty first, then the previous response's cursor
    pub cursor: Cursor,
    /// Always false
    pub vertical_columns: bool,
}

impl LoadPageChunkRequest {
    /// Build the request for chunk `chunk_number` of `page`
    ///
    /// With no previous cursor this is a first request (empty stack,
    /// first-chunk limit); otherwise the cursor is sent back unmodified
    /// with the follow-up limit.
    #[must_use]
    pub fn new(
        page: &RecordId,
        chunk_number: u32,
        previous: Option<Cursor>,
        config: &ResolverConfig,
    ) -> Self {
        let (cursor, limit) = match previous {
            Some(cursor) => (cursor, config.next_chunk_limit),
            None => (Cursor::empty(), config.first_chunk_limit),
        };
        Self {
            page: PageRef {
                id: page.to_dashed(),
            },
            chunk_number,
            limit,
            cursor,
            vertical_columns: false,
        }
    }
}

/// Response body of [`LOAD_PAGE_CHUNK`]
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadPageChunkResponse {
    /// Records delivered by this chunk
    pub record_map: RecordMap,
    /// Where the next chunk starts; missing means exhausted
    #[serde(default)]
    pub cursor: Cursor,
}

/// Address of one record on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pointer {
    /// Table the record lives in
    pub table: Table,
    /// Dashed record ID
    pub id: String,
}

/// One entry of a [`SyncRecordValuesRequest`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordRequest {
    /// Record wanted
    pub pointer: Pointer,
    /// Known version; -1 asks for the latest
    pub version: i64,
}

/// Request body for [`SYNC_RECORD_VALUES`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncRecordValuesRequest {
    /// Records wanted
    pub requests: Vec<RecordRequest>,
}

impl SyncRecordValuesRequest {
    /// Request the latest version of one record
    #[must_use]
    pub fn single(table: Table, id: &RecordId) -> Self {
        Self {
            requests: vec![RecordRequest {
                pointer: Pointer {
                    table,
                    id: id.to_dashed(),
                },
                version: -1,
            }],
        }
    }
}

/// Response body of [`SYNC_RECORD_VALUES`]
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRecordValuesResponse {
    /// Requested records, plus whatever the server adds
    pub record_map: RecordMap,
}

/// Serialize a request body
///
/// # Errors
/// Returns [`ResolveError::Decode`] carrying the route
pub fn encode<T: Serialize>(route: &str, request: &T) -> Result<Value, ResolveError> {
    serde_json::to_value(request).map_err(|e| ResolveError::decode(route, e))
}

/// Decode a response body
///
/// # Errors
/// Returns [`ResolveError::Decode`] carrying the route
pub fn decode<T: DeserializeOwned>(route: &str, bytes: &[u8]) -> Result<T, ResolveError> {
    serde_json::from_slice(bytes).map_err(|e| ResolveError::decode(route, e))
}
