//! Error types for record handling
//!
//! Covers:
//! - Malformed record IDs
//! - Unknown table names
//! - Records whose payload does not match their table's schema

use crate::id::RecordId;
use crate::table::Table;

/// Errors raised while decoding or parsing records
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// ID is not 32 hex digits
    #[error("invalid record id: '{0}'")]
    InvalidId(String),

    /// Table name not in the known set
    #[error("unknown table: '{0}'")]
    UnknownTable(String),

    /// Payload does not decode into the table's schema
    #[error("failed to parse {table} record {id}: {source}")]
    Parse {
        table: Table,
        id: RecordId,
        #[source]
        source: serde_json::Error,
    },

    /// No parser registered for a table
    #[error("no parser registered for table: {0}")]
    NoParser(Table),
}

impl RecordError {
    /// Create parse error for a record
    pub fn parse(table: Table, id: RecordId, source: serde_json::Error) -> Self {
        Self::Parse { table, id, source }
    }

    /// Table and ID of the offending record, if the error names one
    #[must_use]
    pub fn record(&self) -> Option<(Table, &RecordId)> {
        match self {
            Self::Parse { table, id, .. } => Some((*table, id)),
            _ => None,
        }
    }
}

/// Result type alias for record operations
pub type RecordResult<T> = Result<T, RecordError>;
