//! Pagegraph Record Model
//!
//! Typed, table-tagged records as returned by the content service.
//!
//! # Core Concepts
//!
//! - [`RecordId`]: canonical dashless record identifier
//! - [`Table`]: the closed set of record kinds
//! - [`Record`]: raw payload plus its typed decoding
//! - [`RecordMap`]: one snapshot of records, mergeable last-writer-wins
//! - [`ParserRegistry`]: per-table decoding functions
//!
//! # Example
//!
//! ```rust,ignore
//! use pagegraph_record::{RecordMap, Table};
//!
//! let mut map: RecordMap = serde_json::from_slice(&body)?;
//! map.parse_all()?;
//! for record in map.records(Table::Block) {
//!     println!("{} {}", record.id(), record.as_block().map(|b| b.title()).unwrap_or_default());
//! }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
pub mod id;
pub mod parsers;
pub mod record;
pub mod record_map;
pub mod table;

// Re-exports
pub use error::{RecordError, RecordResult};
pub use id::RecordId;
pub use parsers::{
    default_parsers, Activity, Block, Collection, CollectionView, Comment, Discussion,
    NotionUser, ParseFn, ParserRegistry, Space, TypedValue, UserRoot, UserSetting,
};
pub use record::Record;
pub use record_map::{MergeReport, RecordKey, RecordMap};
pub use table::Table;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
