//! Pagegraph Core
//!
//! Assembles the complete content graph of a page from the service's
//! chunked, reference-following wire protocol.
//!
//! # Architecture
//!
//! ```text
//! Resolver ─→ protocol (request) ─→ Transport (CachingTransport → HttpTransport)
//!    ↑                                    │
//!    └── scan ←── merge ←── parse ←── RecordMap (response)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use pagegraph_core::{HttpConfig, HttpTransport, Resolver, ResolverConfig};
//! use pagegraph_record::RecordId;
//! use std::sync::Arc;
//!
//! let transport = Arc::new(HttpTransport::new(HttpConfig::default())?);
//! let resolver = Resolver::new(transport, ResolverConfig::default());
//! let graph = resolver.resolve(&RecordId::parse("246e2166e2d6439682b5559c723f57f9")?).await?;
//! for child in graph.children(graph.root_id()) {
//!     println!("{}", child.title());
//! }
//! ```

#![warn(unreachable_pub)]

pub mod cancel;
pub mod config;
pub mod error;
pub mod graph;
pub mod http;
pub mod protocol;
pub mod resolver;

// Re-exports
pub use cancel::CancellationToken;
pub use config::{Config, HttpConfig, ResolverConfig, DEFAULT_BASE_URL, DEFAULT_CACHE_DIR};
pub use error::{ResolveError, ResolveResult};
pub use graph::Graph;
pub use http::HttpTransport;
pub use protocol::{Branch, Cursor, CursorFrame, LOAD_PAGE_CHUNK, SYNC_RECORD_VALUES};
pub use resolver::Resolver;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for resolving page graphs
    pub use crate::{CancellationToken, Graph, ResolveError, Resolver, ResolverConfig};
    pub use pagegraph_cache::{CachingTransport, DiskStore, MemoryStore, Transport};
    pub use pagegraph_record::{Block, RecordId, RecordMap, Table};
}
