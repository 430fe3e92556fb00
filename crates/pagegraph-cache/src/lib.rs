//! Pagegraph Request Cache
//!
//! The transport seam between the resolver and the network, plus a
//! decorator that makes every request replayable from local storage.
//!
//! # Architecture
//!
//! ```text
//! Resolver → CachingTransport ─hit──→ CacheStore (DiskStore / MemoryStore)
//!                  │
//!                  └─miss─→ inner Transport ─→ network
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use pagegraph_cache::{CachingTransport, DiskStore};
//! use std::sync::Arc;
//!
//! let store = DiskStore::open("tmpdata/cache").await?;
//! let transport = CachingTransport::new(http, Arc::new(store));
//! let bytes = transport.send("/api/v3/loadCachedPageChunk", &body).await?;
//! println!("{}", transport.stats());
//! ```

#![warn(unreachable_pub)]

pub mod caching;
pub mod error;
pub mod key;
pub mod routes;
pub mod store;
pub mod transport;

// Re-exports
pub use caching::{CacheStats, CachingTransport};
pub use error::{CacheError, CacheResult};
pub use key::CacheKey;
pub use store::{CacheStore, DiskStore, MemoryStore, PutOutcome};
pub use transport::{Transport, TransportError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
