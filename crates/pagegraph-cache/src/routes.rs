//! Service routes
//!
//! Everything that speaks to the service (the HTTP client, the resolver and
//! scripted test transports) matches on these.

/// Chunked page loading
pub const LOAD_PAGE_CHUNK: &str = "/api/v3/loadCachedPageChunk";

/// Single record fetch
pub const SYNC_RECORD_VALUES: &str = "/api/v3/syncRecordValues";
