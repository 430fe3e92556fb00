//! Caching transport decorator
//!
//! [`CachingTransport`] wraps any [`Transport`] and makes every call
//! replayable:
//!
//! - hit: stored bytes are returned as-is, never re-validated
//! - miss: the inner transport is called; only a successful response is
//!   persisted
//! - read failure: logged, treated as a miss
//! - write failure: logged, the network response is still returned
//!
//! Calls for the same key are serialized on a per-key lock, so concurrent
//! identical requests reach the network once and the rest are served from
//! the store.

use crate::key::CacheKey;
use crate::store::{CacheStore, PutOutcome};
use crate::transport::{Transport, TransportError};
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Snapshot of the cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Requests answered from the store
    pub from_cache: u64,
    /// Requests that went to the inner transport and succeeded
    pub from_server: u64,
    /// Responses newly persisted
    pub written_to_cache: u64,
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cached requests: {}, non-cached requests: {}, requests written to cache: {}",
            self.from_cache, self.from_server, self.written_to_cache
        )
    }
}

#[derive(Debug, Default)]
struct Counters {
    from_cache: AtomicU64,
    from_server: AtomicU64,
    written_to_cache: AtomicU64,
}

/// Transport decorator persisting every response under its [`CacheKey`]
pub struct CachingTransport<T> {
    inner: T,
    store: Arc<dyn CacheStore>,
    counters: Counters,
    in_flight: DashMap<CacheKey, Arc<Mutex<()>>>,
}

impl<T> fmt::Debug for CachingTransport<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachingTransport")
            .field("store", &self.store)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl<T> CachingTransport<T> {
    /// Wrap `inner`, storing responses in `store`
    #[must_use]
    pub fn new(inner: T, store: Arc<dyn CacheStore>) -> Self {
        Self {
            inner,
            store,
            counters: Counters::default(),
            in_flight: DashMap::new(),
        }
    }

    /// Wrapped transport
    #[inline]
    #[must_use]
    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Current counter values
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            from_cache: self.counters.from_cache.load(Ordering::Relaxed),
            from_server: self.counters.from_server.load(Ordering::Relaxed),
            written_to_cache: self.counters.written_to_cache.load(Ordering::Relaxed),
        }
    }

    /// Keys with a call in progress
    #[inline]
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    async fn read_cached(&self, key: &CacheKey, route: &str) -> Option<Vec<u8>> {
        match self.store.get(key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(route, key = key.short(), error = %e, "cache read failed, treating as miss");
                None
            }
        }
    }

    async fn write_cached(&self, key: &CacheKey, route: &str, bytes: &[u8]) {
        match self.store.put(key, bytes).await {
            Ok(PutOutcome::Written) => {
                self.counters.written_to_cache.fetch_add(1, Ordering::Relaxed);
            }
            Ok(PutOutcome::AlreadyPresent) => {
                tracing::debug!(route, key = key.short(), "cache entry already present");
            }
            Err(e) => {
                tracing::warn!(route, key = key.short(), error = %e, "cache write failed");
            }
        }
    }
}

#[async_trait]
impl<T: Transport> Transport for CachingTransport<T> {
    async fn send(&self, route: &str, body: &Value) -> Result<Vec<u8>, TransportError> {
        let key = CacheKey::compute(route, body).map_err(|e| TransportError::InvalidBody {
            route: route.to_string(),
            message: e.to_string(),
        })?;

        let entry = KeyLock::enter(&self.in_flight, &key);
        let _guard = entry.lock.lock().await;
        self.send_locked(&key, route, body).await
    }
}

/// Share of the per-key lock; the last one dropped removes the map entry,
/// also when the call is abandoned midway
struct KeyLock<'a> {
    map: &'a DashMap<CacheKey, Arc<Mutex<()>>>,
    key: &'a CacheKey,
    lock: Arc<Mutex<()>>,
}

impl<'a> KeyLock<'a> {
    fn enter(map: &'a DashMap<CacheKey, Arc<Mutex<()>>>, key: &'a CacheKey) -> Self {
        let lock = Arc::clone(&map.entry(key.clone()).or_default());
        Self { map, key, lock }
    }
}

impl Drop for KeyLock<'_> {
    fn drop(&mut self) {
        // held by the map and by us only
        self.map.remove_if(self.key, |_, lock| {
            Arc::ptr_eq(lock, &self.lock) && Arc::strong_count(lock) == 2
        });
    }
}

impl<T: Transport> CachingTransport<T> {
    async fn send_locked(
        &self,
        key: &CacheKey,
        route: &str,
        body: &Value,
    ) -> Result<Vec<u8>, TransportError> {
        if let Some(bytes) = self.read_cached(key, route).await {
            self.counters.from_cache.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(route, key = key.short(), bytes = bytes.len(), "served from cache");
            return Ok(bytes);
        }

        let bytes = self.inner.send(route, body).await?;
        self.counters.from_server.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(route, key = key.short(), bytes = bytes.len(), "served from server");

        self.write_cached(key, route, &bytes).await;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheError;
    use crate::store::MemoryStore;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    /// Echoes the body back and counts calls
    #[derive(Debug, Default)]
    struct EchoTransport {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl Transport for EchoTransport {
        async fn send(&self, route: &str, body: &Value) -> Result<Vec<u8>, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            if self.fail {
                return Err(TransportError::status(route, 500, "boom"));
            }
            Ok(serde_json::to_vec(body).unwrap())
        }
    }

    /// Store whose reads and/or writes always fail
    #[derive(Debug, Default)]
    struct BrokenStore {
        inner: MemoryStore,
        fail_reads: bool,
        fail_writes: bool,
    }

    #[async_trait]
    impl CacheStore for BrokenStore {
        async fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, CacheError> {
            if self.fail_reads {
                return Err(CacheError::Task("read broken".to_string()));
            }
            self.inner.get(key).await
        }

        async fn put(&self, key: &CacheKey, bytes: &[u8]) -> Result<PutOutcome, CacheError> {
            if self.fail_writes {
                return Err(CacheError::Task("write broken".to_string()));
            }
            self.inner.put(key, bytes).await
        }
    }

    const ROUTE: &str = crate::routes::LOAD_PAGE_CHUNK;

    #[tokio::test]
    async fn miss_then_hit_counters() {
        let caching = CachingTransport::new(EchoTransport::default(), Arc::new(MemoryStore::default()));
        let body = json!({"page": {"id": "a"}, "chunkNumber": 0});

        let first = caching.send(ROUTE, &body).await.unwrap();
        assert_eq!(
            caching.stats(),
            CacheStats { from_cache: 0, from_server: 1, written_to_cache: 1 }
        );

        let second = caching.send(ROUTE, &body).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(
            caching.stats(),
            CacheStats { from_cache: 1, from_server: 1, written_to_cache: 1 }
        );
        assert_eq!(caching.inner().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn different_body_is_a_miss() {
        let caching = CachingTransport::new(EchoTransport::default(), Arc::new(MemoryStore::default()));

        caching.send(ROUTE, &json!({"chunkNumber": 0})).await.unwrap();
        caching.send(ROUTE, &json!({"chunkNumber": 1})).await.unwrap();

        let stats = caching.stats();
        assert_eq!(stats.from_cache, 0);
        assert_eq!(stats.from_server, 2);
        assert_eq!(stats.written_to_cache, 2);
    }

    #[tokio::test]
    async fn failed_call_is_not_cached() {
        let transport = EchoTransport { fail: true, ..Default::default() };
        let store = Arc::new(MemoryStore::default());
        let caching = CachingTransport::new(transport, store.clone());
        let body = json!({"x": 1});

        assert!(caching.send(ROUTE, &body).await.is_err());
        assert!(caching.send(ROUTE, &body).await.is_err());

        assert_eq!(caching.stats(), CacheStats::default());
        assert!(!store.contains(&CacheKey::compute(ROUTE, &body).unwrap()));
        assert_eq!(caching.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn read_failure_falls_back_to_network() {
        let store = BrokenStore { fail_reads: true, ..Default::default() };
        let caching = CachingTransport::new(EchoTransport::default(), Arc::new(store));
        let body = json!({"x": 1});

        caching.send(ROUTE, &body).await.unwrap();
        caching.send(ROUTE, &body).await.unwrap();

        let stats = caching.stats();
        assert_eq!(stats.from_cache, 0);
        assert_eq!(stats.from_server, 2);
        // the second write finds the first entry in place
        assert_eq!(stats.written_to_cache, 1);
    }

    #[tokio::test]
    async fn write_failure_still_returns_response() {
        let store = BrokenStore { fail_writes: true, ..Default::default() };
        let caching = CachingTransport::new(EchoTransport::default(), Arc::new(store));
        let body = json!({"x": 1});

        let bytes = caching.send(ROUTE, &body).await.unwrap();
        assert_eq!(bytes, serde_json::to_vec(&body).unwrap());
        assert_eq!(
            caching.stats(),
            CacheStats { from_cache: 0, from_server: 1, written_to_cache: 0 }
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_identical_requests_hit_network_once() {
        let caching = Arc::new(CachingTransport::new(
            EchoTransport::default(),
            Arc::new(MemoryStore::default()),
        ));
        let body = json!({"page": {"id": "same"}});

        let mut handles = Vec::new();
        for _ in 0..16 {
            let caching = caching.clone();
            let body = body.clone();
            handles.push(tokio::spawn(async move { caching.send(ROUTE, &body).await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(caching.inner().calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            caching.stats(),
            CacheStats { from_cache: 15, from_server: 1, written_to_cache: 1 }
        );
    }

    #[tokio::test]
    async fn key_locks_released_after_calls() {
        let caching = CachingTransport::new(EchoTransport::default(), Arc::new(MemoryStore::default()));

        for n in 0..200 {
            caching.send(ROUTE, &json!({"chunkNumber": n})).await.unwrap();
        }
        // failures release their lock too
        let failing = CachingTransport::new(
            EchoTransport { fail: true, ..Default::default() },
            Arc::new(MemoryStore::default()),
        );
        assert!(failing.send(ROUTE, &json!({"x": 1})).await.is_err());

        assert_eq!(caching.in_flight(), 0);
        assert_eq!(failing.in_flight(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn key_locks_released_after_concurrent_calls() {
        let caching = Arc::new(CachingTransport::new(
            EchoTransport::default(),
            Arc::new(MemoryStore::default()),
        ));

        let mut handles = Vec::new();
        for n in 0..32 {
            let caching = caching.clone();
            handles.push(tokio::spawn(async move {
                caching.send(ROUTE, &json!({"chunkNumber": n % 4})).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(caching.inner().calls.load(Ordering::SeqCst), 4);
        assert_eq!(caching.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_call_releases_its_lock() {
        struct Stalled;

        #[async_trait]
        impl Transport for Stalled {
            async fn send(&self, _route: &str, _body: &Value) -> Result<Vec<u8>, TransportError> {
                std::future::pending().await
            }
        }

        let caching = CachingTransport::new(Stalled, Arc::new(MemoryStore::default()));
        let body = json!({"x": 1});
        let call = caching.send(ROUTE, &body);
        let timed_out = tokio::time::timeout(std::time::Duration::from_secs(1), call).await;

        assert!(timed_out.is_err());
        assert_eq!(caching.in_flight(), 0);
    }

    #[test]
    fn debug_does_not_need_a_transport() {
        let caching = CachingTransport::new((), Arc::new(MemoryStore::default()));
        let rendered = format!("{caching:?}");
        assert!(rendered.starts_with("CachingTransport"));
        assert!(rendered.contains("from_cache: 0"));
    }

    #[test]
    fn stats_display() {
        let stats = CacheStats { from_cache: 3, from_server: 2, written_to_cache: 1 };
        assert_eq!(
            stats.to_string(),
            "Cached requests: 3, non-cached requests: 2, requests written to cache: 1"
        );
    }
}
