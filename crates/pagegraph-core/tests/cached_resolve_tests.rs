//! Cached Resolution Tests
//!
//! The resolver behind a CachingTransport: a second run over the same cache
//! directory needs no network at all.

use pagegraph_core::prelude::*;
use pagegraph_test_utils::*;
use std::sync::Arc;

fn site() -> FakeTransport {
    let root = root_id();
    let sub = id(10);
    FakeTransport::new()
        .with_chunk(
            &root,
            0,
            chunk_response(
                RecordMapBuilder::new()
                    .block(page_block(&root, "Home", &[id(1), sub.clone()]))
                    .block(text_block(&id(1), &root, "intro"))
                    .block(page_block(&sub, "Sub", &[id(11)]))
                    .build(),
                cursor_at(&root, 2),
            ),
        )
        .with_chunk(
            &root,
            1,
            chunk_response(RecordMapBuilder::new().build(), exhausted()),
        )
        .with_chunk(&sub, 0, single_chunk_page(&sub, "Sub", &[id(11)]))
}

#[tokio::test]
async fn test_second_run_served_entirely_from_cache() {
    let dir = tempfile::tempdir().unwrap();

    let online = Arc::new(site());
    let caching = CachingTransport::new(
        Arc::clone(&online),
        Arc::new(DiskStore::open(dir.path()).await.unwrap()),
    );
    let first = Resolver::new(Arc::new(caching), ResolverConfig::default());
    let graph = first.resolve(&root_id()).await.unwrap();

    let stats = first.transport().stats();
    assert_eq!(online.call_count(), 3);
    assert_eq!(stats.from_server, 3);
    assert_eq!(stats.written_to_cache, 3);
    assert_eq!(stats.from_cache, 0);

    // nothing scripted: any network call would fail
    let offline = Arc::new(FakeTransport::new());
    let caching = CachingTransport::new(
        Arc::clone(&offline),
        Arc::new(DiskStore::open(dir.path()).await.unwrap()),
    );
    let second = Resolver::new(Arc::new(caching), ResolverConfig::default());
    let replayed = second.resolve(&root_id()).await.unwrap();

    assert_eq!(offline.call_count(), 0);
    assert_eq!(second.transport().stats().from_cache, 3);
    assert_eq!(replayed, graph);
}

#[tokio::test]
async fn test_shared_cache_across_concurrent_resolutions() {
    let online = Arc::new(site());
    let caching = Arc::new(CachingTransport::new(
        Arc::clone(&online),
        Arc::new(MemoryStore::default()),
    ));
    let a = Resolver::new(Arc::clone(&caching), ResolverConfig::default());
    let b = Resolver::new(Arc::clone(&caching), ResolverConfig::default());

    let root = root_id();
    let (left, right) = tokio::join!(a.resolve(&root), b.resolve(&root));

    assert_eq!(left.unwrap(), right.unwrap());
    assert_eq!(online.call_count(), 3);
    let stats = caching.stats();
    assert_eq!(stats.from_server, 3);
    assert_eq!(stats.from_cache, 3);
    assert_eq!(caching.in_flight(), 0);
}

#[tokio::test]
async fn test_failed_run_caches_only_successes() {
    let root = root_id();
    let sub = id(10);
    // sub-page chunk is unscripted, so it fails with 404
    let online = Arc::new(
        FakeTransport::new().with_chunk(
            &root,
            0,
            chunk_response(
                RecordMapBuilder::new()
                    .block(page_block(&root, "Home", &[sub.clone()]))
                    .block(page_block(&sub, "Sub", &[id(11)]))
                    .build(),
                exhausted(),
            ),
        ),
    );
    let dir = tempfile::tempdir().unwrap();
    let store = DiskStore::open(dir.path()).await.unwrap();
    let resolver = Resolver::new(
        Arc::new(CachingTransport::new(Arc::clone(&online), Arc::new(store.clone()))),
        ResolverConfig::default(),
    );

    let err = resolver.resolve(&root).await.unwrap_err();

    assert_eq!(err.branch().map(|b| b.id().clone()), Some(sub));
    assert_eq!(store.len().await.unwrap(), 1);
    assert_eq!(resolver.transport().stats().written_to_cache, 1);
}
