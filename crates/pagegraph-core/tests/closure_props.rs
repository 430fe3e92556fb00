//! Closure Property Tests
//!
//! Random page trees with extra link-to-page edges (cycles included): every
//! page ends up in the graph and each page's chunk stream is requested once,
//! whatever the branch concurrency.

use pagegraph_core::prelude::*;
use pagegraph_record::RecordId;
use pagegraph_test_utils::*;
use proptest::prelude::*;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct Site {
    /// parent[i] is the parent page of page i + 1
    parents: Vec<usize>,
    /// (from page, to page) link-to-page blocks
    links: Vec<(usize, usize)>,
}

impl Site {
    fn pages(&self) -> usize {
        self.parents.len() + 1
    }
}

fn page(i: usize) -> RecordId {
    if i == 0 {
        root_id()
    } else {
        id(1_000 + i as u32)
    }
}

fn text(i: usize) -> RecordId {
    id(2_000 + i as u32)
}

fn link(n: usize) -> RecordId {
    id(3_000 + n as u32)
}

fn arb_site() -> impl Strategy<Value = Site> {
    (1usize..10).prop_flat_map(|n| {
        let parents = (1..n).map(|i| 0..i).collect::<Vec<_>>();
        let links = prop::collection::vec((0..n, 0..n), 0..6);
        (parents, links).prop_map(|(parents, links)| Site { parents, links })
    })
}

/// Content of page `i`: its text block, child pages, then its links
fn content(site: &Site, i: usize) -> Vec<RecordId> {
    let mut content = vec![text(i)];
    content.extend(
        site.parents
            .iter()
            .enumerate()
            .filter(|(_, parent)| **parent == i)
            .map(|(child, _)| page(child + 1)),
    );
    content.extend(
        site.links
            .iter()
            .enumerate()
            .filter(|(_, (from, _))| *from == i)
            .map(|(n, _)| link(n)),
    );
    content
}

/// Each page's chunk holds the page, its text, its links, and the page
/// blocks of its children (whose own text is left for their chunk)
fn script(site: &Site) -> FakeTransport {
    let mut fake = FakeTransport::new();
    for i in 0..site.pages() {
        let mut map = RecordMapBuilder::new()
            .block(page_block(&page(i), &format!("page {i}"), &content(site, i)))
            .block(text_block(&text(i), &page(i), "body"));
        for (child, _) in site.parents.iter().enumerate().filter(|(_, p)| **p == i) {
            let child = child + 1;
            map = map.block(page_block(&page(child), &format!("page {child}"), &content(site, child)));
        }
        for (n, (_, to)) in site.links.iter().enumerate().filter(|(_, (from, _))| *from == i) {
            map = map.block(alias_block(&link(n), &page(i), &page(*to)));
        }
        fake = fake.with_chunk(&page(i), 0, chunk_response(map.build(), exhausted()));
    }
    fake
}

fn resolve(site: &Site, max_concurrent_branches: usize) -> (Graph, Arc<FakeTransport>) {
    let fake = Arc::new(script(site));
    let config = ResolverConfig::default().with_max_concurrent_branches(max_concurrent_branches);
    let resolver = Resolver::new(Arc::clone(&fake), config);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap();
    let graph = runtime.block_on(resolver.resolve(&root_id())).unwrap();
    (graph, fake)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_every_page_resolved_once(site in arb_site(), concurrency in 1usize..5) {
        let (graph, fake) = resolve(&site, concurrency);

        prop_assert_eq!(fake.call_count(), site.pages());
        for i in 0..site.pages() {
            prop_assert_eq!(fake.calls_for_page(&page(i)).len(), 1);
            prop_assert!(graph.block(&page(i)).is_some());
            prop_assert!(graph.block(&text(i)).is_some());
        }
        prop_assert_eq!(
            graph.records(Table::Block).count(),
            2 * site.pages() + site.links.len()
        );
    }

    #[test]
    fn prop_concurrency_does_not_change_graph(site in arb_site()) {
        let (serial, _) = resolve(&site, 1);
        let (parallel, _) = resolve(&site, 4);
        prop_assert_eq!(serial.record_map(), parallel.record_map());
    }
}
