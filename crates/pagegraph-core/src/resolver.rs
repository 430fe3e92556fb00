//! Graph resolver
//!
//! Computes the closure of a root page: every record reachable from it by
//! following downward references.
//!
//! # Algorithm
//!
//! ```text
//! seen = {page(root)}, pending = [page(root)]
//! while pending or in flight:
//!     spawn branches up to max_concurrent_branches
//!     branch: fetch chunks/record → parse → merge under lock
//!             → scan changed records for references not in the graph
//!     claim each reference once (seen-set insert) → pending
//! ```
//!
//! Only records reached from the root are scanned. Responses also carry
//! ancestors and other breadcrumbs; those are stored but never followed. A
//! record delivered before anything references it is scanned once it is
//! reached. A page-like block whose content is missing is loaded through its
//! own chunk stream rather than child by child; with `recursive = false` only
//! the root is expanded that way.

use crate::cancel::CancellationToken;
use crate::config::ResolverConfig;
use crate::error::ResolveError;
use crate::graph::Graph;
use crate::protocol::{
    self, Branch, LoadPageChunkRequest, LoadPageChunkResponse, SyncRecordValuesRequest,
    SyncRecordValuesResponse, LOAD_PAGE_CHUNK, SYNC_RECORD_VALUES,
};
use dashmap::DashSet;
use pagegraph_cache::Transport;
use pagegraph_record::{
    default_parsers, Block, ParserRegistry, Record, RecordId, RecordKey, RecordMap, Table,
    TypedValue,
};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinSet;

/// Reference found while scanning merged records
#[derive(Debug, Clone, PartialEq, Eq)]
enum Lead {
    /// Page-like block whose own chunk stream should be loaded
    Expand(RecordId),
    /// Record absent from the graph
    Missing(Table, RecordId),
}

/// Downward references of one record
#[derive(Debug, Default)]
struct Edges {
    /// Fetched on their own when missing
    fetch: Vec<RecordKey>,
    /// Content of an expandable page, loaded through its chunk stream
    content: Vec<RecordId>,
}

/// Records merged so far, and which of them hang below the root
#[derive(Debug)]
struct State {
    records: RecordMap,
    reached: HashSet<RecordKey>,
    scanned: HashSet<RecordKey>,
}

impl State {
    fn new(root: &RecordId) -> Self {
        Self {
            records: RecordMap::new(),
            reached: HashSet::from([(Table::Block, root.clone())]),
            scanned: HashSet::new(),
        }
    }

    /// Mark `key` reached; queue it when present and not yet scanned as is
    fn follow(
        &mut self,
        key: RecordKey,
        changed: &HashSet<RecordKey>,
        queue: &mut VecDeque<RecordKey>,
    ) {
        let stale = changed.contains(&key) || !self.scanned.contains(&key);
        if self.records.contains(key.0, &key.1) && stale {
            queue.push_back(key.clone());
        }
        self.reached.insert(key);
    }

    /// Page block whose content is not all in the graph yet
    fn is_incomplete_page(&self, id: &RecordId) -> bool {
        match self.records.get(Table::Block, id).and_then(Record::typed) {
            Some(TypedValue::Block(block)) => block
                .content
                .iter()
                .any(|child| !self.records.contains(Table::Block, child)),
            _ => true,
        }
    }
}

impl Lead {
    fn into_branch(self) -> Branch {
        match self {
            Self::Expand(id) | Self::Missing(Table::Block, id) => Branch::Page(id),
            Self::Missing(table, id) => Branch::Record(table, id),
        }
    }
}

/// Resolves page graphs over a [`Transport`]
pub struct Resolver<T> {
    transport: Arc<T>,
    config: ResolverConfig,
    parsers: Arc<ParserRegistry>,
    cancel: CancellationToken,
}

impl<T> fmt::Debug for Resolver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("config", &self.config)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl<T: Transport + 'static> Resolver<T> {
    /// Create resolver with the default parsers
    #[must_use]
    pub fn new(transport: Arc<T>, config: ResolverConfig) -> Self {
        Self {
            transport,
            config,
            parsers: Arc::new(default_parsers()),
            cancel: CancellationToken::new(),
        }
    }

    /// With a custom parser registry
    #[must_use]
    pub fn with_parsers(mut self, parsers: ParserRegistry) -> Self {
        self.parsers = Arc::new(parsers);
        self
    }

    /// With an externally owned cancellation token
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that cancels this resolver's runs
    #[inline]
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Resolver configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Underlying transport
    #[inline]
    #[must_use]
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Resolve every record reachable from `root`
    ///
    /// # Errors
    /// - [`ResolveError::Config`] for an unusable configuration
    /// - [`ResolveError::Cancelled`] if the token fires
    /// - [`ResolveError::Branch`] wrapping the first failing branch
    /// - [`ResolveError::Join`] if a branch task panics
    #[tracing::instrument(skip_all, fields(root = %root))]
    pub async fn resolve(&self, root: &RecordId) -> Result<Graph, ResolveError> {
        self.config.validate()?;
        if self.cancel.is_cancelled() {
            return Err(ResolveError::Cancelled);
        }

        let run = Arc::new(Run {
            transport: Arc::clone(&self.transport),
            config: self.config.clone(),
            parsers: Arc::clone(&self.parsers),
            cancel: self.cancel.clone(),
            root: root.clone(),
            state: Mutex::new(State::new(root)),
            seen: DashSet::new(),
            requests: AtomicU64::new(0),
        });

        let root_branch = Branch::Page(root.clone());
        run.seen.insert(root_branch.clone());
        let mut pending = VecDeque::from([root_branch]);
        let mut tasks: JoinSet<(Branch, Result<Vec<Branch>, ResolveError>)> = JoinSet::new();

        tracing::info!(recursive = self.config.recursive, "resolving page graph");

        loop {
            while tasks.len() < self.config.max_concurrent_branches {
                let Some(branch) = pending.pop_front() else {
                    break;
                };
                let run = Arc::clone(&run);
                tasks.spawn(async move {
                    let result = run.process(&branch).await;
                    (branch, result)
                });
            }

            let joined = tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    tasks.abort_all();
                    tracing::info!("resolution cancelled");
                    return Err(ResolveError::Cancelled);
                }
                joined = tasks.join_next() => joined,
            };

            match joined {
                None => break,
                Some(Ok((branch, Ok(next)))) => {
                    tracing::debug!(%branch, discovered = next.len(), "branch complete");
                    pending.extend(next);
                }
                Some(Ok((branch, Err(e)))) => {
                    tasks.abort_all();
                    tracing::debug!(%branch, error = %e, "branch failed");
                    return Err(e.in_branch(branch));
                }
                Some(Err(e)) => {
                    tasks.abort_all();
                    return Err(ResolveError::Join(e.to_string()));
                }
            }
        }

        let records = std::mem::take(&mut run.state.lock().records);
        tracing::info!(
            records = records.len(),
            branches = run.seen.len(),
            requests = run.requests.load(Ordering::Relaxed),
            "page graph resolved"
        );
        Ok(Graph::new(root.clone(), records))
    }
}

/// State shared by the branches of one resolution
struct Run<T> {
    transport: Arc<T>,
    config: ResolverConfig,
    parsers: Arc<ParserRegistry>,
    cancel: CancellationToken,
    root: RecordId,
    state: Mutex<State>,
    seen: DashSet<Branch>,
    requests: AtomicU64,
}

impl<T: Transport> Run<T> {
    async fn process(&self, branch: &Branch) -> Result<Vec<Branch>, ResolveError> {
        let leads = match branch {
            Branch::Page(id) => self.load_page(id).await?,
            Branch::Record(table, id) => self.load_record(*table, id).await?,
        };
        Ok(self.claim(leads))
    }

    /// Page through a chunk stream until the cursor is exhausted
    async fn load_page(&self, page: &RecordId) -> Result<Vec<Lead>, ResolveError> {
        let mut leads = Vec::new();
        let mut cursor = None;
        let mut chunk_number = 0u32;

        loop {
            let request = LoadPageChunkRequest::new(page, chunk_number, cursor.take(), &self.config);
            let body = protocol::encode(LOAD_PAGE_CHUNK, &request)?;
            let bytes = self.send(LOAD_PAGE_CHUNK, &body).await?;
            let response: LoadPageChunkResponse = protocol::decode(LOAD_PAGE_CHUNK, &bytes)?;

            tracing::debug!(
                %page,
                chunk_number,
                records = response.record_map.len(),
                "chunk loaded"
            );
            leads.extend(self.absorb(response.record_map)?);

            if response.cursor.is_exhausted() {
                break;
            }
            cursor = Some(response.cursor);
            chunk_number += 1;
        }
        Ok(leads)
    }

    async fn load_record(&self, table: Table, id: &RecordId) -> Result<Vec<Lead>, ResolveError> {
        let request = SyncRecordValuesRequest::single(table, id);
        let body = protocol::encode(SYNC_RECORD_VALUES, &request)?;
        let bytes = self.send(SYNC_RECORD_VALUES, &body).await?;
        let response: SyncRecordValuesResponse = protocol::decode(SYNC_RECORD_VALUES, &bytes)?;

        if !response.record_map.contains(table, id) {
            tracing::debug!(%table, %id, "record not returned");
        }
        self.absorb(response.record_map)
    }

    async fn send(&self, route: &str, body: &Value) -> Result<Vec<u8>, ResolveError> {
        if self.cancel.is_cancelled() {
            return Err(ResolveError::Cancelled);
        }
        self.requests.fetch_add(1, Ordering::Relaxed);

        let timeout = self.config.request_timeout();
        let bytes = tokio::time::timeout(timeout, self.transport.send(route, body))
            .await
            .map_err(|_| ResolveError::timeout(route, timeout))??;
        Ok(bytes)
    }

    /// Parse, merge, and scan what changed below the root
    fn absorb(&self, mut map: RecordMap) -> Result<Vec<Lead>, ResolveError> {
        map.parse_with(&self.parsers)?;

        let mut state = self.state.lock();
        let report = state.records.merge(map);
        let changed: HashSet<RecordKey> = report.changed().cloned().collect();
        let mut queue: VecDeque<RecordKey> = report
            .changed()
            .filter(|key| state.reached.contains(*key))
            .cloned()
            .collect();

        let mut leads = Vec::new();
        let mut visited = HashSet::new();
        while let Some(key) = queue.pop_front() {
            if !visited.insert(key.clone()) {
                continue;
            }
            let Some(edges) = state.records.get(key.0, &key.1).map(|r| self.edges(r)) else {
                continue;
            };
            state.scanned.insert(key.clone());

            if edges.content.iter().any(|c| !state.records.contains(Table::Block, c)) {
                leads.push(Lead::Expand(key.1.clone()));
            }
            for (table, id) in edges.fetch {
                if !state.records.contains(table, &id) {
                    leads.push(Lead::Missing(table, id.clone()));
                }
                state.follow((table, id), &changed, &mut queue);
            }
            for id in edges.content {
                state.follow((Table::Block, id), &changed, &mut queue);
            }
        }
        Ok(leads)
    }

    fn edges(&self, record: &Record) -> Edges {
        let mut edges = Edges::default();
        match record.typed() {
            Some(TypedValue::Block(block)) => self.block_edges(block, &mut edges),
            Some(TypedValue::Discussion(discussion)) => {
                edges.fetch.extend(keys(Table::Comment, &discussion.comments));
            }
            _ => {}
        }
        edges
    }

    fn block_edges(&self, block: &Block, edges: &mut Edges) {
        if block.is_page_like() {
            if self.config.recursive || block.id == self.root {
                edges.content.extend(block.content.iter().cloned());
            }
        } else {
            edges.fetch.extend(keys(Table::Block, &block.content));
        }

        if self.config.recursive {
            if let Some(target) = block.alias_target() {
                edges.fetch.push((Table::Block, target));
            }
        }
        edges.fetch.extend(keys(Table::Collection, block.collection_id.as_slice()));
        edges.fetch.extend(keys(Table::CollectionView, &block.view_ids));
        edges.fetch.extend(keys(Table::Discussion, &block.discussions));
    }

    /// Turn leads into branches, each claimed at most once per run
    ///
    /// Leads are re-checked first: a later chunk of the same page often
    /// delivers records referenced by an earlier one.
    fn claim(&self, leads: Vec<Lead>) -> Vec<Branch> {
        let state = self.state.lock();
        leads
            .into_iter()
            .filter(|lead| match lead {
                Lead::Expand(id) => state.is_incomplete_page(id),
                Lead::Missing(table, id) => !state.records.contains(*table, id),
            })
            .map(Lead::into_branch)
            .filter(|branch| self.seen.insert(branch.clone()))
            .collect()
    }
}

fn keys(table: Table, ids: &[RecordId]) -> impl Iterator<Item = RecordKey> + '_ {
    ids.iter().map(move |id| (table, id.clone()))
}
