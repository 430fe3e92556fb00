//! Scripted transport

use async_trait::async_trait;
use pagegraph_cache::routes::{LOAD_PAGE_CHUNK, SYNC_RECORD_VALUES};
use pagegraph_cache::{Transport, TransportError};
use pagegraph_record::{RecordId, Table};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// Scripted answer
#[derive(Debug, Clone)]
pub enum Reply {
    Json(Value),
    Raw(Vec<u8>),
    Fail(TransportError),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Script {
    Chunk(RecordId, u64),
    Record(Table, RecordId),
}

/// One request seen by the fake
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub route: String,
    pub body: Value,
}

impl RecordedCall {
    /// Page a chunk request was for
    pub fn page_id(&self) -> Option<RecordId> {
        RecordId::parse(self.body.pointer("/page/id")?.as_str()?).ok()
    }

    pub fn chunk_number(&self) -> Option<u64> {
        self.body.get("chunkNumber")?.as_u64()
    }

    pub fn limit(&self) -> Option<u64> {
        self.body.get("limit")?.as_u64()
    }

    pub fn cursor(&self) -> Option<&Value> {
        self.body.get("cursor")
    }

    /// Record a sync request was for
    pub fn pointer(&self) -> Option<(Table, RecordId)> {
        let pointer = self.body.pointer("/requests/0/pointer")?;
        let table = pointer.get("table")?.as_str()?.parse().ok()?;
        let id = RecordId::parse(pointer.get("id")?.as_str()?).ok()?;
        Some((table, id))
    }

    fn script(&self) -> Option<Script> {
        match self.route.as_str() {
            LOAD_PAGE_CHUNK => Some(Script::Chunk(self.page_id()?, self.chunk_number()?)),
            SYNC_RECORD_VALUES => {
                let (table, id) = self.pointer()?;
                Some(Script::Record(table, id))
            }
            _ => None,
        }
    }
}

/// Transport answering from a script and recording every call
///
/// Unscripted requests fail with HTTP 404.
#[derive(Debug, Default)]
pub struct FakeTransport {
    replies: HashMap<Script, Reply>,
    delay: Option<Duration>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer chunk `chunk` of `page` with `response`
    pub fn with_chunk(self, page: &RecordId, chunk: u64, response: Value) -> Self {
        self.with_chunk_reply(page, chunk, Reply::Json(response))
    }

    pub fn with_chunk_reply(mut self, page: &RecordId, chunk: u64, reply: Reply) -> Self {
        self.replies.insert(Script::Chunk(page.clone(), chunk), reply);
        self
    }

    /// Answer a sync request for `(table, id)` with `{"recordMap": record_map}`
    pub fn with_record(self, table: Table, id: &RecordId, record_map: Value) -> Self {
        let response = serde_json::json!({ "recordMap": record_map });
        self.with_record_reply(table, id, Reply::Json(response))
    }

    pub fn with_record_reply(mut self, table: Table, id: &RecordId, reply: Reply) -> Self {
        self.replies.insert(Script::Record(table, id.clone()), reply);
        self
    }

    /// Sleep before every answer (use with paused tokio time)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn calls_on(&self, route: &str) -> Vec<RecordedCall> {
        self.calls.lock().iter().filter(|c| c.route == route).cloned().collect()
    }

    /// Chunk requests for one page, in order
    pub fn calls_for_page(&self, page: &RecordId) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.page_id().as_ref() == Some(page))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, route: &str, body: &Value) -> Result<Vec<u8>, TransportError> {
        let call = RecordedCall {
            route: route.to_string(),
            body: body.clone(),
        };
        let reply = call.script().and_then(|s| self.replies.get(&s).cloned());
        self.calls.lock().push(call);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match reply {
            Some(Reply::Json(value)) => Ok(serde_json::to_vec(&value).unwrap_or_default()),
            Some(Reply::Raw(bytes)) => Ok(bytes),
            Some(Reply::Fail(err)) => Err(err),
            None => Err(TransportError::status(route, 404, format!("unscripted request: {body}"))),
        }
    }
}
