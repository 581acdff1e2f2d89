//! In-memory backend for service tests
//!
//! Stores documents per index, honours the refresh mode of writes, answers
//! `match_all`, `term` on `id` and `ids` queries, and can be scripted to
//! return canned responses or failures instead. Every connection it hands
//! out is counted on open and on close.

#![allow(dead_code)]

use async_trait::async_trait;
use quarry_search::{Connection, Connector, Error, IndexConfig, Refresh, Result};
use serde_json::{json, Value as JsonValue};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct State {
    /// index -> id -> source, visible to searches
    visible: HashMap<String, BTreeMap<String, JsonValue>>,
    /// index -> id -> source, written without refresh
    pending: HashMap<String, BTreeMap<String, JsonValue>>,
    scripted: VecDeque<Result<JsonValue>>,
    requests: Vec<JsonValue>,
}

#[derive(Default)]
struct Inner {
    state: Mutex<State>,
    opened: AtomicUsize,
    closed: AtomicUsize,
    refuse_connections: bool,
    delay: Option<Duration>,
}

/// Shared handle to the in-memory backend; clones observe the same state.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<Inner>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend whose connect attempts always fail.
    pub fn refusing() -> Self {
        Self {
            inner: Arc::new(Inner {
                refuse_connections: true,
                ..Default::default()
            }),
        }
    }

    /// Backend whose searches take `delay` to answer.
    pub fn slow(delay: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                delay: Some(delay),
                ..Default::default()
            }),
        }
    }

    pub fn connector(&self) -> Arc<dyn Connector> {
        Arc::new(self.clone())
    }

    /// Store a searchable document directly.
    pub fn insert(&self, index: &str, id: &str, source: JsonValue) {
        let mut state = self.inner.state.lock().unwrap();
        state
            .visible
            .entry(index.to_string())
            .or_default()
            .insert(id.to_string(), source);
    }

    /// Queue the next search response.
    pub fn respond_with(&self, response: JsonValue) {
        self.inner.state.lock().unwrap().scripted.push_back(Ok(response));
    }

    /// Queue a failure for the next search.
    pub fn fail_with(&self, error: Error) {
        self.inner.state.lock().unwrap().scripted.push_back(Err(error));
    }

    /// Bodies of every search request received so far.
    pub fn requests(&self) -> Vec<JsonValue> {
        self.inner.state.lock().unwrap().requests.clone()
    }

    pub fn document(&self, index: &str, id: &str) -> Option<JsonValue> {
        let state = self.inner.state.lock().unwrap();
        state.visible.get(index).and_then(|docs| docs.get(id)).cloned()
    }

    pub fn opened(&self) -> usize {
        self.inner.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.inner.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for MemoryBackend {
    async fn connect(&self, config: &IndexConfig) -> Result<Box<dyn Connection>> {
        if self.inner.refuse_connections {
            return Err(Error::BackendConnection(format!(
                "connection refused: {}",
                config.url
            )));
        }
        self.inner.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryConnection {
            inner: self.inner.clone(),
            index: config.index.clone(),
            closed: false,
        }))
    }
}

struct MemoryConnection {
    inner: Arc<Inner>,
    index: String,
    closed: bool,
}

impl MemoryConnection {
    fn matches(query: &JsonValue, id: &str) -> bool {
        if query.get("match_all").is_some() {
            return true;
        }
        if let Some(term) = query.get("term").and_then(|t| t.get("id")) {
            let wanted = term.get("value").unwrap_or(term);
            return wanted.as_str() == Some(id);
        }
        if let Some(values) = query
            .get("ids")
            .and_then(|ids| ids.get("values"))
            .and_then(JsonValue::as_array)
        {
            return values.iter().any(|v| v.as_str() == Some(id));
        }
        false
    }
}

#[async_trait]
impl Connection for MemoryConnection {
    async fn search(&self, body: &JsonValue) -> Result<JsonValue> {
        if let Some(delay) = self.inner.delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.inner.state.lock().unwrap();
        state.requests.push(body.clone());

        if let Some(scripted) = state.scripted.pop_front() {
            return scripted;
        }

        let query = body.get("query").cloned().unwrap_or(json!({"match_all": {}}));
        let hits: Vec<JsonValue> = state
            .visible
            .get(&self.index)
            .map(|docs| {
                docs.iter()
                    .filter(|(id, _)| Self::matches(&query, id))
                    .map(|(id, source)| json!({"_id": id, "_score": 1.0, "_source": source}))
                    .collect()
            })
            .unwrap_or_default();

        Ok(json!({
            "hits": {
                "total": {"value": hits.len(), "relation": "eq"},
                "hits": hits
            }
        }))
    }

    async fn index(&self, id: &str, document: &JsonValue, refresh: Refresh) -> Result<()> {
        let mut state = self.inner.state.lock().unwrap();
        let target = match refresh {
            Refresh::Immediate => &mut state.visible,
            Refresh::Eventual => &mut state.pending,
        };
        target
            .entry(self.index.clone())
            .or_default()
            .insert(id.to_string(), document.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut state = self.inner.state.lock().unwrap();
        let removed = state
            .visible
            .get_mut(&self.index)
            .and_then(|docs| docs.remove(id));

        match removed {
            Some(_) => Ok(()),
            None => Err(Error::MutationConflict {
                id: id.to_string(),
                reason: "document not found".to_string(),
            }),
        }
    }

    fn close(&mut self) {
        assert!(!self.closed, "connection closed twice");
        self.closed = true;
        self.inner.closed.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn applicants() -> IndexConfig {
    IndexConfig::new("memory://local", "applicants", "applicant")
}
