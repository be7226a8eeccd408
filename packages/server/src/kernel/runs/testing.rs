//! In-memory test doubles for the orchestrator's seams.
//!
//! These mirror the durable implementations closely enough that the
//! integration suite exercises the real supervisor, executor, and registry
//! without a database or a live backend.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Mutex, RwLock};
use std::time::Duration;

use super::audit::{AuditLog, TraceLogEntry};
use super::error::StoreError;
use super::run::{RunSnapshot, RunStatus};
use super::store::RunStore;
use crate::kernel::traits::{
    BackendError, BackendQuery, DocumentError, DocumentHandle, DocumentStore, RetrievalBackend,
};

/// In-memory `RunStore` with the same status-machine guards as the Postgres
/// implementation.
pub struct InMemoryRunStore {
    next_id: AtomicI64,
    runs: RwLock<HashMap<i64, RunSnapshot>>,
}

impl Default for InMemoryRunStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRunStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            runs: RwLock::new(HashMap::new()),
        }
    }

    fn update<F>(&self, run_id: i64, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut RunSnapshot),
    {
        let mut runs = self.runs.write().unwrap_or_else(|e| e.into_inner());
        let run = runs.get_mut(&run_id).ok_or(StoreError::MissingRun(run_id))?;
        f(run);
        Ok(())
    }
}

#[async_trait]
impl RunStore for InMemoryRunStore {
    async fn create(&self, filename: &str) -> Result<i64, StoreError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let snapshot = RunSnapshot {
            id,
            filename: filename.to_string(),
            status: RunStatus::Queued,
            current_task: "Queued".to_string(),
            start_time: None,
            end_time: None,
            results: BTreeMap::new(),
        };
        self.runs
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, snapshot);
        Ok(id)
    }

    async fn fetch(&self, run_id: i64) -> Result<Option<RunSnapshot>, StoreError> {
        Ok(self
            .runs
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&run_id)
            .cloned())
    }

    async fn mark_started(&self, run_id: i64) -> Result<(), StoreError> {
        self.update(run_id, |run| {
            if run.status == RunStatus::Queued {
                run.status = RunStatus::InProgress;
                run.start_time = Some(Utc::now());
            }
        })
    }

    async fn set_current_task(&self, run_id: i64, label: &str) -> Result<(), StoreError> {
        self.update(run_id, |run| {
            if run.status == RunStatus::InProgress {
                run.current_task = label.to_string();
            }
        })
    }

    async fn merge_result(
        &self,
        run_id: i64,
        task_name: &str,
        value: &Value,
    ) -> Result<(), StoreError> {
        self.update(run_id, |run| {
            if run.status == RunStatus::InProgress {
                run.results.insert(task_name.to_string(), value.clone());
            }
        })
    }

    async fn finish(&self, run_id: i64, status: RunStatus, label: &str) -> Result<(), StoreError> {
        self.update(run_id, |run| {
            if run.status.can_transition_to(status) {
                run.status = status;
                run.current_task = label.to_string();
                run.end_time = Some(Utc::now());
            }
        })
    }
}

/// In-memory `AuditLog`. Appends preserve order; `set_unavailable` simulates
/// a persistence outage.
pub struct InMemoryAuditLog {
    entries: RwLock<Vec<TraceLogEntry>>,
    unavailable: AtomicBool,
}

impl Default for InMemoryAuditLog {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            unavailable: AtomicBool::new(false),
        }
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl AuditLog for InMemoryAuditLog {
    async fn append(
        &self,
        run_id: i64,
        node_name: &str,
        message: &str,
    ) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("audit log offline".to_string()));
        }

        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(TraceLogEntry {
                run_id,
                timestamp: Utc::now(),
                node_name: node_name.to_string(),
                message: message.to_string(),
            });
        Ok(())
    }

    async fn list(&self, run_id: i64) -> Result<Vec<TraceLogEntry>, StoreError> {
        Ok(self
            .entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|entry| entry.run_id == run_id)
            .cloned()
            .collect())
    }
}

/// Scripted response for one backend call.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return this raw answer.
    Answer(String),
    /// Fail with a backend error.
    Fail(String),
    /// Sleep for the duration, then answer. Used to trip time budgets.
    Hang(Duration, String),
}

/// Scripted `RetrievalBackend` keyed by task name. Responses for a task are
/// consumed in order; the last one repeats for further calls.
pub struct MockBackend {
    scripts: Mutex<HashMap<String, VecDeque<MockResponse>>>,
    calls: Mutex<HashMap<String, u32>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            calls: Mutex::new(HashMap::new()),
        }
    }

    pub fn script(&self, task: &str, response: MockResponse) {
        self.scripts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(task.to_string())
            .or_default()
            .push_back(response);
    }

    /// How many times the backend was queried for a task.
    pub fn calls(&self, task: &str) -> u32 {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(task)
            .copied()
            .unwrap_or(0)
    }

    fn next_response(&self, task: &str) -> Option<MockResponse> {
        *self
            .calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(task.to_string())
            .or_insert(0) += 1;

        let mut scripts = self.scripts.lock().unwrap_or_else(|e| e.into_inner());
        let queue = scripts.get_mut(task)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl RetrievalBackend for MockBackend {
    async fn query(
        &self,
        _document: &DocumentHandle,
        query: &BackendQuery,
    ) -> Result<String, BackendError> {
        // Resolve the script before any await so the lock is not held across
        // a suspension point.
        let response = self.next_response(&query.task);

        match response {
            None => Err(BackendError::Failed(format!(
                "no scripted answer for task '{}'",
                query.task
            ))),
            Some(MockResponse::Answer(answer)) => Ok(answer),
            Some(MockResponse::Fail(message)) => Err(BackendError::Failed(message)),
            Some(MockResponse::Hang(duration, answer)) => {
                tokio::time::sleep(duration).await;
                Ok(answer)
            }
        }
    }
}

/// `DocumentStore` over a fixed set of known filenames. A "corrupt" entry
/// resolves at submission time but fails to load when the supervisor reaches
/// for it.
pub struct StaticDocuments {
    docs: RwLock<HashMap<String, bool>>,
}

impl Default for StaticDocuments {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticDocuments {
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(HashMap::new()),
        }
    }

    pub fn with(filenames: &[&str]) -> Self {
        let store = Self::new();
        for filename in filenames {
            store.add(filename);
        }
        store
    }

    pub fn add(&self, filename: &str) {
        self.docs
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(filename.to_string(), true);
    }

    pub fn add_corrupt(&self, filename: &str) {
        self.docs
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(filename.to_string(), false);
    }
}

#[async_trait]
impl DocumentStore for StaticDocuments {
    async fn resolve(&self, filename: &str) -> Result<DocumentHandle, DocumentError> {
        match self
            .docs
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(filename)
        {
            None => Err(DocumentError::NotFound(filename.to_string())),
            Some(false) => Err(DocumentError::Unreadable(format!(
                "{} is corrupt",
                filename
            ))),
            Some(true) => Ok(DocumentHandle {
                filename: filename.to_string(),
                location: format!("memory://{}", filename),
            }),
        }
    }
}
