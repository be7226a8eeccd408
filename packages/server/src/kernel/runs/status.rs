//! Read-only projections for the polling API. Never mutates run state.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::audit::{AuditLog, TraceLogEntry};
use super::error::LookupError;
use super::run::RunStatus;
use super::store::RunStore;

/// Shape served by the status polling endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct RunStatusView {
    pub run_id: i64,
    pub status: RunStatus,
    pub current_task: String,
    pub start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

/// Shape served by the results endpoint: always the current snapshot,
/// regardless of terminal state.
#[derive(Debug, Clone, Serialize)]
pub struct RunResultsView {
    pub run_id: i64,
    pub status: RunStatus,
    pub filename: String,
    pub results: BTreeMap<String, serde_json::Value>,
    pub trace_logs: Vec<TraceLogEntry>,
}

pub struct StatusReader {
    store: Arc<dyn RunStore>,
    audit: Arc<dyn AuditLog>,
}

impl StatusReader {
    pub fn new(store: Arc<dyn RunStore>, audit: Arc<dyn AuditLog>) -> Self {
        Self { store, audit }
    }

    /// Live status for polling. Reflects the most recently committed
    /// supervisor write.
    pub async fn status(&self, run_id: i64) -> Result<RunStatusView, LookupError> {
        let snapshot = self
            .store
            .fetch(run_id)
            .await?
            .ok_or(LookupError::NotFound(run_id))?;

        Ok(RunStatusView {
            run_id: snapshot.id,
            status: snapshot.status,
            current_task: snapshot.current_task,
            start_time: snapshot.start_time,
            end_time: snapshot.end_time,
        })
    }

    /// Current results plus the full audit trail. Partial while the run is
    /// still in progress.
    pub async fn results(&self, run_id: i64) -> Result<RunResultsView, LookupError> {
        let snapshot = self
            .store
            .fetch(run_id)
            .await?
            .ok_or(LookupError::NotFound(run_id))?;

        let trace_logs = self.audit.list(run_id).await?;

        Ok(RunResultsView {
            run_id: snapshot.id,
            status: snapshot.status,
            filename: snapshot.filename,
            results: snapshot.results,
            trace_logs,
        })
    }
}
