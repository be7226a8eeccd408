//! Error taxonomy for the run orchestrator.
//!
//! Faults are strictly layered: a `TaskFailure` never leaves the executor as
//! an `Err`, an `OrchestrationFault` never leaves the supervisor, and store
//! errors on the audit path are reported to the operational log instead of
//! aborting the run.

use serde::Serialize;
use thiserror::Error;

/// Durable-store failure. Best-effort on the audit path, fatal to the run
/// when the run record itself cannot be written.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("run {0} does not exist")]
    MissingRun(i64),
}

/// Rejected submission. The run is never created.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("unknown document: {0}")]
    UnknownDocument(String),
    #[error("registry is shutting down")]
    ShuttingDown,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Lookup of a run that was never issued.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("run {0} not found")]
    NotFound(i64),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Why a single task failed. Recorded in the audit trail, never escalated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskFailureKind {
    /// The backend call exceeded its time budget.
    Timeout,
    /// The backend itself reported an error.
    Backend,
    /// The raw answer could not be parsed into the task's schema.
    Parse,
}

impl TaskFailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskFailureKind::Timeout => "timeout",
            TaskFailureKind::Backend => "backend",
            TaskFailureKind::Parse => "parse",
        }
    }
}

/// Isolated failure of one task.
#[derive(Debug, Clone)]
pub struct TaskFailure {
    pub kind: TaskFailureKind,
    pub message: String,
}

/// Fault in the supervising logic itself, outside task isolation. Transitions
/// the run to `failed`.
#[derive(Debug, Error)]
pub enum OrchestrationFault {
    #[error("document could not be loaded: {0}")]
    DocumentUnavailable(String),
    #[error("run state could not be persisted: {0}")]
    Store(#[from] StoreError),
}
