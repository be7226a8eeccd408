//! Task execution with a tagged-outcome isolation boundary.
//!
//! The executor runs exactly one task end-to-end: formulate the backend
//! query, invoke it under the task's time budget, parse the raw answer into
//! the typed schema. Every internal fault is converted into the failure
//! variant of `TaskOutcome` - nothing escapes to the supervisor as an `Err`.

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use super::catalog::TaskSpec;
use super::error::{TaskFailure, TaskFailureKind};
use crate::kernel::traits::{BackendQuery, DocumentHandle, RetrievalBackend};

/// Per-task execution limits, fixed at orchestrator construction.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Time budget for one backend call. Expiry is a task failure, not a run
    /// failure.
    pub task_timeout: Duration,
    /// Extra attempts allowed after a parse failure.
    pub parse_retry_limit: u32,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            task_timeout: Duration::from_secs(60),
            parse_retry_limit: 1,
        }
    }
}

/// Result of one task execution.
#[derive(Debug, Clone)]
pub enum TaskOutcome {
    /// Typed payload, already validated against the task's schema.
    Success { value: Value },
    Failure(TaskFailure),
}

pub struct TaskExecutor {
    backend: Arc<dyn RetrievalBackend>,
    config: ExecutorConfig,
}

impl TaskExecutor {
    pub fn new(backend: Arc<dyn RetrievalBackend>, config: ExecutorConfig) -> Self {
        Self { backend, config }
    }

    /// Execute one task against the document. Infallible from the caller's
    /// point of view: faults come back as `TaskOutcome::Failure`.
    pub async fn execute(&self, document: &DocumentHandle, spec: &TaskSpec) -> TaskOutcome {
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let query = self.formulate(spec);

            let raw = match tokio::time::timeout(
                self.config.task_timeout,
                self.backend.query(document, &query),
            )
            .await
            {
                Err(_) => {
                    return TaskOutcome::Failure(TaskFailure {
                        kind: TaskFailureKind::Timeout,
                        message: format!(
                            "backend call exceeded {}s time budget",
                            self.config.task_timeout.as_secs()
                        ),
                    })
                }
                Ok(Err(e)) => {
                    return TaskOutcome::Failure(TaskFailure {
                        kind: TaskFailureKind::Backend,
                        message: e.to_string(),
                    })
                }
                Ok(Ok(raw)) => raw,
            };

            match spec.kind.parse(&raw) {
                Ok(value) => return TaskOutcome::Success { value },
                Err(e) if attempt <= self.config.parse_retry_limit => {
                    tracing::debug!(
                        task = spec.name,
                        attempt,
                        error = %e,
                        "parse failed, retrying task"
                    );
                }
                Err(e) => {
                    return TaskOutcome::Failure(TaskFailure {
                        kind: TaskFailureKind::Parse,
                        message: e.to_string(),
                    })
                }
            }
        }
    }

    fn formulate(&self, spec: &TaskSpec) -> BackendQuery {
        BackendQuery {
            task: spec.name.to_string(),
            question: format!(
                "{}\nReturn the answer as a single JSON object with fields: {}.",
                spec.retrieval_hint,
                spec.kind.schema_fields()
            ),
            target: spec.target,
        }
    }
}
