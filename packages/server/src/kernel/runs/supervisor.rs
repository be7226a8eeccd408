//! Run supervision: drives one run from `queued` to a terminal state.
//!
//! Exactly one supervisor instance is ever active for a given run id; it is
//! the sole writer of the run's mutable fields for the id's entire lifetime.
//! Task execution is strictly sequential so `current_task` always names a
//! single unambiguous in-flight operation for polling clients.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::audit::AuditLog;
use super::catalog::TaskSpec;
use super::error::OrchestrationFault;
use super::executor::{TaskExecutor, TaskOutcome};
use super::run::RunStatus;
use super::store::RunStore;
use crate::kernel::traits::DocumentStore;

/// Audit node name for orchestration-level entries (task entries use the
/// task's own name).
const SUPERVISOR_NODE: &str = "Supervisor";

pub struct RunSupervisor {
    run_id: i64,
    filename: String,
    store: Arc<dyn RunStore>,
    audit: Arc<dyn AuditLog>,
    documents: Arc<dyn DocumentStore>,
    executor: TaskExecutor,
    catalog: Arc<Vec<TaskSpec>>,
    shutdown: Arc<AtomicBool>,
}

impl RunSupervisor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        run_id: i64,
        filename: String,
        store: Arc<dyn RunStore>,
        audit: Arc<dyn AuditLog>,
        documents: Arc<dyn DocumentStore>,
        executor: TaskExecutor,
        catalog: Arc<Vec<TaskSpec>>,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            run_id,
            filename,
            store,
            audit,
            documents,
            executor,
            catalog,
            shutdown,
        }
    }

    /// Drive the run to a terminal state. Infallible: orchestration faults
    /// are converted into the `failed` terminal state here and nothing
    /// propagates to the spawning registry.
    pub async fn run(self) {
        tracing::info!(run_id = self.run_id, filename = %self.filename, "run starting");

        match self.drive().await {
            Ok(summary) => {
                tracing::info!(run_id = self.run_id, summary = %summary, "run completed");
            }
            Err(fault) => {
                tracing::warn!(run_id = self.run_id, fault = %fault, "run failed");
                self.record_fault(fault).await;
            }
        }
    }

    async fn drive(&self) -> Result<String, OrchestrationFault> {
        self.store.mark_started(self.run_id).await?;

        let document = self
            .documents
            .resolve(&self.filename)
            .await
            .map_err(|e| OrchestrationFault::DocumentUnavailable(e.to_string()))?;

        let total = self.catalog.len();
        let mut succeeded = 0usize;

        for spec in self.catalog.iter() {
            if self.shutdown.load(Ordering::SeqCst) {
                tracing::info!(
                    run_id = self.run_id,
                    task = spec.name,
                    "shutdown requested, not starting further tasks"
                );
                break;
            }

            // Progress must be durable before the task begins; this write is
            // the only way the in-flight task becomes externally visible.
            self.store
                .set_current_task(self.run_id, &format!("Processing: {}", spec.name))
                .await?;

            match self.executor.execute(&document, spec).await {
                TaskOutcome::Success { value } => {
                    self.store
                        .merge_result(self.run_id, spec.name, &value)
                        .await?;
                    self.append_audit(
                        spec.name,
                        &format!("Task succeeded.\nParsed result: {}", value),
                    )
                    .await;
                    succeeded += 1;
                }
                TaskOutcome::Failure(failure) => {
                    // Isolated: record the failure and continue with the next
                    // task. The task's key stays absent from results.
                    tracing::warn!(
                        run_id = self.run_id,
                        task = spec.name,
                        kind = failure.kind.as_str(),
                        error = %failure.message,
                        "task failed"
                    );
                    self.append_audit(
                        spec.name,
                        &format!(
                            "Task failed ({}): {}",
                            failure.kind.as_str(),
                            failure.message
                        ),
                    )
                    .await;
                }
            }
        }

        // Completion measures orchestration progress, not extraction
        // success: the run completes even if every task failed.
        let summary = format!("Completed: {} of {} tasks succeeded", succeeded, total);
        self.store
            .finish(self.run_id, RunStatus::Completed, &summary)
            .await?;

        Ok(summary)
    }

    /// Terminal path for orchestration faults: one summarizing audit entry,
    /// then the `failed` transition. Store errors here can only be logged.
    async fn record_fault(&self, fault: OrchestrationFault) {
        let message = fault.to_string();

        if let Err(e) = self.audit.append(self.run_id, SUPERVISOR_NODE, &message).await {
            tracing::warn!(run_id = self.run_id, error = %e, "failed to append fault audit entry");
        }

        if let Err(e) = self
            .store
            .finish(self.run_id, RunStatus::Failed, &format!("Failed: {}", message))
            .await
        {
            tracing::error!(run_id = self.run_id, error = %e, "failed to mark run as failed");
        }
    }

    /// Best-effort audit append: a persistence failure is reported on the
    /// operational channel and must not block extraction progress.
    async fn append_audit(&self, node_name: &str, message: &str) {
        if let Err(e) = self.audit.append(self.run_id, node_name, message).await {
            tracing::warn!(
                run_id = self.run_id,
                node = node_name,
                error = %e,
                "audit append failed, continuing run"
            );
        }
    }
}
