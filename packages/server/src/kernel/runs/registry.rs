//! Run registry: the single authoritative handle by which runs are created
//! and looked up.
//!
//! One registry instance exists per process and is injected into the API
//! layer. `submit` validates the document, writes the queued run, and spawns
//! the supervisor on its own tokio task - one independent unit of concurrency
//! per active run, never shared. The call returns the run id immediately.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::audit::AuditLog;
use super::catalog::TaskSpec;
use super::error::{LookupError, SubmitError};
use super::executor::{ExecutorConfig, TaskExecutor};
use super::run::RunSnapshot;
use super::store::RunStore;
use super::supervisor::RunSupervisor;
use crate::kernel::traits::{DocumentError, DocumentStore, RetrievalBackend};

pub struct RunRegistry {
    store: Arc<dyn RunStore>,
    audit: Arc<dyn AuditLog>,
    documents: Arc<dyn DocumentStore>,
    backend: Arc<dyn RetrievalBackend>,
    catalog: Arc<Vec<TaskSpec>>,
    config: ExecutorConfig,
    shutdown: Arc<AtomicBool>,
}

impl RunRegistry {
    pub fn new(
        store: Arc<dyn RunStore>,
        audit: Arc<dyn AuditLog>,
        documents: Arc<dyn DocumentStore>,
        backend: Arc<dyn RetrievalBackend>,
        catalog: Vec<TaskSpec>,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            store,
            audit,
            documents,
            backend,
            catalog: Arc::new(catalog),
            config,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create a run for the document and schedule its supervisor. Returns the
    /// new run id without waiting for execution.
    ///
    /// Only an unknown filename is rejected here; a document that resolves
    /// but cannot be loaded surfaces later as an orchestration fault on the
    /// run itself.
    pub async fn submit(&self, filename: &str) -> Result<i64, SubmitError> {
        if self.shutdown.load(Ordering::SeqCst) {
            return Err(SubmitError::ShuttingDown);
        }

        match self.documents.resolve(filename).await {
            Ok(_) | Err(DocumentError::Unreadable(_)) => {}
            Err(DocumentError::NotFound(_)) => {
                return Err(SubmitError::UnknownDocument(filename.to_string()));
            }
        }

        let run_id = self.store.create(filename).await?;

        let supervisor = RunSupervisor::new(
            run_id,
            filename.to_string(),
            Arc::clone(&self.store),
            Arc::clone(&self.audit),
            Arc::clone(&self.documents),
            TaskExecutor::new(Arc::clone(&self.backend), self.config.clone()),
            Arc::clone(&self.catalog),
            Arc::clone(&self.shutdown),
        );

        // One supervisor per run id, for the id's entire lifetime.
        tokio::spawn(supervisor.run());

        tracing::info!(run_id, filename, "run submitted");
        Ok(run_id)
    }

    /// Immutable point-in-time copy of the run's current state.
    pub async fn get(&self, run_id: i64) -> Result<RunSnapshot, LookupError> {
        self.store
            .fetch(run_id)
            .await?
            .ok_or(LookupError::NotFound(run_id))
    }

    /// Signal shutdown: no new runs are accepted and supervisors stop
    /// starting further tasks. In-flight tasks are not aborted.
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }
}
