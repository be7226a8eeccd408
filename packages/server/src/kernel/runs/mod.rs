//! The extraction-run orchestrator.
//!
//! A submission creates a `Run` that a dedicated `RunSupervisor` drives
//! through the fixed task catalog on its own tokio task. The `TaskExecutor`
//! isolates per-task faults behind a tagged outcome, the `AuditLog` keeps the
//! ordered trail of what happened, and the `StatusReader` serves the polling
//! contract without write access.

pub mod audit;
pub mod catalog;
pub mod error;
pub mod executor;
pub mod registry;
pub mod run;
pub mod status;
pub mod store;
pub mod supervisor;
pub mod testing;

pub use audit::{AuditLog, PostgresAuditLog, TraceLogEntry};
pub use catalog::{default_catalog, TaskKind, TaskSpec};
pub use error::{
    LookupError, OrchestrationFault, StoreError, SubmitError, TaskFailure, TaskFailureKind,
};
pub use executor::{ExecutorConfig, TaskExecutor, TaskOutcome};
pub use registry::RunRegistry;
pub use run::{RunSnapshot, RunStatus};
pub use status::{RunResultsView, RunStatusView, StatusReader};
pub use store::{PostgresRunStore, RunStore};
