// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// The orchestrator consumes external collaborators (document resolution,
// retrieval) exclusively through these seams so tests can substitute them.

use async_trait::async_trait;
use thiserror::Error;

// =============================================================================
// Document collaborator
// =============================================================================

/// Handle to a resolved source document. Supports repeated reads, no mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentHandle {
    pub filename: String,
    /// Where the indexed content lives, in whatever terms the backend
    /// understands (a path for the filesystem store).
    pub location: String,
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("document not found: {0}")]
    NotFound(String),
    #[error("document could not be loaded: {0}")]
    Unreadable(String),
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Resolve a filename to a document handle.
    async fn resolve(&self, filename: &str) -> Result<DocumentHandle, DocumentError>;
}

// =============================================================================
// Retrieval backend
// =============================================================================

/// Which slice of the indexed document a query should search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryTarget {
    /// Narrative prose: risks, outlook, rates described in paragraphs.
    Text,
    /// Structured tables: the best target for specific financial figures.
    Table,
}

/// One formulated query against a document's indexed content.
#[derive(Debug, Clone)]
pub struct BackendQuery {
    /// Name of the task this query belongs to.
    pub task: String,
    /// The precise question to answer from the document.
    pub question: String,
    pub target: QueryTarget,
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("retrieval backend error: {0}")]
    Failed(String),
}

#[async_trait]
pub trait RetrievalBackend: Send + Sync {
    /// Answer a query against the document's indexed content, returning the
    /// raw answer text. Time budgets are enforced by the caller.
    async fn query(
        &self,
        document: &DocumentHandle,
        query: &BackendQuery,
    ) -> Result<String, BackendError>;
}
