//! Kernel module - server infrastructure and dependencies.

pub mod ai;
pub mod deps;
pub mod documents;
pub mod retrieval;
pub mod runs;
pub mod traits;

pub use ai::{OpenAIClient, EXTRACTION_MODEL};
pub use deps::ServerDeps;
pub use documents::FsDocumentStore;
pub use retrieval::LlmRetrievalBackend;
pub use traits::*;
