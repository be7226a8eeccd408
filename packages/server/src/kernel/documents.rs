//! Filesystem-backed document store.
//!
//! Documents live as files under a configured directory; resolving a filename
//! checks that the file exists and is a regular file. The handle's location is
//! the absolute-ish path the retrieval backend indexes from.

use async_trait::async_trait;
use std::path::PathBuf;

use super::traits::{DocumentError, DocumentHandle, DocumentStore};

pub struct FsDocumentStore {
    root: PathBuf,
}

impl FsDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl DocumentStore for FsDocumentStore {
    async fn resolve(&self, filename: &str) -> Result<DocumentHandle, DocumentError> {
        // Submitted names must be plain filenames, not paths.
        if filename.is_empty() || filename.contains('/') || filename.contains("..") {
            return Err(DocumentError::NotFound(filename.to_string()));
        }

        let path = self.root.join(filename);
        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|_| DocumentError::NotFound(filename.to_string()))?;

        if !metadata.is_file() {
            return Err(DocumentError::Unreadable(format!(
                "{} is not a regular file",
                filename
            )));
        }

        Ok(DocumentHandle {
            filename: filename.to_string(),
            location: path.display().to_string(),
        })
    }
}
