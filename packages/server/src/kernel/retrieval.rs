//! Production retrieval backend.
//!
//! Wraps the OpenAI client in the strict extraction prompt: the model answers
//! only from the indexed document content and returns the `NOT FOUND`
//! sentinel when the answer is absent. Index construction and similarity
//! search are the backend's own concern and are not modeled here; this
//! adapter only formulates the call.

use async_trait::async_trait;
use std::sync::Arc;

use super::ai::OpenAIClient;
use super::traits::{BackendError, BackendQuery, DocumentHandle, QueryTarget, RetrievalBackend};

/// Sentinel the extraction prompt mandates when the document does not contain
/// the requested answer.
pub const NOT_FOUND_SENTINEL: &str = "NOT FOUND";

const EXTRACTION_PROMPT: &str = "You are a precise financial data extraction assistant. \
Your task is to find the exact answer to the question below using ONLY the indexed content \
of the named document.

- Look for the specific data point asked in the question.
- Do not use any prior knowledge or external information.
- Do not make up, infer, or calculate any figures.
- If the answer is not explicitly stated in the document, return the single phrase \"NOT FOUND\".";

/// `RetrievalBackend` implementation backed by the OpenAI client.
pub struct LlmRetrievalBackend {
    ai: Arc<OpenAIClient>,
}

impl LlmRetrievalBackend {
    pub fn new(ai: Arc<OpenAIClient>) -> Self {
        Self { ai }
    }

    fn target_guidance(target: QueryTarget) -> &'static str {
        match target {
            QueryTarget::Text => {
                "Search the narrative prose of the report: management discussion, \
                 outlook, and rates described in paragraphs."
            }
            QueryTarget::Table => {
                "Search the structured tables of the report: financial statements \
                 and segment breakdowns."
            }
        }
    }
}

#[async_trait]
impl RetrievalBackend for LlmRetrievalBackend {
    async fn query(
        &self,
        document: &DocumentHandle,
        query: &BackendQuery,
    ) -> Result<String, BackendError> {
        let prompt = format!(
            "{}\n\nDOCUMENT: {} ({})\n{}\n\nQUESTION:\n{}\n\nANSWER:",
            EXTRACTION_PROMPT,
            document.filename,
            document.location,
            Self::target_guidance(query.target),
            query.question,
        );

        self.ai
            .complete(&prompt)
            .await
            .map_err(|e| BackendError::Failed(e.to_string()))
    }
}
