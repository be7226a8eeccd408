// AI implementation using OpenAI
//
// This is the infrastructure LLM client behind the production retrieval
// backend. What to prompt for lives in kernel/retrieval.rs.

use anyhow::{Context, Result};
use rig::completion::Prompt;
use rig::providers::openai;

/// Default completion model for extraction queries.
pub const EXTRACTION_MODEL: &str = "gpt-4o";

/// Truncate for log fields without splitting a multibyte character.
fn preview(text: &str) -> String {
    text.chars().take(200).collect()
}

/// OpenAI-backed completion client
#[derive(Clone)]
pub struct OpenAIClient {
    client: openai::Client,
}

impl OpenAIClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            client: openai::Client::new(api_key),
        }
    }

    /// Complete a prompt and return the raw text response.
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        tracing::debug!(
            prompt_length = prompt.len(),
            model = EXTRACTION_MODEL,
            "Building OpenAI agent for completion"
        );

        let agent = self
            .client
            .agent(openai::GPT_4O)
            .preamble("You are a precise financial data extraction assistant.")
            .max_tokens(4096)
            .build();

        let response = agent
            .prompt(prompt)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    model = EXTRACTION_MODEL,
                    prompt_preview = %preview(prompt),
                    "OpenAI API call failed"
                );
                e
            })
            .context("Failed to call OpenAI API")?;

        tracing::debug!(
            response_length = response.len(),
            model = EXTRACTION_MODEL,
            "OpenAI API response received"
        );

        Ok(response)
    }
}
