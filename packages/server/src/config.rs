use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub openai_api_key: String,
    /// Directory containing the source documents runs are submitted against.
    pub documents_dir: String,
    /// Time budget for a single task's backend call.
    pub task_timeout: Duration,
    /// How many extra parse attempts a task gets before it is declared failed.
    pub task_retry_limit: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            openai_api_key: env::var("OPENAI_API_KEY")
                .context("OPENAI_API_KEY must be set")?,
            documents_dir: env::var("DOCUMENTS_DIR")
                .unwrap_or_else(|_| "documents".to_string()),
            task_timeout: Duration::from_secs(
                env::var("TASK_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "60".to_string())
                    .parse()
                    .context("TASK_TIMEOUT_SECS must be a valid number")?,
            ),
            task_retry_limit: env::var("TASK_RETRY_LIMIT")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .context("TASK_RETRY_LIMIT must be a valid number")?,
        })
    }
}
