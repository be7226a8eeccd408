//! Durable, ordered, append-only audit trail.
//!
//! Entries for a run are the sole ground truth for what happened during
//! execution. They are never updated, deleted, or reordered; `list` returns
//! them in append order.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgPool, Row};

use super::error::StoreError;

/// One immutable audit record.
#[derive(Debug, Clone, Serialize)]
pub struct TraceLogEntry {
    pub run_id: i64,
    pub timestamp: DateTime<Utc>,
    /// Which component emitted the entry: the task's name for task outcomes,
    /// "Supervisor" for orchestration-level entries.
    pub node_name: String,
    pub message: String,
}

#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Append one entry with a store-assigned timestamp. Never fails
    /// silently: an unavailable store surfaces as a `StoreError` the caller
    /// reports to the operational log.
    async fn append(&self, run_id: i64, node_name: &str, message: &str)
        -> Result<(), StoreError>;

    /// All entries for a run, in append order. Each call is independent; no
    /// cursor state is retained.
    async fn list(&self, run_id: i64) -> Result<Vec<TraceLogEntry>, StoreError>;
}

/// PostgreSQL-backed audit log.
pub struct PostgresAuditLog {
    pool: PgPool,
}

impl PostgresAuditLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditLog for PostgresAuditLog {
    async fn append(
        &self,
        run_id: i64,
        node_name: &str,
        message: &str,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO trace_logs (run_id, node_name, message)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(run_id)
        .bind(node_name)
        .bind(message)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list(&self, run_id: i64) -> Result<Vec<TraceLogEntry>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT run_id, timestamp, node_name, message
            FROM trace_logs
            WHERE run_id = $1
            ORDER BY id
            "#,
        )
        .bind(run_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| TraceLogEntry {
                run_id: row.get("run_id"),
                timestamp: row.get("timestamp"),
                node_name: row.get("node_name"),
                message: row.get("message"),
            })
            .collect())
    }
}
