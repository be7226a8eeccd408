//! Durable run storage.
//!
//! The trait is the seam between the orchestrator and the database; the
//! Postgres implementation is used in production and an in-memory one backs
//! the tests (see `testing`). Every mutation guards the status machine in its
//! WHERE clause so writes against a terminal run are no-ops, which is what
//! keeps terminal state idempotent under concurrent readers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{PgPool, Row};
use std::collections::BTreeMap;

use super::error::StoreError;
use super::run::{RunSnapshot, RunStatus};

#[async_trait]
pub trait RunStore: Send + Sync {
    /// Insert a new run in `queued` state and return its id. Ids are
    /// monotonically assigned.
    async fn create(&self, filename: &str) -> Result<i64, StoreError>;

    /// Point-in-time copy of the run's current state.
    async fn fetch(&self, run_id: i64) -> Result<Option<RunSnapshot>, StoreError>;

    /// queued -> in_progress, setting `start_time`. No-op if not queued.
    async fn mark_started(&self, run_id: i64) -> Result<(), StoreError>;

    /// Commit the live progress label. Must be durable before the task it
    /// describes begins executing.
    async fn set_current_task(&self, run_id: i64, label: &str) -> Result<(), StoreError>;

    /// Merge one successful task result under its task-name key. Results only
    /// grow while the run is in progress.
    async fn merge_result(&self, run_id: i64, task_name: &str, value: &Value)
        -> Result<(), StoreError>;

    /// Transition to a terminal status, setting `end_time` exactly once and
    /// replacing `current_task` with the terminal label. No-op if the run is
    /// already terminal.
    async fn finish(&self, run_id: i64, status: RunStatus, label: &str) -> Result<(), StoreError>;
}

/// PostgreSQL-backed run store.
pub struct PostgresRunStore {
    pool: PgPool,
}

impl PostgresRunStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RunStore for PostgresRunStore {
    async fn create(&self, filename: &str) -> Result<i64, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO extraction_runs (filename, status, current_task)
            VALUES ($1, 'queued', 'Queued')
            RETURNING id
            "#,
        )
        .bind(filename)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get::<i64, _>("id"))
    }

    async fn fetch(&self, run_id: i64) -> Result<Option<RunSnapshot>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, filename, status, current_task, start_time, end_time, results
            FROM extraction_runs
            WHERE id = $1
            "#,
        )
        .bind(run_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let status_str: String = row.get("status");
        let status = RunStatus::parse(&status_str)
            .ok_or_else(|| StoreError::Database(sqlx::Error::Decode(
                format!("unrecognized run status '{}'", status_str).into(),
            )))?;

        let results_json: Value = row.get("results");
        let results: BTreeMap<String, Value> = match results_json {
            Value::Object(map) => map.into_iter().collect(),
            _ => BTreeMap::new(),
        };

        Ok(Some(RunSnapshot {
            id: row.get("id"),
            filename: row.get("filename"),
            status,
            current_task: row.get("current_task"),
            start_time: row.get::<Option<DateTime<Utc>>, _>("start_time"),
            end_time: row.get::<Option<DateTime<Utc>>, _>("end_time"),
            results,
        }))
    }

    async fn mark_started(&self, run_id: i64) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE extraction_runs
            SET status = 'in_progress', start_time = NOW()
            WHERE id = $1 AND status = 'queued'
            "#,
        )
        .bind(run_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn set_current_task(&self, run_id: i64, label: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE extraction_runs
            SET current_task = $2
            WHERE id = $1 AND status = 'in_progress'
            "#,
        )
        .bind(run_id)
        .bind(label)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn merge_result(
        &self,
        run_id: i64,
        task_name: &str,
        value: &Value,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE extraction_runs
            SET results = results || jsonb_build_object($2::text, $3::jsonb)
            WHERE id = $1 AND status = 'in_progress'
            "#,
        )
        .bind(run_id)
        .bind(task_name)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn finish(&self, run_id: i64, status: RunStatus, label: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE extraction_runs
            SET status = $2, current_task = $3, end_time = NOW()
            WHERE id = $1 AND status = 'in_progress'
            "#,
        )
        .bind(run_id)
        .bind(status.as_str())
        .bind(label)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
