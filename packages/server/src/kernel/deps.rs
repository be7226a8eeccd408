//! Server dependencies shared across request handlers.
//!
//! The container is built once in `build_app` and attached to the router as
//! an axum `Extension`. Handlers only ever see the registry and the
//! read-only status reader; the pool is exposed for the health check.

use sqlx::PgPool;
use std::sync::Arc;

use super::runs::{RunRegistry, StatusReader};

#[derive(Clone)]
pub struct ServerDeps {
    pub db_pool: PgPool,
    pub registry: Arc<RunRegistry>,
    pub status_reader: Arc<StatusReader>,
}

impl ServerDeps {
    pub fn new(db_pool: PgPool, registry: Arc<RunRegistry>, status_reader: Arc<StatusReader>) -> Self {
        Self {
            db_pool,
            registry,
            status_reader,
        }
    }
}
