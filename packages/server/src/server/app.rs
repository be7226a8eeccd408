//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::kernel::runs::{
    default_catalog, ExecutorConfig, PostgresAuditLog, PostgresRunStore, RunRegistry, StatusReader,
};
use crate::kernel::{FsDocumentStore, LlmRetrievalBackend, OpenAIClient, ServerDeps};
use crate::server::routes::{health_handler, run_results, run_status, submit_extraction};

/// Build the Axum application router.
///
/// Wires the durable store, audit log, document store, and retrieval backend
/// into one `RunRegistry`, and returns the registry alongside the router so
/// `main` can signal shutdown to it.
pub fn build_app(pool: PgPool, config: &Config) -> (Router, Arc<RunRegistry>) {
    let store = Arc::new(PostgresRunStore::new(pool.clone()));
    let audit = Arc::new(PostgresAuditLog::new(pool.clone()));
    let documents = Arc::new(FsDocumentStore::new(&config.documents_dir));

    let ai = Arc::new(OpenAIClient::new(&config.openai_api_key));
    let backend = Arc::new(LlmRetrievalBackend::new(ai));

    let executor_config = ExecutorConfig {
        task_timeout: config.task_timeout,
        parse_retry_limit: config.task_retry_limit,
    };

    let registry = Arc::new(RunRegistry::new(
        store.clone(),
        audit.clone(),
        documents,
        backend,
        default_catalog(),
        executor_config,
    ));

    let status_reader = Arc::new(StatusReader::new(store, audit));

    let deps = ServerDeps::new(pool, registry.clone(), status_reader);

    // CORS for the polling frontend
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    let app = Router::new()
        .route("/api/v1/extract", post(submit_extraction))
        .route("/api/v1/runs/:id/status", get(run_status))
        .route("/api/v1/runs/:id/results", get(run_results))
        .route("/health", get(health_handler))
        .layer(Extension(deps))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    (app, registry)
}
