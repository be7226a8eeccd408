//! End-to-end orchestration tests driving the real registry, supervisor, and
//! executor over in-memory doubles.

use std::sync::Arc;
use std::time::Duration;

use server_core::kernel::runs::testing::{
    InMemoryAuditLog, InMemoryRunStore, MockBackend, MockResponse, StaticDocuments,
};
use server_core::kernel::runs::{
    default_catalog, AuditLog, ExecutorConfig, RunRegistry, RunSnapshot, RunStatus, StatusReader,
    SubmitError, TaskSpec,
};

const REPORT: &str = "annual_report_2024.pdf";

struct Harness {
    registry: Arc<RunRegistry>,
    audit: Arc<InMemoryAuditLog>,
    backend: Arc<MockBackend>,
    documents: Arc<StaticDocuments>,
    reader: StatusReader,
}

fn harness(catalog: Vec<TaskSpec>) -> Harness {
    let store = Arc::new(InMemoryRunStore::new());
    let audit = Arc::new(InMemoryAuditLog::new());
    let backend = Arc::new(MockBackend::new());
    let documents = Arc::new(StaticDocuments::with(&[REPORT]));

    let config = ExecutorConfig {
        task_timeout: Duration::from_millis(100),
        parse_retry_limit: 1,
    };

    let registry = Arc::new(RunRegistry::new(
        store.clone(),
        audit.clone(),
        documents.clone(),
        backend.clone(),
        catalog,
        config,
    ));

    let reader = StatusReader::new(store, audit.clone());

    Harness {
        registry,
        audit,
        backend,
        documents,
        reader,
    }
}

/// First three catalog entries: Revenue, Net Income, EPS.
fn three_task_catalog() -> Vec<TaskSpec> {
    default_catalog().into_iter().take(3).collect()
}

fn revenue_answer() -> MockResponse {
    MockResponse::Answer(r#"{"value": 29.08, "unit": "USD Billion", "source_page": 96}"#.into())
}

fn eps_answer() -> MockResponse {
    MockResponse::Answer(r#"{"value": 115.19, "source_page": 242}"#.into())
}

async fn wait_terminal(registry: &RunRegistry, run_id: i64) -> RunSnapshot {
    for _ in 0..300 {
        let snapshot = registry.get(run_id).await.expect("run must exist");
        if snapshot.status.is_terminal() {
            return snapshot;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("run {} did not reach a terminal state", run_id);
}

#[tokio::test]
async fn submission_returns_immediately_and_run_completes() {
    let h = harness(three_task_catalog());
    let catalog = three_task_catalog();
    for spec in &catalog {
        h.backend.script(spec.name, revenue_answer());
    }
    // EPS schema has no unit requirement; revenue-shaped answers parse for
    // revenue and net income, and EPS tolerates the extra field.
    h.backend.script(catalog[2].name, eps_answer());

    let run_id = h.registry.submit(REPORT).await.expect("submit must succeed");

    let snapshot = wait_terminal(&h.registry, run_id).await;
    assert_eq!(snapshot.status, RunStatus::Completed);
    assert_eq!(snapshot.filename, REPORT);
    assert!(snapshot.start_time.is_some());
    assert!(snapshot.end_time.is_some());
}

#[tokio::test]
async fn one_failing_task_does_not_abort_the_run() {
    let catalog = three_task_catalog();
    let h = harness(catalog.clone());

    h.backend.script(catalog[0].name, revenue_answer());
    h.backend
        .script(catalog[1].name, MockResponse::Fail("index unavailable".into()));
    h.backend.script(catalog[2].name, eps_answer());

    let run_id = h.registry.submit(REPORT).await.unwrap();
    let snapshot = wait_terminal(&h.registry, run_id).await;

    assert_eq!(snapshot.status, RunStatus::Completed);
    // N tasks, one forced failure: exactly N-1 result keys.
    assert_eq!(snapshot.results.len(), 2);
    assert!(snapshot.results.contains_key(catalog[0].name));
    assert!(!snapshot.results.contains_key(catalog[1].name));
    assert!(snapshot.results.contains_key(catalog[2].name));

    // One audit entry per task, including the failed one.
    let logs = h.audit.list(run_id).await.unwrap();
    assert_eq!(logs.len(), 3);
}

#[tokio::test]
async fn timeout_scenario_revenue_netincome_eps() {
    let catalog = three_task_catalog();
    let h = harness(catalog.clone());

    h.backend.script(catalog[0].name, revenue_answer());
    // Net income hangs past the 100ms budget.
    h.backend.script(
        catalog[1].name,
        MockResponse::Hang(Duration::from_secs(5), "{}".into()),
    );
    h.backend.script(catalog[2].name, eps_answer());

    let run_id = h.registry.submit(REPORT).await.unwrap();
    let snapshot = wait_terminal(&h.registry, run_id).await;

    assert_eq!(snapshot.status, RunStatus::Completed);
    assert_eq!(snapshot.results.len(), 2);
    assert_eq!(
        snapshot.results[catalog[2].name]["unit"], "INR",
        "EPS unit defaults to INR"
    );

    let logs = h.audit.list(run_id).await.unwrap();
    assert_eq!(logs.len(), 3);
    // The net income entry records a timeout failure, not an exception trace.
    assert_eq!(logs[1].node_name, catalog[1].name);
    assert!(logs[1].message.contains("timeout"));
    assert!(logs[1].message.contains("time budget"));
}

#[tokio::test]
async fn audit_entries_follow_catalog_order_with_nondecreasing_timestamps() {
    let catalog = default_catalog();
    let h = harness(catalog.clone());
    // No scripted answers: every task fails with a backend error, which
    // still produces one ordered audit entry per task.
    let run_id = h.registry.submit(REPORT).await.unwrap();
    wait_terminal(&h.registry, run_id).await;

    let logs = h.audit.list(run_id).await.unwrap();
    assert_eq!(logs.len(), catalog.len());
    for (entry, spec) in logs.iter().zip(catalog.iter()) {
        assert_eq!(entry.node_name, spec.name);
    }
    for pair in logs.windows(2) {
        assert!(pair[0].timestamp <= pair[1].timestamp);
    }
}

#[tokio::test]
async fn all_tasks_failing_still_completes_the_run() {
    let catalog = default_catalog();
    let h = harness(catalog.clone());

    let run_id = h.registry.submit(REPORT).await.unwrap();
    let snapshot = wait_terminal(&h.registry, run_id).await;

    // Completeness measures orchestration progress, not extraction success.
    assert_eq!(snapshot.status, RunStatus::Completed);
    assert!(snapshot.results.is_empty());
    assert!(snapshot.current_task.contains("0 of 6"));
}

#[tokio::test]
async fn unknown_document_is_rejected_synchronously() {
    let h = harness(three_task_catalog());

    let err = h.registry.submit("no_such_report.pdf").await.unwrap_err();
    assert!(matches!(err, SubmitError::UnknownDocument(_)));

    // No run id was issued; polling an arbitrary id reports not-found.
    let status = h.reader.status(999).await;
    assert!(status.is_err());
    let results = h.reader.results(999).await;
    assert!(results.is_err());
}

#[tokio::test]
async fn corrupt_document_faults_the_run_before_any_task() {
    let h = harness(three_task_catalog());
    h.documents.add_corrupt("corrupt_report.pdf");

    // A known-but-unloadable document is accepted at submission.
    let run_id = h.registry.submit("corrupt_report.pdf").await.unwrap();
    let snapshot = wait_terminal(&h.registry, run_id).await;

    assert_eq!(snapshot.status, RunStatus::Failed);
    assert!(snapshot.results.is_empty());
    assert!(snapshot.end_time.is_some());

    let logs = h.audit.list(run_id).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].node_name, "Supervisor");
    assert!(logs[0].message.contains("could not be loaded"));
}

#[tokio::test]
async fn concurrent_runs_stay_independent() {
    let catalog = three_task_catalog();
    let h = harness(catalog.clone());
    h.documents.add("other_report.pdf");

    for spec in &catalog {
        h.backend.script(spec.name, revenue_answer());
    }
    h.backend.script(catalog[2].name, eps_answer());

    let first = h.registry.submit(REPORT).await.unwrap();
    let second = h.registry.submit("other_report.pdf").await.unwrap();
    assert_ne!(first, second);

    let first_snap = wait_terminal(&h.registry, first).await;
    let second_snap = wait_terminal(&h.registry, second).await;

    assert_eq!(first_snap.filename, REPORT);
    assert_eq!(second_snap.filename, "other_report.pdf");
    assert_eq!(first_snap.status, RunStatus::Completed);
    assert_eq!(second_snap.status, RunStatus::Completed);

    // Audit trails do not leak across runs.
    let first_logs = h.audit.list(first).await.unwrap();
    let second_logs = h.audit.list(second).await.unwrap();
    assert_eq!(first_logs.len(), catalog.len());
    assert_eq!(second_logs.len(), catalog.len());
    assert!(first_logs.iter().all(|e| e.run_id == first));
    assert!(second_logs.iter().all(|e| e.run_id == second));
}

#[tokio::test]
async fn polling_observes_monotonic_status_and_stable_terminal_state() {
    let catalog = three_task_catalog();
    let h = harness(catalog.clone());

    // Short hangs keep the run observable in_progress for a few polls.
    for spec in &catalog {
        h.backend.script(
            spec.name,
            MockResponse::Hang(
                Duration::from_millis(30),
                r#"{"value": 1.0, "unit": "USD Billion"}"#.into(),
            ),
        );
    }

    let run_id = h.registry.submit(REPORT).await.unwrap();

    let mut observed = Vec::new();
    loop {
        let view = h.reader.status(run_id).await.unwrap();
        observed.push(view.status);
        if view.status.is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    for pair in observed.windows(2) {
        assert!(pair[0] <= pair[1], "status must never move backwards");
    }

    // Terminal state is idempotent across repeated polls.
    let first = h.reader.status(run_id).await.unwrap();
    let second = h.reader.status(run_id).await.unwrap();
    assert_eq!(first.status, second.status);
    assert_eq!(first.current_task, second.current_task);
    assert_eq!(first.end_time, second.end_time);
}

#[tokio::test]
async fn results_endpoint_serves_partial_snapshots_mid_run() {
    let catalog = three_task_catalog();
    let h = harness(catalog.clone());

    h.backend.script(
        catalog[0].name,
        MockResponse::Hang(
            Duration::from_millis(20),
            r#"{"value": 29.08, "unit": "USD Billion"}"#.into(),
        ),
    );
    h.backend.script(
        catalog[1].name,
        MockResponse::Hang(Duration::from_millis(60), r#"not json"#.into()),
    );
    h.backend.script(catalog[2].name, eps_answer());

    let run_id = h.registry.submit(REPORT).await.unwrap();

    // Mid-run reads are well-formed whatever the run state is.
    let mid = h.reader.results(run_id).await.unwrap();
    assert_eq!(mid.filename, REPORT);
    assert!(mid.results.len() <= catalog.len());

    wait_terminal(&h.registry, run_id).await;
    let done = h.reader.results(run_id).await.unwrap();
    assert_eq!(done.status, RunStatus::Completed);
    assert!(done.results.contains_key(catalog[0].name));
    assert!(!done.results.contains_key(catalog[1].name));
}

#[tokio::test]
async fn audit_outage_does_not_block_the_run() {
    let catalog = three_task_catalog();
    let h = harness(catalog.clone());
    h.audit.set_unavailable(true);

    for spec in &catalog {
        h.backend.script(spec.name, revenue_answer());
    }
    h.backend.script(catalog[2].name, eps_answer());

    let run_id = h.registry.submit(REPORT).await.unwrap();
    let snapshot = wait_terminal(&h.registry, run_id).await;

    // The run progressed and completed; the trail is simply missing entries.
    assert_eq!(snapshot.status, RunStatus::Completed);
    assert_eq!(snapshot.results.len(), 3);

    h.audit.set_unavailable(false);
    let logs = h.audit.list(run_id).await.unwrap();
    assert!(logs.is_empty());
}

#[tokio::test]
async fn shutdown_mid_run_finishes_in_flight_task_and_starts_no_more() {
    let catalog = three_task_catalog();
    let h = harness(catalog.clone());

    // Task 1 is slow enough to still be in flight when shutdown lands, but
    // well inside the 100ms budget.
    h.backend.script(
        catalog[0].name,
        MockResponse::Hang(
            Duration::from_millis(80),
            r#"{"value": 29.08, "unit": "USD Billion"}"#.into(),
        ),
    );
    h.backend.script(catalog[1].name, revenue_answer());
    h.backend.script(catalog[2].name, eps_answer());

    let run_id = h.registry.submit(REPORT).await.unwrap();

    // Wait until the supervisor has committed task 1 as in flight, then
    // signal shutdown while it hangs.
    for _ in 0..100 {
        let view = h.reader.status(run_id).await.unwrap();
        if view.current_task.contains(catalog[0].name) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    h.registry.request_shutdown();

    let snapshot = wait_terminal(&h.registry, run_id).await;

    // The in-flight task ran to completion; tasks 2 and 3 never started.
    assert_eq!(snapshot.status, RunStatus::Completed);
    assert_eq!(snapshot.results.len(), 1);
    assert!(snapshot.results.contains_key(catalog[0].name));
    assert!(snapshot.current_task.contains("1 of 3"));
    assert!(snapshot.end_time.is_some());

    let logs = h.audit.list(run_id).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].node_name, catalog[0].name);
    assert_eq!(h.backend.calls(catalog[1].name), 0);
    assert_eq!(h.backend.calls(catalog[2].name), 0);
}

#[tokio::test]
async fn shutdown_rejects_new_submissions() {
    let h = harness(three_task_catalog());

    h.registry.request_shutdown();
    assert!(h.registry.is_shutdown_requested());

    let err = h.registry.submit(REPORT).await.unwrap_err();
    assert!(matches!(err, SubmitError::ShuttingDown));
}
