// tests/runtime_fake_executor.rs

mod common;

use common::{code_event, core_with, docs_event, init_tracing, manifest_event, manifest_with, with_timeout, MANIFEST};
use guardian::deps::DiffStatus;
use guardian::engine::Runtime;
use guardian::fs::mock::MockFileSystem;
use guardian::types::RawEvent;
use guardian_test_utils::capture::CaptureBuffer;
use guardian_test_utils::fake_executor::{FakeExecutor, Script};
use tokio::sync::{mpsc, oneshot};

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

/// Queue `events`, close the channel and run the loop to completion.
async fn run_events(
    fs: &MockFileSystem,
    executor: FakeExecutor,
    events: Vec<RawEvent>,
) -> (guardian::engine::OrchestratorStats, String) {
    let (tx, rx) = mpsc::unbounded_channel();
    for ev in events {
        tx.send(ev).unwrap();
    }
    drop(tx);

    let capture = CaptureBuffer::new();
    let mut runtime = Runtime::new(core_with(fs), rx, executor, capture.reporter());
    let stats = with_timeout(runtime.run()).await;
    (stats, capture.contents())
}

#[tokio::test]
async fn source_change_runs_lint_format_test_in_order() {
    init_tracing();

    let executor = FakeExecutor::new().script("test", Script::Exit(5));
    let calls = executor.calls();

    let (stats, report) = run_events(
        &MockFileSystem::new(),
        executor,
        vec![code_event("/proj/src/foo.py")],
    )
    .await;

    assert_eq!(
        *calls.lock().unwrap(),
        vec![
            argv(&["ruff", "check", "--fix", "."]),
            argv(&["black", "."]),
            argv(&["pytest"]),
        ]
    );
    assert_eq!(stats.commands_run, 3);
    assert_eq!(stats.commands_failed, 0, "pytest exit 5 is benign");
    assert!(report.contains("Source file changed: src/foo.py"));
    assert!(report.contains("--- Running: `pytest` ---"));
}

#[tokio::test]
async fn failing_lint_does_not_stop_the_pipeline() {
    init_tracing();

    let executor = FakeExecutor::new().script(
        "lint",
        Script::ExitWithOutput {
            code: 1,
            stdout: "src/foo.py:1:1: F401 unused import\n".to_string(),
            stderr: String::new(),
        },
    );
    let calls = executor.calls();

    let (stats, report) = run_events(
        &MockFileSystem::new(),
        executor,
        vec![code_event("/proj/src/foo.py")],
    )
    .await;

    assert_eq!(calls.lock().unwrap().len(), 3);
    assert_eq!(stats.commands_failed, 1);
    assert!(report.contains("F401 unused import"));
}

#[tokio::test]
async fn missing_program_is_reported_and_pipeline_continues() {
    init_tracing();

    let executor = FakeExecutor::new().missing_program("black");
    let calls = executor.calls();

    let (stats, report) = run_events(
        &MockFileSystem::new(),
        executor,
        vec![code_event("/proj/src/foo.py")],
    )
    .await;

    assert_eq!(calls.lock().unwrap().last(), Some(&argv(&["pytest"])));
    assert_eq!(stats.commands_run, 3);
    assert_eq!(stats.commands_failed, 1);
    assert!(report.contains("command not found: black"));
}

#[tokio::test]
async fn events_are_dispatched_in_arrival_order_without_drops() {
    init_tracing();

    let executor = FakeExecutor::new();
    let calls = executor.calls();

    let (stats, report) = run_events(
        &MockFileSystem::new(),
        executor,
        vec![
            code_event("/proj/src/a.py"),
            docs_event("/proj/docs/index.md"),
            code_event("/proj/src/b.py"),
        ],
    )
    .await;

    assert_eq!(stats.events_seen, 3);
    assert_eq!(stats.events_dispatched, 3);
    assert_eq!(calls.lock().unwrap().len(), 3 + 1 + 3);
    assert_eq!(calls.lock().unwrap()[3], argv(&["mkdocs", "build"]));

    let a = report.find("src/a.py").unwrap();
    let docs = report.find("docs/index.md").unwrap();
    let b = report.find("src/b.py").unwrap();
    assert!(a < docs && docs < b);
}

#[tokio::test]
async fn ignored_events_run_nothing() {
    init_tracing();

    let executor = FakeExecutor::new();
    let calls = executor.calls();

    let (stats, report) = run_events(
        &MockFileSystem::new(),
        executor,
        vec![
            code_event("/proj/src/README.txt"),
            code_event("/proj/src/__pycache__/foo.cpython-312.pyc"),
            code_event("/proj/src/pkg").directory(),
        ],
    )
    .await;

    assert!(calls.lock().unwrap().is_empty());
    assert_eq!(stats.events_ignored, 3);
    assert!(report.is_empty());
}

#[tokio::test]
async fn manifest_change_runs_one_command_per_new_dependency() {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_file(MANIFEST, manifest_with(&["a", "b"]));

    let executor = FakeExecutor::new();
    let calls = executor.calls();

    // Edit lands before the loop starts reading.
    let (tx, rx) = mpsc::unbounded_channel();
    let capture = CaptureBuffer::new();
    let mut runtime = Runtime::new(core_with(&fs), rx, executor, capture.reporter());
    fs.add_file(MANIFEST, manifest_with(&["a", "b", "c", "d>=1.0"]));
    tx.send(manifest_event()).unwrap();
    drop(tx);

    let stats = with_timeout(runtime.run()).await;

    assert_eq!(
        *calls.lock().unwrap(),
        vec![
            argv(&["python", "scripts/generate_api_docs.py", "c"]),
            argv(&["python", "scripts/generate_api_docs.py", "d"]),
        ]
    );
    assert_eq!(stats.commands_run, 2);
    let report = capture.contents();
    assert!(report.contains("Dependencies file changed: pyproject.toml"));
    assert!(report.contains("New dependencies detected: c, d"));
}

#[tokio::test]
async fn failing_dependency_command_does_not_block_the_others() {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_file(MANIFEST, manifest_with(&[]));
    let executor = FakeExecutor::new().script("generate-api-docs", Script::Exit(2));
    let calls = executor.calls();

    let (tx, rx) = mpsc::unbounded_channel();
    let mut runtime = Runtime::new(core_with(&fs), rx, executor, CaptureBuffer::new().reporter());
    fs.add_file(MANIFEST, manifest_with(&["x", "y"]));
    tx.send(manifest_event()).unwrap();
    drop(tx);

    let stats = with_timeout(runtime.run()).await;
    assert_eq!(calls.lock().unwrap().len(), 2);
    assert_eq!(stats.commands_failed, 2);
}

#[tokio::test]
async fn malformed_manifest_runs_nothing_and_keeps_snapshot() {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_file(MANIFEST, manifest_with(&["a"]));
    let executor = FakeExecutor::new();
    let calls = executor.calls();

    let (tx, rx) = mpsc::unbounded_channel();
    let capture = CaptureBuffer::new();
    let mut runtime = Runtime::new(core_with(&fs), rx, executor, capture.reporter());

    fs.add_file(MANIFEST, "[project.optional-dependencies\ndev = [\"a\", \"b\"");
    tx.send(manifest_event()).unwrap();
    drop(tx);

    let stats = with_timeout(runtime.run()).await;
    assert!(calls.lock().unwrap().is_empty());
    assert_eq!(stats.events_dispatched, 1);
    assert!(capture.contents().contains("Could not read dependencies file"));
}

#[tokio::test]
async fn truncate_then_rewrite_save_runs_no_dependency_commands() {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_file(MANIFEST, manifest_with(&["ruff", "black"]));
    let mut core = core_with(&fs);

    // An editor's save: the file is truncated, then the same content lands.
    fs.add_file(MANIFEST, "");
    let truncated = core.step(&manifest_event());
    assert!(truncated.commands.is_empty());
    assert!(matches!(
        truncated.dependency_diff.as_ref().map(|d| &d.status),
        Some(DiffStatus::RetainedPrevious(_))
    ));

    fs.add_file(MANIFEST, manifest_with(&["ruff", "black"]));
    let (tx, rx) = mpsc::unbounded_channel();
    tx.send(manifest_event()).unwrap();
    drop(tx);

    let executor = FakeExecutor::new();
    let calls = executor.calls();
    let capture = CaptureBuffer::new();
    let mut runtime = Runtime::new(core, rx, executor, capture.reporter());
    let stats = with_timeout(runtime.run()).await;

    assert!(calls.lock().unwrap().is_empty());
    assert_eq!(stats.commands_run, 0);
    assert!(capture.contents().contains("No new dependencies detected."));
}

#[tokio::test]
async fn unchanged_manifest_reports_no_new_dependencies() {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_file(MANIFEST, manifest_with(&["a"]));

    let executor = FakeExecutor::new();
    let calls = executor.calls();
    let (stats, report) = run_events(&fs, executor, vec![manifest_event(), manifest_event()]).await;

    assert!(calls.lock().unwrap().is_empty());
    assert_eq!(stats.events_dispatched, 2);
    assert_eq!(report.matches("No new dependencies detected.").count(), 2);
}

#[tokio::test]
async fn shutdown_finishes_current_dispatch_and_discards_the_rest() {
    init_tracing();

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let mut shutdown_tx = Some(shutdown_tx);

    // Request shutdown while the first event's pipeline is running.
    let executor = FakeExecutor::new().on_run(move |_| {
        if let Some(tx) = shutdown_tx.take() {
            let _ = tx.send(());
        }
    });
    let calls = executor.calls();

    let (tx, rx) = mpsc::unbounded_channel();
    tx.send(code_event("/proj/src/a.py")).unwrap();
    tx.send(code_event("/proj/src/b.py")).unwrap();
    tx.send(docs_event("/proj/docs/c.md")).unwrap();

    let mut runtime = Runtime::new(
        core_with(&MockFileSystem::new()),
        rx,
        executor,
        CaptureBuffer::new().reporter(),
    )
    .with_shutdown(shutdown_rx);

    let stats = with_timeout(runtime.run()).await;

    assert_eq!(calls.lock().unwrap().len(), 3, "whole first pipeline ran");
    assert_eq!(stats.events_seen, 1);
    assert_eq!(stats.events_discarded, 2);
    assert_eq!(runtime.state(), guardian::engine::OrchestratorState::Stopped);
    assert!(tx.send(code_event("/proj/src/late.py")).is_err(), "channel closed");
}

#[tokio::test]
async fn dropped_shutdown_sender_does_not_stop_the_loop() {
    init_tracing();

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    drop(shutdown_tx);

    let (tx, rx) = mpsc::unbounded_channel();
    tx.send(code_event("/proj/src/a.py")).unwrap();
    drop(tx);

    let executor = FakeExecutor::new();
    let calls = executor.calls();
    let mut runtime = Runtime::new(
        core_with(&MockFileSystem::new()),
        rx,
        executor,
        CaptureBuffer::new().reporter(),
    )
    .with_shutdown(shutdown_rx);

    let stats = with_timeout(runtime.run()).await;
    assert_eq!(stats.events_dispatched, 1);
    assert_eq!(calls.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn once_mode_runs_code_then_docs() {
    init_tracing();

    let executor = FakeExecutor::new().script("format", Script::Exit(1));
    let calls = executor.calls();
    let (_tx, rx) = mpsc::unbounded_channel();
    let capture = CaptureBuffer::new();
    let mut runtime = Runtime::new(
        core_with(&MockFileSystem::new()),
        rx,
        executor,
        capture.reporter(),
    );

    let stats = with_timeout(runtime.run_once()).await;

    assert_eq!(calls.lock().unwrap().len(), 4);
    assert_eq!(calls.lock().unwrap()[3], argv(&["mkdocs", "build"]));
    assert_eq!(stats.commands_failed, 1);
    assert!(capture.contents().contains("Running code pipeline (3 commands)"));
}
