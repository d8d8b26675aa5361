// tests/watcher_roots.rs

use std::time::Duration;

use guardian::errors::GuardianError;
use guardian::types::{EventKind, RootCategory, WatchRoot};
use guardian::watch::spawn_watcher;
use guardian_test_utils::{init_tracing, with_timeout};
use tempfile::TempDir;

#[tokio::test]
async fn missing_roots_are_skipped() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    std::fs::create_dir(dir.path().join("src")).unwrap();

    let roots = vec![
        WatchRoot::new(dir.path().join("src"), true, RootCategory::Code),
        WatchRoot::new(dir.path().join("docs"), true, RootCategory::Docs),
    ];
    let (watcher, _rx) = spawn_watcher(roots, Duration::ZERO).unwrap();

    assert_eq!(watcher.roots().len(), 1);
    assert_eq!(watcher.roots()[0].category, RootCategory::Code);
    with_timeout(watcher.stop()).await;
}

#[tokio::test]
async fn no_usable_root_is_an_error() {
    init_tracing();
    let dir = TempDir::new().unwrap();

    let roots = vec![WatchRoot::new(dir.path().join("gone"), true, RootCategory::Code)];
    let err = spawn_watcher(roots, Duration::ZERO).unwrap_err();
    assert!(matches!(err, GuardianError::NoWatchRoots));
}

#[tokio::test]
async fn file_write_reaches_the_channel_with_its_root() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("src");
    std::fs::create_dir(&src).unwrap();

    let roots = vec![WatchRoot::new(&src, true, RootCategory::Code)];
    let (watcher, mut rx) = spawn_watcher(roots, Duration::ZERO).unwrap();
    let canonical_src = watcher.roots()[0].path.clone();

    // Give the OS watcher a moment to attach before writing.
    tokio::time::sleep(Duration::from_millis(100)).await;
    std::fs::write(src.join("foo.py"), "x = 1\n").unwrap();

    let event = with_timeout(async {
        loop {
            let ev = rx.recv().await.expect("channel open while watching");
            if ev.path.ends_with("foo.py") {
                break ev;
            }
        }
    })
    .await;

    assert_eq!(event.root.path, canonical_src);
    assert!(matches!(event.kind, EventKind::Created | EventKind::Modified));
    assert!(!event.is_dir);

    with_timeout(watcher.stop()).await;
}
