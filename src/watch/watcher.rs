// src/watch/watcher.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use notify::event::ModifyKind;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::{GuardianError, Result};
use crate::types::{EventKind, RawEvent, WatchRoot};

/// Handle for the filesystem watcher.
///
/// Keeps the underlying `RecommendedWatcher` alive. Dropping the handle stops
/// watching as well; [`WatcherHandle::stop`] additionally waits until every
/// event already received from the OS has been forwarded.
pub struct WatcherHandle {
    watcher: RecommendedWatcher,
    roots: Vec<WatchRoot>,
    bridge: JoinHandle<()>,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle")
            .field("roots", &self.roots)
            .finish_non_exhaustive()
    }
}

impl WatcherHandle {
    /// Roots that were successfully subscribed.
    pub fn roots(&self) -> &[WatchRoot] {
        &self.roots
    }

    /// Unsubscribe all roots and close the event channel.
    pub async fn stop(self) {
        let WatcherHandle {
            mut watcher,
            roots,
            bridge,
        } = self;

        for root in &roots {
            if let Err(err) = watcher.unwatch(&root.path) {
                // Removed roots are already gone from the OS watcher.
                debug!(root = ?root.path, error = %err, "unwatch failed");
            }
        }
        drop(watcher);

        if let Err(err) = bridge.await {
            warn!(error = %err, "watcher bridge task ended abnormally");
        }
        info!("file watcher stopped");
    }
}

/// Subscribe every root and return the single ordered channel all of them
/// feed.
///
/// - Roots that do not exist are skipped with a warning.
/// - If no root can be subscribed, this fails with `NoWatchRoots`.
/// - `debounce` of zero forwards every event; otherwise a burst of events with
///   the same path and kind is coalesced, and the newest one is forwarded once
///   the path has been quiet for the whole window.
///
/// The notify callback only pushes onto an unbounded channel so it never
/// blocks the OS notification thread.
pub fn spawn_watcher(
    roots: Vec<WatchRoot>,
    debounce: Duration,
) -> Result<(WatcherHandle, mpsc::UnboundedReceiver<RawEvent>)> {
    let (notify_tx, notify_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = notify_tx.send(event) {
                    // Bridge already gone; tracing may be torn down too.
                    eprintln!("guardian: failed to forward notify event: {err}");
                }
            }
            Err(err) => {
                eprintln!("guardian: file watch error: {err}");
            }
        },
        Config::default(),
    )?;

    let mut active = Vec::new();
    for root in roots {
        match subscribe(&mut watcher, &root) {
            Ok(canonical) => {
                info!(root = ?canonical.path, category = %canonical.category, recursive = canonical.recursive, "watching");
                active.push(canonical);
            }
            Err(err) => {
                warn!(root = ?root.path, error = %err, "skipping watch root");
            }
        }
    }

    if active.is_empty() {
        return Err(GuardianError::NoWatchRoots);
    }

    let (tx, rx) = mpsc::unbounded_channel::<RawEvent>();
    let bridge_roots = active.clone();

    let bridge = tokio::spawn(forward_events(notify_rx, tx, bridge_roots, debounce));

    Ok((
        WatcherHandle {
            watcher,
            roots: active,
            bridge,
        },
        rx,
    ))
}

/// Bridge loop: notify events in, classified-ready raw events out.
///
/// Events still waiting out their debounce window are flushed when the
/// notify side closes, so the final state of a burst is never lost.
async fn forward_events(
    mut notify_rx: mpsc::UnboundedReceiver<Event>,
    tx: mpsc::UnboundedSender<RawEvent>,
    roots: Vec<WatchRoot>,
    debounce: Duration,
) {
    let mut debouncer = Debouncer::new(debounce);

    loop {
        let deadline = debouncer.next_deadline();
        let wake = tokio::time::Instant::from_std(deadline.unwrap_or_else(Instant::now));

        tokio::select! {
            received = notify_rx.recv() => match received {
                Some(event) => {
                    debug!(?event, "received notify event");
                    let now = Instant::now();
                    for raw in to_raw_events(&event, &roots) {
                        debouncer.push(raw, now);
                    }
                }
                None => break,
            },
            _ = tokio::time::sleep_until(wake), if deadline.is_some() => {}
        }

        for raw in debouncer.drain_due(Instant::now()) {
            if tx.send(raw).is_err() {
                debug!("event receiver dropped; watcher bridge exiting");
                return;
            }
        }
    }

    for raw in debouncer.drain_all() {
        if tx.send(raw).is_err() {
            break;
        }
    }
    debug!("watcher event loop finished");
}

fn subscribe(watcher: &mut RecommendedWatcher, root: &WatchRoot) -> Result<WatchRoot> {
    if !root.path.is_dir() {
        return Err(GuardianError::WatchRootUnavailable(root.path.clone()));
    }
    let path = root.path.canonicalize()?;
    let mode = if root.recursive {
        RecursiveMode::Recursive
    } else {
        RecursiveMode::NonRecursive
    };
    watcher.watch(&path, mode)?;
    Ok(WatchRoot::new(path, root.recursive, root.category))
}

/// Translate one notify event into zero or more raw events, one per path.
fn to_raw_events(event: &Event, roots: &[WatchRoot]) -> Vec<RawEvent> {
    let Some(kind) = map_kind(&event.kind) else {
        return Vec::new();
    };

    let mut out = Vec::with_capacity(event.paths.len());
    for path in &event.paths {
        if kind == EventKind::Deleted {
            if let Some(root) = roots.iter().find(|r| r.path == *path) {
                warn!(root = ?root.path, "watch root removed; no further events from it");
                continue;
            }
        }

        let Some(root) = find_root(path, roots) else {
            debug!(?path, "event outside every watch root");
            continue;
        };

        let is_dir = matches!(
            event.kind,
            notify::EventKind::Create(notify::event::CreateKind::Folder)
                | notify::EventKind::Remove(notify::event::RemoveKind::Folder)
        ) || path.is_dir();

        out.push(RawEvent {
            path: path.clone(),
            kind,
            root: root.clone(),
            is_dir,
        });
    }
    out
}

fn map_kind(kind: &notify::EventKind) -> Option<EventKind> {
    match kind {
        notify::EventKind::Create(_) => Some(EventKind::Created),
        notify::EventKind::Modify(ModifyKind::Name(_)) => Some(EventKind::Moved),
        notify::EventKind::Modify(ModifyKind::Metadata(_)) => None,
        notify::EventKind::Modify(_) => Some(EventKind::Modified),
        notify::EventKind::Remove(_) => Some(EventKind::Deleted),
        _ => None,
    }
}

/// The most specific root containing `path`.
fn find_root<'a>(path: &Path, roots: &'a [WatchRoot]) -> Option<&'a WatchRoot> {
    roots
        .iter()
        .filter(|r| r.contains(path))
        .max_by_key(|r| r.path.components().count())
}

/// Trailing-edge coalescing of repeated events for the same path and kind.
///
/// Each pushed event replaces the pending one for its key and pushes the
/// key's deadline out by `window`. Due events come out in first-seen order.
#[derive(Debug)]
struct Debouncer {
    window: Duration,
    pending: HashMap<(PathBuf, EventKind), Pending>,
    ready: Vec<RawEvent>,
    next_seq: u64,
}

#[derive(Debug)]
struct Pending {
    event: RawEvent,
    due: Instant,
    seq: u64,
}

impl Debouncer {
    fn new(window: Duration) -> Self {
        Self {
            window,
            pending: HashMap::new(),
            ready: Vec::new(),
            next_seq: 0,
        }
    }

    fn push(&mut self, event: RawEvent, now: Instant) {
        if self.window.is_zero() {
            self.ready.push(event);
            return;
        }

        let due = now + self.window;
        let key = (event.path.clone(), event.kind);
        match self.pending.get_mut(&key) {
            Some(pending) => {
                debug!(path = ?event.path, "coalesced repeated event");
                pending.event = event;
                pending.due = due;
            }
            None => {
                let seq = self.next_seq;
                self.next_seq += 1;
                self.pending.insert(key, Pending { event, due, seq });
            }
        }
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|p| p.due).min()
    }

    fn drain_due(&mut self, now: Instant) -> Vec<RawEvent> {
        let mut out = std::mem::take(&mut self.ready);
        let mut due: Vec<Pending> = Vec::new();
        self.pending.retain(|_, p| {
            if p.due <= now {
                due.push(Pending {
                    event: p.event.clone(),
                    due: p.due,
                    seq: p.seq,
                });
                false
            } else {
                true
            }
        });
        due.sort_by_key(|p| p.seq);
        out.extend(due.into_iter().map(|p| p.event));
        out
    }

    fn drain_all(&mut self) -> Vec<RawEvent> {
        let mut out = std::mem::take(&mut self.ready);
        let mut rest: Vec<Pending> = self.pending.drain().map(|(_, p)| p).collect();
        rest.sort_by_key(|p| p.seq);
        out.extend(rest.into_iter().map(|p| p.event));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RootCategory;
    use notify::event::{CreateKind, DataChange, MetadataKind, RemoveKind, RenameMode};

    fn roots() -> Vec<WatchRoot> {
        vec![
            WatchRoot::new("/proj", false, RootCategory::Manifest),
            WatchRoot::new("/proj/src", true, RootCategory::Code),
        ]
    }

    #[test]
    fn kinds_map_to_raw_kinds() {
        use notify::EventKind as K;
        assert_eq!(map_kind(&K::Create(CreateKind::File)), Some(EventKind::Created));
        assert_eq!(
            map_kind(&K::Modify(ModifyKind::Data(DataChange::Content))),
            Some(EventKind::Modified)
        );
        assert_eq!(
            map_kind(&K::Modify(ModifyKind::Name(RenameMode::To))),
            Some(EventKind::Moved)
        );
        assert_eq!(map_kind(&K::Modify(ModifyKind::Metadata(MetadataKind::Any))), None);
        assert_eq!(map_kind(&K::Remove(RemoveKind::File)), Some(EventKind::Deleted));
        assert_eq!(map_kind(&K::Access(notify::event::AccessKind::Any)), None);
    }

    #[test]
    fn most_specific_root_wins() {
        let roots = roots();
        let root = find_root(Path::new("/proj/src/a.py"), &roots).unwrap();
        assert_eq!(root.category, RootCategory::Code);

        let root = find_root(Path::new("/proj/pyproject.toml"), &roots).unwrap();
        assert_eq!(root.category, RootCategory::Manifest);

        assert!(find_root(Path::new("/proj/tests/test_a.py"), &roots).is_none());
    }

    #[test]
    fn one_raw_event_per_path() {
        let event = Event::new(notify::EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
            .add_path(PathBuf::from("/proj/src/old.py"))
            .add_path(PathBuf::from("/proj/src/new.py"));
        let raw = to_raw_events(&event, &roots());
        assert_eq!(raw.len(), 2);
        assert!(raw.iter().all(|r| r.kind == EventKind::Moved));
        assert_eq!(raw[1].path, PathBuf::from("/proj/src/new.py"));
    }

    #[test]
    fn removing_a_root_produces_no_event() {
        let event = Event::new(notify::EventKind::Remove(RemoveKind::Folder))
            .add_path(PathBuf::from("/proj/src"));
        assert!(to_raw_events(&event, &roots()).is_empty());
    }

    fn modified(path: &str) -> RawEvent {
        RawEvent::new(path, EventKind::Modified, roots()[1].clone())
    }

    #[test]
    fn zero_window_passes_everything_through() {
        let mut d = Debouncer::new(Duration::ZERO);
        let now = Instant::now();
        d.push(modified("/proj/src/a.py"), now);
        d.push(modified("/proj/src/a.py"), now);
        assert_eq!(d.next_deadline(), None);
        assert_eq!(d.drain_due(now).len(), 2);
    }

    #[test]
    fn last_event_of_a_burst_is_delivered_after_the_window() {
        let mut d = Debouncer::new(Duration::from_millis(200));
        let t0 = Instant::now();

        d.push(modified("/proj/src/a.py"), t0);
        d.push(modified("/proj/src/a.py").directory(), t0 + Duration::from_millis(5));

        assert!(d.drain_due(t0 + Duration::from_millis(150)).is_empty());
        assert_eq!(d.next_deadline(), Some(t0 + Duration::from_millis(205)));

        let out = d.drain_due(t0 + Duration::from_millis(205));
        assert_eq!(out.len(), 1);
        assert!(out[0].is_dir, "newest event of the burst wins");
        assert_eq!(d.next_deadline(), None);
    }

    #[test]
    fn due_events_keep_first_seen_order() {
        let mut d = Debouncer::new(Duration::from_millis(100));
        let t0 = Instant::now();
        d.push(modified("/proj/src/a.py"), t0);
        d.push(modified("/proj/src/b.py"), t0 + Duration::from_millis(1));
        d.push(modified("/proj/src/a.py"), t0 + Duration::from_millis(2));

        let out = d.drain_due(t0 + Duration::from_millis(500));
        let paths: Vec<_> = out.iter().map(|e| e.path.clone()).collect();
        assert_eq!(
            paths,
            vec![PathBuf::from("/proj/src/a.py"), PathBuf::from("/proj/src/b.py")]
        );
    }

    #[test]
    fn pending_events_flush_on_close() {
        let mut d = Debouncer::new(Duration::from_secs(60));
        d.push(modified("/proj/src/a.py"), Instant::now());
        assert!(d.drain_due(Instant::now()).is_empty());
        assert_eq!(d.drain_all().len(), 1);
    }

    fn modify_event(path: &str) -> Event {
        Event::new(notify::EventKind::Modify(ModifyKind::Data(DataChange::Content)))
            .add_path(PathBuf::from(path))
    }

    #[tokio::test]
    async fn bridge_forwards_the_final_event_of_a_burst() {
        let (notify_tx, notify_rx) = mpsc::unbounded_channel();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let bridge = tokio::spawn(forward_events(
            notify_rx,
            tx,
            roots(),
            Duration::from_millis(50),
        ));

        notify_tx.send(modify_event("/proj/pyproject.toml")).unwrap();
        notify_tx.send(modify_event("/proj/pyproject.toml")).unwrap();

        let ev = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("flushed after the window")
            .unwrap();
        assert_eq!(ev.path, PathBuf::from("/proj/pyproject.toml"));

        drop(notify_tx);
        bridge.await.unwrap();
        assert!(rx.recv().await.is_none(), "burst delivered exactly once");
    }

    #[tokio::test]
    async fn bridge_flushes_pending_events_when_notify_closes() {
        let (notify_tx, notify_rx) = mpsc::unbounded_channel();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let bridge = tokio::spawn(forward_events(
            notify_rx,
            tx,
            roots(),
            Duration::from_secs(60),
        ));

        notify_tx.send(modify_event("/proj/src/a.py")).unwrap();
        drop(notify_tx);
        bridge.await.unwrap();

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.path, PathBuf::from("/proj/src/a.py"));
    }
}
