// src/deps/tracker.rs

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::deps::manifest::{parse_manifest, DependencySnapshot};
use crate::errors::{GuardianError, Result};
use crate::fs::FileSystem;

/// Whether a diff replaced the snapshot or kept the last good one.
#[derive(Debug)]
pub enum DiffStatus {
    Applied,
    /// The manifest could not be read or parsed; the previous snapshot is
    /// still current and nothing is reported as added.
    RetainedPrevious(GuardianError),
}

/// Result of re-reading the manifest.
#[derive(Debug)]
pub struct DependencyDiff {
    /// The tracker's snapshot after this diff.
    pub snapshot: DependencySnapshot,
    pub added: BTreeSet<String>,
    pub removed: BTreeSet<String>,
    pub status: DiffStatus,
}

/// Owns the "known dependencies" of the project and diffs manifest edits
/// against them.
///
/// Each successful read replaces the snapshot wholesale, so a dependency that
/// is removed and later declared again is reported as added the second time.
#[derive(Debug)]
pub struct DependencySetTracker {
    manifest_path: PathBuf,
    section: String,
    fs: Arc<dyn FileSystem>,
    current: DependencySnapshot,
}

impl DependencySetTracker {
    pub fn new(
        manifest_path: impl Into<PathBuf>,
        section: impl Into<String>,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            manifest_path: manifest_path.into(),
            section: section.into(),
            fs,
            current: DependencySnapshot::new(),
        }
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    pub fn snapshot(&self) -> &DependencySnapshot {
        &self.current
    }

    /// Read the manifest once at startup.
    ///
    /// A missing or malformed manifest logs a warning and starts from the
    /// empty set.
    pub fn initial_snapshot(&mut self) -> &DependencySnapshot {
        let path = self.manifest_path.clone();
        if !self.fs.exists(&path) {
            info!(manifest = ?path, "no manifest yet; starting with no known dependencies");
            self.current = DependencySnapshot::new();
            return &self.current;
        }
        match self.read(&path) {
            Ok(snapshot) => {
                info!(
                    manifest = ?path,
                    count = snapshot.len(),
                    "loaded initial dependency snapshot"
                );
                self.current = snapshot;
            }
            Err(err) => {
                warn!(manifest = ?path, error = %err, "could not read manifest; starting with no known dependencies");
                self.current = DependencySnapshot::new();
            }
        }
        &self.current
    }

    /// Re-read `manifest_path` and report which names are new.
    pub fn diff(&mut self, manifest_path: &Path) -> DependencyDiff {
        match self.read(manifest_path) {
            Ok(next) => {
                let added = next.added_since(&self.current);
                let removed = self.current.added_since(&next);
                debug!(?added, ?removed, "dependency snapshot replaced");
                self.current = next;
                DependencyDiff {
                    snapshot: self.current.clone(),
                    added,
                    removed,
                    status: DiffStatus::Applied,
                }
            }
            Err(err) => {
                warn!(
                    manifest = ?manifest_path,
                    error = %err,
                    "manifest unreadable; keeping previous dependency snapshot"
                );
                DependencyDiff {
                    snapshot: self.current.clone(),
                    added: BTreeSet::new(),
                    removed: BTreeSet::new(),
                    status: DiffStatus::RetainedPrevious(err),
                }
            }
        }
    }

    fn read(&self, path: &Path) -> Result<DependencySnapshot> {
        let contents = self.fs.read_to_string(path)?;
        parse_manifest(path, &contents, &self.section)
    }
}
