// src/engine/core.rs

//! Pure core runtime.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RawEvent`]s and produces a [`CoreStep`]: the category of the
//! change and the rendered commands the IO shell should run, in order.
//!
//! The async/IO-heavy shell (`engine::runtime::Runtime`) is responsible for:
//! - reading events from the watcher channel
//! - running commands through a `CommandExecutor`
//! - reporting results and handling shutdown
//!
//! The core never spawns processes and only touches the filesystem through
//! the tracker's `FileSystem`, so it is unit tested with a mock filesystem.

use std::path::PathBuf;
use std::time::Instant;

use crate::deps::DependencySetTracker;
use crate::engine::event_handlers::{handle_manifest_event, handle_pipeline_event, CoreStep};
use crate::exec::CommandResult;
use crate::pipeline::{CommandSpec, Placeholders, PipelineRegistry};
use crate::types::{Category, RawEvent};
use crate::watch::EventClassifier;

/// Counters exposed for tests and the shutdown summary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrchestratorStats {
    pub events_seen: u64,
    pub events_ignored: u64,
    pub events_dispatched: u64,
    /// Events still queued when shutdown was requested.
    pub events_discarded: u64,
    pub commands_run: u64,
    /// Commands that neither succeeded nor exited with a benign code.
    pub commands_failed: u64,
    pub last_event_path: Option<PathBuf>,
    pub last_event_at: Option<Instant>,
}

/// Pure core runtime state.
///
/// This owns:
/// - the event classifier
/// - the pipeline registry
/// - the dependency tracker
/// - telemetry counters
#[derive(Debug)]
pub struct CoreRuntime {
    classifier: EventClassifier,
    registry: PipelineRegistry,
    tracker: DependencySetTracker,
    stats: OrchestratorStats,
}

impl CoreRuntime {
    /// The tracker should already hold its initial snapshot.
    pub fn new(
        classifier: EventClassifier,
        registry: PipelineRegistry,
        tracker: DependencySetTracker,
    ) -> Self {
        Self {
            classifier,
            registry,
            tracker,
            stats: OrchestratorStats::default(),
        }
    }

    pub fn stats(&self) -> &OrchestratorStats {
        &self.stats
    }

    pub fn tracker(&self) -> &DependencySetTracker {
        &self.tracker
    }

    /// Handle a single raw event: classify it and plan the commands.
    pub fn step(&mut self, event: &RawEvent) -> CoreStep {
        self.stats.events_seen += 1;
        self.stats.last_event_path = Some(event.path.clone());
        self.stats.last_event_at = Some(Instant::now());

        let category = self.classifier.classify(event);
        let rel_path = self.classifier.relative_path(&event.path);

        let step = match category {
            Category::Ignored => CoreStep::ignored(rel_path),
            Category::Code | Category::Docs => {
                handle_pipeline_event(&self.registry, category, rel_path)
            }
            Category::Manifest => {
                handle_manifest_event(&self.registry, &mut self.tracker, &event.path, rel_path)
            }
        };

        if step.is_ignored() {
            self.stats.events_ignored += 1;
        } else {
            self.stats.events_dispatched += 1;
        }
        step
    }

    /// Commands for running a whole pipeline without a triggering event
    /// (`--once`). `{path}` renders as the project root, `.`.
    pub fn pipeline_commands(&self, category: Category) -> Vec<CommandSpec> {
        let placeholders = Placeholders::for_path(".");
        self.registry
            .pipeline_for(category)
            .iter()
            .map(|spec| spec.render(&placeholders))
            .collect()
    }

    pub fn record_result(&mut self, result: &CommandResult) {
        self.stats.commands_run += 1;
        if !result.success() {
            self.stats.commands_failed += 1;
        }
    }

    pub fn record_discarded(&mut self, count: u64) {
        self.stats.events_discarded += count;
    }
}
