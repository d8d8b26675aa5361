// src/engine/event_handlers.rs

//! Per-category event handling for the core runtime.

use std::path::Path;

use tracing::{debug, info};

use crate::deps::{DependencyDiff, DependencySetTracker, DiffStatus};
use crate::pipeline::{CommandSpec, Placeholders, PipelineRegistry};
use crate::types::Category;

/// Decision returned by the core after handling a single event.
#[derive(Debug)]
pub struct CoreStep {
    pub category: Category,
    /// Changed path relative to the project root.
    pub rel_path: String,
    /// Rendered commands, to be run strictly in this order.
    pub commands: Vec<CommandSpec>,
    /// Present for manifest events.
    pub dependency_diff: Option<DependencyDiff>,
}

impl CoreStep {
    pub fn ignored(rel_path: String) -> Self {
        Self {
            category: Category::Ignored,
            rel_path,
            commands: Vec::new(),
            dependency_diff: None,
        }
    }

    pub fn is_ignored(&self) -> bool {
        self.category == Category::Ignored
    }
}

/// Code and docs events: render the category's pipeline for the changed path.
pub fn handle_pipeline_event(
    registry: &PipelineRegistry,
    category: Category,
    rel_path: String,
) -> CoreStep {
    let placeholders = Placeholders::for_path(rel_path.clone());
    let commands: Vec<CommandSpec> = registry
        .pipeline_for(category)
        .iter()
        .map(|spec| spec.render(&placeholders))
        .collect();

    debug!(%category, path = %rel_path, count = commands.len(), "pipeline selected");

    CoreStep {
        category,
        rel_path,
        commands,
        dependency_diff: None,
    }
}

/// Manifest events: diff the dependency set and plan one independent
/// command per newly added name.
pub fn handle_manifest_event(
    registry: &PipelineRegistry,
    tracker: &mut DependencySetTracker,
    manifest_path: &Path,
    rel_path: String,
) -> CoreStep {
    let diff = tracker.diff(manifest_path);

    let commands: Vec<CommandSpec> = match diff.status {
        DiffStatus::Applied => diff
            .added
            .iter()
            .filter_map(|name| registry.dependency_command(name))
            .collect(),
        DiffStatus::RetainedPrevious(_) => Vec::new(),
    };

    if !diff.added.is_empty() {
        info!(added = ?diff.added, "new dependencies detected");
    }

    CoreStep {
        category: Category::Manifest,
        rel_path,
        commands,
        dependency_diff: Some(diff),
    }
}
