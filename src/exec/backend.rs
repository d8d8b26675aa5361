// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The runtime talks to a `CommandExecutor` instead of spawning processes
//! itself. This makes it easy to swap in a fake executor in tests while
//! keeping the production implementation in [`runner`](super::runner).

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use crate::exec::result::CommandResult;
use crate::exec::runner::run_command;
use crate::pipeline::CommandSpec;

/// Trait abstracting how a single command is executed.
///
/// Production code uses [`ProcessExecutor`]; tests can provide their own
/// implementation that records the argv and returns a scripted result.
pub trait CommandExecutor: Send {
    /// Run `spec` to completion. Implementations must not fail: every
    /// problem is expressed through the returned result's outcome.
    fn run<'a>(
        &'a mut self,
        spec: &'a CommandSpec,
    ) -> Pin<Box<dyn Future<Output = CommandResult> + Send + 'a>>;
}

/// Real executor backend used in production.
///
/// Commands without a `cwd` override run in `project_root`.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    project_root: PathBuf,
}

impl ProcessExecutor {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
        }
    }
}

impl CommandExecutor for ProcessExecutor {
    fn run<'a>(
        &'a mut self,
        spec: &'a CommandSpec,
    ) -> Pin<Box<dyn Future<Output = CommandResult> + Send + 'a>> {
        Box::pin(run_command(spec, &self.project_root))
    }
}
