// src/engine/mod.rs

//! Orchestration engine for guardian.
//!
//! This module ties together:
//! - the event classifier and pipeline registry
//! - the dependency tracker (for manifest changes)
//! - the main runtime loop that reacts to:
//!   - raw filesystem events from the watcher
//!   - a shutdown signal
//!
//! The pure core lives in [`core`]: it turns one event into the list of
//! commands to run. The async/IO shell in [`runtime`] runs those commands
//! one at a time and reports them.

use std::fmt;

pub mod core;
pub mod event_handlers;
pub mod runtime;

pub use self::core::{CoreRuntime, OrchestratorStats};
pub use event_handlers::CoreStep;
pub use runtime::Runtime;

/// Where the orchestrator loop currently is.
///
/// There is no error state: a failed command is reported and the loop goes
/// back to `Idle`. `Stopped` is only reached through shutdown or when the
/// event channel closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    Idle,
    Classifying,
    Dispatching,
    Stopped,
}

impl fmt::Display for OrchestratorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrchestratorState::Idle => "idle",
            OrchestratorState::Classifying => "classifying",
            OrchestratorState::Dispatching => "dispatching",
            OrchestratorState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}
