// src/engine/runtime.rs

use std::fmt;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::deps::DiffStatus;
use crate::exec::CommandExecutor;
use crate::pipeline::CommandSpec;
use crate::report::Reporter;
use crate::types::{Category, RawEvent};

use super::core::{CoreRuntime, OrchestratorStats};
use super::event_handlers::CoreStep;
use super::OrchestratorState;

/// What the loop should do next.
enum Next {
    Event(RawEvent),
    Shutdown,
    /// The shutdown sender was dropped without signalling.
    ShutdownDetached,
    Closed,
}

/// Drives the core in response to raw events and delegates command
/// execution to a `CommandExecutor`.
///
/// This is a pure IO shell around `CoreRuntime`. Events are handled strictly
/// one at a time in arrival order, and the commands of one event run
/// sequentially; a failing command never stops the ones after it.
pub struct Runtime<E: CommandExecutor> {
    core: CoreRuntime,
    event_rx: mpsc::UnboundedReceiver<RawEvent>,
    shutdown_rx: Option<oneshot::Receiver<()>>,
    executor: E,
    reporter: Reporter,
    state: OrchestratorState,
}

impl<E: CommandExecutor> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<E: CommandExecutor> Runtime<E> {
    pub fn new(
        core: CoreRuntime,
        event_rx: mpsc::UnboundedReceiver<RawEvent>,
        executor: E,
        reporter: Reporter,
    ) -> Self {
        Self {
            core,
            event_rx,
            shutdown_rx: None,
            executor,
            reporter,
            state: OrchestratorState::Idle,
        }
    }

    /// Stop at the next event boundary once `rx` fires.
    pub fn with_shutdown(mut self, rx: oneshot::Receiver<()>) -> Self {
        self.shutdown_rx = Some(rx);
        self
    }

    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    /// For notices printed after the loop has stopped.
    pub fn reporter_mut(&mut self) -> &mut Reporter {
        &mut self.reporter
    }

    /// Main event loop.
    ///
    /// - Consumes `RawEvent`s from `event_rx` until the channel closes or
    ///   shutdown is requested.
    /// - On shutdown the in-flight dispatch has already finished; events
    ///   still queued are dropped and counted.
    /// - When the channel closes, every event already queued is handled
    ///   first.
    pub async fn run(&mut self) -> OrchestratorStats {
        info!("guardian runtime started");

        loop {
            self.transition(OrchestratorState::Idle);

            match self.next_event().await {
                Next::Event(event) => self.handle_event(event).await,
                Next::Shutdown => {
                    info!("shutdown requested; stopping runtime");
                    self.discard_pending();
                    break;
                }
                Next::ShutdownDetached => {
                    debug!("shutdown sender dropped; running until the event channel closes");
                    self.shutdown_rx = None;
                }
                Next::Closed => {
                    info!("event channel closed; exiting");
                    break;
                }
            }
        }

        self.transition(OrchestratorState::Stopped);
        info!(stats = ?self.core.stats(), "runtime exiting");
        self.core.stats().clone()
    }

    /// Run the code and docs pipelines once each, without watching.
    pub async fn run_once(&mut self) -> OrchestratorStats {
        for category in [Category::Code, Category::Docs] {
            let commands = self.core.pipeline_commands(category);
            if commands.is_empty() {
                continue;
            }
            self.reporter
                .line(&format!("Running {category} pipeline ({} commands)", commands.len()));
            self.transition(OrchestratorState::Dispatching);
            self.dispatch(&commands).await;
        }

        self.transition(OrchestratorState::Stopped);
        self.core.stats().clone()
    }

    async fn next_event(&mut self) -> Next {
        match self.shutdown_rx.as_mut() {
            Some(shutdown) => {
                tokio::select! {
                    biased;
                    res = shutdown => match res {
                        Ok(()) => Next::Shutdown,
                        Err(_) => Next::ShutdownDetached,
                    },
                    event = self.event_rx.recv() => match event {
                        Some(e) => Next::Event(e),
                        None => Next::Closed,
                    },
                }
            }
            None => match self.event_rx.recv().await {
                Some(e) => Next::Event(e),
                None => Next::Closed,
            },
        }
    }

    async fn handle_event(&mut self, event: RawEvent) {
        self.transition(OrchestratorState::Classifying);
        debug!(path = ?event.path, kind = ?event.kind, "runtime received event");

        let step = self.core.step(&event);
        if step.is_ignored() {
            debug!(path = %step.rel_path, "event ignored");
            return;
        }

        self.transition(OrchestratorState::Dispatching);
        self.report_step(&step);
        self.dispatch(&step.commands).await;
    }

    fn report_step(&mut self, step: &CoreStep) {
        self.reporter.event(step.category, &step.rel_path);
        if let Some(ref diff) = step.dependency_diff {
            match diff.status {
                DiffStatus::Applied => self.reporter.dependencies_added(&diff.added),
                DiffStatus::RetainedPrevious(ref err) => self
                    .reporter
                    .line(&format!("Could not read dependencies file: {err}")),
            }
        }
    }

    async fn dispatch(&mut self, commands: &[CommandSpec]) {
        for spec in commands {
            self.reporter.command_started(spec);
            let result = self.executor.run(spec).await;
            if !result.success() {
                warn!(label = %result.label, outcome = ?result.outcome, "command did not succeed");
            }
            self.reporter.command_finished(&result);
            self.core.record_result(&result);
        }
    }

    fn discard_pending(&mut self) {
        self.event_rx.close();
        let mut discarded = 0u64;
        while self.event_rx.try_recv().is_ok() {
            discarded += 1;
        }
        if discarded > 0 {
            info!(discarded, "discarding queued events on shutdown");
        }
        self.core.record_discarded(discarded);
    }

    fn transition(&mut self, next: OrchestratorState) {
        if self.state != next {
            debug!(from = %self.state, to = %next, "orchestrator state");
            self.state = next;
        }
    }
}
