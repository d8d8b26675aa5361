// src/exec/result.rs

use std::time::Duration;

use crate::pipeline::CommandSpec;

/// How a single command invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Exit code 0.
    Success,
    /// A non-zero exit code listed in the command's `benign_exit_codes`.
    BenignExit(i32),
    /// Any other exit. `-1` when there is no code (killed by a signal, or
    /// waiting on the process failed).
    Failed(i32),
    /// The process could not be started at all.
    SpawnError(String),
    /// The configured timeout elapsed and the process was killed.
    TimedOut,
}

/// Everything captured from one run of a [`CommandSpec`].
///
/// Produced for reporting and then dropped; nothing keeps results around.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub label: String,
    pub argv: Vec<String>,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
    pub outcome: CommandOutcome,
}

impl CommandResult {
    pub fn from_exit(
        spec: &CommandSpec,
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
        elapsed: Duration,
    ) -> Self {
        let outcome = match exit_code {
            Some(0) => CommandOutcome::Success,
            Some(code) if spec.is_benign(code) => CommandOutcome::BenignExit(code),
            Some(code) => CommandOutcome::Failed(code),
            None => CommandOutcome::Failed(-1),
        };

        Self {
            label: spec.label.clone(),
            argv: spec.argv.clone(),
            exit_code,
            stdout,
            stderr,
            elapsed,
            outcome,
        }
    }

    pub fn spawn_failure(spec: &CommandSpec, message: impl Into<String>, elapsed: Duration) -> Self {
        Self::without_output(spec, CommandOutcome::SpawnError(message.into()), elapsed)
    }

    pub fn timeout(spec: &CommandSpec, elapsed: Duration) -> Self {
        Self::without_output(spec, CommandOutcome::TimedOut, elapsed)
    }

    fn without_output(spec: &CommandSpec, outcome: CommandOutcome, elapsed: Duration) -> Self {
        Self {
            label: spec.label.clone(),
            argv: spec.argv.clone(),
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
            elapsed,
            outcome,
        }
    }

    /// Clean pass or benign exit.
    pub fn success(&self) -> bool {
        matches!(
            self.outcome,
            CommandOutcome::Success | CommandOutcome::BenignExit(_)
        )
    }

    pub fn benign(&self) -> bool {
        matches!(self.outcome, CommandOutcome::BenignExit(_))
    }

    pub fn spawn_error(&self) -> bool {
        matches!(self.outcome, CommandOutcome::SpawnError(_))
    }

    pub fn timed_out(&self) -> bool {
        matches!(self.outcome, CommandOutcome::TimedOut)
    }

    pub fn command_line(&self) -> String {
        self.argv.join(" ")
    }
}
