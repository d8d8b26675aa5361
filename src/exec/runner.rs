// src/exec/runner.rs

//! Single-command process runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;

use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::exec::result::CommandResult;
use crate::pipeline::CommandSpec;

/// Run one command to completion and classify how it ended.
///
/// - argv is passed straight to the OS, never through a shell.
/// - stdout and stderr are captured fully, not streamed.
/// - A spawn failure or timeout is folded into the returned result; this
///   function never fails.
/// - On timeout the child is dropped, and `kill_on_drop(true)` kills it.
pub async fn run_command(spec: &CommandSpec, default_cwd: &Path) -> CommandResult {
    let started = Instant::now();

    let Some(program) = spec.program() else {
        warn!(label = %spec.label, "command has an empty argv; nothing to spawn");
        return CommandResult::spawn_failure(spec, "empty argument vector", started.elapsed());
    };

    let cwd = resolve_cwd(spec, default_cwd);

    let mut cmd = Command::new(program);
    cmd.args(&spec.argv[1..])
        .current_dir(&cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    info!(label = %spec.label, cmd = %spec, cwd = ?cwd, "starting command");

    let child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => {
            warn!(label = %spec.label, program, error = %err, "failed to spawn command");
            let message = if err.kind() == std::io::ErrorKind::NotFound {
                format!("command not found: {program}")
            } else {
                format!("could not start {program}: {err}")
            };
            return CommandResult::spawn_failure(spec, message, started.elapsed());
        }
    };

    let wait = child.wait_with_output();
    let output = match spec.timeout {
        Some(limit) => match tokio::time::timeout(limit, wait).await {
            Ok(res) => res,
            Err(_) => {
                warn!(label = %spec.label, ?limit, "command timed out; killing process");
                return CommandResult::timeout(spec, started.elapsed());
            }
        },
        None => wait.await,
    };

    let elapsed = started.elapsed();

    match output {
        Ok(output) => {
            let code = output.status.code();
            debug!(label = %spec.label, exit_code = ?code, ?elapsed, "command exited");
            CommandResult::from_exit(
                spec,
                code,
                String::from_utf8_lossy(&output.stdout).into_owned(),
                String::from_utf8_lossy(&output.stderr).into_owned(),
                elapsed,
            )
        }
        Err(err) => {
            warn!(label = %spec.label, error = %err, "waiting for command failed");
            CommandResult::from_exit(spec, None, String::new(), err.to_string(), elapsed)
        }
    }
}

fn resolve_cwd(spec: &CommandSpec, default_cwd: &Path) -> PathBuf {
    match spec.cwd {
        Some(ref dir) if dir.is_relative() => default_cwd.join(dir),
        Some(ref dir) => dir.clone(),
        None => default_cwd.to_path_buf(),
    }
}
