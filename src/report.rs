// src/report.rs

//! Console/log sink for command blocks.
//!
//! Every command produces one delimited block:
//!
//! ```text
//! --- Running: `ruff check --fix .` ---
//! <raw stdout>
//! <raw stderr>
//! --- Failed (code 1): `ruff check --fix .` ---
//! ```
//!
//! Blocks go to the console (stdout by default) and, when configured, are
//! appended to a log file with every line prefixed by a local
//! `[%Y-%m-%d %H:%M:%S]` timestamp. Writes are best-effort: a failing sink
//! is reported on stderr and otherwise ignored.

use std::collections::BTreeSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;

use crate::exec::{CommandOutcome, CommandResult};
use crate::pipeline::CommandSpec;
use crate::types::Category;

pub struct Reporter {
    console: Box<dyn Write + Send>,
    log: Option<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter")
            .field("log", &self.log.is_some())
            .finish_non_exhaustive()
    }
}

impl Reporter {
    pub fn new(console: Box<dyn Write + Send>) -> Self {
        Self { console, log: None }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    /// Also append every block to `path` (created if missing).
    pub fn with_log_file(self, path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening log file {:?}", path))?;
        Ok(self.with_log_writer(Box::new(file)))
    }

    pub fn with_log_writer(mut self, writer: Box<dyn Write + Send>) -> Self {
        self.log = Some(writer);
        self
    }

    /// A free-form line, e.g. banners and shutdown notices.
    pub fn line(&mut self, message: &str) {
        self.emit(&format!("{message}\n"));
    }

    pub fn event(&mut self, category: Category, rel_path: &str) {
        let label = match category {
            Category::Code => "Source file changed",
            Category::Docs => "Doc file changed",
            Category::Manifest => "Dependencies file changed",
            Category::Ignored => return,
        };
        self.line(&format!("{label}: {rel_path}"));
    }

    pub fn dependencies_added(&mut self, added: &BTreeSet<String>) {
        if added.is_empty() {
            self.line("No new dependencies detected.");
        } else {
            let names: Vec<&str> = added.iter().map(String::as_str).collect();
            self.line(&format!("New dependencies detected: {}", names.join(", ")));
        }
    }

    pub fn command_started(&mut self, spec: &CommandSpec) {
        self.emit(&start_marker(spec));
    }

    pub fn command_finished(&mut self, result: &CommandResult) {
        let mut block = String::new();
        push_output(&mut block, &result.stdout);
        push_output(&mut block, &result.stderr);
        block.push_str(&end_marker(result));
        block.push('\n');
        self.emit(&block);
    }

    fn emit(&mut self, text: &str) {
        if let Err(err) = write_flush(&mut *self.console, text) {
            eprintln!("guardian: failed to write report to console: {err}");
        }
        if let Some(log) = self.log.as_mut() {
            let stamp = Local::now().format(LOG_TIMESTAMP).to_string();
            if let Err(err) = write_flush(&mut **log, &timestamp_lines(text, &stamp)) {
                eprintln!("guardian: failed to append to log file: {err}");
            }
        }
    }
}

const LOG_TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S";

/// Prefix each line of `text` with `[stamp] `, keeping line endings.
fn timestamp_lines(text: &str, stamp: &str) -> String {
    let mut out = String::with_capacity(text.len() + 24);
    for line in text.split_inclusive('\n') {
        out.push('[');
        out.push_str(stamp);
        out.push_str("] ");
        out.push_str(line);
    }
    out
}

fn write_flush(w: &mut (dyn Write + Send), text: &str) -> std::io::Result<()> {
    w.write_all(text.as_bytes())?;
    w.flush()
}

fn push_output(block: &mut String, output: &str) {
    if output.is_empty() {
        return;
    }
    block.push_str(output);
    if !output.ends_with('\n') {
        block.push('\n');
    }
}

pub fn start_marker(spec: &CommandSpec) -> String {
    format!("--- Running: `{spec}` ---\n")
}

pub fn end_marker(result: &CommandResult) -> String {
    let cmd = result.command_line();
    match result.outcome {
        CommandOutcome::Success => format!("--- Success: `{cmd}` ---\n"),
        CommandOutcome::BenignExit(code) => {
            format!("--- Success (benign exit {code}): `{cmd}` ---\n")
        }
        CommandOutcome::Failed(code) => format!("--- Failed (code {code}): `{cmd}` ---\n"),
        CommandOutcome::SpawnError(ref message) => format!("--- Error: {message} ---\n"),
        CommandOutcome::TimedOut => format!(
            "--- Timed out after {:.1}s: `{cmd}` ---\n",
            result.elapsed.as_secs_f64()
        ),
    }
}
