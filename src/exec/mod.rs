// src/exec/mod.rs

//! Process execution layer.
//!
//! This module actually runs the commands of a pipeline, using
//! `tokio::process::Command`, and turns each run into a [`CommandResult`].
//!
//! - [`result`] defines [`CommandResult`] and the [`CommandOutcome`] failure
//!   taxonomy.
//! - [`runner`] spawns a single process, captures its output and applies the
//!   optional timeout.
//! - [`backend`] provides the [`CommandExecutor`] trait and the production
//!   [`ProcessExecutor`]; tests replace it with a fake that never spawns.

pub mod backend;
pub mod result;
pub mod runner;

pub use backend::{CommandExecutor, ProcessExecutor};
pub use result::{CommandOutcome, CommandResult};
pub use runner::run_command;
