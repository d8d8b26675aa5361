// src/lib.rs

pub mod cli;
pub mod config;
pub mod deps;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod pipeline;
pub mod report;
pub mod types;
pub mod watch;

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{load_or_default, ConfigFile};
use crate::deps::DependencySetTracker;
use crate::engine::{CoreRuntime, Runtime};
use crate::errors::Result;
use crate::exec::ProcessExecutor;
use crate::fs::RealFileSystem;
use crate::report::Reporter;
use crate::types::{Category, WatchRoot};
use crate::watch::{spawn_watcher, EventClassifier};

/// High-level entry point used by `main.rs`. Returns the process exit code.
///
/// This wires together:
/// - config loading
/// - dependency tracker, classifier and pipeline registry
/// - executor and reporter
/// - file watcher (disabled in `--once` mode)
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<i32> {
    let config_path = args.config.as_ref().map(PathBuf::from);
    let cfg = load_or_default(config_path.as_deref())?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(0);
    }

    let mut reporter = Reporter::stdout();
    if let Some(ref log_file) = cfg.log_file {
        reporter = reporter.with_log_file(log_file)?;
    }

    let core = build_core(&cfg)?;
    let executor = ProcessExecutor::new(&cfg.project_root);

    if args.once {
        // Nothing feeds this channel; run_once never reads it.
        let (_tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let mut runtime = Runtime::new(core, rx, executor, reporter);
        let stats = runtime.run_once().await;
        info!(?stats, "single pass complete");
        return Ok(if stats.commands_failed > 0 { 1 } else { 0 });
    }

    let (watcher, event_rx) = spawn_watcher(cfg.roots.clone(), cfg.debounce)?;

    reporter.line(&banner(&cfg, watcher.roots()));

    // Ctrl-C → graceful shutdown.
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("failed to listen for Ctrl+C: {e}");
            return;
        }
        let _ = shutdown_tx.send(());
    });

    let mut runtime = Runtime::new(core, event_rx, executor, reporter).with_shutdown(shutdown_rx);
    let stats = runtime.run().await;

    watcher.stop().await;
    runtime.reporter_mut().line("Guardian stopped. Goodbye!");
    debug!(?stats, "final orchestrator stats");

    Ok(0)
}

/// Build the pure core from a validated config.
///
/// Reads the manifest once for the initial dependency snapshot.
pub fn build_core(cfg: &ConfigFile) -> Result<CoreRuntime> {
    let mut tracker = DependencySetTracker::new(
        &cfg.manifest,
        cfg.manifest_section.as_str(),
        Arc::new(RealFileSystem),
    );
    tracker.initial_snapshot();

    let classifier = EventClassifier::new(&cfg.project_root, &cfg.manifest)
        .with_source_extensions(&cfg.source_extensions)
        .with_doc_extensions(&cfg.doc_extensions)
        .with_ignore_patterns(&cfg.ignore)?;

    Ok(CoreRuntime::new(classifier, cfg.registry.clone(), tracker))
}

fn banner(cfg: &ConfigFile, active: &[WatchRoot]) -> String {
    let mut out = format!("Guardian is watching {}", cfg.project_root.display());
    for root in active {
        let mode = if root.recursive { "recursive" } else { "flat" };
        out.push_str(&format!(
            "\n  [{}] {} ({mode})",
            root.category,
            root.path.display()
        ));
    }
    out.push_str("\nPress Ctrl+C to stop.");
    out
}

/// Simple dry-run output: print roots, pipelines, the dependency command and
/// the initial dependency snapshot.
fn print_dry_run(cfg: &ConfigFile) {
    println!("guardian dry-run");
    println!("  project_root = {}", cfg.project_root.display());
    println!("  manifest = {}", cfg.manifest.display());
    println!("  manifest_section = {}", cfg.manifest_section);
    println!("  debounce = {:?}", cfg.debounce);
    if !cfg.ignore.is_empty() {
        println!("  ignore = {:?}", cfg.ignore);
    }
    if let Some(ref log_file) = cfg.log_file {
        println!("  log_file = {}", log_file.display());
    }
    println!();

    println!("roots ({}):", cfg.roots.len());
    for root in &cfg.roots {
        let mode = if root.recursive { "recursive" } else { "flat" };
        println!("  - [{}] {} ({mode})", root.category, root.path.display());
    }
    println!();

    for category in [Category::Code, Category::Docs] {
        let pipeline = cfg.registry.pipeline_for(category);
        println!("{category} pipeline ({}):", pipeline.len());
        for spec in pipeline {
            println!("  - {}: {spec}", spec.label);
            if !spec.benign_exit_codes.is_empty() {
                println!("      benign_exit_codes: {:?}", spec.benign_exit_codes);
            }
            if let Some(timeout) = spec.timeout {
                println!("      timeout: {timeout:?}");
            }
            if let Some(ref cwd) = spec.cwd {
                println!("      cwd: {}", cwd.display());
            }
        }
    }

    if let Some(spec) = cfg.registry.dependency_template() {
        println!();
        println!("dependency command: {spec}");
    }

    let mut tracker = DependencySetTracker::new(
        &cfg.manifest,
        cfg.manifest_section.as_str(),
        Arc::new(RealFileSystem),
    );
    println!("known dependencies: {}", tracker.initial_snapshot());

    debug!("dry-run complete (no execution)");
}
