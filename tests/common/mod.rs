#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use guardian::config::ConfigFile;
use guardian::engine::CoreRuntime;
use guardian::fs::mock::MockFileSystem;
use guardian::types::{EventKind, RawEvent, RootCategory, WatchRoot};
use guardian_test_utils::builders::{core_from_config, CommandConfigBuilder, ConfigFileBuilder};

pub use guardian_test_utils::{init_tracing, with_timeout};

pub const PROJECT: &str = "/proj";
pub const MANIFEST: &str = "/proj/pyproject.toml";

/// The stock layout with a stand-in pipeline so argv assertions stay short.
pub fn stock_config() -> ConfigFile {
    ConfigFileBuilder::new()
        .code_command(CommandConfigBuilder::new(&["ruff", "check", "--fix", "."]).label("lint").build())
        .code_command(CommandConfigBuilder::new(&["black", "."]).label("format").build())
        .code_command(
            CommandConfigBuilder::new(&["pytest"])
                .label("test")
                .benign(5)
                .build(),
        )
        .docs_command(CommandConfigBuilder::new(&["mkdocs", "build"]).label("docs").build())
        .dependency_command(
            CommandConfigBuilder::new(&["python", "scripts/generate_api_docs.py", "{dependency}"])
                .label("generate-api-docs")
                .build(),
        )
        .build_in(Path::new(PROJECT))
}

pub fn core_with(fs: &MockFileSystem) -> CoreRuntime {
    core_from_config(&stock_config(), Arc::new(fs.clone()))
}

pub fn manifest_with(deps: &[&str]) -> String {
    let quoted: Vec<String> = deps.iter().map(|d| format!("\"{d}\"")).collect();
    format!(
        "[project]\nname = \"demo\"\n\n[project.optional-dependencies]\ndev = [{}]\n",
        quoted.join(", ")
    )
}

pub fn code_event(path: &str) -> RawEvent {
    let root = WatchRoot::new("/proj/src", true, RootCategory::Code);
    RawEvent::new(path, EventKind::Modified, root)
}

pub fn docs_event(path: &str) -> RawEvent {
    let root = WatchRoot::new("/proj/docs", true, RootCategory::Docs);
    RawEvent::new(path, EventKind::Modified, root)
}

pub fn manifest_event() -> RawEvent {
    let root = WatchRoot::new(PROJECT, false, RootCategory::Manifest);
    RawEvent::new(MANIFEST, EventKind::Modified, root)
}
