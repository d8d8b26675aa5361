// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::deps::DEFAULT_MANIFEST_SECTION;
use crate::pipeline::PipelineRegistry;
use crate::types::{RootCategory, WatchRoot};

/// Top-level configuration as read from a TOML file, before validation.
///
/// ```toml
/// [config]
/// manifest = "pyproject.toml"
/// debounce_ms = 200
///
/// [[root]]
/// path = "src"
/// category = "code"
///
/// [[pipeline.code]]
/// label = "test"
/// cmd = ["pytest"]
/// benign_exit_codes = [5]
///
/// [dependency]
/// cmd = ["python", "scripts/generate_api_docs.py", "{dependency}"]
/// ```
///
/// Every section is optional; an empty file describes the stock Python
/// layout (`src`/`tests` as code, `docs`/`specs` as docs, `pyproject.toml`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    /// `[[root]]` entries. Empty means the default layout.
    #[serde(default)]
    pub root: Vec<RootConfig>,

    #[serde(default)]
    pub pipeline: PipelineSection,

    /// `[dependency]`: the per-dependency command. `None` keeps the default.
    #[serde(default)]
    pub dependency: Option<CommandConfig>,
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigSection {
    /// Project root, relative to the config file's directory.
    #[serde(default = "default_project_root")]
    pub project_root: String,

    /// Manifest path, relative to the project root.
    #[serde(default = "default_manifest")]
    pub manifest: String,

    /// Dotted key path of the dependency list inside the manifest.
    #[serde(default = "default_manifest_section")]
    pub manifest_section: String,

    /// Coalescing window for repeated events on the same path; 0 disables it.
    #[serde(default)]
    pub debounce_ms: u64,

    #[serde(default = "default_source_extensions")]
    pub source_extensions: Vec<String>,

    #[serde(default = "default_doc_extensions")]
    pub doc_extensions: Vec<String>,

    /// Globs (relative to the project root) whose changes are ignored.
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,

    /// Append-only copy of the console report, relative to the project root.
    #[serde(default)]
    pub log_file: Option<String>,
}

fn default_project_root() -> String {
    ".".to_string()
}

fn default_manifest() -> String {
    "pyproject.toml".to_string()
}

fn default_manifest_section() -> String {
    DEFAULT_MANIFEST_SECTION.to_string()
}

fn default_source_extensions() -> Vec<String> {
    vec!["py".to_string()]
}

fn default_doc_extensions() -> Vec<String> {
    vec!["md".to_string()]
}

fn default_ignore() -> Vec<String> {
    vec!["**/__pycache__/**".to_string(), "**/.*/**".to_string()]
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            project_root: default_project_root(),
            manifest: default_manifest(),
            manifest_section: default_manifest_section(),
            debounce_ms: 0,
            source_extensions: default_source_extensions(),
            doc_extensions: default_doc_extensions(),
            ignore: default_ignore(),
            log_file: None,
        }
    }
}

/// `[[root]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RootConfig {
    /// Directory, relative to the project root.
    pub path: String,
    pub category: RootCategory,
    #[serde(default = "default_recursive")]
    pub recursive: bool,
}

fn default_recursive() -> bool {
    true
}

/// `[pipeline]` section: `[[pipeline.code]]` and `[[pipeline.docs]]`.
///
/// `None` keeps the built-in pipeline; an explicit empty list disables it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineSection {
    #[serde(default)]
    pub code: Option<Vec<CommandConfig>>,
    #[serde(default)]
    pub docs: Option<Vec<CommandConfig>>,
}

/// One command as written in TOML.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandConfig {
    /// Defaults to the program name.
    #[serde(default)]
    pub label: Option<String>,

    /// Program and arguments. Never run through a shell.
    pub cmd: Vec<String>,

    /// Working directory, relative to the project root.
    #[serde(default)]
    pub cwd: Option<String>,

    #[serde(default)]
    pub benign_exit_codes: Vec<i32>,

    /// Duration string such as `"90s"` or `"10m"`.
    #[serde(default)]
    pub timeout: Option<String>,
}

/// Validated, fully resolved configuration.
///
/// All paths are absolute. Built through `RawConfigFile::resolve` or
/// `TryFrom<RawConfigFile>`, which resolves against the current directory.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub project_root: PathBuf,
    pub manifest: PathBuf,
    pub manifest_section: String,
    pub roots: Vec<WatchRoot>,
    pub registry: PipelineRegistry,
    pub debounce: Duration,
    pub source_extensions: Vec<String>,
    pub doc_extensions: Vec<String>,
    pub ignore: Vec<String>,
    pub log_file: Option<PathBuf>,
}

impl ConfigFile {
    /// Roots of the given category, in configuration order.
    pub fn roots_of(&self, category: RootCategory) -> impl Iterator<Item = &WatchRoot> {
        self.roots.iter().filter(move |r| r.category == category)
    }
}

/// The layout the tool watches when no `[[root]]` is configured.
pub fn default_roots() -> Vec<RootConfig> {
    [
        ("src", RootCategory::Code),
        ("tests", RootCategory::Code),
        ("docs", RootCategory::Docs),
        ("specs", RootCategory::Docs),
    ]
    .into_iter()
    .map(|(path, category)| RootConfig {
        path: path.to_string(),
        category,
        recursive: true,
    })
    .collect()
}
