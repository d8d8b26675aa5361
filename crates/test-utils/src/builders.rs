use std::path::Path;
use std::sync::Arc;

use guardian::config::{CommandConfig, ConfigFile, RawConfigFile, RootConfig};
use guardian::deps::DependencySetTracker;
use guardian::engine::CoreRuntime;
use guardian::fs::FileSystem;
use guardian::types::RootCategory;
use guardian::watch::EventClassifier;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn manifest(mut self, manifest: &str) -> Self {
        self.config.config.manifest = manifest.to_string();
        self
    }

    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.config.config.debounce_ms = ms;
        self
    }

    pub fn ignore(mut self, pattern: &str) -> Self {
        self.config.config.ignore.push(pattern.to_string());
        self
    }

    pub fn root(mut self, path: &str, category: RootCategory, recursive: bool) -> Self {
        self.config.root.push(RootConfig {
            path: path.to_string(),
            category,
            recursive,
        });
        self
    }

    pub fn code_command(mut self, cmd: CommandConfig) -> Self {
        self.config.pipeline.code.get_or_insert_with(Vec::new).push(cmd);
        self
    }

    pub fn docs_command(mut self, cmd: CommandConfig) -> Self {
        self.config.pipeline.docs.get_or_insert_with(Vec::new).push(cmd);
        self
    }

    pub fn dependency_command(mut self, cmd: CommandConfig) -> Self {
        self.config.dependency = Some(cmd);
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    /// Resolve against `base_dir`, panicking on invalid configuration.
    pub fn build_in(self, base_dir: &Path) -> ConfigFile {
        self.config
            .resolve(base_dir)
            .expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `CommandConfig`.
pub struct CommandConfigBuilder {
    cmd: CommandConfig,
}

impl CommandConfigBuilder {
    pub fn new(argv: &[&str]) -> Self {
        Self {
            cmd: CommandConfig {
                label: None,
                cmd: argv.iter().map(|s| s.to_string()).collect(),
                cwd: None,
                benign_exit_codes: vec![],
                timeout: None,
            },
        }
    }

    pub fn label(mut self, label: &str) -> Self {
        self.cmd.label = Some(label.to_string());
        self
    }

    pub fn benign(mut self, code: i32) -> Self {
        self.cmd.benign_exit_codes.push(code);
        self
    }

    pub fn timeout(mut self, timeout: &str) -> Self {
        self.cmd.timeout = Some(timeout.to_string());
        self
    }

    pub fn cwd(mut self, cwd: &str) -> Self {
        self.cmd.cwd = Some(cwd.to_string());
        self
    }

    pub fn build(self) -> CommandConfig {
        self.cmd
    }
}

/// Core runtime over `cfg`, reading the manifest through `fs`.
pub fn core_from_config(cfg: &ConfigFile, fs: Arc<dyn FileSystem>) -> CoreRuntime {
    let mut tracker =
        DependencySetTracker::new(&cfg.manifest, cfg.manifest_section.as_str(), fs);
    tracker.initial_snapshot();

    let classifier = EventClassifier::new(&cfg.project_root, &cfg.manifest)
        .with_source_extensions(&cfg.source_extensions)
        .with_doc_extensions(&cfg.doc_extensions)
        .with_ignore_patterns(&cfg.ignore)
        .expect("ignore patterns were validated with the config");

    CoreRuntime::new(classifier, cfg.registry.clone(), tracker)
}
