// src/config/validate.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use globset::Glob;

use crate::config::model::{default_roots, CommandConfig, ConfigFile, RawConfigFile};
use crate::errors::{GuardianError, Result};
use crate::pipeline::registry::{
    default_code_pipeline, default_dependency_command, default_docs_pipeline,
};
use crate::pipeline::{CommandSpec, PipelineRegistry};
use crate::types::{RootCategory, WatchRoot};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = GuardianError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let base = std::env::current_dir()?;
        raw.resolve(&base)
    }
}

impl RawConfigFile {
    /// Validate and resolve every path against `base_dir` (the directory of
    /// the config file).
    pub fn resolve(self, base_dir: &Path) -> Result<ConfigFile> {
        validate_raw_config(&self)?;

        let project_root = absolutize(&base_dir.join(&self.config.project_root));
        let manifest = project_root.join(&self.config.manifest);
        let roots = build_roots(&self, &project_root, &manifest);
        let registry = build_registry(&self)?;
        let log_file = self
            .config
            .log_file
            .as_ref()
            .map(|f| project_root.join(f));

        Ok(ConfigFile {
            project_root,
            manifest,
            manifest_section: self.config.manifest_section,
            roots,
            registry,
            debounce: Duration::from_millis(self.config.debounce_ms),
            source_extensions: self.config.source_extensions,
            doc_extensions: self.config.doc_extensions,
            ignore: self.config.ignore,
            log_file,
        })
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_global_config(cfg)?;
    validate_roots(cfg)?;
    validate_commands(cfg)?;
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.manifest.trim().is_empty() {
        return Err(GuardianError::ConfigError(
            "[config].manifest must not be empty".to_string(),
        ));
    }

    for pat in &cfg.config.ignore {
        Glob::new(pat).map_err(|e| {
            GuardianError::ConfigError(format!("[config].ignore has invalid glob '{pat}': {e}"))
        })?;
    }

    Ok(())
}

fn validate_roots(cfg: &RawConfigFile) -> Result<()> {
    for (idx, root) in cfg.root.iter().enumerate() {
        if root.path.trim().is_empty() {
            return Err(GuardianError::ConfigError(format!(
                "root[{idx}] has an empty `path`"
            )));
        }
        if root.category == RootCategory::Manifest && root.recursive {
            return Err(GuardianError::ConfigError(format!(
                "root[{idx}] ('{}') is a manifest root and must set `recursive = false`",
                root.path
            )));
        }
    }
    Ok(())
}

fn validate_commands(cfg: &RawConfigFile) -> Result<()> {
    let code = cfg.pipeline.code.iter().flatten().map(|c| ("pipeline.code", c));
    let docs = cfg.pipeline.docs.iter().flatten().map(|c| ("pipeline.docs", c));
    let dependency = cfg.dependency.iter().map(|c| ("dependency", c));

    for (section, command) in code.chain(docs).chain(dependency) {
        if command.cmd.is_empty() || command.cmd[0].trim().is_empty() {
            return Err(GuardianError::ConfigError(format!(
                "[{section}] command {:?} has an empty `cmd`",
                command.label.as_deref().unwrap_or("<unnamed>")
            )));
        }
        if let Some(ref timeout) = command.timeout {
            parse_duration(timeout).map_err(|e| {
                GuardianError::ConfigError(format!("[{section}] `{}`: {e}", command.cmd[0]))
            })?;
        }
    }
    Ok(())
}

/// Resolve configured roots, adding a flat manifest root unless an existing
/// root already covers the manifest.
fn build_roots(cfg: &RawConfigFile, project_root: &Path, manifest: &Path) -> Vec<WatchRoot> {
    let configured = if cfg.root.is_empty() {
        default_roots()
    } else {
        cfg.root.clone()
    };

    let mut roots: Vec<WatchRoot> = Vec::new();
    for root in configured {
        let path = absolutize(&project_root.join(&root.path));
        let resolved = WatchRoot::new(path, root.recursive, root.category);
        if !roots.contains(&resolved) {
            roots.push(resolved);
        }
    }

    let covered = roots.iter().any(|r| r.contains(manifest));
    if !covered {
        if let Some(parent) = manifest.parent() {
            roots.push(WatchRoot::new(parent, false, RootCategory::Manifest));
        }
    }

    roots
}

fn build_registry(cfg: &RawConfigFile) -> Result<PipelineRegistry> {
    let code = match cfg.pipeline.code {
        Some(ref cmds) => cmds.iter().map(to_command_spec).collect::<Result<_>>()?,
        None => default_code_pipeline(),
    };
    let docs = match cfg.pipeline.docs {
        Some(ref cmds) => cmds.iter().map(to_command_spec).collect::<Result<_>>()?,
        None => default_docs_pipeline(),
    };
    let dependency = match cfg.dependency {
        Some(ref cmd) => to_command_spec(cmd)?,
        None => default_dependency_command(),
    };

    Ok(PipelineRegistry::new(code, docs, Some(dependency)))
}

fn to_command_spec(cfg: &CommandConfig) -> Result<CommandSpec> {
    let label = cfg
        .label
        .clone()
        .unwrap_or_else(|| cfg.cmd.first().cloned().unwrap_or_default());

    let mut spec = CommandSpec::new(label, cfg.cmd.iter().cloned())
        .with_benign_exit_codes(cfg.benign_exit_codes.iter().copied());

    if let Some(ref cwd) = cfg.cwd {
        spec = spec.with_cwd(cwd);
    }
    if let Some(ref timeout) = cfg.timeout {
        let timeout = parse_duration(timeout).map_err(GuardianError::ConfigError)?;
        spec = spec.with_timeout(timeout);
    }
    Ok(spec)
}

fn absolutize(path: &Path) -> PathBuf {
    path.canonicalize()
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Parse a simple duration string like `"3s"`, `"250ms"`, `"1m"`, `"2h"`.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| format!("duration '{s}' is missing a unit suffix"))?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    let scaled = |factor: u64| {
        value
            .checked_mul(factor)
            .map(Duration::from_secs)
            .ok_or_else(|| format!("duration '{s}' is too large"))
    };

    match unit.as_str() {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => scaled(60),
        "h" => scaled(60 * 60),
        _ => Err(format!(
            "unsupported duration unit '{}'; expected ms, s, m, or h",
            unit
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_parse_with_units() {
        assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
        assert_eq!(parse_duration(" 10m "), Ok(Duration::from_secs(600)));
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("5d").is_err());
    }

    #[test]
    fn oversized_durations_are_rejected_not_wrapped() {
        let err = parse_duration("99999999999999999h").unwrap_err();
        assert!(err.contains("too large"), "{err}");
        assert!(parse_duration("999999999999999999m").is_err());
        assert_eq!(
            parse_duration("18446744073709551615s"),
            Ok(Duration::from_secs(u64::MAX))
        );
    }
}
