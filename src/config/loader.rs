// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** resolve paths or
/// validate commands. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file and resolve it relative to its own directory.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let raw_config = load_from_path(path)?;
    raw_config.resolve(&config_base_dir(path)?)
}

/// Load the config the CLI asked for.
///
/// - An explicit path must exist.
/// - Without one, `Guardian.toml` in the current directory is used when
///   present, otherwise the built-in defaults.
pub fn load_or_default(explicit: Option<&Path>) -> Result<ConfigFile> {
    if let Some(path) = explicit {
        return load_and_validate(path);
    }

    let default_path = default_config_path();
    if default_path.is_file() {
        return load_and_validate(&default_path);
    }

    info!("no {:?} found; using built-in defaults", default_path);
    RawConfigFile::default().resolve(&std::env::current_dir()?)
}

/// Default config location: `Guardian.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Guardian.toml")
}

/// Directory the config's relative paths are anchored to.
///
/// A bare filename like `Guardian.toml` (parent = "") falls back to the
/// current working directory.
fn config_base_dir(config_path: &Path) -> Result<PathBuf> {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => Ok(parent.to_path_buf()),
        _ => Ok(std::env::current_dir()?),
    }
}
