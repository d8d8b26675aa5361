// src/errors.rs

//! Crate-wide error aliases and helpers.
//!
//! Only initialization problems and manifest reads surface as
//! [`GuardianError`]. Command failures are not errors: they are recorded as a
//! [`CommandOutcome`](crate::exec::CommandOutcome) and reported.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GuardianError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Could not parse manifest {path:?}: {message}")]
    ManifestParse { path: PathBuf, message: String },

    #[error("Manifest section `{section}` not found in {path:?}")]
    ManifestSectionMissing { path: PathBuf, section: String },

    #[error("Manifest section `{section}` in {path:?} is not an array or table")]
    ManifestSection { path: PathBuf, section: String },

    #[error("Watch root unavailable: {0:?}")]
    WatchRootUnavailable(PathBuf),

    #[error("No watch roots could be resolved")]
    NoWatchRoots,

    #[error("File watch error: {0}")]
    Notify(#[from] notify::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, GuardianError>;
