// src/config/mod.rs

//! Configuration loading and validation for guardian.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate and resolve it into absolute roots and a pipeline registry
//!   (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_or_default};
pub use model::{
    CommandConfig, ConfigFile, ConfigSection, PipelineSection, RawConfigFile, RootConfig,
};
pub use validate::parse_duration;
