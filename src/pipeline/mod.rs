// src/pipeline/mod.rs

//! Command templates and the category → pipeline table.
//!
//! - [`command`] defines [`CommandSpec`], a static argv template with
//!   `{path}` / `{dependency}` placeholders.
//! - [`registry`] maps each [`Category`](crate::types::Category) to its
//!   ordered list of commands.

pub mod command;
pub mod registry;

pub use command::{CommandSpec, Placeholders, DEPENDENCY_PLACEHOLDER, PATH_PLACEHOLDER};
pub use registry::PipelineRegistry;
