// src/deps/mod.rs

//! Dependency manifest tracking.
//!
//! - [`manifest`] extracts a flat, normalized set of dependency names from a
//!   TOML manifest section.
//! - [`tracker`] owns the current [`DependencySnapshot`] and diffs each new
//!   read of the manifest against it.

pub mod manifest;
pub mod tracker;

pub use manifest::{normalize_dependency, parse_manifest, DependencySnapshot, DEFAULT_MANIFEST_SECTION};
pub use tracker::{DependencyDiff, DependencySetTracker, DiffStatus};
