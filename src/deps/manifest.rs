// src/deps/manifest.rs

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use crate::errors::{GuardianError, Result};

/// Where PEP 621 projects keep their development dependencies.
pub const DEFAULT_MANIFEST_SECTION: &str = "project.optional-dependencies.dev";

/// Characters that end the name part of a requirement string, e.g.
/// `mkdocstrings[python]>=0.24 ; python_version > "3.9"`.
const NAME_TERMINATORS: &[char] = &['[', '<', '>', '=', '!', '~', ';', '@', ' ', '(', ','];

/// The complete set of dependency names declared at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencySnapshot {
    names: BTreeSet<String>,
}

impl DependencySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Names present in `self` but not in `previous`.
    pub fn added_since(&self, previous: &DependencySnapshot) -> BTreeSet<String> {
        self.names.difference(&previous.names).cloned().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for DependencySnapshot {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for DependencySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().collect();
        write!(f, "{{{}}}", names.join(", "))
    }
}

/// Reduce a requirement string to its bare distribution name.
///
/// Returns `None` for entries that are empty once trimmed.
pub fn normalize_dependency(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let name = match trimmed.find(NAME_TERMINATORS) {
        Some(idx) => &trimmed[..idx],
        None => trimmed,
    };
    let name = name.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Parse manifest `contents` and extract the names under `section`.
///
/// `section` is a dotted key path. An array contributes its string entries;
/// a table (Poetry style) contributes its keys, minus the `python` pin.
///
/// A blank document or an absent section is an error, not an empty set:
/// editors often truncate before writing, and that intermediate state must
/// not look like every dependency was removed. An explicit `dev = []` is a
/// real, empty declaration.
pub fn parse_manifest(path: &Path, contents: &str, section: &str) -> Result<DependencySnapshot> {
    if contents.trim().is_empty() {
        return Err(GuardianError::ManifestParse {
            path: path.to_path_buf(),
            message: "manifest is empty".to_string(),
        });
    }

    let missing = || GuardianError::ManifestSectionMissing {
        path: path.to_path_buf(),
        section: section.to_string(),
    };

    let doc: toml::Table = toml::from_str(contents).map_err(|e| GuardianError::ManifestParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut keys = section.split('.').filter(|k| !k.is_empty());
    let first = keys.next().ok_or_else(missing)?;

    let mut value = doc.get(first).ok_or_else(missing)?;
    for key in keys {
        value = value.get(key).ok_or_else(missing)?;
    }

    match value {
        toml::Value::Array(items) => Ok(items
            .iter()
            .filter_map(toml::Value::as_str)
            .filter_map(normalize_dependency)
            .collect()),
        toml::Value::Table(table) => Ok(table
            .keys()
            .filter(|k| k.as_str() != "python")
            .filter_map(|k| normalize_dependency(k))
            .collect()),
        _ => Err(GuardianError::ManifestSection {
            path: path.to_path_buf(),
            section: section.to_string(),
        }),
    }
}
