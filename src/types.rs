// src/types.rs

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

/// Category a watch root feeds when any file beneath it changes.
///
/// This is what users write in `[[root]] category = "..."`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RootCategory {
    Code,
    Docs,
    Manifest,
}

impl FromStr for RootCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "code" => Ok(RootCategory::Code),
            "docs" => Ok(RootCategory::Docs),
            "manifest" => Ok(RootCategory::Manifest),
            other => Err(format!(
                "invalid root category: {other} (expected \"code\", \"docs\" or \"manifest\")"
            )),
        }
    }
}

impl fmt::Display for RootCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RootCategory::Code => "code",
            RootCategory::Docs => "docs",
            RootCategory::Manifest => "manifest",
        };
        f.write_str(s)
    }
}

/// Semantic classification of a single filesystem change.
///
/// Selects which pipeline (if any) runs for the change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Code,
    Docs,
    Manifest,
    Ignored,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Category::Code => "code",
            Category::Docs => "docs",
            Category::Manifest => "manifest",
            Category::Ignored => "ignored",
        };
        f.write_str(s)
    }
}

/// Kind of mutation reported by the notification source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Created,
    Modified,
    Deleted,
    Moved,
}

/// A directory Guardian subscribes to, plus the category its files feed.
///
/// Built once at startup from configuration and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WatchRoot {
    pub path: PathBuf,
    pub recursive: bool,
    pub category: RootCategory,
}

impl WatchRoot {
    pub fn new(path: impl Into<PathBuf>, recursive: bool, category: RootCategory) -> Self {
        Self {
            path: path.into(),
            recursive,
            category,
        }
    }

    /// Whether `path` lives under this root, honouring the `recursive` flag.
    ///
    /// Non-recursive roots only contain their direct children.
    pub fn contains(&self, path: &Path) -> bool {
        match path.strip_prefix(&self.path) {
            Ok(rel) => {
                let depth = rel.components().count();
                depth >= 1 && (self.recursive || depth == 1)
            }
            Err(_) => false,
        }
    }
}

/// One filesystem change, as handed from the watcher to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub path: PathBuf,
    pub kind: EventKind,
    pub root: WatchRoot,
    /// True when the path referred to a directory at the time of the event.
    pub is_dir: bool,
}

impl RawEvent {
    pub fn new(path: impl Into<PathBuf>, kind: EventKind, root: WatchRoot) -> Self {
        Self {
            path: path.into(),
            kind,
            root,
            is_dir: false,
        }
    }

    pub fn directory(mut self) -> Self {
        self.is_dir = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recursive_root_contains_nested_files() {
        let root = WatchRoot::new("/proj/src", true, RootCategory::Code);
        assert!(root.contains(Path::new("/proj/src/a.py")));
        assert!(root.contains(Path::new("/proj/src/pkg/deep/b.py")));
        assert!(!root.contains(Path::new("/proj/src")));
        assert!(!root.contains(Path::new("/proj/docs/a.md")));
    }

    #[test]
    fn flat_root_only_contains_direct_children() {
        let root = WatchRoot::new("/proj", false, RootCategory::Manifest);
        assert!(root.contains(Path::new("/proj/pyproject.toml")));
        assert!(!root.contains(Path::new("/proj/src/a.py")));
    }

    #[test]
    fn root_category_parses_case_insensitively() {
        assert_eq!("Docs".parse::<RootCategory>(), Ok(RootCategory::Docs));
        assert!("tests".parse::<RootCategory>().is_err());
    }
}
