// src/watch/classify.rs

//! Mapping from a raw filesystem change to a [`Category`].

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::types::{Category, RawEvent, RootCategory};

/// Pure classifier: the same event always yields the same category.
///
/// Rules, first match wins:
/// 1. directory events are ignored;
/// 2. the configured manifest path is `Manifest`;
/// 3. paths matching an ignore glob (relative to the project root) are ignored;
/// 4. a source extension under a `code` root is `Code`;
/// 5. a docs extension under a `docs` root is `Docs`;
/// 6. anything else is ignored.
#[derive(Debug, Clone)]
pub struct EventClassifier {
    project_root: PathBuf,
    manifest_path: PathBuf,
    source_extensions: Vec<String>,
    doc_extensions: Vec<String>,
    ignore: Option<GlobSet>,
}

impl EventClassifier {
    pub fn new(project_root: impl Into<PathBuf>, manifest_path: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            manifest_path: manifest_path.into(),
            source_extensions: vec!["py".to_string()],
            doc_extensions: vec!["md".to_string()],
            ignore: None,
        }
    }

    pub fn with_source_extensions<I, S>(mut self, exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.source_extensions = normalize_extensions(exts);
        self
    }

    pub fn with_doc_extensions<I, S>(mut self, exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.doc_extensions = normalize_extensions(exts);
        self
    }

    /// Compile ignore globs such as `**/__pycache__/**`.
    pub fn with_ignore_patterns(mut self, patterns: &[String]) -> Result<Self> {
        if patterns.is_empty() {
            self.ignore = None;
            return Ok(self);
        }

        let mut builder = GlobSetBuilder::new();
        for pat in patterns {
            let glob = Glob::new(pat).with_context(|| format!("invalid ignore pattern: {pat}"))?;
            builder.add(glob);
        }
        self.ignore = Some(builder.build().context("building ignore glob set")?);
        Ok(self)
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    pub fn classify(&self, event: &RawEvent) -> Category {
        if event.is_dir {
            return Category::Ignored;
        }

        if event.path == self.manifest_path {
            return Category::Manifest;
        }

        if let Some(ref ignore) = self.ignore {
            if ignore.is_match(self.relative_path(&event.path)) {
                return Category::Ignored;
            }
        }

        if !event.root.contains(&event.path) {
            return Category::Ignored;
        }

        match event.root.category {
            RootCategory::Code if has_extension(&event.path, &self.source_extensions) => {
                Category::Code
            }
            RootCategory::Docs if has_extension(&event.path, &self.doc_extensions) => {
                Category::Docs
            }
            _ => Category::Ignored,
        }
    }

    /// `path` relative to the project root with forward slashes, or the full
    /// path when it lives outside the project.
    pub fn relative_path(&self, path: &Path) -> String {
        let rel = path.strip_prefix(&self.project_root).unwrap_or(path);
        rel.to_string_lossy().replace('\\', "/")
    }
}

fn normalize_extensions<I, S>(exts: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    exts.into_iter()
        .map(|e| e.as_ref().trim().trim_start_matches('.').to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

fn has_extension(path: &Path, exts: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| exts.iter().any(|x| x.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}
