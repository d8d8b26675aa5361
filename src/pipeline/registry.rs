// src/pipeline/registry.rs

use std::time::Duration;

use crate::pipeline::command::{CommandSpec, Placeholders};
use crate::types::Category;

/// Static table from [`Category`] to the ordered commands it runs.
///
/// `Manifest` has no generic pipeline: it owns the per-dependency template
/// instead, which the orchestrator renders once per newly added name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineRegistry {
    code: Vec<CommandSpec>,
    docs: Vec<CommandSpec>,
    dependency: Option<CommandSpec>,
}

impl PipelineRegistry {
    pub fn new(
        code: Vec<CommandSpec>,
        docs: Vec<CommandSpec>,
        dependency: Option<CommandSpec>,
    ) -> Self {
        Self {
            code,
            docs,
            dependency,
        }
    }

    /// Commands to run, strictly in order, for an event of this category.
    pub fn pipeline_for(&self, category: Category) -> &[CommandSpec] {
        match category {
            Category::Code => &self.code,
            Category::Docs => &self.docs,
            Category::Manifest | Category::Ignored => &[],
        }
    }

    /// The unrendered per-dependency template, if one is configured.
    pub fn dependency_template(&self) -> Option<&CommandSpec> {
        self.dependency.as_ref()
    }

    /// The per-dependency command rendered for `name`.
    pub fn dependency_command(&self, name: &str) -> Option<CommandSpec> {
        self.dependency
            .as_ref()
            .map(|tpl| tpl.render(&Placeholders::for_dependency(name)))
    }
}

impl Default for PipelineRegistry {
    /// Python project layout: ruff, black, pytest, mkdocs.
    fn default() -> Self {
        Self {
            code: default_code_pipeline(),
            docs: default_docs_pipeline(),
            dependency: Some(default_dependency_command()),
        }
    }
}

pub fn default_code_pipeline() -> Vec<CommandSpec> {
    vec![
        CommandSpec::new("lint", ["ruff", "check", "--fix", "."]),
        CommandSpec::new("format", ["black", "."]),
        // pytest exits 5 when no tests were collected.
        CommandSpec::new("test", ["pytest"])
            .with_benign_exit_codes([5])
            .with_timeout(Duration::from_secs(30 * 60)),
    ]
}

pub fn default_docs_pipeline() -> Vec<CommandSpec> {
    vec![CommandSpec::new("docs", ["mkdocs", "build"])]
}

pub fn default_dependency_command() -> CommandSpec {
    CommandSpec::new(
        "generate-api-docs",
        ["python", "scripts/generate_api_docs.py", "{dependency}"],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_code_pipeline_is_lint_format_test() {
        let reg = PipelineRegistry::default();
        let labels: Vec<_> = reg
            .pipeline_for(Category::Code)
            .iter()
            .map(|c| c.label.as_str())
            .collect();
        assert_eq!(labels, vec!["lint", "format", "test"]);
    }

    #[test]
    fn manifest_and_ignored_have_no_generic_pipeline() {
        let reg = PipelineRegistry::default();
        assert!(reg.pipeline_for(Category::Manifest).is_empty());
        assert!(reg.pipeline_for(Category::Ignored).is_empty());
    }

    #[test]
    fn dependency_command_is_rendered_per_name() {
        let reg = PipelineRegistry::default();
        let cmd = reg.dependency_command("mkdocstrings").unwrap();
        assert_eq!(
            cmd.argv,
            vec!["python", "scripts/generate_api_docs.py", "mkdocstrings"]
        );
    }
}
