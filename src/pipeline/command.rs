// src/pipeline/command.rs

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Replaced with the changed file, relative to the project root.
pub const PATH_PLACEHOLDER: &str = "{path}";

/// Replaced with the name of a newly declared dependency.
pub const DEPENDENCY_PLACEHOLDER: &str = "{dependency}";

/// A single external command as configured, before or after rendering.
///
/// The argv is always passed to the OS as a vector; nothing here goes through
/// a shell, so paths containing spaces or quotes are safe to substitute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Human label, e.g. `"lint"`.
    pub label: String,
    /// Program followed by its arguments.
    pub argv: Vec<String>,
    /// Working directory override; `None` runs in the project root.
    pub cwd: Option<PathBuf>,
    /// Non-zero exit codes that count as success (reported distinctly).
    pub benign_exit_codes: Vec<i32>,
    /// Kill the process and record a timeout once this elapses.
    pub timeout: Option<Duration>,
}

impl CommandSpec {
    pub fn new<I, S>(label: impl Into<String>, argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            label: label.into(),
            argv: argv.into_iter().map(Into::into).collect(),
            cwd: None,
            benign_exit_codes: Vec::new(),
            timeout: None,
        }
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn with_benign_exit_codes(mut self, codes: impl IntoIterator<Item = i32>) -> Self {
        self.benign_exit_codes = codes.into_iter().collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn program(&self) -> Option<&str> {
        self.argv.first().map(String::as_str)
    }

    pub fn is_benign(&self, code: i32) -> bool {
        code != 0 && self.benign_exit_codes.contains(&code)
    }

    /// Substitute placeholders in every argument.
    ///
    /// Placeholders with no value are left untouched.
    pub fn render(&self, placeholders: &Placeholders) -> CommandSpec {
        let argv = self
            .argv
            .iter()
            .map(|arg| placeholders.apply(arg))
            .collect();

        CommandSpec {
            argv,
            ..self.clone()
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.argv.join(" "))
    }
}

/// Values substituted into a [`CommandSpec`] at dispatch time.
#[derive(Debug, Clone, Default)]
pub struct Placeholders {
    pub path: Option<String>,
    pub dependency: Option<String>,
}

impl Placeholders {
    pub fn for_path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            dependency: None,
        }
    }

    pub fn for_dependency(name: impl Into<String>) -> Self {
        Self {
            path: None,
            dependency: Some(name.into()),
        }
    }

    fn apply(&self, arg: &str) -> String {
        let mut out = arg.to_string();
        if let Some(ref path) = self.path {
            out = out.replace(PATH_PLACEHOLDER, path);
        }
        if let Some(ref dep) = self.dependency {
            out = out.replace(DEPENDENCY_PLACEHOLDER, dep);
        }
        out
    }
}
