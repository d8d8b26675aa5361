// src/logging.rs

//! Diagnostic logging on STDERR via `tracing-subscriber`'s `EnvFilter`.
//!
//! Filter resolution:
//! 1. `--log-level` sets one global level.
//! 2. Otherwise `GUARDIAN_LOG` is read as filter directives, so both
//!    `debug` and `guardian::watch=trace,notify=warn` work. `warning` is
//!    accepted as an alias for `warn`.
//! 3. Otherwise, or when the directives do not parse, `info`.
//!
//! STDOUT is reserved for the command report.

use anyhow::{anyhow, Result};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::cli::LogLevel;

pub const LOG_ENV: &str = "GUARDIAN_LOG";
const DEFAULT_DIRECTIVE: &str = "info";

/// Filter chosen for this run, plus the rejected `GUARDIAN_LOG` value if any.
#[derive(Debug)]
pub struct LogFilter {
    pub filter: EnvFilter,
    pub rejected: Option<String>,
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV).ok();
    let LogFilter { filter, rejected } = build_filter(cli_level, env.as_deref());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to initialise logging: {e}"))?;

    if let Some(value) = rejected {
        warn!(%value, "ignoring unparsable {LOG_ENV}; using `{DEFAULT_DIRECTIVE}`");
    }
    Ok(())
}

pub fn build_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> LogFilter {
    if let Some(level) = cli_level {
        return LogFilter {
            filter: EnvFilter::new(level_directive(level)),
            rejected: None,
        };
    }

    let Some(raw) = env.map(str::trim).filter(|s| !s.is_empty()) else {
        return LogFilter {
            filter: EnvFilter::new(DEFAULT_DIRECTIVE),
            rejected: None,
        };
    };

    let directives = normalize_directives(raw);
    match EnvFilter::try_new(&directives) {
        Ok(filter) => LogFilter {
            filter,
            rejected: None,
        },
        Err(_) => LogFilter {
            filter: EnvFilter::new(DEFAULT_DIRECTIVE),
            rejected: Some(raw.to_string()),
        },
    }
}

fn level_directive(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}

/// Lowercase bare levels and map `warning` to `warn`, per directive.
fn normalize_directives(raw: &str) -> String {
    raw.split(',')
        .map(|directive| {
            let directive = directive.trim();
            let (target, level) = match directive.rsplit_once('=') {
                Some((target, level)) => (Some(target), level),
                None => (None, directive),
            };
            let level = match level.to_ascii_lowercase().as_str() {
                "warning" => "warn".to_string(),
                other if is_level(other) => other.to_string(),
                _ => level.to_string(),
            };
            match target {
                Some(target) => format!("{target}={level}"),
                None => level,
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn is_level(s: &str) -> bool {
    matches!(s, "off" | "error" | "warn" | "info" | "debug" | "trace")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    fn max(f: &LogFilter) -> Option<LevelFilter> {
        f.filter.max_level_hint()
    }

    #[test]
    fn cli_level_wins_over_env() {
        let f = build_filter(Some(LogLevel::Trace), Some("error"));
        assert_eq!(max(&f), Some(LevelFilter::TRACE));
        assert!(f.rejected.is_none());
    }

    #[test]
    fn env_level_strings_are_lenient() {
        assert_eq!(max(&build_filter(None, Some(" WARNING "))), Some(LevelFilter::WARN));
        assert_eq!(max(&build_filter(None, Some("Debug"))), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn env_accepts_per_target_directives() {
        let f = build_filter(None, Some("guardian::watch=trace,notify=warning"));
        assert!(f.rejected.is_none());
        assert_eq!(max(&f), Some(LevelFilter::TRACE));
        assert_eq!(
            normalize_directives("guardian::watch=trace, notify=warning"),
            "guardian::watch=trace,notify=warn"
        );
    }

    #[test]
    fn unparsable_env_falls_back_to_info() {
        let f = build_filter(None, Some("guardian=loud"));
        assert_eq!(f.rejected.as_deref(), Some("guardian=loud"));
        assert_eq!(max(&f), Some(LevelFilter::INFO));

        let f = build_filter(None, Some("   "));
        assert!(f.rejected.is_none());
        assert_eq!(max(&f), Some(LevelFilter::INFO));
    }
}
