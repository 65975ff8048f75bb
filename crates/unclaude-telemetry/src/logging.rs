//! Logging setup (spec §6 [AMBIENT] Logging).
//!
//! The daemon and CLI binaries call [`setup_logging`] exactly once at
//! startup; library crates never install a subscriber, they only emit
//! `tracing::{info,warn,error,debug}!` events.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use crate::error::{TelemetryError, TelemetryResult};

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Single-line, human-readable (default for interactive use).
    #[default]
    Compact,
    /// Multi-line, human-readable with span context.
    Pretty,
    /// One JSON object per line, for ingestion by log pipelines.
    Json,
}

/// Where log output is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogTarget {
    /// Standard error (default).
    #[default]
    Stderr,
    /// Standard output.
    Stdout,
}

/// Logging configuration, built from `config.yaml`'s `logging` section or
/// CLI flags.
#[derive(Debug, Clone)]
pub struct LogConfig {
    level: String,
    format: LogFormat,
    target: LogTarget,
    directives: Vec<String>,
}

impl LogConfig {
    /// Start a config at the given base level (`"trace"`, `"debug"`,
    /// `"info"`, `"warn"`, `"error"`).
    #[must_use]
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            format: LogFormat::default(),
            target: LogTarget::default(),
            directives: Vec::new(),
        }
    }

    /// Set the output format.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the output target.
    #[must_use]
    pub fn with_target(mut self, target: LogTarget) -> Self {
        self.target = target;
        self
    }

    /// Add a per-target directive, e.g. `"unclaude_daemon=trace"`.
    #[must_use]
    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    fn build_filter(&self) -> TelemetryResult<EnvFilter> {
        let mut spec = self.level.clone();
        for directive in &self.directives {
            spec.push(',');
            spec.push_str(directive);
        }
        EnvFilter::try_new(spec).map_err(|e| TelemetryError::InvalidFilter(e.to_string()))
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new("info")
    }
}

/// Install the global `tracing` subscriber from `config`.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] if a directive fails to parse.
/// Does not error if a subscriber is already installed (idempotent no-op,
/// since the daemon and its watchers/proactive engine may each call this
/// during startup in test harnesses).
pub fn setup_logging(config: &LogConfig) -> TelemetryResult<()> {
    let filter = config.build_filter()?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE);

    let writer_stdout = matches!(config.target, LogTarget::Stdout);

    let result = match (config.format, writer_stdout) {
        (LogFormat::Json, true) => builder.json().with_writer(std::io::stdout).try_init(),
        (LogFormat::Json, false) => builder.json().with_writer(std::io::stderr).try_init(),
        (LogFormat::Pretty, true) => builder.pretty().with_writer(std::io::stdout).try_init(),
        (LogFormat::Pretty, false) => builder.pretty().with_writer(std::io::stderr).try_init(),
        (LogFormat::Compact, true) => builder.compact().with_writer(std::io::stdout).try_init(),
        (LogFormat::Compact, false) => builder.compact().with_writer(std::io::stderr).try_init(),
    };

    // A second init attempt (e.g. in tests that run multiple daemons in one
    // process) is tolerated rather than treated as fatal.
    let _ = result;
    Ok(())
}

/// Install logging with sensible defaults (`info` level, compact, stderr).
///
/// # Errors
///
/// Propagates [`setup_logging`] errors.
pub fn setup_default_logging() -> TelemetryResult<()> {
    setup_logging(&LogConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_filter_with_directives() {
        let config = LogConfig::new("info").with_directive("unclaude_daemon=debug");
        assert!(config.build_filter().is_ok());
    }

    #[test]
    fn rejects_malformed_directive() {
        let config = LogConfig::new("info").with_directive("not a valid directive===");
        assert!(config.build_filter().is_err());
    }
}
