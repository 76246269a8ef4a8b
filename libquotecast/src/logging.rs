//! Logging setup shared by `quote-send` and `quote-queue`
//!
//! Everything is written to stderr: `quote-send` prints tick summaries on
//! stdout and `quote-queue` prints command output there, so neither may be
//! interleaved with log lines.
//!
//! The format and level come from `QUOTECAST_LOG_FORMAT` and
//! `QUOTECAST_LOG_LEVEL`; `RUST_LOG`, when set, replaces the computed
//! filter entirely.
//!
//! ```no_run
//! use libquotecast::logging::LoggingConfig;
//!
//! // Daemon: info by default, debug with --verbose
//! LoggingConfig::from_env("info", false).init();
//! ```

use std::str::FromStr;
use tracing_subscriber::EnvFilter;

/// Crates whose debug output drowns the engine's own events
const NOISY_TARGETS: &[&str] = &["sqlx", "hyper", "hyper_util", "reqwest", "h2", "rustls"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One plain line per event
    #[default]
    Text,
    /// One JSON object per event, with the active `auto_post` span fields
    Json,
    /// Multi-line, colored
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            _ => Err(format!(
                "Invalid log format: '{}'. Valid options: text, json, pretty",
                s
            )),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            LogFormat::Text => "text",
            LogFormat::Json => "json",
            LogFormat::Pretty => "pretty",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Level for quotecast's own events: error, warn, info, debug or trace
    pub level: String,
    /// Raises the level to debug
    pub verbose: bool,
}

impl LoggingConfig {
    pub fn new(format: LogFormat, level: impl Into<String>, verbose: bool) -> Self {
        Self {
            format,
            level: level.into(),
            verbose,
        }
    }

    /// Read `QUOTECAST_LOG_FORMAT` and `QUOTECAST_LOG_LEVEL`
    ///
    /// Unset or unparseable values fall back to text output at
    /// `default_level`.
    pub fn from_env(default_level: &str, verbose: bool) -> Self {
        let format = std::env::var("QUOTECAST_LOG_FORMAT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default();
        let level = std::env::var("QUOTECAST_LOG_LEVEL")
            .ok()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| default_level.to_string());

        Self::new(format, level, verbose)
    }

    /// Filter directives used when `RUST_LOG` is not set
    ///
    /// HTTP and SQL internals stay at `warn` unless the requested level is
    /// `trace`.
    pub fn directives(&self) -> String {
        let level = if self.verbose {
            "debug"
        } else {
            self.level.trim()
        };

        if level.eq_ignore_ascii_case("trace") {
            return level.to_string();
        }

        let mut directives = vec![level.to_string()];
        directives.extend(NOISY_TARGETS.iter().map(|target| format!("{}=warn", target)));
        directives.join(",")
    }

    /// Install the global subscriber; a second call leaves the first in place
    pub fn init(&self) {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(self.directives()))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let result = match self.format {
            LogFormat::Json => tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_current_span(true)
                .with_span_list(false)
                .flatten_event(true)
                .try_init(),
            LogFormat::Pretty => tracing_subscriber::fmt()
                .pretty()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_line_number(true)
                .try_init(),
            LogFormat::Text => tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .with_target(false)
                .try_init(),
        };

        if result.is_err() {
            tracing::debug!("logging already initialized");
        }
    }
}

/// Daemon defaults: `info` unless the environment says otherwise
pub fn init_default(verbose: bool) {
    LoggingConfig::from_env("info", verbose).init();
}
