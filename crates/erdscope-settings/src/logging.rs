//! Logging setup
//!
//! Pretty console output while developing and daily-rotated JSON files for
//! bug reports. `RUST_LOG` overrides the configured filter.
//!
//! Schema streams run inside a `schema_stream` span carrying the stream mode
//! and target; the JSON files record it with every event.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::settings_file::logs_dir;

const LOG_FILE_PREFIX: &str = "erdscope.log";

/// Crates whose events are raised above the base level
pub const ERDSCOPE_CRATES: &[&str] = &[
    "erdscope_core",
    "erdscope_schema",
    "erdscope_diagram",
    "erdscope_settings",
];

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// `base` for everything, `level` for the erdscope crates
pub fn crate_filter(base: &str, level: &str) -> String {
    std::iter::once(base.to_string())
        .chain(ERDSCOPE_CRATES.iter().map(|krate| format!("{krate}={level}")))
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Directory of the rolling JSON files
    pub log_dir: PathBuf,

    pub file_logs: bool,

    pub console_logs: bool,

    /// Whether to include file/line information in console output
    pub include_location: bool,

    /// Log stream spans opening and closing
    pub span_events: bool,

    /// Filter used when `RUST_LOG` is not set
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::development()
    }
}

impl LoggingConfig {
    /// JSON files only, erdscope events from `info`
    pub fn production() -> Self {
        Self {
            log_dir: default_log_dir(),
            file_logs: true,
            console_logs: false,
            include_location: false,
            span_events: false,
            filter: crate_filter("warn", "info"),
        }
    }

    /// Console and files, erdscope events from `debug`
    pub fn development() -> Self {
        Self {
            log_dir: default_log_dir(),
            file_logs: true,
            console_logs: true,
            include_location: true,
            span_events: true,
            filter: crate_filter("info", "debug"),
        }
    }

    /// Console only, no files
    pub fn testing() -> Self {
        Self {
            log_dir: std::env::temp_dir().join("erdscope-tests"),
            file_logs: false,
            console_logs: true,
            include_location: true,
            span_events: false,
            filter: crate_filter("warn", "debug"),
        }
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    /// Write files to `dir`, enabling file logs
    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = dir.into();
        self.file_logs = true;
        self
    }

    pub fn with_console(mut self, enabled: bool) -> Self {
        self.console_logs = enabled;
        self
    }

    fn env_filter(&self) -> Result<EnvFilter> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(&self.filter)
                .with_context(|| format!("Invalid log filter: {}", self.filter)),
        }
    }
}

/// Keeps the file writer alive; pending lines are flushed on drop
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard {
    file: Option<WorkerGuard>,
}

impl LoggingGuard {
    pub fn writes_files(&self) -> bool {
        self.file.is_some()
    }
}

/// Install the global subscriber.
///
/// Fails if a global subscriber is already set.
pub fn init(config: LoggingConfig) -> Result<LoggingGuard> {
    let (layers, guard) = build_layers(&config)?;

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .context("A global tracing subscriber is already installed")?;

    tracing::info!(
        log_dir = %config.log_dir.display(),
        files = config.file_logs,
        console = config.console_logs,
        "logging initialized"
    );

    Ok(guard)
}

/// Development preset in debug builds, production otherwise
pub fn init_default() -> Result<LoggingGuard> {
    let config = if cfg!(debug_assertions) {
        LoggingConfig::development()
    } else {
        LoggingConfig::production()
    };

    init(config)
}

fn build_layers(config: &LoggingConfig) -> Result<(Vec<BoxedLayer>, LoggingGuard)> {
    let span_events = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let mut layers = Vec::new();

    if config.console_logs {
        layers.push(
            fmt::layer()
                .with_target(true)
                .with_file(config.include_location)
                .with_line_number(config.include_location)
                .with_span_events(span_events.clone())
                .pretty()
                .with_filter(config.env_filter()?)
                .boxed(),
        );
    }

    let mut file_guard = None;
    if config.file_logs {
        std::fs::create_dir_all(&config.log_dir)
            .with_context(|| format!("Failed to create log directory: {:?}", config.log_dir))?;
        let appender = tracing_appender::rolling::daily(&config.log_dir, LOG_FILE_PREFIX);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        file_guard = Some(guard);

        layers.push(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_span_events(span_events)
                .with_ansi(false)
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_writer(writer)
                .with_filter(config.env_filter()?)
                .boxed(),
        );
    }

    Ok((layers, LoggingGuard { file: file_guard }))
}

fn default_log_dir() -> PathBuf {
    logs_dir().unwrap_or_else(|_| std::env::temp_dir().join("erdscope").join("logs"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crate_filter_covers_every_crate() {
        let filter = crate_filter("warn", "debug");
        assert!(filter.starts_with("warn,"));
        for krate in ERDSCOPE_CRATES {
            assert!(filter.contains(&format!("{krate}=debug")));
        }
        assert!(EnvFilter::try_new(&filter).is_ok());
    }

    #[test]
    fn test_presets() {
        let production = LoggingConfig::production();
        assert!(!production.console_logs);
        assert!(production.file_logs);
        assert_eq!(production.filter, crate_filter("warn", "info"));

        let testing = LoggingConfig::testing();
        assert!(!testing.file_logs);
        assert!(testing.console_logs);

        let custom = LoggingConfig::testing().with_log_dir("/tmp/erdscope-logs");
        assert!(custom.file_logs);
        assert_eq!(custom.log_dir, PathBuf::from("/tmp/erdscope-logs"));
    }

    #[test]
    fn test_invalid_filter_is_an_error() {
        let config = LoggingConfig::testing().with_filter("erdscope_schema=loud");
        if std::env::var_os("RUST_LOG").is_none() {
            assert!(build_layers(&config).is_err());
        }
    }

    #[test]
    fn test_file_layer_writes_stream_spans() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggingConfig::testing()
            .with_console(false)
            .with_log_dir(dir.path())
            .with_filter("trace");
        let (layers, guard) = build_layers(&config).unwrap();
        assert!(guard.writes_files());

        tracing::subscriber::with_default(tracing_subscriber::registry().with(layers), || {
            let span = tracing::info_span!("schema_stream", mode = "table", target = "public.orders");
            let _entered = span.enter();
            tracing::info!(table = "public.orders", "discovering table");
        });
        drop(guard);

        let logged: String = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(LOG_FILE_PREFIX))
            .map(|entry| std::fs::read_to_string(entry.path()).unwrap())
            .collect();
        assert!(logged.contains("discovering table"));
        assert!(logged.contains("schema_stream"));
        assert!(logged.contains("public.orders"));
    }

    #[test]
    fn test_init_installs_subscriber_once() {
        let guard = init(LoggingConfig::testing()).unwrap();
        assert!(!guard.writes_files());
        assert!(init(LoggingConfig::testing()).is_err());
    }
}
