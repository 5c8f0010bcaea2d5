//! Logging infrastructure
//!
//! The engine only emits `tracing` events (target `argmarshal`). Hosts that
//! want them rendered call [`init`] once with the `[logging]` section of the
//! configuration.

use crate::config::{LogLevel, LoggingConfig};
use once_cell::sync::OnceCell;
use std::path::Path;
use tracing::Level;
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Global logging state
static LOGGER_INITIALIZED: OnceCell<()> = OnceCell::new();

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

/// Install the global subscriber
///
/// Returns the appender guard, which must be kept alive until exit so
/// buffered lines are flushed. Returns `None` if logging was already set up,
/// here or by the host.
pub fn init(config: &LoggingConfig) -> Option<WorkerGuard> {
    if is_initialized() {
        return None;
    }

    let (writer, guard) = match &config.file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "argmarshal.log".to_string());
            tracing_appender::non_blocking(rolling::never(dir, file_name))
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    let span_events = span_events_config(config.spans);
    let layer = if config.json {
        fmt::layer()
            .with_writer(writer)
            .json()
            .with_span_events(span_events)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(writer)
            .compact()
            .with_span_events(span_events)
            .with_target(true)
            .boxed()
    };

    let installed = tracing_subscriber::registry()
        .with(build_filter(config.level))
        .with(layer)
        .try_init()
        .is_ok();

    LOGGER_INITIALIZED.get_or_init(|| ());
    installed.then_some(guard)
}

/// Check if logging is initialized
pub fn is_initialized() -> bool {
    LOGGER_INITIALIZED.get().is_some()
}

fn build_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(level)))
}

fn default_directive(level: LogLevel) -> String {
    format!("argmarshal={}", level.as_str())
}

fn span_events_config(enabled: bool) -> FmtSpan {
    if enabled {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    }
}
