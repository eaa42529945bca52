//! Console and file logging (SPEC_FULL.md §2's ambient logging section),
//! modeled on `streamkit-server`'s `init_logging` layer stack with the
//! OpenTelemetry layer trimmed — mediad has no metrics backend in scope.

use std::error::Error;
use std::path::Path;

use tracing_appender::non_blocking::NonBlocking;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::config::{LogConfig, LogFormat};

type DynLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

fn env_filter_or(default_level: tracing::Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level.as_str()))
}

fn console_layer(level: tracing::Level) -> DynLayer {
    tracing_subscriber::fmt::layer().with_filter(env_filter_or(level)).boxed()
}

fn file_layer(writer: NonBlocking, level: tracing::Level, format: LogFormat) -> DynLayer {
    let layer = tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false);
    match format {
        LogFormat::Json => layer.json().with_filter(env_filter_or(level)).boxed(),
        LogFormat::Text => layer.with_filter(env_filter_or(level)).boxed(),
    }
}

/// Installs the global `tracing` subscriber. Returns the file appender's
/// guard (if file logging is enabled) — the caller must hold onto it for
/// the life of the process, or buffered log lines are dropped unflushed.
pub fn init_logging(
    log_config: &LogConfig,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>, Box<dyn Error>> {
    let mut layers: Vec<DynLayer> = Vec::new();
    let mut guard = None;

    if log_config.file_enable {
        let log_path = Path::new(&log_config.file_path);
        let log_dir = log_path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
        let log_filename = log_path.file_name().unwrap_or_else(|| std::ffi::OsStr::new("mediad.log"));

        std::fs::create_dir_all(log_dir)
            .map_err(|e| format!("failed to create log directory {}: {e}", log_dir.display()))?;

        let appender = tracing_appender::rolling::never(log_dir, log_filename);
        let (non_blocking, file_guard) = tracing_appender::non_blocking(appender);
        guard = Some(file_guard);
        layers.push(file_layer(non_blocking, log_config.file_level.into(), log_config.file_format));
    }

    if log_config.console_enable {
        layers.push(console_layer(log_config.console_level.into()));
    }

    if layers.is_empty() {
        layers.push(console_layer(tracing::Level::INFO));
    }

    tracing_subscriber::registry().with(layers).try_init()?;

    if !log_config.console_enable && !log_config.file_enable {
        tracing::warn!("both console and file logging are disabled in config; falling back to console logging");
    }

    Ok(guard)
}
