//! Console and file logging
//!
//! The console gets a compact, tiered layout from [`CleanFormatter`]; the
//! optional log file receives plain, timestamped records of everything
//! that passes the level filter.

mod filters;
mod formatter;

pub use filters::{is_error_line, is_noise};
pub use formatter::{CleanFormatter, Tier};

use crate::utils::{Error, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing::{Level, Subscriber};
use tracing_subscriber::{
    fmt,
    layer::{Layer, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter,
};

pub const LOG_FILE_NAME: &str = "encoding.log";

pub fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

fn level_filter(level: &str) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(parse_level(level).into())
        .from_env_lossy()
}

fn console_layer<S>(show_timestamps: bool, colored: bool) -> impl Layer<S> + Send + Sync
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_target(false)
        .with_level(false)
        .event_format(CleanFormatter::new(show_timestamps, colored))
}

/// Console-only subscriber for the window before the configuration is
/// known. Meant for `tracing::subscriber::with_default`.
pub fn startup_subscriber(level: &str, colored: bool) -> impl Subscriber + Send + Sync {
    tracing_subscriber::registry()
        .with(level_filter(level))
        .with(console_layer(false, colored))
}

/// Installs the global subscriber. `RUST_LOG` overrides `level`.
///
/// When `log_file` is given, records are appended to it without colour.
pub fn setup_logging(
    level: &str,
    show_timestamps: bool,
    colored: bool,
    log_file: Option<&Path>,
) -> Result<()> {
    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(level_filter(level))
        .with(console_layer(show_timestamps, colored))
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::validation(format!("Failed to install logger: {}", e)))
}
