//! Logging setup for RSS Bot.
//!
//! Both binaries log to stdout. Setting `[logging] file` adds a plain-text
//! copy appended to that file, so cron runs of the updater accumulate in one
//! place.

use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::Result;

/// Dependencies that are only interesting when something goes wrong.
const QUIET_TARGETS: [&str; 4] = ["sqlx=warn", "hyper=warn", "reqwest=warn", "html5ever=warn"];

/// Map a level name to a tracing level. Unknown names fall back to info.
fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" | "critical" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// `RUST_LOG` directives first, then the configured level, then the quiet
/// dependency targets.
fn build_filter(level: &str) -> EnvFilter {
    QUIET_TARGETS
        .iter()
        .filter_map(|target| target.parse::<Directive>().ok())
        .fold(
            EnvFilter::from_default_env().add_directive(parse_level(level).into()),
            EnvFilter::add_directive,
        )
}

/// Open `path` for appending, creating missing parent directories.
fn open_log_file(path: &str) -> Result<File> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

/// Install the global subscriber described by `config`.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let file_layer = match &config.file {
        Some(path) => Some(
            fmt::layer()
                .with_writer(Arc::new(open_log_file(path)?))
                .with_ansi(false)
                .with_target(true),
        ),
        None => None,
    };

    tracing_subscriber::registry()
        .with(build_filter(&config.level))
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .init();

    Ok(())
}

/// Install a stdout-only subscriber, used when the configuration could not
/// be applied.
pub fn init_console_only(level: &str) {
    tracing_subscriber::registry()
        .with(build_filter(level))
        .with(fmt::layer().with_target(true))
        .init();
}
