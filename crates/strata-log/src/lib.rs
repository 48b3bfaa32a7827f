//! Structured logging and tracing for the terrain generator.
//!
//! Console output with uptime timestamps and module paths, plus JSON file
//! logging in debug builds for post-mortem analysis of long generation runs.
//!
//! Filter precedence: a valid `RUST_LOG`, then the config's
//! `debug.log_level`, then [`DEFAULT_FILTER`].

use std::fs::File;
use std::path::Path;

use strata_config::TerrainConfig;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when neither `RUST_LOG` nor the config names a level.
pub const DEFAULT_FILTER: &str = "info";

/// File name of the JSON log written in debug builds.
pub const LOG_FILE_NAME: &str = "strata.log";

/// Filter string derived from the config, ignoring `RUST_LOG`.
pub fn config_filter(config: Option<&TerrainConfig>) -> String {
    match config {
        Some(config) if !config.debug.log_level.trim().is_empty() => {
            config.debug.log_level.clone()
        }
        _ => DEFAULT_FILTER.to_string(),
    }
}

/// Resolve the active filter from an optional `RUST_LOG` value and the config.
///
/// Blank or unparsable directives fall through to the next source, so a typo
/// in either place still leaves logging enabled.
pub fn resolve_filter(env: Option<&str>, config: Option<&TerrainConfig>) -> EnvFilter {
    env.filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_new(config_filter(config)).ok())
        .unwrap_or_else(default_env_filter)
}

/// Create `log_dir` if needed and open a fresh [`LOG_FILE_NAME`] inside it.
pub fn open_log_file(log_dir: &Path) -> std::io::Result<File> {
    std::fs::create_dir_all(log_dir)?;
    File::create(log_dir.join(LOG_FILE_NAME))
}

/// Initialize the global tracing subscriber.
///
/// The JSON file layer is only attached when `debug_build` is set and
/// `log_dir` can be opened; otherwise logging is console-only.
///
/// Must be called at most once per process.
///
/// # Examples
///
/// ```no_run
/// use strata_config::TerrainConfig;
/// use strata_log::init_logging;
///
/// let config = TerrainConfig::default();
/// init_logging(Some(std::path::Path::new("./logs")), true, Some(&config));
/// ```
pub fn init_logging(log_dir: Option<&Path>, debug_build: bool, config: Option<&TerrainConfig>) {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = resolve_filter(env.as_deref(), config);

    let log_file = log_dir.filter(|_| debug_build).and_then(|dir| {
        open_log_file(dir)
            .map_err(|e| eprintln!("File logging disabled for {}: {e}", dir.display()))
            .ok()
    });
    let file_layer = log_file.map(|file| {
        fmt::layer()
            .json()
            .with_writer(file)
            .with_ansi(false)
            .with_timer(fmt::time::uptime())
    });

    // Rebuild workers are named, so thread names beat thread ids here.
    let console_layer = fmt::layer()
        .with_thread_names(true)
        .with_timer(fmt::time::uptime());

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();
}

/// Create an `EnvFilter` with the default filter string.
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new(DEFAULT_FILTER)
}
