// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Logging initialization
//!
//! Console logging is always available. With the `file-logging` feature each
//! run also gets a timestamped folder holding one log file per crate plus a
//! combined file.

use anyhow::{Context, Result};
use synapse_cache_config::LoggingConfig;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;

/// Filter combining the configured base level with per-crate debug flags
pub fn build_filter(debug_flags: &CrateDebugFlags, config: &LoggingConfig) -> Result<EnvFilter> {
    let directives = debug_flags.to_filter_string_with_base(&config.level);
    EnvFilter::try_new(&directives)
        .with_context(|| format!("Invalid log filter: {}", directives))
}

/// Install a console subscriber as the global default
///
/// # Errors
///
/// Fails if the filter cannot be parsed or a global subscriber is already set.
pub fn init_logging(debug_flags: &CrateDebugFlags, config: &LoggingConfig) -> Result<()> {
    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .with_filter(build_filter(debug_flags, config)?);

    Registry::default()
        .with(console_layer)
        .try_init()
        .context("Failed to install global tracing subscriber")
}

/// Install a console subscriber using the default logging config
pub fn init_logging_default(debug_flags: &CrateDebugFlags) -> Result<()> {
    init_logging(debug_flags, &LoggingConfig::default())
}

#[cfg(feature = "file-logging")]
pub use file::{init_file_logging, LoggingGuard};

#[cfg(feature = "file-logging")]
mod file {
    use std::path::{Path, PathBuf};

    use anyhow::{Context, Result};
    use chrono::{NaiveDateTime, Utc};
    use synapse_cache_config::LoggingConfig;
    use tracing_appender::non_blocking::WorkerGuard;
    use tracing_appender::rolling;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{EnvFilter, Layer, Registry};

    use super::build_filter;
    use crate::cli::CrateDebugFlags;

    const RUN_PREFIX: &str = "run_";
    const RUN_FORMAT: &str = "%Y%m%d_%H%M%S";

    /// Keeps the non-blocking writers alive; logs are flushed on drop
    pub struct LoggingGuard {
        _file_guards: Vec<WorkerGuard>,
        log_dir: PathBuf,
    }

    impl LoggingGuard {
        /// Folder of the current run
        pub fn log_dir(&self) -> &Path {
            &self.log_dir
        }
    }

    /// Console plus per-run file logging
    ///
    /// ```text
    /// ./logs/
    ///   └── run_20250101_120000/
    ///       ├── synapse-cache-core.log
    ///       ├── synapse-cache-config.log
    ///       └── synapse-cache.log (combined)
    /// ```
    ///
    /// * `log_dir` - Base directory for logs (default: `./logs`)
    /// * `retention_runs` - Keep N most recent runs (default: 10)
    pub fn init_file_logging(
        debug_flags: &CrateDebugFlags,
        config: &LoggingConfig,
        log_dir: Option<PathBuf>,
        retention_runs: Option<usize>,
    ) -> Result<LoggingGuard> {
        let base_log_dir = log_dir.unwrap_or_else(|| PathBuf::from("./logs"));

        let run_folder = base_log_dir.join(format!(
            "{}{}",
            RUN_PREFIX,
            Utc::now().format(RUN_FORMAT)
        ));
        std::fs::create_dir_all(&run_folder)
            .with_context(|| format!("Failed to create log directory: {}", run_folder.display()))?;

        cleanup_old_runs(&base_log_dir, retention_runs.unwrap_or(10))?;

        let mut layers = Vec::new();
        let mut file_guards = Vec::new();

        layers.push(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_filter(build_filter(debug_flags, config)?)
                .boxed(),
        );

        for crate_name in crate::KNOWN_CRATES {
            let appender = rolling::daily(&run_folder, format!("{}.log", crate_name));
            let (writer, guard) = tracing_appender::non_blocking(appender);
            file_guards.push(guard);

            let target = crate_name.replace('-', "_");
            let crate_filter = EnvFilter::try_new(format!("{}=debug,off", target))
                .with_context(|| format!("Invalid log filter for {}", crate_name))?;
            layers.push(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_filter(crate_filter)
                    .boxed(),
            );
        }

        let combined = rolling::daily(&run_folder, "synapse-cache.log");
        let (combined_writer, combined_guard) = tracing_appender::non_blocking(combined);
        file_guards.push(combined_guard);
        layers.push(
            tracing_subscriber::fmt::layer()
                .with_writer(combined_writer)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(build_filter(debug_flags, config)?)
                .boxed(),
        );

        Registry::default()
            .with(layers)
            .try_init()
            .context("Failed to install global tracing subscriber")?;

        Ok(LoggingGuard {
            _file_guards: file_guards,
            log_dir: run_folder,
        })
    }

    /// Remove all but the newest `retention_runs` run folders
    pub(crate) fn cleanup_old_runs(base_log_dir: &Path, retention_runs: usize) -> Result<()> {
        if !base_log_dir.exists() {
            return Ok(());
        }

        let mut runs: Vec<(PathBuf, NaiveDateTime)> = Vec::new();
        for entry in std::fs::read_dir(base_log_dir)? {
            let path = entry?.path();
            if !path.is_dir() {
                continue;
            }
            let stamp = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_prefix(RUN_PREFIX))
                .and_then(|s| NaiveDateTime::parse_from_str(s, RUN_FORMAT).ok());
            if let Some(stamp) = stamp {
                runs.push((path, stamp));
            }
        }

        // Oldest first
        runs.sort_by_key(|(_, stamp)| *stamp);

        let excess = runs.len().saturating_sub(retention_runs);
        for (path, _) in runs.iter().take(excess) {
            if let Err(e) = std::fs::remove_dir_all(path) {
                eprintln!(
                    "Warning: Failed to remove old log directory {}: {}",
                    path.display(),
                    e
                );
            }
        }

        Ok(())
    }

}
