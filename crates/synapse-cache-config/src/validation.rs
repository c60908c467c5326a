// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Checks value ranges and recognised names. All problems are collected and
//! reported together.

use crate::{ConfigError, ConfigResult, SynapseCacheConfig};

/// Smallest and largest accepted column alignment in bytes
pub const MIN_COLUMN_ALIGNMENT: usize = 8;
pub const MAX_COLUMN_ALIGNMENT: usize = 4096;

const PREFETCH_NAMES: [&str; 4] = ["none", "attributes", "positions", "all"];
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    InvalidAlignment { alignment: usize },
    UnknownPrefetch { value: String },
    UnknownLogLevel { value: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidAlignment { alignment } => write!(
                f,
                "cache.column_alignment = {} must be a power of two in {}-{}",
                alignment, MIN_COLUMN_ALIGNMENT, MAX_COLUMN_ALIGNMENT
            ),
            Self::UnknownPrefetch { value } => write!(
                f,
                "cache.default_prefetch = '{}' is not a combination of {}",
                value,
                PREFETCH_NAMES.join(", ")
            ),
            Self::UnknownLogLevel { value } => write!(
                f,
                "logging.level = '{}' must be one of {}",
                value,
                LOG_LEVELS.join(", ")
            ),
        }
    }
}

/// Validate the complete configuration
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every problem found
pub fn validate_config(config: &SynapseCacheConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    let alignment = config.cache.column_alignment;
    if !alignment.is_power_of_two()
        || !(MIN_COLUMN_ALIGNMENT..=MAX_COLUMN_ALIGNMENT).contains(&alignment)
    {
        errors.push(ConfigValidationError::InvalidAlignment { alignment });
    }

    if !is_prefetch_name(&config.cache.default_prefetch) {
        errors.push(ConfigValidationError::UnknownPrefetch {
            value: config.cache.default_prefetch.clone(),
        });
    }

    let level = config.logging.level.to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigValidationError::UnknownLogLevel {
            value: config.logging.level.clone(),
        });
    }

    if errors.is_empty() {
        return Ok(());
    }

    let error_messages = errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n");
    Err(ConfigError::ValidationError(format!(
        "Configuration validation failed:\n{}",
        error_messages
    )))
}

/// `|`-separated prefetch names, case-insensitive
fn is_prefetch_name(value: &str) -> bool {
    value.split('|').all(|part| {
        let part = part.trim().to_lowercase();
        PREFETCH_NAMES.contains(&part.as_str())
    })
}
