// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! Each struct maps to a section of `synapse_cache.toml`. Missing sections and
//! keys fall back to their defaults.

use serde::{Deserialize, Serialize};

/// Name of the configuration file searched for on disk
pub const CONFIG_FILE_NAME: &str = "synapse_cache.toml";

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SynapseCacheConfig {
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

/// Cache construction defaults
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Preferred column alignment in bytes
    pub column_alignment: usize,
    /// Tiers loaded at construction: "none", "attributes", "positions", "all"
    /// or a `|`-joined combination
    pub default_prefetch: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            column_alignment: 32,
            default_prefetch: "none".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
