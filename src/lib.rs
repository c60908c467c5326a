// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # synapse-cache
//!
//! Columnar cache of the synapses of a set of neurons. Connectivity (pre/post
//! GIDs), per-synapse attributes and spatial positions are separate tiers;
//! each is read from a [`cache::RecordSource`] once, on first use, and then
//! shared by every clone of the handle across threads.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! synapse-cache = "0.1"
//! ```
//!
//! ## Feature Flags
//!
//! - **`observability`** (default): logging initialisation and debug flags
//! - **`file-logging`**: per-run log folders
//! - **`lock-tracing`**: log slow cache lock waits and holds
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use synapse_cache::prelude::*;
//!
//! let source = InMemorySource::new()
//!     .with_connectivity(1, vec![ConnectivityRow::new(9, 0, 2)]);
//! let gids: GidSet = [1].into_iter().collect();
//!
//! let synapses = Synapses::with_config(
//!     Arc::new(source),
//!     gids,
//!     GidSet::new(),
//!     Direction::Afferent,
//!     &CacheConfig::default(),
//! )?;
//!
//! assert_eq!(synapses.pre_gids(), &[9, 9]);
//! // Attributes are read on first access; the source has none for GID 1
//! assert_eq!(synapses.delays()?, &[0.0, 0.0]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Foundation: synapse-cache-config                       │
//! │  (TOML file, env/CLI overrides, validation)             │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Cache: synapse-cache-core                              │
//! │  (RecordSource, tier loaders, Synapses handle)          │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Infrastructure: synapse-cache-observability            │
//! │  (tracing-subscriber setup, per-crate debug flags)      │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## License
//!
//! Apache-2.0

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use synapse_cache_config as config;
pub use synapse_cache_core as cache;

#[cfg(feature = "observability")]
pub use synapse_cache_observability as observability;

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::config::{load_config, validate_config, CacheConfig, SynapseCacheConfig};
    pub use crate::cache::{
        CacheError, ConnectivityRow, Direction, Gid, GidSet, InMemorySource, RecordSource,
        Synapse, SynapsePrefetch, Synapses, SynapsesStream,
    };

    #[cfg(feature = "observability")]
    pub use crate::observability::{init_logging, parse_debug_flags, CrateDebugFlags};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_facade_imports() {
        use crate::prelude::*;
        let _prefetch = SynapsePrefetch::NONE;
        let _config = CacheConfig::default();
    }
}
