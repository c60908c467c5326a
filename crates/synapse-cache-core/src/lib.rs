// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Synapse Cache Core
//!
//! Lazily-populated, thread-safe, columnar cache of per-synapse data for a
//! requested set of neurons:
//! - **Connectivity**: pre/post GIDs
//! - **Attributes**: sections, segments, distances, delays, conductances, ...
//! - **Positions**: pre/post surface and center positions
//!
//! Each tier is loaded from a [`RecordSource`] either at construction (see
//! [`SynapsePrefetch`]) or on first access, at most once per cache, and is
//! immutable afterwards.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use synapse_cache_core::{
//!     ConnectivityRow, Direction, GidSet, InMemorySource, SynapsePrefetch, Synapses,
//! };
//!
//! let source = InMemorySource::new()
//!     .with_connectivity(1, vec![ConnectivityRow::new(9, 0, 1)])
//!     .with_connectivity(2, vec![ConnectivityRow::new(10, 0, 2)]);
//!
//! let synapses = Synapses::new(
//!     Arc::new(source),
//!     [1, 2].into_iter().collect(),
//!     GidSet::new(),
//!     Direction::Afferent,
//!     SynapsePrefetch::NONE,
//! )?;
//!
//! assert_eq!(synapses.pre_gids(), &[9, 10, 10]);
//! assert_eq!(synapses.post_gids(), &[1, 2, 2]);
//! # Ok::<(), synapse_cache_core::CacheError>(())
//! ```
//!
//! ## Features
//!
//! - `lock-tracing`: log lock waits and hold times of the cache lock

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod aligned;
pub mod cache;
pub mod columns;
pub mod error;
mod loader;
pub mod prefetch;
pub mod source;
pub mod stream;
pub mod synapses;
pub mod tracing_lock;
pub mod types;
pub mod view;

pub use aligned::{AlignedColumn, DEFAULT_COLUMN_ALIGNMENT};
pub use cache::{LoadedTiers, SynapseCache};
pub use columns::{Attributes, Connectivity, Positions};
pub use error::{CacheError, Result};
pub use prefetch::SynapsePrefetch;
pub use source::{
    attribute_field, position_field, AttributeRow, ConnectivityRow, ExtraIndexRow,
    InMemorySource, PositionRow, RecordSource,
};
pub use stream::SynapsesStream;
pub use synapses::Synapses;
pub use tracing_lock::TracingRwLock;
pub use types::{Direction, Gid, GidSet, Tier};
pub use view::{Iter, Synapse};
