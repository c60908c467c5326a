// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Lazy-fill cache controller
//!
//! Each tier moves one way, from unpopulated to populated. The published tier
//! lives in a `OnceLock`, which doubles as the sentinel: the fast path is a
//! lock-free `get`, the slow path takes the write lock, re-checks the sentinel
//! and only then runs the loader. Loads that discover connectivity publish it
//! before the tier itself, so the synapse count is fixed by whichever tier
//! loads first. Connectivity counts as established once it is published,
//! including a count of zero, and that count is final for every later tier.
//!
//! Nothing is published until a loader returns successfully; a failed load
//! leaves the tier unpopulated and the next access starts over.

use std::sync::{Arc, OnceLock};

use tracing::debug;

use crate::columns::{Attributes, Connectivity, Positions};
use crate::error::{CacheError, Result};
use crate::loader::{self, LoadRequest};
use crate::prefetch::SynapsePrefetch;
use crate::source::RecordSource;
use crate::tracing_lock::TracingRwLock;
use crate::types::{Direction, GidSet};

/// Request parameters kept for lazy loads
#[derive(Debug, Clone)]
struct CapturedRequest {
    gids: GidSet,
    filter: GidSet,
}

/// Which tiers are currently populated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadedTiers {
    pub connectivity: bool,
    pub attributes: bool,
    pub positions: bool,
}

/// Shared cache state behind every clone of a [`crate::Synapses`] handle
pub struct SynapseCache {
    source: Arc<dyn RecordSource>,
    /// `None` once every tier was prefetched
    request: Option<CapturedRequest>,
    direction: Direction,
    alignment: usize,

    /// Serialises loaders; readers of the synapse count take it shared
    lock: TracingRwLock<()>,

    connectivity: OnceLock<Connectivity>,
    attributes: OnceLock<Attributes>,
    positions: OnceLock<Positions>,
}

impl SynapseCache {
    /// Build the cache and run the loads selected by `prefetch`
    pub(crate) fn new(
        source: Arc<dyn RecordSource>,
        gids: GidSet,
        filter: GidSet,
        direction: Direction,
        prefetch: SynapsePrefetch,
        alignment: usize,
    ) -> Result<Self> {
        let mut cache = Self {
            source,
            request: None,
            direction,
            alignment,
            lock: TracingRwLock::new((), "SynapseCache"),
            connectivity: OnceLock::new(),
            attributes: OnceLock::new(),
            positions: OnceLock::new(),
        };

        debug!(
            "[SYNAPSE-CACHE] New cache: {} neurons, {} filter GIDs, {}, prefetch {}",
            gids.len(),
            filter.len(),
            direction,
            prefetch
        );

        if prefetch.is_none() {
            cache.fill_connectivity(&gids, &filter)?;
        } else {
            if prefetch.contains(SynapsePrefetch::ATTRIBUTES) {
                cache.fill_attributes(&gids, &filter)?;
            }
            if prefetch.contains(SynapsePrefetch::POSITIONS) {
                cache.fill_positions(&gids, &filter)?;
            }
        }

        if prefetch != SynapsePrefetch::ALL {
            cache.request = Some(CapturedRequest { gids, filter });
        }
        Ok(cache)
    }

    /// Direction the cache was built for
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Established synapse count (0 before any tier is loaded)
    pub fn size(&self) -> usize {
        let _guard = self.lock.read();
        self.connectivity.get().map_or(0, Connectivity::len)
    }

    /// Populated tiers, for diagnostics
    pub fn loaded_tiers(&self) -> LoadedTiers {
        let _guard = self.lock.read();
        LoadedTiers {
            connectivity: self.connectivity.get().is_some(),
            attributes: self.attributes.get().is_some(),
            positions: self.positions.get().is_some(),
        }
    }

    /// Pre/post GIDs, if established
    pub fn connectivity(&self) -> Option<&Connectivity> {
        self.connectivity.get()
    }

    /// Attribute tier, loading it on first use
    pub fn ensure_attributes(&self) -> Result<&Attributes> {
        if let Some(attributes) = self.attributes.get() {
            return Ok(attributes);
        }
        let request = self.retained_request("attributes")?;
        self.fill_attributes(&request.gids, &request.filter)
    }

    /// Position tier, loading it on first use
    pub fn ensure_positions(&self) -> Result<&Positions> {
        if let Some(positions) = self.positions.get() {
            return Ok(positions);
        }
        let request = self.retained_request("positions")?;
        self.fill_positions(&request.gids, &request.filter)
    }

    /// Global synapse indices
    ///
    /// # Errors
    ///
    /// `CacheError::FeatureUnavailable` if the source had no extra index or
    /// the cache is efferent.
    pub fn indices(&self) -> Result<&[u64]> {
        self.ensure_attributes()?.indices().ok_or_else(|| {
            CacheError::FeatureUnavailable("No synapse index file available".to_string())
        })
    }

    fn retained_request(&self, tier: &str) -> Result<&CapturedRequest> {
        self.request.as_ref().ok_or_else(|| {
            CacheError::InvalidOperation(format!(
                "{tier} tier is not loaded and the synapse request was not retained"
            ))
        })
    }

    fn load_request<'a>(&'a self, gids: &'a GidSet, filter: &'a GidSet) -> LoadRequest<'a> {
        LoadRequest {
            source: self.source.as_ref(),
            gids,
            filter,
            direction: self.direction,
            alignment: self.alignment,
        }
    }

    fn fill_connectivity(&self, gids: &GidSet, filter: &GidSet) -> Result<&Connectivity> {
        let _guard = self.lock.write();
        if let Some(connectivity) = self.connectivity.get() {
            return Ok(connectivity);
        }
        let loaded = loader::load_connectivity(self.load_request(gids, filter))?;
        Ok(self.connectivity.get_or_init(|| loaded))
    }

    fn fill_attributes(&self, gids: &GidSet, filter: &GidSet) -> Result<&Attributes> {
        let _guard = self.lock.write();
        if let Some(attributes) = self.attributes.get() {
            return Ok(attributes);
        }

        let established = self.connectivity.get().map(Connectivity::len);
        let load = loader::load_attributes(self.load_request(gids, filter), established)?;
        if let Some(discovered) = load.discovered {
            self.connectivity.get_or_init(|| discovered);
        }
        Ok(self.attributes.get_or_init(|| load.columns))
    }

    fn fill_positions(&self, gids: &GidSet, filter: &GidSet) -> Result<&Positions> {
        let _guard = self.lock.write();
        if let Some(positions) = self.positions.get() {
            return Ok(positions);
        }

        let established = self.connectivity.get().map(Connectivity::len);
        let load = loader::load_positions(self.load_request(gids, filter), established)?;
        if let Some(discovered) = load.discovered {
            self.connectivity.get_or_init(|| discovered);
        }
        Ok(self.positions.get_or_init(|| load.columns))
    }
}

impl std::fmt::Debug for SynapseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SynapseCache")
            .field("direction", &self.direction)
            .field("alignment", &self.alignment)
            .field("size", &self.size())
            .field("loaded", &self.loaded_tiers())
            .finish()
    }
}
