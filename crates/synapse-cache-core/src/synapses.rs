// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Synapse collection handle
//!
//! [`Synapses`] is a cheap, clonable view over one [`SynapseCache`]. Clones
//! share the cache (and any tier one of them loads); moving a handle moves the
//! reference. The cache is released with the last handle.
//!
//! Every column accessor returns a slice of length [`Synapses::len`]. Attribute
//! and position accessors fill their tier on first use, which is why they
//! return `Result`.

use std::fmt;
use std::sync::Arc;

use synapse_cache_config::CacheConfig;

use crate::aligned::DEFAULT_COLUMN_ALIGNMENT;
use crate::cache::{LoadedTiers, SynapseCache};
use crate::error::{CacheError, Result};
use crate::prefetch::SynapsePrefetch;
use crate::source::RecordSource;
use crate::stream::SynapsesStream;
use crate::types::{Direction, GidSet};
use crate::view::{Iter, Synapse};

/// Generates one accessor per attribute column
macro_rules! attribute_columns {
    ($($(#[$doc:meta])* $name:ident: $ty:ty;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(&self) -> Result<&[$ty]> {
                Ok(self.cache.ensure_attributes()?.$name.as_slice())
            }
        )*
    };
}

/// Generates one accessor per position column
macro_rules! position_columns {
    ($($(#[$doc:meta])* $name:ident => $field:ident;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(&self) -> Result<&[f32]> {
                Ok(self.cache.ensure_positions()?.$field.as_slice())
            }
        )*
    };
}

/// Columnar synapses of a set of neurons, loaded on demand
#[derive(Clone)]
pub struct Synapses {
    cache: Arc<SynapseCache>,
}

impl Synapses {
    /// Synapses of `gids`, optionally restricted to peers in `filter`
    ///
    /// `prefetch` selects the tiers loaded now; connectivity alone is loaded
    /// for [`SynapsePrefetch::NONE`].
    pub fn new(
        source: Arc<dyn RecordSource>,
        gids: GidSet,
        filter: GidSet,
        direction: Direction,
        prefetch: SynapsePrefetch,
    ) -> Result<Self> {
        Self::with_alignment(source, gids, filter, direction, prefetch, DEFAULT_COLUMN_ALIGNMENT)
    }

    /// Same as [`Synapses::new`] with an explicit column alignment in bytes
    pub fn with_alignment(
        source: Arc<dyn RecordSource>,
        gids: GidSet,
        filter: GidSet,
        direction: Direction,
        prefetch: SynapsePrefetch,
        alignment: usize,
    ) -> Result<Self> {
        let cache = SynapseCache::new(source, gids, filter, direction, prefetch, alignment)?;
        Ok(Self {
            cache: Arc::new(cache),
        })
    }

    /// Build with the prefetch policy and alignment from `config`
    pub fn with_config(
        source: Arc<dyn RecordSource>,
        gids: GidSet,
        filter: GidSet,
        direction: Direction,
        config: &CacheConfig,
    ) -> Result<Self> {
        let prefetch: SynapsePrefetch = config.default_prefetch.parse()?;
        Self::with_alignment(source, gids, filter, direction, prefetch, config.column_alignment)
    }

    /// Number of synapses
    pub fn len(&self) -> usize {
        self.cache.size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Direction the synapses were requested for
    pub fn direction(&self) -> Direction {
        self.cache.direction()
    }

    /// Tiers populated so far
    pub fn loaded_tiers(&self) -> LoadedTiers {
        self.cache.loaded_tiers()
    }

    /// True if both handles view the same cache instance
    pub fn shares_cache_with(&self, other: &Synapses) -> bool {
        Arc::ptr_eq(&self.cache, &other.cache)
    }

    /// View of synapse `index`, or `None` past the end
    pub fn get(&self, index: usize) -> Option<Synapse<'_>> {
        (index < self.len()).then(|| Synapse::new(self, index))
    }

    /// Forward iterator over all synapses
    pub fn iter(&self) -> Iter<'_> {
        Iter::new(self, self.len())
    }

    /// Global synapse indices
    ///
    /// # Errors
    ///
    /// `CacheError::FeatureUnavailable` when the source has no extra index or
    /// the synapses are efferent.
    pub fn indices(&self) -> Result<&[u64]> {
        self.cache.indices()
    }

    /// Presynaptic GIDs
    pub fn pre_gids(&self) -> &[u32] {
        self.cache.connectivity().map(|c| c.pre_gids()).unwrap_or(&[])
    }

    /// Postsynaptic GIDs
    pub fn post_gids(&self) -> &[u32] {
        self.cache.connectivity().map(|c| c.post_gids()).unwrap_or(&[])
    }

    attribute_columns! {
        /// Presynaptic section IDs
        pre_section_ids: u32;
        /// Presynaptic segment IDs
        pre_segment_ids: u32;
        /// Presynaptic distances along the section
        pre_distances: f32;
        /// Postsynaptic section IDs
        post_section_ids: u32;
        /// Postsynaptic segment IDs
        post_segment_ids: u32;
        /// Postsynaptic distances along the section
        post_distances: f32;
        /// Synaptic delays (ms)
        delays: f32;
        /// Peak conductances (nS)
        conductances: f32;
        /// Utilizations of synaptic efficacy
        utilizations: f32;
        /// Depression time constants (ms)
        depressions: f32;
        /// Facilitation time constants (ms)
        facilitations: f32;
        /// Decay time constants (ms)
        decays: f32;
        /// Absolute synaptic efficacies
        efficacies: i32;
    }

    position_columns! {
        pre_surface_x_positions => pre_surface_x;
        pre_surface_y_positions => pre_surface_y;
        pre_surface_z_positions => pre_surface_z;
        pre_center_x_positions => pre_center_x;
        pre_center_y_positions => pre_center_y;
        pre_center_z_positions => pre_center_z;
        post_surface_x_positions => post_surface_x;
        post_surface_y_positions => post_surface_y;
        post_surface_z_positions => post_surface_z;
        post_center_x_positions => post_center_x;
        post_center_y_positions => post_center_y;
        post_center_z_positions => post_center_z;
    }
}

impl TryFrom<&SynapsesStream> for Synapses {
    type Error = CacheError;

    /// Fresh cache built from the stream's request; nothing is shared with it
    fn try_from(stream: &SynapsesStream) -> Result<Self> {
        Self::new(
            stream.source(),
            stream.gids().clone(),
            stream.filter().clone(),
            stream.direction(),
            stream.prefetch(),
        )
    }
}

impl<'a> IntoIterator for &'a Synapses {
    type Item = Synapse<'a>;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Debug for Synapses {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Synapses")
            .field("cache", &self.cache)
            .finish()
    }
}
