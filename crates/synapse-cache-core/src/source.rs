// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Record source abstraction
//!
//! The cache never parses circuit files itself. It pulls fixed-shape rows,
//! one neuron at a time, from a [`RecordSource`]:
//!
//! - connectivity rows: per-peer aggregated synapse counts
//! - attribute rows: a peer GID plus 17 positional numeric fields
//! - position rows: a peer GID plus 12 positional numeric fields
//! - extra index rows (optional): one global synapse index per attribute row
//!
//! Row order is significant: the n-th attribute row, the n-th position row and
//! the n-th extra index row of a neuron describe the same synapse.

use ahash::AHashMap;

use crate::error::{CacheError, Result};
use crate::types::{Direction, Gid, GidSet, Tier};

/// Field positions inside [`AttributeRow::fields`]
pub mod attribute_field {
    pub const DELAY: usize = 0;
    pub const POST_SECTION_ID: usize = 1;
    pub const POST_SEGMENT_ID: usize = 2;
    pub const POST_DISTANCE: usize = 3;
    pub const PRE_SECTION_ID: usize = 4;
    pub const PRE_SEGMENT_ID: usize = 5;
    pub const PRE_DISTANCE: usize = 6;
    pub const CONDUCTANCE: usize = 7;
    pub const UTILIZATION: usize = 8;
    pub const DEPRESSION: usize = 9;
    pub const FACILITATION: usize = 10;
    pub const DECAY: usize = 11;
    // 12..=15 are carried by the file format but not cached
    pub const EFFICACY: usize = 16;
    /// Number of numeric fields per row
    pub const COUNT: usize = 17;
}

/// Field positions inside [`PositionRow::fields`]
pub mod position_field {
    pub const PRE_SURFACE_X: usize = 0;
    pub const PRE_SURFACE_Y: usize = 1;
    pub const PRE_SURFACE_Z: usize = 2;
    pub const POST_SURFACE_X: usize = 3;
    pub const POST_SURFACE_Y: usize = 4;
    pub const POST_SURFACE_Z: usize = 5;
    pub const PRE_CENTER_X: usize = 6;
    pub const PRE_CENTER_Y: usize = 7;
    pub const PRE_CENTER_Z: usize = 8;
    pub const POST_CENTER_X: usize = 9;
    pub const POST_CENTER_Y: usize = 10;
    pub const POST_CENTER_Z: usize = 11;
    /// Number of numeric fields per row
    pub const COUNT: usize = 12;
}

/// Defines a peer-keyed record with a fixed block of numeric fields
///
/// The peer stays a [`Gid`]; only the payload is `f32`.
macro_rules! peer_record {
    ($(#[$doc:meta])* $name:ident, $count:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq)]
        pub struct $name {
            /// Peer GID (the endpoint not in the requested set)
            pub peer: Gid,
            pub fields: [f32; $count],
        }

        impl $name {
            /// Row for `peer` with every field zeroed
            pub fn new(peer: Gid) -> Self {
                Self {
                    peer,
                    fields: [0.0; $count],
                }
            }

            pub fn with_fields(peer: Gid, fields: [f32; $count]) -> Self {
                Self { peer, fields }
            }
        }

        impl std::ops::Index<usize> for $name {
            type Output = f32;

            #[inline]
            fn index(&self, field: usize) -> &f32 {
                &self.fields[field]
            }
        }

        impl std::ops::IndexMut<usize> for $name {
            #[inline]
            fn index_mut(&mut self, field: usize) -> &mut f32 {
                &mut self.fields[field]
            }
        }
    };
}

peer_record! {
    /// One attribute record, fields indexed with [`attribute_field`]
    AttributeRow, attribute_field::COUNT
}

peer_record! {
    /// One position record, fields indexed with [`position_field`]
    PositionRow, position_field::COUNT
}

/// Synapse counts between a neuron and one peer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectivityRow {
    /// Peer GID
    pub peer: Gid,
    /// Synapses from the neuron onto the peer
    pub efferent: u32,
    /// Synapses from the peer onto the neuron
    pub afferent: u32,
}

impl ConnectivityRow {
    pub fn new(peer: Gid, efferent: u32, afferent: u32) -> Self {
        Self {
            peer,
            efferent,
            afferent,
        }
    }

    /// Number of synapses this row contributes in `direction`
    #[inline]
    pub fn count(&self, direction: Direction) -> u32 {
        match direction {
            Direction::Afferent => self.afferent,
            Direction::Efferent => self.efferent,
        }
    }
}

/// Global synapse index for one attribute row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtraIndexRow {
    /// Peer GID
    pub peer: Gid,
    /// Circuit-wide synapse index
    pub index: u64,
}

/// Per-neuron row reader backing the cache
///
/// Implementations must be callable from any thread; the cache serialises its
/// own loads but several caches may share one source.
pub trait RecordSource: Send + Sync {
    /// Connectivity summary of `gid`, one row per peer
    fn read_connectivity(&self, gid: Gid) -> Result<Vec<ConnectivityRow>>;

    /// Attribute rows of `gid` as seen from `direction`
    fn read_attributes(&self, gid: Gid, direction: Direction) -> Result<Vec<AttributeRow>>;

    /// Position rows of `gid` as seen from `direction`
    fn read_positions(&self, gid: Gid, direction: Direction) -> Result<Vec<PositionRow>>;

    /// True if [`RecordSource::read_extra_index`] is backed by data
    fn has_extra_index(&self) -> bool {
        false
    }

    /// Global synapse indices of `gid`'s afferent attribute rows
    fn read_extra_index(&self, _gid: Gid) -> Result<Vec<ExtraIndexRow>> {
        Err(CacheError::FeatureUnavailable(
            "No synapse index file available".to_string(),
        ))
    }

    /// Rows an unfiltered load of `tier` for `gids` would produce
    ///
    /// Used to reserve staging space before the first scan of a tier. The
    /// default sums the connectivity counts for every tier, so it never reads
    /// attribute or position rows; sources that can count a tier's rows
    /// directly should override it.
    fn count_synapses(&self, gids: &GidSet, direction: Direction, _tier: Tier) -> Result<usize> {
        let mut total = 0;
        for &gid in gids {
            total += self
                .read_connectivity(gid)?
                .iter()
                .map(|row| row.count(direction) as usize)
                .sum::<usize>();
        }
        Ok(total)
    }
}

/// Record source held entirely in memory
///
/// Neurons without rows read as empty.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    connectivity: AHashMap<Gid, Vec<ConnectivityRow>>,
    attributes: AHashMap<(Gid, Direction), Vec<AttributeRow>>,
    positions: AHashMap<(Gid, Direction), Vec<PositionRow>>,
    extra_index: Option<AHashMap<Gid, Vec<ExtraIndexRow>>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the connectivity summary of `gid`
    pub fn with_connectivity(mut self, gid: Gid, rows: Vec<ConnectivityRow>) -> Self {
        self.connectivity.insert(gid, rows);
        self
    }

    /// Set the attribute rows of `gid` for `direction`
    pub fn with_attributes(mut self, gid: Gid, direction: Direction, rows: Vec<AttributeRow>) -> Self {
        self.attributes.insert((gid, direction), rows);
        self
    }

    /// Set the position rows of `gid` for `direction`
    pub fn with_positions(mut self, gid: Gid, direction: Direction, rows: Vec<PositionRow>) -> Self {
        self.positions.insert((gid, direction), rows);
        self
    }

    /// Set the extra index rows of `gid`; enables the extra index
    pub fn with_extra_index(mut self, gid: Gid, rows: Vec<ExtraIndexRow>) -> Self {
        self.extra_index
            .get_or_insert_with(AHashMap::new)
            .insert(gid, rows);
        self
    }
}

impl RecordSource for InMemorySource {
    fn read_connectivity(&self, gid: Gid) -> Result<Vec<ConnectivityRow>> {
        Ok(self.connectivity.get(&gid).cloned().unwrap_or_default())
    }

    fn read_attributes(&self, gid: Gid, direction: Direction) -> Result<Vec<AttributeRow>> {
        Ok(self
            .attributes
            .get(&(gid, direction))
            .cloned()
            .unwrap_or_default())
    }

    fn read_positions(&self, gid: Gid, direction: Direction) -> Result<Vec<PositionRow>> {
        Ok(self
            .positions
            .get(&(gid, direction))
            .cloned()
            .unwrap_or_default())
    }

    fn has_extra_index(&self) -> bool {
        self.extra_index.is_some()
    }

    fn read_extra_index(&self, gid: Gid) -> Result<Vec<ExtraIndexRow>> {
        match &self.extra_index {
            Some(index) => Ok(index.get(&gid).cloned().unwrap_or_default()),
            None => Err(CacheError::FeatureUnavailable(
                "No synapse index file available".to_string(),
            )),
        }
    }

    fn count_synapses(&self, gids: &GidSet, direction: Direction, tier: Tier) -> Result<usize> {
        Ok(gids
            .iter()
            .map(|&gid| match tier {
                Tier::Connectivity => self.connectivity.get(&gid).map_or(0, |rows| {
                    rows.iter().map(|row| row.count(direction) as usize).sum()
                }),
                Tier::Attributes => self.attributes.get(&(gid, direction)).map_or(0, Vec::len),
                Tier::Positions => self.positions.get(&(gid, direction)).map_or(0, Vec::len),
            })
            .sum())
    }
}
