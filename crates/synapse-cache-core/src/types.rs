// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Identity types shared by the cache, the loaders and the record sources

use core::fmt;
use std::collections::BTreeSet;

/// Neuron GID (globally unique across the circuit)
pub type Gid = u32;

/// Ordered set of unique neuron GIDs
pub type GidSet = BTreeSet<Gid>;

/// Which endpoint of a synapse belongs to the requested GIDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// Requested GIDs are the postsynaptic side
    #[default]
    Afferent,
    /// Requested GIDs are the presynaptic side
    Efferent,
}

impl Direction {
    /// True for [`Direction::Afferent`]
    #[inline]
    pub fn is_afferent(self) -> bool {
        matches!(self, Direction::Afferent)
    }
}

impl From<bool> for Direction {
    fn from(afferent: bool) -> Self {
        if afferent {
            Direction::Afferent
        } else {
            Direction::Efferent
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Afferent => write!(f, "afferent"),
            Direction::Efferent => write!(f, "efferent"),
        }
    }
}

/// Independently loadable group of synapse columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Pre/post GIDs
    Connectivity,
    /// Biophysical attributes (delays, conductances, ...)
    Attributes,
    /// Surface and center positions
    Positions,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Connectivity => write!(f, "connectivity"),
            Tier::Attributes => write!(f, "attributes"),
            Tier::Positions => write!(f, "positions"),
        }
    }
}
