// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Prefetch policy for synapse tiers
//!
//! The policy decides which tiers are filled while a [`crate::Synapses`]
//! handle is constructed. Tiers left out are filled on first access.

use core::fmt;
use core::ops::{BitOr, BitOrAssign};
use core::str::FromStr;

use crate::error::CacheError;

/// Bit set of tiers to load eagerly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SynapsePrefetch(u8);

impl SynapsePrefetch {
    /// Load connectivity only; attributes and positions are filled lazily
    pub const NONE: Self = Self(0);
    /// Load the attribute tier at construction
    pub const ATTRIBUTES: Self = Self(1 << 0);
    /// Load the position tier at construction
    pub const POSITIONS: Self = Self(1 << 1);
    /// Load every tier at construction; the request is not retained afterwards
    pub const ALL: Self = Self(Self::ATTRIBUTES.0 | Self::POSITIONS.0);

    /// Raw bit representation
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// True if every bit of `other` is set in `self`
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// True for [`SynapsePrefetch::NONE`]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for SynapsePrefetch {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for SynapsePrefetch {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for SynapsePrefetch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::NONE => write!(f, "none"),
            Self::ATTRIBUTES => write!(f, "attributes"),
            Self::POSITIONS => write!(f, "positions"),
            _ => write!(f, "all"),
        }
    }
}

impl FromStr for SynapsePrefetch {
    type Err = CacheError;

    /// Parse `none`, `attributes`, `positions`, `all` or a `|`-joined combination
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut prefetch = Self::NONE;
        for part in s.split('|').map(str::trim) {
            prefetch |= match part.to_ascii_lowercase().as_str() {
                "none" => Self::NONE,
                "attributes" => Self::ATTRIBUTES,
                "positions" => Self::POSITIONS,
                "all" => Self::ALL,
                other => {
                    return Err(CacheError::InvalidOperation(format!(
                        "Unknown synapse prefetch policy: {other:?}"
                    )))
                }
            };
        }
        Ok(prefetch)
    }
}
