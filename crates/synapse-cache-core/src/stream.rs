// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Deferred synapse request
//!
//! A [`SynapsesStream`] records what to load without loading anything.
//! Converting it into [`crate::Synapses`] builds a new, independent cache from
//! the recorded request.

use std::fmt;
use std::sync::Arc;

use crate::prefetch::SynapsePrefetch;
use crate::source::RecordSource;
use crate::types::{Direction, GidSet};

/// Synapse request captured for later materialization
#[derive(Clone)]
pub struct SynapsesStream {
    source: Arc<dyn RecordSource>,
    gids: GidSet,
    filter: GidSet,
    direction: Direction,
    prefetch: SynapsePrefetch,
}

impl SynapsesStream {
    pub fn new(
        source: Arc<dyn RecordSource>,
        gids: GidSet,
        filter: GidSet,
        direction: Direction,
        prefetch: SynapsePrefetch,
    ) -> Self {
        Self {
            source,
            gids,
            filter,
            direction,
            prefetch,
        }
    }

    /// Number of neurons still to be read
    pub fn len(&self) -> usize {
        self.gids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gids.is_empty()
    }

    pub fn source(&self) -> Arc<dyn RecordSource> {
        Arc::clone(&self.source)
    }

    pub fn gids(&self) -> &GidSet {
        &self.gids
    }

    pub fn filter(&self) -> &GidSet {
        &self.filter
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn prefetch(&self) -> SynapsePrefetch {
        self.prefetch
    }
}

impl fmt::Debug for SynapsesStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SynapsesStream")
            .field("gids", &self.gids.len())
            .field("filter", &self.filter.len())
            .field("direction", &self.direction)
            .field("prefetch", &self.prefetch)
            .finish()
    }
}
