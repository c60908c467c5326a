// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Single-synapse view and forward iterator over a [`Synapses`] collection

use crate::error::Result;
use crate::synapses::Synapses;

/// Generates fallible scalar getters backed by a column accessor
macro_rules! field_getters {
    ($($(#[$doc:meta])* $name:ident => $column:ident: $ty:ty;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(&self) -> Result<$ty> {
                Ok(self.synapses.$column()?[self.index])
            }
        )*
    };
}

/// Row `index` of a [`Synapses`] collection
#[derive(Clone, Copy)]
pub struct Synapse<'a> {
    synapses: &'a Synapses,
    index: usize,
}

impl<'a> Synapse<'a> {
    pub(crate) fn new(synapses: &'a Synapses, index: usize) -> Self {
        Self { synapses, index }
    }

    /// Position inside the collection
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn pre_gid(&self) -> u32 {
        self.synapses.pre_gids()[self.index]
    }

    pub fn post_gid(&self) -> u32 {
        self.synapses.post_gids()[self.index]
    }

    /// Global synapse index (afferent synapses with an extra index only)
    pub fn global_index(&self) -> Result<u64> {
        Ok(self.synapses.indices()?[self.index])
    }

    field_getters! {
        pre_section_id => pre_section_ids: u32;
        pre_segment_id => pre_segment_ids: u32;
        pre_distance => pre_distances: f32;
        post_section_id => post_section_ids: u32;
        post_segment_id => post_segment_ids: u32;
        post_distance => post_distances: f32;
        delay => delays: f32;
        conductance => conductances: f32;
        utilization => utilizations: f32;
        depression => depressions: f32;
        facilitation => facilitations: f32;
        decay => decays: f32;
        efficacy => efficacies: i32;
    }

    /// Presynaptic surface position (x, y, z)
    pub fn pre_surface_position(&self) -> Result<[f32; 3]> {
        let s = self.synapses;
        Ok([
            s.pre_surface_x_positions()?[self.index],
            s.pre_surface_y_positions()?[self.index],
            s.pre_surface_z_positions()?[self.index],
        ])
    }

    /// Presynaptic center position (x, y, z)
    pub fn pre_center_position(&self) -> Result<[f32; 3]> {
        let s = self.synapses;
        Ok([
            s.pre_center_x_positions()?[self.index],
            s.pre_center_y_positions()?[self.index],
            s.pre_center_z_positions()?[self.index],
        ])
    }

    /// Postsynaptic surface position (x, y, z)
    pub fn post_surface_position(&self) -> Result<[f32; 3]> {
        let s = self.synapses;
        Ok([
            s.post_surface_x_positions()?[self.index],
            s.post_surface_y_positions()?[self.index],
            s.post_surface_z_positions()?[self.index],
        ])
    }

    /// Postsynaptic center position (x, y, z)
    pub fn post_center_position(&self) -> Result<[f32; 3]> {
        let s = self.synapses;
        Ok([
            s.post_center_x_positions()?[self.index],
            s.post_center_y_positions()?[self.index],
            s.post_center_z_positions()?[self.index],
        ])
    }
}

impl std::fmt::Debug for Synapse<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Synapse")
            .field("index", &self.index)
            .field("pre_gid", &self.pre_gid())
            .field("post_gid", &self.post_gid())
            .finish()
    }
}

/// Forward iterator; the end is fixed when the iterator is created
#[derive(Clone)]
pub struct Iter<'a> {
    synapses: &'a Synapses,
    next: usize,
    end: usize,
}

impl<'a> Iter<'a> {
    pub(crate) fn new(synapses: &'a Synapses, end: usize) -> Self {
        Self {
            synapses,
            next: 0,
            end,
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = Synapse<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let synapse = Synapse::new(self.synapses, self.next);
        self.next += 1;
        Some(synapse)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl std::iter::FusedIterator for Iter<'_> {}
