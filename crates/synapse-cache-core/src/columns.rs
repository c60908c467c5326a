// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Columnar (Structure-of-Arrays) storage for the three synapse tiers
//!
//! Row `i` of every column describes the same synapse. Each tier is built in
//! full by the loader and then published read-only.

use crate::aligned::AlignedColumn;
use crate::error::Result;
use crate::source::{attribute_field as af, position_field as pf, AttributeRow, PositionRow};
use crate::types::Gid;

/// Pre/post GID columns
#[derive(Debug)]
pub struct Connectivity {
    pub(crate) pre_gids: AlignedColumn<u32>,
    pub(crate) post_gids: AlignedColumn<u32>,
}

impl Connectivity {
    pub(crate) fn from_pairs(pre: &[Gid], post: &[Gid], alignment: usize) -> Result<Self> {
        Ok(Self {
            pre_gids: AlignedColumn::from_slice(pre, alignment)?,
            post_gids: AlignedColumn::from_slice(post, alignment)?,
        })
    }

    /// Exchange the pre and post roles (efferent requests)
    pub(crate) fn swap_roles(&mut self) {
        std::mem::swap(&mut self.pre_gids, &mut self.post_gids);
    }

    /// Number of synapses
    pub fn len(&self) -> usize {
        self.pre_gids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn pre_gids(&self) -> &[u32] {
        self.pre_gids.as_slice()
    }

    pub fn post_gids(&self) -> &[u32] {
        self.post_gids.as_slice()
    }
}

/// Biophysical attribute columns
#[derive(Debug)]
pub struct Attributes {
    pub(crate) indices: Option<AlignedColumn<u64>>,

    pub(crate) pre_section_ids: AlignedColumn<u32>,
    pub(crate) pre_segment_ids: AlignedColumn<u32>,
    pub(crate) pre_distances: AlignedColumn<f32>,

    pub(crate) post_section_ids: AlignedColumn<u32>,
    pub(crate) post_segment_ids: AlignedColumn<u32>,
    pub(crate) post_distances: AlignedColumn<f32>,

    pub(crate) delays: AlignedColumn<f32>,
    pub(crate) conductances: AlignedColumn<f32>,
    pub(crate) utilizations: AlignedColumn<f32>,
    pub(crate) depressions: AlignedColumn<f32>,
    pub(crate) facilitations: AlignedColumn<f32>,
    pub(crate) decays: AlignedColumn<f32>,
    pub(crate) efficacies: AlignedColumn<i32>,
}

impl Attributes {
    pub(crate) fn allocate(len: usize, with_indices: bool, alignment: usize) -> Result<Self> {
        let mut indices = None;
        if with_indices {
            AlignedColumn::allocate_into(&mut indices, len, alignment)?;
        }

        Ok(Self {
            indices,
            pre_section_ids: AlignedColumn::allocate(len, alignment)?,
            pre_segment_ids: AlignedColumn::allocate(len, alignment)?,
            pre_distances: AlignedColumn::allocate(len, alignment)?,
            post_section_ids: AlignedColumn::allocate(len, alignment)?,
            post_segment_ids: AlignedColumn::allocate(len, alignment)?,
            post_distances: AlignedColumn::allocate(len, alignment)?,
            delays: AlignedColumn::allocate(len, alignment)?,
            conductances: AlignedColumn::allocate(len, alignment)?,
            utilizations: AlignedColumn::allocate(len, alignment)?,
            depressions: AlignedColumn::allocate(len, alignment)?,
            facilitations: AlignedColumn::allocate(len, alignment)?,
            decays: AlignedColumn::allocate(len, alignment)?,
            efficacies: AlignedColumn::allocate(len, alignment)?,
        })
    }

    /// Copy one source row into position `i`
    pub(crate) fn write_row(&mut self, i: usize, row: &AttributeRow, index: Option<u64>) {
        if let (Some(indices), Some(index)) = (self.indices.as_mut(), index) {
            indices.as_mut_slice()[i] = index;
        }

        self.delays.as_mut_slice()[i] = row[af::DELAY];
        self.post_section_ids.as_mut_slice()[i] = row[af::POST_SECTION_ID] as u32;
        self.post_segment_ids.as_mut_slice()[i] = row[af::POST_SEGMENT_ID] as u32;
        self.post_distances.as_mut_slice()[i] = row[af::POST_DISTANCE];
        self.pre_section_ids.as_mut_slice()[i] = row[af::PRE_SECTION_ID] as u32;
        self.pre_segment_ids.as_mut_slice()[i] = row[af::PRE_SEGMENT_ID] as u32;
        self.pre_distances.as_mut_slice()[i] = row[af::PRE_DISTANCE];
        self.conductances.as_mut_slice()[i] = row[af::CONDUCTANCE];
        self.utilizations.as_mut_slice()[i] = row[af::UTILIZATION];
        self.depressions.as_mut_slice()[i] = row[af::DEPRESSION];
        self.facilitations.as_mut_slice()[i] = row[af::FACILITATION];
        self.decays.as_mut_slice()[i] = row[af::DECAY];
        self.efficacies.as_mut_slice()[i] = row[af::EFFICACY] as i32;
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.efficacies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Global synapse indices, if an extra index was loaded
    pub fn indices(&self) -> Option<&[u64]> {
        self.indices.as_ref().map(AlignedColumn::as_slice)
    }
}

/// Surface and center position columns
#[derive(Debug)]
pub struct Positions {
    pub(crate) pre_surface_x: AlignedColumn<f32>,
    pub(crate) pre_surface_y: AlignedColumn<f32>,
    pub(crate) pre_surface_z: AlignedColumn<f32>,
    pub(crate) pre_center_x: AlignedColumn<f32>,
    pub(crate) pre_center_y: AlignedColumn<f32>,
    pub(crate) pre_center_z: AlignedColumn<f32>,

    pub(crate) post_surface_x: AlignedColumn<f32>,
    pub(crate) post_surface_y: AlignedColumn<f32>,
    pub(crate) post_surface_z: AlignedColumn<f32>,
    pub(crate) post_center_x: AlignedColumn<f32>,
    pub(crate) post_center_y: AlignedColumn<f32>,
    pub(crate) post_center_z: AlignedColumn<f32>,
}

impl Positions {
    pub(crate) fn allocate(len: usize, alignment: usize) -> Result<Self> {
        Ok(Self {
            pre_surface_x: AlignedColumn::allocate(len, alignment)?,
            pre_surface_y: AlignedColumn::allocate(len, alignment)?,
            pre_surface_z: AlignedColumn::allocate(len, alignment)?,
            pre_center_x: AlignedColumn::allocate(len, alignment)?,
            pre_center_y: AlignedColumn::allocate(len, alignment)?,
            pre_center_z: AlignedColumn::allocate(len, alignment)?,
            post_surface_x: AlignedColumn::allocate(len, alignment)?,
            post_surface_y: AlignedColumn::allocate(len, alignment)?,
            post_surface_z: AlignedColumn::allocate(len, alignment)?,
            post_center_x: AlignedColumn::allocate(len, alignment)?,
            post_center_y: AlignedColumn::allocate(len, alignment)?,
            post_center_z: AlignedColumn::allocate(len, alignment)?,
        })
    }

    /// Copy one source row into position `i`
    pub(crate) fn write_row(&mut self, i: usize, row: &PositionRow) {
        self.pre_surface_x.as_mut_slice()[i] = row[pf::PRE_SURFACE_X];
        self.pre_surface_y.as_mut_slice()[i] = row[pf::PRE_SURFACE_Y];
        self.pre_surface_z.as_mut_slice()[i] = row[pf::PRE_SURFACE_Z];
        self.post_surface_x.as_mut_slice()[i] = row[pf::POST_SURFACE_X];
        self.post_surface_y.as_mut_slice()[i] = row[pf::POST_SURFACE_Y];
        self.post_surface_z.as_mut_slice()[i] = row[pf::POST_SURFACE_Z];
        self.pre_center_x.as_mut_slice()[i] = row[pf::PRE_CENTER_X];
        self.pre_center_y.as_mut_slice()[i] = row[pf::PRE_CENTER_Y];
        self.pre_center_z.as_mut_slice()[i] = row[pf::PRE_CENTER_Z];
        self.post_center_x.as_mut_slice()[i] = row[pf::POST_CENTER_X];
        self.post_center_y.as_mut_slice()[i] = row[pf::POST_CENTER_Y];
        self.post_center_z.as_mut_slice()[i] = row[pf::POST_CENTER_Z];
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.pre_surface_x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
