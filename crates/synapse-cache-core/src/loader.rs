// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Tier loaders
//!
//! Each loader walks the requested GIDs in ascending order, drops rows whose
//! peer is not in the neighbor filter, and fills freshly allocated columns.
//!
//! Attribute and position loads either reuse an established synapse count
//! (connectivity already known, pre/post GIDs are left untouched) or discover
//! the count and the pre/post GIDs from their own rows. Either way each
//! neuron's rows are read exactly once per load.

use tracing::{debug, warn};

use crate::columns::{Attributes, Connectivity, Positions};
use crate::error::Result;
use crate::source::{AttributeRow, PositionRow, RecordSource};
use crate::types::{Direction, Gid, GidSet, Tier};

/// Parameters shared by every loader invocation
#[derive(Clone, Copy)]
pub(crate) struct LoadRequest<'a> {
    pub source: &'a dyn RecordSource,
    pub gids: &'a GidSet,
    pub filter: &'a GidSet,
    pub direction: Direction,
    pub alignment: usize,
}

impl LoadRequest<'_> {
    /// Neighbor filter: an empty set keeps every peer
    #[inline]
    fn keeps(&self, peer: Gid) -> bool {
        self.filter.is_empty() || self.filter.contains(&peer)
    }
}

/// Result of an attribute or position load
pub(crate) struct TierLoad<T> {
    pub columns: T,
    /// Pre/post GIDs found by this load when connectivity was not established
    pub discovered: Option<Connectivity>,
}

/// Expand per-peer synapse counts into one (pre, post) pair per synapse
pub(crate) fn load_connectivity(request: LoadRequest<'_>) -> Result<Connectivity> {
    debug!(
        "[SYNAPSE-CACHE] Loading connectivity for {} neurons ({})",
        request.gids.len(),
        request.direction
    );

    let mut pres: Vec<Gid> = Vec::new();
    let mut posts: Vec<Gid> = Vec::new();
    for &gid in request.gids {
        for row in request.source.read_connectivity(gid)? {
            if !request.keeps(row.peer) {
                continue;
            }
            let count = row.count(request.direction) as usize;
            pres.extend(std::iter::repeat(row.peer).take(count));
            posts.extend(std::iter::repeat(gid).take(count));
        }
    }

    let mut connectivity = Connectivity::from_pairs(&pres, &posts, request.alignment)?;
    if !request.direction.is_afferent() {
        connectivity.swap_roles();
    }

    debug!("[SYNAPSE-CACHE] Loaded connectivity: {} synapses", connectivity.len());
    Ok(connectivity)
}

/// Fill the attribute tier
pub(crate) fn load_attributes(
    request: LoadRequest<'_>,
    established: Option<usize>,
) -> Result<TierLoad<Attributes>> {
    let source = request.source;
    let with_indices = source.has_extra_index() && request.direction.is_afferent();

    let staged = stage_rows(
        request,
        Tier::Attributes,
        established,
        |gid| {
            let rows = source.read_attributes(gid, request.direction)?;
            let extra = if with_indices {
                source.read_extra_index(gid)?
            } else {
                Vec::new()
            };
            Ok(rows
                .into_iter()
                .enumerate()
                .map(|(j, row)| (row, extra.get(j).map(|e| e.index)))
                .collect::<Vec<_>>())
        },
        |(row, _): &(AttributeRow, Option<u64>)| row.peer,
    )?;

    let mut columns = Attributes::allocate(staged.count, with_indices, request.alignment)?;
    for (i, (_, (row, index))) in staged.kept().enumerate() {
        columns.write_row(i, row, *index);
    }

    Ok(TierLoad {
        discovered: staged.discover(request, |(row, _)| row.peer)?,
        columns,
    })
}

/// Fill the position tier
pub(crate) fn load_positions(
    request: LoadRequest<'_>,
    established: Option<usize>,
) -> Result<TierLoad<Positions>> {
    let source = request.source;

    let staged = stage_rows(
        request,
        Tier::Positions,
        established,
        |gid| source.read_positions(gid, request.direction),
        |row: &PositionRow| row.peer,
    )?;

    let mut columns = Positions::allocate(staged.count, request.alignment)?;
    for (i, (_, row)) in staged.kept().enumerate() {
        columns.write_row(i, row);
    }

    Ok(TierLoad {
        discovered: staged.discover(request, |row| row.peer)?,
        columns,
    })
}

/// Filtered rows of one tier, in load order, tagged with their neuron
struct Staged<R> {
    rows: Vec<(Gid, R)>,
    /// Final synapse count: the established one, or the number of kept rows
    count: usize,
    established: bool,
}

impl<R> Staged<R> {
    /// Rows that fit into the final count
    fn kept(&self) -> impl Iterator<Item = &(Gid, R)> {
        self.rows.iter().take(self.count)
    }

    /// Pre/post GIDs implied by the rows, unless the count was established
    fn discover(
        &self,
        request: LoadRequest<'_>,
        peer_of: impl Fn(&R) -> Gid,
    ) -> Result<Option<Connectivity>> {
        if self.established {
            return Ok(None);
        }
        let pres: Vec<Gid> = self.rows.iter().map(|(_, row)| peer_of(row)).collect();
        let posts: Vec<Gid> = self.rows.iter().map(|(gid, _)| *gid).collect();
        let mut connectivity = Connectivity::from_pairs(&pres, &posts, request.alignment)?;
        if !request.direction.is_afferent() {
            connectivity.swap_roles();
        }
        Ok(Some(connectivity))
    }
}

/// Read every requested neuron once and keep the rows passing the filter
///
/// Without an established count the columns are sized from the kept rows,
/// so a tier's read routine runs once per neuron and load.
fn stage_rows<R>(
    request: LoadRequest<'_>,
    tier: Tier,
    established: Option<usize>,
    mut read: impl FnMut(Gid) -> Result<Vec<R>>,
    peer_of: impl Fn(&R) -> Gid,
) -> Result<Staged<R>> {
    let reserve = match established {
        Some(count) => count,
        None => request
            .source
            .count_synapses(request.gids, request.direction, tier)?,
    };
    debug!(
        "[SYNAPSE-CACHE] Loading {} for {} neurons ({}, {} count {})",
        tier,
        request.gids.len(),
        request.direction,
        if established.is_some() { "established" } else { "estimated" },
        reserve
    );

    let mut rows = Vec::with_capacity(reserve);
    for &gid in request.gids {
        for row in read(gid)? {
            if request.keeps(peer_of(&row)) {
                rows.push((gid, row));
            }
        }
    }

    let count = match established {
        Some(count) => {
            if rows.len() != count {
                warn!(
                    "[SYNAPSE-CACHE] {} rows disagree with established connectivity: found {} synapses, keeping {}",
                    tier,
                    rows.len(),
                    count
                );
            }
            count
        }
        None => rows.len(),
    };

    debug!("[SYNAPSE-CACHE] Loaded {}: {} synapses", tier, count);
    Ok(Staged {
        rows,
        count,
        established: established.is_some(),
    })
}
