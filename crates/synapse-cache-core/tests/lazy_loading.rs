// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for tiered lazy loading
//!
//! These tests exercise the public `Synapses` surface against an instrumented
//! record source.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use synapse_cache_core::*;

/// Wraps an `InMemorySource`, counting reads and optionally failing them
#[derive(Default)]
struct InstrumentedSource {
    inner: InMemorySource,
    connectivity_reads: AtomicUsize,
    attribute_reads: AtomicUsize,
    position_reads: AtomicUsize,
    fail_attributes: AtomicBool,
}

impl InstrumentedSource {
    fn new(inner: InMemorySource) -> Self {
        Self {
            inner,
            ..Default::default()
        }
    }
}

impl RecordSource for InstrumentedSource {
    fn read_connectivity(&self, gid: Gid) -> Result<Vec<ConnectivityRow>> {
        self.connectivity_reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read_connectivity(gid)
    }

    fn read_attributes(&self, gid: Gid, direction: Direction) -> Result<Vec<AttributeRow>> {
        self.attribute_reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_attributes.load(Ordering::SeqCst) {
            return Err(CacheError::Source(format!("cannot read attributes of {gid}")));
        }
        self.inner.read_attributes(gid, direction)
    }

    fn read_positions(&self, gid: Gid, direction: Direction) -> Result<Vec<PositionRow>> {
        self.position_reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read_positions(gid, direction)
    }

    fn has_extra_index(&self) -> bool {
        self.inner.has_extra_index()
    }

    fn read_extra_index(&self, gid: Gid) -> Result<Vec<ExtraIndexRow>> {
        self.inner.read_extra_index(gid)
    }

    fn count_synapses(&self, gids: &GidSet, direction: Direction, tier: Tier) -> Result<usize> {
        self.inner.count_synapses(gids, direction, tier)
    }
}

/// Counts attribute reads and relies on the default `count_synapses`
#[derive(Default)]
struct DefaultCountSource {
    inner: InMemorySource,
    attribute_reads: AtomicUsize,
}

impl RecordSource for DefaultCountSource {
    fn read_connectivity(&self, gid: Gid) -> Result<Vec<ConnectivityRow>> {
        self.inner.read_connectivity(gid)
    }

    fn read_attributes(&self, gid: Gid, direction: Direction) -> Result<Vec<AttributeRow>> {
        self.attribute_reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read_attributes(gid, direction)
    }

    fn read_positions(&self, gid: Gid, direction: Direction) -> Result<Vec<PositionRow>> {
        self.inner.read_positions(gid, direction)
    }
}

fn gid_set(ids: &[Gid]) -> GidSet {
    ids.iter().copied().collect()
}

fn attribute_row(peer: Gid, delay: f32) -> AttributeRow {
    let mut row = AttributeRow::new(peer);
    row[attribute_field::DELAY] = delay;
    row[attribute_field::POST_SECTION_ID] = 4.0;
    row[attribute_field::POST_SEGMENT_ID] = 5.0;
    row[attribute_field::CONDUCTANCE] = delay * 2.0;
    row[attribute_field::EFFICACY] = 3.0;
    row
}

fn position_row(peer: Gid, x: f32) -> PositionRow {
    let mut row = PositionRow::new(peer);
    row[position_field::PRE_SURFACE_X] = x;
    row[position_field::POST_CENTER_Z] = -x;
    row
}

/// Neuron 1 has one afferent synapse from 9, neuron 2 has two from 10
fn scenario_source() -> InMemorySource {
    InMemorySource::new()
        .with_connectivity(1, vec![ConnectivityRow::new(9, 0, 1)])
        .with_connectivity(2, vec![ConnectivityRow::new(10, 0, 2)])
        .with_attributes(1, Direction::Afferent, vec![attribute_row(9, 0.1)])
        .with_attributes(
            2,
            Direction::Afferent,
            vec![attribute_row(10, 0.2), attribute_row(10, 0.3)],
        )
        .with_positions(1, Direction::Afferent, vec![position_row(9, 1.0)])
        .with_positions(
            2,
            Direction::Afferent,
            vec![position_row(10, 2.0), position_row(10, 3.0)],
        )
}

/// Richer circuit with both directions populated consistently
fn circuit_source() -> InMemorySource {
    let mut source = InMemorySource::new();
    for gid in 1..=4u32 {
        let peers: Vec<(Gid, u32, u32)> = (10..13).map(|p| (p, gid % 2 + 1, p % 3)).collect();
        source = source.with_connectivity(
            gid,
            peers
                .iter()
                .map(|&(peer, efferent, afferent)| ConnectivityRow::new(peer, efferent, afferent))
                .collect(),
        );

        let mut afferent_rows = Vec::new();
        let mut afferent_positions = Vec::new();
        let mut efferent_rows = Vec::new();
        let mut efferent_positions = Vec::new();
        for &(peer, efferent, afferent) in &peers {
            for k in 0..afferent {
                afferent_rows.push(attribute_row(peer, (gid * 100 + peer + k) as f32));
                afferent_positions.push(position_row(peer, (gid + k) as f32));
            }
            for k in 0..efferent {
                efferent_rows.push(attribute_row(peer, (gid * 1000 + peer + k) as f32));
                efferent_positions.push(position_row(peer, (gid * 10 + k) as f32));
            }
        }
        source = source
            .with_attributes(gid, Direction::Afferent, afferent_rows)
            .with_positions(gid, Direction::Afferent, afferent_positions)
            .with_attributes(gid, Direction::Efferent, efferent_rows)
            .with_positions(gid, Direction::Efferent, efferent_positions);
    }
    source
}

#[test]
fn test_scenario_afferent_connectivity() {
    let synapses = Synapses::new(
        Arc::new(scenario_source()),
        gid_set(&[1, 2]),
        GidSet::new(),
        Direction::Afferent,
        SynapsePrefetch::NONE,
    )
    .unwrap();

    assert_eq!(synapses.len(), 3);
    assert_eq!(synapses.pre_gids(), &[9, 10, 10]);
    assert_eq!(synapses.post_gids(), &[1, 2, 2]);
}

#[test]
fn test_scenario_filtered_connectivity() {
    let synapses = Synapses::new(
        Arc::new(scenario_source()),
        gid_set(&[1, 2]),
        gid_set(&[10]),
        Direction::Afferent,
        SynapsePrefetch::NONE,
    )
    .unwrap();

    assert_eq!(synapses.len(), 2);
    assert_eq!(synapses.pre_gids(), &[10, 10]);
    assert_eq!(synapses.post_gids(), &[2, 2]);
}

#[test]
fn test_scenario_lazy_delay_triggers_one_attribute_load() {
    let source = Arc::new(InstrumentedSource::new(scenario_source()));
    let synapses = Synapses::new(
        source.clone(),
        gid_set(&[1, 2]),
        GidSet::new(),
        Direction::Afferent,
        SynapsePrefetch::NONE,
    )
    .unwrap();
    assert_eq!(source.attribute_reads.load(Ordering::SeqCst), 0);

    let delays = synapses.delays().unwrap();
    assert_eq!(delays.len(), synapses.len());
    assert_eq!(delays, &[0.1, 0.2, 0.3]);
    // one read per requested neuron, i.e. exactly one tier load
    assert_eq!(source.attribute_reads.load(Ordering::SeqCst), 2);
}

#[test]
fn test_connectivity_length_matches_reported_counts() {
    let source = circuit_source();
    let gids = gid_set(&[1, 2, 3, 4]);

    for direction in [Direction::Afferent, Direction::Efferent] {
        let expected: usize = gids
            .iter()
            .flat_map(|&gid| source.read_connectivity(gid).unwrap())
            .map(|row| row.count(direction) as usize)
            .sum();

        let synapses = Synapses::new(
            Arc::new(source.clone()),
            gids.clone(),
            GidSet::new(),
            direction,
            SynapsePrefetch::NONE,
        )
        .unwrap();

        assert_eq!(synapses.len(), expected);
        assert_eq!(synapses.pre_gids().len(), expected);
        assert_eq!(synapses.post_gids().len(), expected);
    }
}

#[test]
fn test_filter_retains_only_member_peers() {
    let filter = gid_set(&[11]);
    for prefetch in [
        SynapsePrefetch::NONE,
        SynapsePrefetch::ATTRIBUTES,
        SynapsePrefetch::POSITIONS,
    ] {
        let synapses = Synapses::new(
            Arc::new(circuit_source()),
            gid_set(&[1, 2, 3, 4]),
            filter.clone(),
            Direction::Afferent,
            prefetch,
        )
        .unwrap();

        assert!(!synapses.is_empty());
        assert!(synapses.pre_gids().iter().all(|peer| filter.contains(peer)));
    }
}

#[test]
fn test_attribute_access_is_idempotent() {
    let source = Arc::new(InstrumentedSource::new(circuit_source()));
    let synapses = Synapses::new(
        source.clone(),
        gid_set(&[1, 2, 3, 4]),
        GidSet::new(),
        Direction::Afferent,
        SynapsePrefetch::NONE,
    )
    .unwrap();

    let first = synapses.conductances().unwrap();
    let second = synapses.conductances().unwrap();
    assert_eq!(first.as_ptr(), second.as_ptr());
    assert_eq!(first, second);

    let reads = source.attribute_reads.load(Ordering::SeqCst);
    synapses.delays().unwrap();
    synapses.efficacies().unwrap();
    synapses.clone().post_segment_ids().unwrap();
    assert_eq!(source.attribute_reads.load(Ordering::SeqCst), reads);
    assert_eq!(reads, 4);
}

#[test]
fn test_tiers_agree_in_any_order() {
    for direction in [Direction::Afferent, Direction::Efferent] {
        let attributes_first = Synapses::new(
            Arc::new(circuit_source()),
            gid_set(&[1, 2, 3, 4]),
            GidSet::new(),
            direction,
            SynapsePrefetch::ATTRIBUTES,
        )
        .unwrap();
        attributes_first.pre_surface_x_positions().unwrap();

        let positions_first = Synapses::new(
            Arc::new(circuit_source()),
            gid_set(&[1, 2, 3, 4]),
            GidSet::new(),
            direction,
            SynapsePrefetch::POSITIONS,
        )
        .unwrap();
        positions_first.delays().unwrap();

        assert_eq!(attributes_first.len(), positions_first.len());
        assert_eq!(attributes_first.pre_gids(), positions_first.pre_gids());
        assert_eq!(attributes_first.post_gids(), positions_first.post_gids());
        assert_eq!(
            attributes_first.delays().unwrap(),
            positions_first.delays().unwrap()
        );
        assert_eq!(
            attributes_first.pre_surface_x_positions().unwrap(),
            positions_first.pre_surface_x_positions().unwrap()
        );

        let from_connectivity = Synapses::new(
            Arc::new(circuit_source()),
            gid_set(&[1, 2, 3, 4]),
            GidSet::new(),
            direction,
            SynapsePrefetch::NONE,
        )
        .unwrap();
        assert_eq!(from_connectivity.pre_gids(), attributes_first.pre_gids());
        assert_eq!(from_connectivity.post_gids(), attributes_first.post_gids());
    }
}

#[test]
fn test_efferent_is_swap_of_afferent() {
    // Same rows served for both directions
    let mut source = InMemorySource::new()
        .with_connectivity(1, vec![ConnectivityRow::new(5, 2, 2), ConnectivityRow::new(6, 1, 1)]);
    let rows = vec![attribute_row(5, 1.0), attribute_row(5, 2.0), attribute_row(6, 3.0)];
    for direction in [Direction::Afferent, Direction::Efferent] {
        source = source.with_attributes(1, direction, rows.clone());
    }
    let source = Arc::new(source);

    for prefetch in [SynapsePrefetch::NONE, SynapsePrefetch::ATTRIBUTES] {
        let afferent = Synapses::new(
            source.clone(),
            gid_set(&[1]),
            GidSet::new(),
            Direction::Afferent,
            prefetch,
        )
        .unwrap();
        let efferent = Synapses::new(
            source.clone(),
            gid_set(&[1]),
            GidSet::new(),
            Direction::Efferent,
            prefetch,
        )
        .unwrap();

        assert_eq!(afferent.pre_gids(), efferent.post_gids());
        assert_eq!(afferent.post_gids(), efferent.pre_gids());
        assert_eq!(efferent.pre_gids(), &[1, 1, 1]);
        assert_eq!(efferent.post_gids(), &[5, 5, 6]);
    }
}

#[test]
fn test_concurrent_first_access_loads_once() {
    let source = Arc::new(InstrumentedSource::new(circuit_source()));
    let synapses = Synapses::new(
        source.clone(),
        gid_set(&[1, 2, 3, 4]),
        GidSet::new(),
        Direction::Afferent,
        SynapsePrefetch::NONE,
    )
    .unwrap();

    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let synapses = synapses.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                if t % 2 == 0 {
                    synapses.delays().unwrap().to_vec()
                } else {
                    synapses.pre_center_x_positions().unwrap().to_vec()
                }
            })
        })
        .collect();

    let results: Vec<Vec<f32>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for pair in results.chunks(2) {
        assert_eq!(pair[0].len(), synapses.len());
        assert_eq!(pair[1].len(), synapses.len());
    }

    // each tier was read exactly once per neuron
    assert_eq!(source.attribute_reads.load(Ordering::SeqCst), 4);
    assert_eq!(source.position_reads.load(Ordering::SeqCst), 4);
    assert_eq!(source.connectivity_reads.load(Ordering::SeqCst), 4);
}

#[test]
fn test_failed_load_leaves_tier_unpopulated_and_retries() {
    let source = Arc::new(InstrumentedSource::new(scenario_source()));
    source.fail_attributes.store(true, Ordering::SeqCst);

    let synapses = Synapses::new(
        source.clone(),
        gid_set(&[1, 2]),
        GidSet::new(),
        Direction::Afferent,
        SynapsePrefetch::NONE,
    )
    .unwrap();

    assert!(matches!(synapses.delays(), Err(CacheError::Source(_))));
    assert!(!synapses.loaded_tiers().attributes);
    assert_eq!(synapses.len(), 3);

    source.fail_attributes.store(false, Ordering::SeqCst);
    assert_eq!(synapses.delays().unwrap(), &[0.1, 0.2, 0.3]);
    assert!(synapses.loaded_tiers().attributes);
}

#[test]
fn test_failed_prefetch_fails_construction() {
    let source = Arc::new(InstrumentedSource::new(scenario_source()));
    source.fail_attributes.store(true, Ordering::SeqCst);

    let result = Synapses::new(
        source,
        gid_set(&[1, 2]),
        GidSet::new(),
        Direction::Afferent,
        SynapsePrefetch::ATTRIBUTES,
    );
    assert!(matches!(result, Err(CacheError::Source(_))));
}

#[test]
fn test_prefetch_all_loads_everything_up_front() {
    let source = Arc::new(InstrumentedSource::new(scenario_source()));
    let synapses = Synapses::new(
        source.clone(),
        gid_set(&[1, 2]),
        GidSet::new(),
        Direction::Afferent,
        SynapsePrefetch::ALL,
    )
    .unwrap();

    let tiers = synapses.loaded_tiers();
    assert!(tiers.connectivity && tiers.attributes && tiers.positions);
    assert_eq!(source.connectivity_reads.load(Ordering::SeqCst), 0);

    assert_eq!(synapses.pre_surface_x_positions().unwrap(), &[1.0, 2.0, 3.0]);
    assert_eq!(synapses.post_center_z_positions().unwrap(), &[-1.0, -2.0, -3.0]);
    assert_eq!(synapses.post_section_ids().unwrap(), &[4, 4, 4]);
}

#[test]
fn test_indices_follow_extra_index_source() {
    let source = scenario_source()
        .with_extra_index(1, vec![ExtraIndexRow { peer: 9, index: 11 }])
        .with_extra_index(
            2,
            vec![
                ExtraIndexRow { peer: 10, index: 21 },
                ExtraIndexRow { peer: 10, index: 22 },
            ],
        );
    let source = Arc::new(source);

    let afferent = Synapses::new(
        source.clone(),
        gid_set(&[1, 2]),
        GidSet::new(),
        Direction::Afferent,
        SynapsePrefetch::NONE,
    )
    .unwrap();
    assert_eq!(afferent.indices().unwrap(), &[11, 21, 22]);
    assert_eq!(afferent.get(2).unwrap().global_index().unwrap(), 22);

    let without_index = Synapses::new(
        Arc::new(scenario_source()),
        gid_set(&[1, 2]),
        GidSet::new(),
        Direction::Afferent,
        SynapsePrefetch::NONE,
    )
    .unwrap();
    assert!(matches!(
        without_index.indices(),
        Err(CacheError::FeatureUnavailable(_))
    ));
}

#[test]
fn test_columns_are_aligned() {
    let synapses = Synapses::with_alignment(
        Arc::new(circuit_source()),
        gid_set(&[1, 2, 3, 4]),
        GidSet::new(),
        Direction::Afferent,
        SynapsePrefetch::ALL,
        64,
    )
    .unwrap();

    assert_eq!(synapses.pre_gids().as_ptr() as usize % 64, 0);
    assert_eq!(synapses.delays().unwrap().as_ptr() as usize % 64, 0);
    assert_eq!(
        synapses.post_surface_y_positions().unwrap().as_ptr() as usize % 64,
        0
    );
}

#[test]
fn test_empty_request() {
    let synapses = Synapses::new(
        Arc::new(scenario_source()),
        GidSet::new(),
        GidSet::new(),
        Direction::Afferent,
        SynapsePrefetch::NONE,
    )
    .unwrap();

    assert!(synapses.is_empty());
    assert_eq!(synapses.iter().count(), 0);
    assert!(synapses.delays().unwrap().is_empty());
    assert!(synapses.pre_center_y_positions().unwrap().is_empty());
}

#[test]
fn test_handle_outlives_original() {
    let synapses = Synapses::new(
        Arc::new(scenario_source()),
        gid_set(&[1, 2]),
        GidSet::new(),
        Direction::Afferent,
        SynapsePrefetch::NONE,
    )
    .unwrap();
    let moved = synapses.clone();
    drop(synapses);

    assert_eq!(moved.len(), 3);
    assert_eq!(moved.utilizations().unwrap().len(), 3);
}

#[test]
fn test_attribute_prefetch_reads_each_neuron_once() {
    let source = Arc::new(DefaultCountSource {
        inner: scenario_source(),
        ..Default::default()
    });
    let synapses = Synapses::new(
        source.clone(),
        gid_set(&[1, 2]),
        GidSet::new(),
        Direction::Afferent,
        SynapsePrefetch::ATTRIBUTES,
    )
    .unwrap();

    assert_eq!(synapses.delays().unwrap(), &[0.1, 0.2, 0.3]);
    assert_eq!(source.attribute_reads.load(Ordering::SeqCst), 2);
}

#[test]
fn test_large_peer_gid_is_exact_in_every_tier() {
    let peer: Gid = 16_777_217;
    let source = || {
        Arc::new(
            InMemorySource::new()
                .with_connectivity(3, vec![ConnectivityRow::new(peer, 0, 1)])
                .with_attributes(3, Direction::Afferent, vec![attribute_row(peer, 0.5)])
                .with_positions(3, Direction::Afferent, vec![position_row(peer, 1.0)]),
        )
    };
    let open = |prefetch| {
        Synapses::new(
            source(),
            gid_set(&[3]),
            gid_set(&[peer]),
            Direction::Afferent,
            prefetch,
        )
        .unwrap()
    };

    let from_connectivity = open(SynapsePrefetch::NONE);
    let attributes_first = open(SynapsePrefetch::ATTRIBUTES);
    let positions_first = open(SynapsePrefetch::POSITIONS);

    assert_eq!(from_connectivity.pre_gids(), &[peer]);
    assert_eq!(attributes_first.pre_gids(), from_connectivity.pre_gids());
    assert_eq!(positions_first.pre_gids(), from_connectivity.pre_gids());
    assert_eq!(attributes_first.delays().unwrap(), &[0.5]);
    assert_eq!(attributes_first.get(0).unwrap().pre_gid(), peer);
}
