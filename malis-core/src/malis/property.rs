//! Property tests comparing MALIS weights with a pair-enumerating oracle.

use proptest::prelude::*;
use proptest::test_runner::{TestCaseError, TestCaseResult};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::forest::WeightedEdge;
use crate::test_utils::suite_proptest_config;
use crate::{AffinityGraph, GridShape, Neighbourhood, PairCounts, PairPolicy, malis_loss_weights};

#[derive(Clone, Debug)]
struct VolumeFixture {
    shape: GridShape,
    seg: Vec<u64>,
    affinities: Vec<f32>,
}

fn volume_fixture_strategy() -> impl Strategy<Value = VolumeFixture> {
    (1_usize..=2, 1_usize..=4, 1_usize..=4, 0_u64..=4, any::<u64>()).prop_map(
        |(z, y, x, max_label, seed)| {
            let mut rng = SmallRng::seed_from_u64(seed);
            let shape = GridShape::new(z, y, x);
            let sites = z * y * x;
            let seg = (0..sites).map(|_| rng.gen_range(0..=max_label)).collect();
            // A coarse weight grid forces plenty of ties.
            let affinities = (0..sites * 3)
                .map(|_| f32::from(rng.gen_range(0_u8..=8)) / 8.0)
                .collect();
            VolumeFixture {
                shape,
                seg,
                affinities,
            }
        },
    )
}

/// Replays the heaviest-first merge sequence with flat component ids and
/// charges every labelled site pair directly to the edge that joins it.
fn enumerate_pairs(graph: &AffinityGraph, seg: &[u64], affinities: &[f32], policy: PairPolicy) -> Vec<f64> {
    let counts = PairCounts::from_labels(seg);
    let scale = |pairs: u64| (pairs != 0).then(|| 1.0 / pairs as f64);
    let (same, cross) = match policy {
        PairPolicy::Positive => (scale(counts.positive_pairs()), None),
        PairPolicy::Negative => (None, scale(counts.negative_pairs())),
        PairPolicy::Signed => (
            scale(counts.positive_pairs()),
            scale(counts.negative_pairs()).map(|s| -s),
        ),
    };

    let mut edges = graph
        .edge_slots()
        .iter()
        .map(|&slot| {
            let (source, target) = graph.endpoints(slot).expect("edge slot");
            WeightedEdge::new(slot, source, target, affinities[slot])
        })
        .collect::<Vec<_>>();
    edges.sort_by(|a, b| b.weight().total_cmp(&a.weight()).then(a.key().cmp(&b.key())));

    let mut component: Vec<usize> = (0..seg.len()).collect();
    let mut out = vec![0.0_f64; graph.slot_count()];
    for edge in edges {
        let left = component[edge.source()];
        let right = component[edge.target()];
        if left == right {
            continue;
        }
        for i in (0..seg.len()).filter(|&i| component[i] == left && seg[i] != 0) {
            for j in (0..seg.len()).filter(|&j| component[j] == right && seg[j] != 0) {
                let factor = if seg[i] == seg[j] { same } else { cross };
                if let Some(factor) = factor {
                    out[edge.key()] += factor;
                }
            }
        }
        for id in &mut component {
            if *id == right {
                *id = left;
            }
        }
    }
    out
}

fn run_oracle_equivalence_property(fixture: &VolumeFixture, policy: PairPolicy) -> TestCaseResult {
    let graph = AffinityGraph::new(fixture.shape, Neighbourhood::nearest())
        .map_err(|e| TestCaseError::fail(format!("graph failed: {e}")))?;
    let mut out = vec![0.0_f32; graph.slot_count()];
    malis_loss_weights(&fixture.seg, &graph, &fixture.affinities, policy, &mut out)
        .map_err(|e| TestCaseError::fail(format!("malis failed: {e}")))?;

    let expected = enumerate_pairs(&graph, &fixture.seg, &fixture.affinities, policy);
    for (slot, (&actual, &wanted)) in out.iter().zip(&expected).enumerate() {
        prop_assert!(
            (f64::from(actual) - wanted).abs() <= 1e-5,
            "slot {slot}: histogram={actual} oracle={wanted} ({policy:?})"
        );
    }
    Ok(())
}

fn run_normalisation_property(fixture: &VolumeFixture, policy: PairPolicy) -> TestCaseResult {
    let graph = AffinityGraph::new(fixture.shape, Neighbourhood::nearest())
        .map_err(|e| TestCaseError::fail(format!("graph failed: {e}")))?;
    let mut out = vec![0.0_f32; graph.slot_count()];
    let counts = malis_loss_weights(&fixture.seg, &graph, &fixture.affinities, policy, &mut out)
        .map_err(|e| TestCaseError::fail(format!("malis failed: {e}")))?;

    // The nearest neighbourhood connects the whole grid, so every labelled
    // pair is charged exactly once.
    let positive = if counts.positive_pairs() > 0 { 1.0 } else { 0.0 };
    let negative = if counts.negative_pairs() > 0 { 1.0 } else { 0.0 };
    let expected = match policy {
        PairPolicy::Positive => positive,
        PairPolicy::Negative => negative,
        PairPolicy::Signed => positive - negative,
    };
    let total: f64 = out.iter().map(|&value| f64::from(value)).sum();
    prop_assert!(
        (total - expected).abs() <= 1e-4,
        "total {total}, expected {expected} ({policy:?}, {counts:?})"
    );
    Ok(())
}

fn policy_strategy() -> impl Strategy<Value = PairPolicy> {
    prop::sample::select(vec![PairPolicy::Positive, PairPolicy::Negative, PairPolicy::Signed])
}

proptest! {
    #![proptest_config(suite_proptest_config(96))]

    #[test]
    fn malis_matches_pair_enumeration(
        fixture in volume_fixture_strategy(),
        policy in policy_strategy(),
    ) {
        run_oracle_equivalence_property(&fixture, policy)?;
    }

    #[test]
    fn malis_totals_are_normalised(
        fixture in volume_fixture_strategy(),
        policy in policy_strategy(),
    ) {
        run_normalisation_property(&fixture, policy)?;
    }
}
