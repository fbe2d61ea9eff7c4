//! Graph generators for spanning forest property tests.

use proptest::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::WeightedEdge;

use super::types::{ForestFixture, WeightDistribution};

const MIN_NODES: usize = 2;
const MAX_NODES: usize = 40;

/// Generates fixtures covering every weight distribution.
pub(super) fn forest_fixture_strategy() -> impl Strategy<Value = ForestFixture> {
    let distributions = prop::sample::select(vec![
        WeightDistribution::Unique,
        WeightDistribution::ManyIdentical,
        WeightDistribution::Disconnected,
    ]);
    (distributions, any::<u64>()).prop_map(|(distribution, seed)| {
        let mut rng = SmallRng::seed_from_u64(seed);
        generate_fixture(distribution, &mut rng)
    })
}

/// Generates a fixture for a specific weight distribution.
pub(super) fn generate_fixture(
    distribution: WeightDistribution,
    rng: &mut SmallRng,
) -> ForestFixture {
    let node_count = rng.gen_range(MIN_NODES..=MAX_NODES);
    let edges = match distribution {
        WeightDistribution::Unique => random_edges(rng, 0..node_count, 0, |r| r.gen_range(0.0_f32..1.0)),
        WeightDistribution::ManyIdentical => {
            let pool: Vec<f32> = (0..rng.gen_range(1..=3))
                .map(|_| f32::from(rng.gen_range(1_u8..=4)) / 4.0)
                .collect();
            random_edges(rng, 0..node_count, 0, move |r| pool[r.gen_range(0..pool.len())])
        }
        WeightDistribution::Disconnected => {
            let split = node_count / 2;
            let mut left = random_edges(rng, 0..split, 0, |r| r.gen_range(0.0_f32..1.0));
            let right = random_edges(rng, split..node_count, left.len(), |r| {
                r.gen_range(0.0_f32..1.0)
            });
            left.extend(right);
            left
        }
    };
    ForestFixture {
        node_count,
        edges,
        distribution,
    }
}

fn random_edges(
    rng: &mut SmallRng,
    nodes: std::ops::Range<usize>,
    first_key: usize,
    mut weight: impl FnMut(&mut SmallRng) -> f32,
) -> Vec<WeightedEdge> {
    let probability = rng.gen_range(0.1..=0.6);
    let mut edges = Vec::new();
    for source in nodes.clone() {
        for target in (source + 1)..nodes.end {
            if rng.gen_bool(probability) {
                let key = first_key + edges.len();
                edges.push(WeightedEdge::new(key, source, target, weight(rng)));
            }
        }
    }
    edges
}
