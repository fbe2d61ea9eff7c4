//! Seeded synthetic labelled volumes.
//!
//! A volume is a Voronoi partition of a grid around randomly placed seed
//! sites, with a fraction of non-seed sites knocked out to background. Edge
//! affinities are high inside a segment and low across a boundary, blurred by
//! uniform noise, so MALIS sees realistic merge orders.

use malis_core::{AffinityGraph, GraphError, GridShape, Neighbourhood};
use rand::{Rng, SeedableRng, rngs::SmallRng, seq::index};

/// Affinity assigned to edges inside one segment, before noise.
pub const INTRA_SEGMENT_AFFINITY: f32 = 0.9;
/// Affinity assigned to edges crossing a boundary, before noise.
pub const BOUNDARY_AFFINITY: f32 = 0.1;

/// Errors raised while generating a synthetic volume.
#[derive(Debug, thiserror::Error)]
pub enum VolumeError {
    /// No segments were requested.
    #[error("segment count must be greater than zero")]
    ZeroSegments,
    /// More segments were requested than the grid has sites.
    #[error("segment count ({segment_count}) must not exceed site count ({site_count})")]
    SegmentCountExceedsSites {
        /// Number of segments requested.
        segment_count: usize,
        /// Number of grid sites.
        site_count: usize,
    },
    /// A probability or noise amplitude was outside `[0, 1]`.
    #[error("`{parameter}` must be a finite value in [0, 1]")]
    InvalidFloatParameter {
        /// Name of the invalid parameter.
        parameter: &'static str,
    },
    /// The grid could not be enumerated.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Parameters of a synthetic volume.
#[derive(Clone, Copy, Debug)]
pub struct SyntheticVolumeConfig {
    /// `[z, y, x]` extents.
    pub extents: [usize; 3],
    /// Number of Voronoi segments.
    pub segment_count: usize,
    /// Probability that a non-seed site is relabelled as background.
    pub background_fraction: f64,
    /// Half-width of the uniform noise added to every affinity.
    pub noise: f32,
    /// RNG seed.
    pub seed: u64,
}

/// Explicit edge arrays for the segmentation entry points.
#[derive(Clone, Debug, Default)]
pub struct EdgeList {
    /// First endpoint of every edge.
    pub node1: Vec<u64>,
    /// Second endpoint of every edge.
    pub node2: Vec<u64>,
    /// Affinity of every edge.
    pub weights: Vec<f32>,
}

impl EdgeList {
    /// Binarises the weights: `1` where the affinity exceeds `threshold`.
    #[must_use]
    pub fn thresholded(&self, threshold: f32) -> Vec<i32> {
        self.weights
            .iter()
            .map(|&weight| i32::from(weight > threshold))
            .collect()
    }
}

/// A labelled grid with affinities over the nearest-neighbour graph.
#[derive(Clone, Debug)]
pub struct SyntheticVolume {
    graph: AffinityGraph,
    labels: Vec<u64>,
    markers: Vec<u64>,
    affinities: Vec<f32>,
}

impl SyntheticVolume {
    /// Generates a volume deterministically from `config`.
    ///
    /// # Errors
    /// Returns [`VolumeError`] when the configuration is invalid or the grid
    /// cannot be enumerated.
    pub fn generate(config: &SyntheticVolumeConfig) -> Result<Self, VolumeError> {
        validate(config)?;
        let [depth, height, width] = config.extents;
        let graph = AffinityGraph::new(GridShape::new(depth, height, width), Neighbourhood::nearest())?;
        let site_count = graph.site_count();
        if config.segment_count > site_count {
            return Err(VolumeError::SegmentCountExceedsSites {
                segment_count: config.segment_count,
                site_count,
            });
        }

        let mut rng = SmallRng::seed_from_u64(config.seed);
        let coordinates = grid_coordinates(config.extents);
        let seed_sites = index::sample(&mut rng, site_count, config.segment_count).into_vec();
        let seeds: Vec<(u64, [usize; 3])> = (1_u64..)
            .zip(&seed_sites)
            .filter_map(|(label, &site)| Some((label, *coordinates.get(site)?)))
            .collect();

        let mut markers = vec![0_u64; site_count];
        for (&site, &(label, _)) in seed_sites.iter().zip(&seeds) {
            if let Some(marker) = markers.get_mut(site) {
                *marker = label;
            }
        }

        let labels = coordinates
            .iter()
            .zip(&markers)
            .map(|(position, &marker)| {
                if marker != 0 {
                    marker
                } else if rng.gen_bool(config.background_fraction) {
                    0
                } else {
                    nearest_seed(&seeds, *position)
                }
            })
            .collect::<Vec<_>>();

        let affinities = noisy_affinities(&graph, &labels, config.noise, &mut rng);
        Ok(Self {
            graph,
            labels,
            markers,
            affinities,
        })
    }

    /// The nearest-neighbour affinity graph of the volume.
    #[must_use]
    pub const fn graph(&self) -> &AffinityGraph {
        &self.graph
    }

    /// Ground-truth label of every site (`0` = background).
    #[must_use]
    pub fn labels(&self) -> &[u64] {
        &self.labels
    }

    /// Watershed markers: every seed site carries its segment label.
    #[must_use]
    pub fn markers(&self) -> &[u64] {
        &self.markers
    }

    /// Dense affinity buffer, one value per graph slot.
    #[must_use]
    pub fn affinities(&self) -> &[f32] {
        &self.affinities
    }

    /// The valid edges as explicit endpoint arrays.
    #[must_use]
    pub fn edge_list(&self) -> EdgeList {
        let mut edges = EdgeList::default();
        for &slot in self.graph.edge_slots() {
            let Some((source, target)) = self.graph.endpoints(slot) else {
                continue;
            };
            let (Ok(first), Ok(second)) = (u64::try_from(source), u64::try_from(target)) else {
                continue;
            };
            edges.node1.push(first);
            edges.node2.push(second);
            edges
                .weights
                .push(self.affinities.get(slot).copied().unwrap_or_default());
        }
        edges
    }
}

fn validate(config: &SyntheticVolumeConfig) -> Result<(), VolumeError> {
    if config.segment_count == 0 {
        return Err(VolumeError::ZeroSegments);
    }
    if !(0.0..=1.0).contains(&config.background_fraction) {
        return Err(VolumeError::InvalidFloatParameter {
            parameter: "background_fraction",
        });
    }
    if !(0.0..=1.0).contains(&config.noise) {
        return Err(VolumeError::InvalidFloatParameter { parameter: "noise" });
    }
    Ok(())
}

/// Site coordinates in row-major site order.
fn grid_coordinates([depth, height, width]: [usize; 3]) -> Vec<[usize; 3]> {
    let mut coordinates = Vec::with_capacity(depth.saturating_mul(height).saturating_mul(width));
    for z in 0..depth {
        for y in 0..height {
            for x in 0..width {
                coordinates.push([z, y, x]);
            }
        }
    }
    coordinates
}

fn nearest_seed(seeds: &[(u64, [usize; 3])], position: [usize; 3]) -> u64 {
    seeds
        .iter()
        .min_by_key(|(_, seed)| {
            seed.iter().zip(position).fold(0_usize, |acc, (&a, b)| {
                let delta = a.abs_diff(b);
                acc.saturating_add(delta.saturating_mul(delta))
            })
        })
        .map_or(0, |&(label, _)| label)
}

#[expect(
    clippy::float_arithmetic,
    reason = "affinities are perturbed by additive noise"
)]
fn noisy_affinities(graph: &AffinityGraph, labels: &[u64], noise: f32, rng: &mut SmallRng) -> Vec<f32> {
    let mut affinities = vec![0.0_f32; graph.slot_count()];
    for &slot in graph.edge_slots() {
        let Some((source, target)) = graph.endpoints(slot) else {
            continue;
        };
        let base = match (labels.get(source), labels.get(target)) {
            (Some(&left), Some(&right)) if left != 0 && left == right => INTRA_SEGMENT_AFFINITY,
            _ => BOUNDARY_AFFINITY,
        };
        let jitter = rng.gen_range(-noise..=noise);
        if let Some(value) = affinities.get_mut(slot) {
            *value = (base + jitter).clamp(0.0, 1.0);
        }
    }
    affinities
}

#[cfg(test)]
mod tests;
