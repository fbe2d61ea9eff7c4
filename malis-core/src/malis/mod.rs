//! MALIS (maximin affinity) loss weights.
//!
//! Thresholding an affinity graph at every level at once is equivalent to
//! building its maximum spanning forest: two sites are connected at
//! threshold `t` exactly when the weakest edge on their forest path, the
//! maximin edge, is at least `t`. MALIS charges each pair of labelled sites
//! to that single edge. The forest is grown heaviest edge first and every
//! component carries a histogram of the ground-truth labels it contains, so
//! the merge triggered by an edge connects `count_a * count_b` new pairs for
//! every label pair `(a, b)` drawn from the two sides.
//!
//! Same-label pairs are positive pairs and different-label pairs are
//! negative pairs. Counts are normalised by the total number of pairs of
//! each kind in the ground truth:
//!
//! - `nPairPos = Σ_label C(size(label), 2)`
//! - `nPairNeg = C(nLabeledSites, 2) - nPairPos`
//!
//! Unlabelled sites (label `0`) are ignored throughout.

mod overlap;

use std::collections::HashMap;

use tracing::{debug, instrument};

use crate::{
    AffinityGraph, GridShape, Neighbourhood,
    error::{MalisError, Result, check_len},
    forest::{DisjointSet, MergeDecision, MergeHandler, WeightedEdge, grow_forest},
};

use self::overlap::LabelOverlap;

/// Selects which pairs contribute to the loss weights and how.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PairPolicy {
    /// Same-label pairs only, normalised by `nPairPos`.
    Positive,
    /// Different-label pairs only, normalised by `nPairNeg`.
    Negative,
    /// Same-label pairs add `1 / nPairPos`, different-label pairs subtract
    /// `1 / nPairNeg`, giving one signed weight per edge.
    Signed,
}

impl PairPolicy {
    /// Decodes the integer mode flag: `1` positive, `0` negative, `-1` signed.
    ///
    /// # Examples
    /// ```
    /// use malis_core::PairPolicy;
    ///
    /// assert_eq!(PairPolicy::from_flag(1), Some(PairPolicy::Positive));
    /// assert_eq!(PairPolicy::from_flag(-1), Some(PairPolicy::Signed));
    /// assert_eq!(PairPolicy::from_flag(2), None);
    /// ```
    #[must_use]
    pub const fn from_flag(flag: i32) -> Option<Self> {
        match flag {
            1 => Some(Self::Positive),
            0 => Some(Self::Negative),
            -1 => Some(Self::Signed),
            _ => None,
        }
    }

    /// Returns the integer mode flag for this policy.
    #[must_use]
    pub const fn flag(self) -> i32 {
        match self {
            Self::Positive => 1,
            Self::Negative => 0,
            Self::Signed => -1,
        }
    }
}

/// Pair statistics of a ground-truth labelling.
///
/// # Examples
/// ```
/// use malis_core::PairCounts;
///
/// let counts = PairCounts::from_labels(&[1, 1, 2, 2, 0]);
/// assert_eq!(counts.labeled_sites(), 4);
/// assert_eq!(counts.positive_pairs(), 2);
/// assert_eq!(counts.negative_pairs(), 4);
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct PairCounts {
    labeled_sites: u64,
    positive_pairs: u64,
    negative_pairs: u64,
}

impl PairCounts {
    /// Counts labelled sites and same/different-label pairs in `labels`.
    #[must_use]
    pub fn from_labels(labels: &[u64]) -> Self {
        let mut segment_sizes = HashMap::<u64, u64>::new();
        let mut labeled_sites = 0u64;
        let mut positive_pairs = 0u64;
        for &label in labels.iter().filter(|&&label| label != 0) {
            let size = segment_sizes.entry(label).or_insert(0);
            // The new site pairs with every earlier site of its segment.
            positive_pairs = positive_pairs.saturating_add(*size);
            *size = size.saturating_add(1);
            labeled_sites = labeled_sites.saturating_add(1);
        }
        let total_pairs = choose_two(labeled_sites);
        Self {
            labeled_sites,
            positive_pairs,
            negative_pairs: total_pairs.saturating_sub(positive_pairs),
        }
    }

    /// Number of sites with a nonzero label.
    #[must_use]
    #[rustfmt::skip]
    pub const fn labeled_sites(&self) -> u64 { self.labeled_sites }

    /// Number of unordered same-label site pairs (`nPairPos`).
    #[must_use]
    #[rustfmt::skip]
    pub const fn positive_pairs(&self) -> u64 { self.positive_pairs }

    /// Number of unordered different-label site pairs (`nPairNeg`).
    #[must_use]
    #[rustfmt::skip]
    pub const fn negative_pairs(&self) -> u64 { self.negative_pairs }

    /// Number of unordered labelled site pairs.
    #[must_use]
    pub const fn total_pairs(&self) -> u64 {
        self.positive_pairs.saturating_add(self.negative_pairs)
    }
}

const fn choose_two(n: u64) -> u64 {
    if n < 2 {
        0
    } else if n % 2 == 0 {
        (n / 2).saturating_mul(n - 1)
    } else {
        n.saturating_mul((n - 1) / 2)
    }
}

#[expect(
    clippy::cast_precision_loss,
    clippy::float_arithmetic,
    reason = "normalisers are reciprocal pair counts"
)]
fn reciprocal(pairs: u64) -> Option<f64> {
    (pairs != 0).then(|| 1.0 / pairs as f64)
}

/// Writes normalised pair counts into the slot of the edge that caused each
/// merge.
struct PairAccumulator<'a> {
    same_label_scale: Option<f64>,
    cross_label_scale: Option<f64>,
    out: &'a mut [f32],
}

impl<'a> PairAccumulator<'a> {
    /// Returns `None` when the policy has nothing to accumulate.
    fn new(policy: PairPolicy, counts: PairCounts, out: &'a mut [f32]) -> Option<Self> {
        let positive = reciprocal(counts.positive_pairs());
        let negative = reciprocal(counts.negative_pairs());
        let (same_label_scale, cross_label_scale) = match policy {
            PairPolicy::Positive => (positive, None),
            PairPolicy::Negative => (None, negative),
            PairPolicy::Signed => (positive, negative.map(|scale| -scale)),
        };
        if same_label_scale.is_none() && cross_label_scale.is_none() {
            return None;
        }
        Some(Self {
            same_label_scale,
            cross_label_scale,
            out,
        })
    }
}

impl MergeHandler<LabelOverlap> for PairAccumulator<'_> {
    #[expect(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::float_arithmetic,
        reason = "pair counts are scaled into f32 loss weights"
    )]
    fn on_merge(&mut self, key: usize, left: &LabelOverlap, right: &LabelOverlap) -> MergeDecision {
        if left.is_empty() || right.is_empty() {
            return MergeDecision::Merge;
        }
        let mut delta = 0.0_f64;
        for (left_label, left_count) in left.iter() {
            for (right_label, right_count) in right.iter() {
                let scale = if left_label == right_label {
                    self.same_label_scale
                } else {
                    self.cross_label_scale
                };
                if let Some(scale) = scale {
                    delta += left_count.saturating_mul(right_count) as f64 * scale;
                }
            }
        }
        if delta != 0.0 {
            if let Some(slot) = self.out.get_mut(key) {
                *slot += delta as f32;
            }
        }
        MergeDecision::Merge
    }
}

/// Entry point for computing MALIS loss weights with a fixed [`PairPolicy`].
///
/// # Examples
/// ```
/// use malis_core::{AffinityGraph, GridShape, MalisBuilder, Neighbourhood, PairPolicy};
///
/// let graph = AffinityGraph::new(GridShape::planar(1, 4), Neighbourhood::new(vec![[0, 0, 1]]))?;
/// let malis = MalisBuilder::new().with_policy(PairPolicy::Positive).build()?;
/// let mut out = vec![0.0; graph.slot_count()];
/// malis.loss_weights(&graph, &[1, 1, 2, 2], &[0.9, 0.1, 0.8, 0.0], &mut out)?;
/// assert_eq!(out, vec![0.5, 0.0, 0.5, 0.0]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Malis {
    policy: PairPolicy,
}

impl Malis {
    pub(crate) const fn new(policy: PairPolicy) -> Self {
        Self { policy }
    }

    /// Returns the configured pair policy.
    #[must_use]
    #[rustfmt::skip]
    pub const fn policy(&self) -> PairPolicy { self.policy }

    /// Accumulates MALIS weights for `graph` into `out`.
    ///
    /// `seg` holds one ground-truth label per site (`0` = unlabelled);
    /// `edge_weight` and `out` hold one value per affinity slot
    /// ([`AffinityGraph::slot_count`]). Contributions are added to whatever
    /// `out` already holds; slots of out-of-bounds edges are never touched.
    /// When the policy's normaliser is zero the call returns without writing.
    /// Returns the pair statistics of `seg`.
    ///
    /// # Errors
    /// Returns [`MalisError::LengthMismatch`] when a buffer does not match the
    /// graph and [`MalisError::NonFiniteWeight`] when a valid edge carries a
    /// NaN or infinite weight. Validation completes before `out` is written.
    #[instrument(
        name = "malis.loss_weights",
        err,
        skip(self, graph, seg, edge_weight, out),
        fields(
            sites = graph.site_count(),
            edges = graph.edge_count(),
            policy = ?self.policy
        ),
    )]
    pub fn loss_weights(
        &self,
        graph: &AffinityGraph,
        seg: &[u64],
        edge_weight: &[f32],
        out: &mut [f32],
    ) -> Result<PairCounts> {
        check_len("seg", seg.len(), graph.site_count())?;
        check_len("edge_weight", edge_weight.len(), graph.slot_count())?;
        check_len("out", out.len(), graph.slot_count())?;

        let edges = graph.weighted_edges(edge_weight).collect::<Vec<_>>();
        if let Some(edge) = edges.iter().find(|edge| !edge.weight().is_finite()) {
            return Err(MalisError::NonFiniteWeight {
                edge: edge.key(),
                weight: edge.weight(),
            });
        }

        let counts = PairCounts::from_labels(seg);
        debug!(
            labeled_sites = counts.labeled_sites(),
            positive_pairs = counts.positive_pairs(),
            negative_pairs = counts.negative_pairs(),
            "ground-truth pairs counted"
        );
        let Some(mut accumulator) = PairAccumulator::new(self.policy, counts, out) else {
            debug!("no pairs to normalise for this policy, leaving weights untouched");
            return Ok(counts);
        };

        accumulate(seg, edges, &mut accumulator);
        Ok(counts)
    }
}

fn accumulate(seg: &[u64], edges: Vec<WeightedEdge>, accumulator: &mut PairAccumulator<'_>) {
    let payload = seg.iter().map(|&label| LabelOverlap::seeded(label)).collect();
    let mut sets = DisjointSet::new(payload);
    let merges = grow_forest(&mut sets, edges, accumulator);
    debug!(merges = merges.len(), "malis weights accumulated");
}

/// Accumulates MALIS weights for `graph` into `out` under `policy`.
///
/// Arguments follow the order labels, graph, weights, mode, output. See
/// [`Malis::loss_weights`] for buffer layout and degenerate cases.
///
/// # Errors
/// As [`Malis::loss_weights`].
pub fn malis_loss_weights(
    seg: &[u64],
    graph: &AffinityGraph,
    edge_weight: &[f32],
    policy: PairPolicy,
    out: &mut [f32],
) -> Result<PairCounts> {
    Malis::new(policy).loss_weights(graph, seg, edge_weight, out)
}

/// Builds the affinity graph for `shape` and `neighbourhood` and returns a
/// freshly zeroed weight buffer with the MALIS weights accumulated into it.
///
/// # Errors
/// Returns [`MalisError::Graph`] when the graph cannot be built, otherwise
/// as [`Malis::loss_weights`].
///
/// # Examples
/// ```
/// use malis_core::{GridShape, Neighbourhood, PairPolicy, malis_loss_weights_for_shape};
///
/// let weights = malis_loss_weights_for_shape(
///     &[1, 1, 2, 0],
///     GridShape::planar(2, 2),
///     &Neighbourhood::new(vec![[0, 0, 1]]),
///     &[0.9, 0.0, 0.1, 0.0],
///     PairPolicy::Positive,
/// )?;
/// assert_eq!(weights, vec![1.0, 0.0, 0.0, 0.0]);
/// # Ok::<(), malis_core::MalisError>(())
/// ```
pub fn malis_loss_weights_for_shape(
    seg: &[u64],
    shape: GridShape,
    neighbourhood: &Neighbourhood,
    edge_weight: &[f32],
    policy: PairPolicy,
) -> Result<Vec<f32>> {
    let graph = AffinityGraph::new(shape, neighbourhood.clone())?;
    let mut out = vec![0.0; graph.slot_count()];
    malis_loss_weights(seg, &graph, edge_weight, policy, &mut out)?;
    Ok(out)
}

#[cfg(test)]
mod property;
