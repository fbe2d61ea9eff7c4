//! Seeded maximum-spanning-forest watershed.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use tracing::{debug, instrument, warn};

use crate::{
    error::{MalisError, Result},
    forest::{DisjointSet, MergeDecision, MergeHandler, Payload, WeightedEdge, grow_forest},
};

use super::{check_edge_arrays, site_pair};

/// The marker flooding a component; `0` while unflooded.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
struct MarkerLabel(u64);

impl Payload for MarkerLabel {
    fn absorb(&mut self, other: Self) {
        self.0 = self.0.max(other.0);
    }
}

/// Refuses to join two basins flooded by different markers.
struct SeedGuard;

impl MergeHandler<MarkerLabel> for SeedGuard {
    fn on_merge(&mut self, _key: usize, left: &MarkerLabel, right: &MarkerLabel) -> MergeDecision {
        if left.0 == 0 || right.0 == 0 || left.0 == right.0 {
            MergeDecision::Merge
        } else {
            MergeDecision::Skip
        }
    }
}

/// Floods positive markers across the affinity graph, strongest edges first.
///
/// Edge `i` joins sites `node1[i]` and `node2[i]` with affinity
/// `edge_weight[i]`. Zero-weight edges are ignored. Sites sharing a positive
/// marker start as one basin. Each basin grows along the maximum spanning
/// forest until it meets a basin with a different marker; sites no marker
/// reaches keep label `0`. The resulting label of every site is written to
/// `seg`.
///
/// # Errors
/// Returns [`MalisError::LengthMismatch`] when `seg` does not have one slot
/// per marker or the edge arrays differ in length, and
/// [`MalisError::NonFiniteWeight`] when an in-range edge carries a NaN or
/// infinite weight. `seg` is left untouched on error.
///
/// # Examples
/// ```
/// use malis_core::marker_watershed;
///
/// let marker = [1, 0, 0, 2];
/// let mut seg = [0; 4];
/// marker_watershed(&marker, &[0, 1, 2], &[1, 2, 3], &[0.9, 0.2, 0.8], &mut seg)?;
/// assert_eq!(seg, [1, 1, 2, 2]);
/// # Ok::<(), malis_core::MalisError>(())
/// ```
#[instrument(
    name = "segment.marker_watershed",
    err,
    skip_all,
    fields(sites = marker.len(), edges = node1.len()),
)]
pub fn marker_watershed(
    marker: &[u64],
    node1: &[u64],
    node2: &[u64],
    edge_weight: &[f32],
    seg: &mut [u64],
) -> Result<()> {
    let site_count = marker.len();
    check_edge_arrays(site_count, node1, node2, edge_weight.len(), seg)?;

    let mut edges = Vec::with_capacity(edge_weight.len());
    let mut skipped = 0usize;
    for (key, ((&source, &target), &weight)) in node1.iter().zip(node2).zip(edge_weight).enumerate() {
        let Some((source, target)) = site_pair(source, target, site_count) else {
            skipped = skipped.saturating_add(1);
            continue;
        };
        if weight == 0.0 {
            continue;
        }
        if !weight.is_finite() {
            return Err(MalisError::NonFiniteWeight { edge: key, weight });
        }
        edges.push(WeightedEdge::new(key, source, target, weight));
    }
    if skipped > 0 {
        warn!(skipped, site_count, "skipping edges with out-of-range endpoints");
    }

    let mut sets = DisjointSet::new(marker.iter().map(|&label| MarkerLabel(label)).collect());
    let basins = unite_shared_markers(&mut sets, marker);
    let merges = grow_forest(&mut sets, edges, &mut SeedGuard);

    for (site, label) in seg.iter_mut().enumerate() {
        let root = sets.find(site);
        *label = sets.payload(root).0;
    }
    debug!(
        basins,
        merges = merges.len(),
        components = sets.component_count(),
        "watershed flooded"
    );
    Ok(())
}

/// Joins every site carrying a given positive marker into one component and
/// returns the number of distinct markers.
fn unite_shared_markers(sets: &mut DisjointSet<MarkerLabel>, marker: &[u64]) -> usize {
    let mut first_site = HashMap::new();
    for (site, &label) in marker.iter().enumerate().filter(|&(_, &label)| label != 0) {
        match first_site.entry(label) {
            Entry::Occupied(entry) => {
                sets.union(*entry.get(), site);
            }
            Entry::Vacant(entry) => {
                entry.insert(site);
            }
        }
    }
    first_site.len()
}
