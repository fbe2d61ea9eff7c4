//! Connected components of the nonzero-affinity subgraph.

use tracing::{debug, instrument, warn};

use crate::{error::Result, forest::DisjointSet};

use super::{check_edge_arrays, site_pair};

/// Labels every site with the representative of its connected component.
///
/// Edge `i` joins `node1[i]` and `node2[i]` when `edge_weight[i]` is
/// nonzero. Edge order does not matter. Representatives are site indices,
/// but which site represents a component is unspecified: compare outputs as
/// partitions, not by value.
///
/// # Errors
/// Returns [`crate::MalisError::LengthMismatch`] when `seg` does not have
/// `site_count` slots or the edge arrays differ in length.
///
/// # Examples
/// ```
/// use malis_core::connected_components;
///
/// let mut seg = [0; 4];
/// connected_components(4, &[0, 1, 2], &[1, 2, 3], &[1, 0, 1], &mut seg)?;
/// assert_eq!(seg[0], seg[1]);
/// assert_eq!(seg[2], seg[3]);
/// assert_ne!(seg[1], seg[2]);
/// # Ok::<(), malis_core::MalisError>(())
/// ```
#[instrument(
    name = "segment.connected_components",
    err,
    skip(node1, node2, edge_weight, seg),
    fields(edges = node1.len()),
)]
pub fn connected_components(
    site_count: usize,
    node1: &[u64],
    node2: &[u64],
    edge_weight: &[i32],
    seg: &mut [u64],
) -> Result<()> {
    check_edge_arrays(site_count, node1, node2, edge_weight.len(), seg)?;

    let mut sets = DisjointSet::new(vec![(); site_count]);
    let mut skipped = 0usize;
    for ((&source, &target), _) in node1
        .iter()
        .zip(node2)
        .zip(edge_weight)
        .filter(|&(_, &weight)| weight != 0)
    {
        match site_pair(source, target, site_count) {
            Some((source, target)) => {
                sets.union(source, target);
            }
            None => skipped = skipped.saturating_add(1),
        }
    }
    if skipped > 0 {
        warn!(skipped, site_count, "skipping edges with out-of-range endpoints");
    }

    for (site, label) in seg.iter_mut().enumerate() {
        *label = sets.find(site) as u64;
    }
    debug!(components = sets.component_count(), "components labelled");
    Ok(())
}
