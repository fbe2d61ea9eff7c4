//! Segmentations derived directly from an affinity edge list.
//!
//! Both entry points take explicit `node1`/`node2` endpoint arrays rather
//! than an [`crate::AffinityGraph`], so they cannot rely on enumerated edges
//! being in range. Edges whose endpoints fall outside `0..site_count` are
//! skipped and counted in a `warn!` event.

mod components;
mod watershed;

pub use self::components::connected_components;
pub use self::watershed::marker_watershed;

use crate::error::{Result, check_len};

/// Checks that the endpoint arrays and the weight array describe the same
/// edges and that `seg` has one slot per site.
fn check_edge_arrays(
    site_count: usize,
    node1: &[u64],
    node2: &[u64],
    weights: usize,
    seg: &[u64],
) -> Result<()> {
    check_len("seg", seg.len(), site_count)?;
    check_len("node2", node2.len(), node1.len())?;
    check_len("edge_weight", weights, node1.len())
}

/// Converts a raw endpoint pair to site indices, or `None` when either
/// endpoint is outside the graph.
fn site_pair(source: u64, target: u64, site_count: usize) -> Option<(usize, usize)> {
    let in_range = |node: u64| usize::try_from(node).ok().filter(|&site| site < site_count);
    Some((in_range(source)?, in_range(target)?))
}
