//! Type definitions for spanning forest property tests.

use crate::WeightedEdge;

/// Weight distribution strategy for generated graphs.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) enum WeightDistribution {
    /// Each edge has a (practically) unique weight from a continuous range.
    Unique,
    /// Large groups of edges share identical weights, stressing tie-breaking.
    ManyIdentical,
    /// Several components with no cross-component edges.
    Disconnected,
}

/// Fixture for forest property tests.
#[derive(Clone, Debug)]
pub(super) struct ForestFixture {
    /// Number of nodes in the graph.
    pub node_count: usize,
    /// Generated edges, keyed by generation order.
    pub edges: Vec<WeightedEdge>,
    /// Weight distribution used during generation.
    pub distribution: WeightDistribution,
}
