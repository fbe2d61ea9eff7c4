//! Maximum spanning forest construction over weighted edges.
//!
//! This is Kruskal's algorithm run from the heaviest edge down. The driver
//! owns a payload-carrying union-find and, for every edge whose endpoints lie
//! in different components, asks a [`MergeHandler`] whether to merge before
//! the payloads are fused. MALIS weight accumulation and seeded watershed are
//! both handlers over this one loop; [`maximum_spanning_forest`] is the plain
//! instantiation with no payload.
//!
//! Edges are processed by descending weight with ties broken by ascending
//! edge key, so a given input always yields the same merge sequence.

mod union_find;

use std::cmp::Ordering;

use tracing::{debug, instrument};

pub use self::union_find::Payload;
pub(crate) use self::union_find::DisjointSet;

/// Errors returned while computing a maximum spanning forest.
#[derive(Clone, Debug, thiserror::Error, PartialEq)]
#[non_exhaustive]
pub enum ForestError {
    /// The caller requested a forest for an empty graph.
    #[error("cannot compute a spanning forest for an empty graph")]
    EmptyGraph,
    /// An edge referenced a node id that is not present in the graph.
    #[error("edge references node {node}, but node_count is {node_count}")]
    InvalidNodeId {
        /// The invalid node id referenced by an edge.
        node: usize,
        /// The number of nodes in the graph.
        node_count: usize,
    },
    /// An edge contained a non-finite weight.
    #[error("edge {key} has non-finite weight")]
    NonFiniteWeight {
        /// Key of the offending edge.
        key: usize,
    },
}

impl ForestError {
    /// Returns a stable, machine-readable error code for the variant.
    #[must_use]
    pub const fn code(&self) -> ForestErrorCode {
        match self {
            Self::EmptyGraph => ForestErrorCode::EmptyGraph,
            Self::InvalidNodeId { .. } => ForestErrorCode::InvalidNodeId,
            Self::NonFiniteWeight { .. } => ForestErrorCode::NonFiniteWeight,
        }
    }
}

/// Machine-readable error codes for [`ForestError`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ForestErrorCode {
    /// The caller requested a forest for an empty graph.
    EmptyGraph,
    /// An edge referenced a node id that is not present in the graph.
    InvalidNodeId,
    /// An edge contained a non-finite weight.
    NonFiniteWeight,
}

impl ForestErrorCode {
    /// Returns the symbolic identifier for logging and metrics surfaces.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EmptyGraph => "EMPTY_GRAPH",
            Self::InvalidNodeId => "INVALID_NODE_ID",
            Self::NonFiniteWeight => "NON_FINITE_WEIGHT",
        }
    }
}

/// An undirected weighted edge identified by a caller-chosen key.
///
/// The key names the output slot the edge reports to: the affinity slot for
/// grid graphs, or the position in the node arrays for explicit edge lists.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeightedEdge {
    key: usize,
    source: usize,
    target: usize,
    weight: f32,
}

impl WeightedEdge {
    /// Creates an edge between `source` and `target`.
    #[must_use]
    pub const fn new(key: usize, source: usize, target: usize, weight: f32) -> Self {
        Self {
            key,
            source,
            target,
            weight,
        }
    }

    /// Returns the edge key.
    #[must_use]
    #[rustfmt::skip]
    pub const fn key(&self) -> usize { self.key }

    /// Returns the origin site.
    #[must_use]
    #[rustfmt::skip]
    pub const fn source(&self) -> usize { self.source }

    /// Returns the neighbour site.
    #[must_use]
    #[rustfmt::skip]
    pub const fn target(&self) -> usize { self.target }

    /// Returns the edge weight.
    #[must_use]
    #[rustfmt::skip]
    pub const fn weight(&self) -> f32 { self.weight }
}

/// Heaviest first; equal weights in ascending key order.
fn processing_order(left: &WeightedEdge, right: &WeightedEdge) -> Ordering {
    right
        .weight
        .total_cmp(&left.weight)
        .then_with(|| left.key.cmp(&right.key))
}

/// Outcome of a [`MergeHandler`] consultation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum MergeDecision {
    /// Unite the two components.
    Merge,
    /// Leave both components untouched and move to the next edge.
    Skip,
}

/// Observes, and may veto, every union the driver is about to perform.
pub(crate) trait MergeHandler<P> {
    /// Called with the payloads of the two distinct roots joined by edge
    /// `key`, before they are fused.
    fn on_merge(&mut self, key: usize, left: &P, right: &P) -> MergeDecision;
}

/// Runs Kruskal's algorithm from the heaviest edge down over `sets`.
///
/// Returns the edges that caused a union, in processing order. Every edge
/// reaches the handler at most once, so each key receives at most one merge
/// event.
pub(crate) fn grow_forest<P, H>(
    sets: &mut DisjointSet<P>,
    mut edges: Vec<WeightedEdge>,
    handler: &mut H,
) -> Vec<WeightedEdge>
where
    P: Payload,
    H: MergeHandler<P>,
{
    edges.sort_unstable_by(processing_order);

    let mut accepted = Vec::with_capacity(sets.len().saturating_sub(1));
    let mut vetoed = 0usize;
    for edge in &edges {
        if sets.component_count() <= 1 {
            break;
        }
        let left = sets.find(edge.source);
        let right = sets.find(edge.target);
        if left == right {
            continue;
        }
        match handler.on_merge(edge.key, sets.payload(left), sets.payload(right)) {
            MergeDecision::Merge => {
                sets.union_roots(left, right);
                accepted.push(*edge);
            }
            MergeDecision::Skip => vetoed = vetoed.saturating_add(1),
        }
    }

    debug!(
        edges = edges.len(),
        merges = accepted.len(),
        vetoed,
        components = sets.component_count(),
        "spanning forest grown"
    );
    accepted
}

struct AcceptAll;

impl<P> MergeHandler<P> for AcceptAll {
    fn on_merge(&mut self, _key: usize, _left: &P, _right: &P) -> MergeDecision {
        MergeDecision::Merge
    }
}

/// The output of a maximum spanning forest computation.
///
/// When the input graph is connected, the forest is a maximum spanning tree.
#[derive(Clone, Debug, PartialEq)]
pub struct SpanningForest {
    edges: Vec<WeightedEdge>,
    component_count: usize,
}

impl SpanningForest {
    /// Returns the forest edges in the order they were accepted.
    #[must_use]
    #[rustfmt::skip]
    pub fn edges(&self) -> &[WeightedEdge] { &self.edges }

    /// Returns the number of connected components in the resulting forest.
    #[must_use]
    #[rustfmt::skip]
    pub fn component_count(&self) -> usize { self.component_count }

    /// Returns `true` when the forest spans a single connected component.
    #[must_use]
    pub fn is_tree(&self) -> bool {
        self.component_count == 1
    }
}

/// Computes a maximum spanning forest with Kruskal's algorithm.
///
/// Self-edges are ignored.
///
/// # Errors
///
/// Returns an error when:
/// - `node_count == 0`
/// - an edge references a node id `>= node_count`
/// - an edge weight is non-finite
///
/// # Examples
/// ```
/// use malis_core::{WeightedEdge, maximum_spanning_forest};
///
/// let edges = [
///     WeightedEdge::new(0, 0, 1, 0.9),
///     WeightedEdge::new(1, 1, 2, 0.2),
///     WeightedEdge::new(2, 0, 2, 0.5),
/// ];
/// let forest = maximum_spanning_forest(3, &edges)?;
/// assert!(forest.is_tree());
/// let keys: Vec<usize> = forest.edges().iter().map(|edge| edge.key()).collect();
/// assert_eq!(keys, vec![0, 2]);
/// # Ok::<(), malis_core::ForestError>(())
/// ```
#[instrument(name = "forest.maximum", err, skip(edges), fields(edges = edges.len()))]
pub fn maximum_spanning_forest(
    node_count: usize,
    edges: &[WeightedEdge],
) -> Result<SpanningForest, ForestError> {
    if node_count == 0 {
        return Err(ForestError::EmptyGraph);
    }

    let mut candidates = Vec::with_capacity(edges.len());
    for edge in edges {
        for node in [edge.source, edge.target] {
            if node >= node_count {
                return Err(ForestError::InvalidNodeId { node, node_count });
            }
        }
        if !edge.weight.is_finite() {
            return Err(ForestError::NonFiniteWeight { key: edge.key });
        }
        if edge.source != edge.target {
            candidates.push(*edge);
        }
    }

    let mut sets = DisjointSet::new(vec![(); node_count]);
    let accepted = grow_forest(&mut sets, candidates, &mut AcceptAll);
    Ok(SpanningForest {
        edges: accepted,
        component_count: sets.component_count(),
    })
}

#[cfg(test)]
mod property;
