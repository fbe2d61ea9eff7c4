//! Affinity graphs over dense 3-D grids.
//!
//! A grid of `z * y * x` sites is connected along a small set of neighbour
//! offsets. Affinities are stored densely with one slot per
//! `(offset class, site)` pair, so slot `d * site_count + site` holds the
//! weight of the edge from `site` to `site + offset[d]`. Slots whose
//! neighbour falls outside the grid exist in the buffer but are never
//! enumerated as edges.
//!
//! [`AffinityGraph`] is an immutable, pure function of the grid shape and the
//! neighbourhood, so callers that process many volumes of the same shape can
//! keep one in an [`AffinityGraphCache`] instead of re-enumerating edges on
//! every call.

use tracing::{debug, instrument};

use crate::forest::WeightedEdge;

/// Number of spatial axes supported by the grid (`z`, `y`, `x`).
pub const AXES: usize = 3;

/// Errors returned while building an [`AffinityGraph`].
#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum GraphError {
    /// One of the grid extents was zero.
    #[error("grid extent along axis {axis} must be at least 1")]
    ZeroExtent {
        /// Index of the empty axis (`0 = z`, `1 = y`, `2 = x`).
        axis: usize,
    },
    /// The neighbourhood contained no offsets.
    #[error("neighbourhood must contain at least one offset")]
    EmptyNeighbourhood,
    /// A flat neighbourhood buffer was not a whole number of offset rows.
    #[error("flat neighbourhood of length {len} is not a multiple of {AXES}")]
    RaggedNeighbourhood {
        /// Length of the rejected buffer.
        len: usize,
    },
    /// The number of sites or affinity slots does not fit in `usize`.
    #[error("grid {extents:?} with {offsets} offsets overflows the addressable size")]
    SizeOverflow {
        /// The requested extents.
        extents: [usize; AXES],
        /// The number of offset classes.
        offsets: usize,
    },
}

impl GraphError {
    /// Returns a stable, machine-readable error code for the variant.
    #[must_use]
    pub const fn code(&self) -> GraphErrorCode {
        match self {
            Self::ZeroExtent { .. } => GraphErrorCode::ZeroExtent,
            Self::EmptyNeighbourhood => GraphErrorCode::EmptyNeighbourhood,
            Self::RaggedNeighbourhood { .. } => GraphErrorCode::RaggedNeighbourhood,
            Self::SizeOverflow { .. } => GraphErrorCode::SizeOverflow,
        }
    }
}

/// Machine-readable error codes for [`GraphError`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum GraphErrorCode {
    /// One of the grid extents was zero.
    ZeroExtent,
    /// The neighbourhood contained no offsets.
    EmptyNeighbourhood,
    /// A flat neighbourhood buffer was ragged.
    RaggedNeighbourhood,
    /// The grid is too large to address.
    SizeOverflow,
}

impl GraphErrorCode {
    /// Returns the symbolic identifier for logging and metrics surfaces.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ZeroExtent => "ZERO_EXTENT",
            Self::EmptyNeighbourhood => "EMPTY_NEIGHBOURHOOD",
            Self::RaggedNeighbourhood => "RAGGED_NEIGHBOURHOOD",
            Self::SizeOverflow => "SIZE_OVERFLOW",
        }
    }
}

/// Spatial extents of a grid in `[z, y, x]` order.
///
/// # Examples
/// ```
/// use malis_core::GridShape;
///
/// let shape = GridShape::planar(2, 3);
/// assert_eq!(shape.extents(), [1, 2, 3]);
/// assert_eq!(shape.site_count(), Some(6));
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct GridShape {
    extents: [usize; AXES],
}

impl GridShape {
    /// Creates a volumetric shape.
    #[must_use]
    pub const fn new(z: usize, y: usize, x: usize) -> Self {
        Self { extents: [z, y, x] }
    }

    /// Creates a single-slice shape (`z = 1`).
    #[must_use]
    pub const fn planar(y: usize, x: usize) -> Self {
        Self::new(1, y, x)
    }

    /// Returns the extents in `[z, y, x]` order.
    #[must_use]
    #[rustfmt::skip]
    pub const fn extents(&self) -> [usize; AXES] { self.extents }

    /// Returns the number of sites, or `None` when it overflows `usize`.
    #[must_use]
    pub fn site_count(&self) -> Option<usize> {
        self.extents
            .iter()
            .try_fold(1usize, |acc, &extent| acc.checked_mul(extent))
    }

    /// Row-major strides: the linear distance between neighbours on each axis.
    fn strides(&self) -> [usize; AXES] {
        let [_, y, x] = self.extents;
        [y.saturating_mul(x), x, 1]
    }
}

/// The set of neighbour offsets that define which sites share an edge.
///
/// # Examples
/// ```
/// use malis_core::Neighbourhood;
///
/// let nhood = Neighbourhood::from_flat(&[-1, 0, 0, 0, -1, 0, 0, 0, -1])
///     .expect("nine values form three offsets");
/// assert_eq!(nhood, Neighbourhood::nearest());
/// ```
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Neighbourhood {
    offsets: Vec<[i32; AXES]>,
}

impl Neighbourhood {
    /// Creates a neighbourhood from `[z, y, x]` displacement vectors.
    #[must_use]
    pub fn new(offsets: Vec<[i32; AXES]>) -> Self {
        Self { offsets }
    }

    /// Creates a neighbourhood from a row-major `D x 3` buffer.
    ///
    /// # Errors
    /// Returns [`GraphError::RaggedNeighbourhood`] when the buffer length is
    /// not a multiple of three.
    pub fn from_flat(data: &[i32]) -> Result<Self, GraphError> {
        let (rows, rest) = data.as_chunks::<AXES>();
        if !rest.is_empty() {
            return Err(GraphError::RaggedNeighbourhood { len: data.len() });
        }
        Ok(Self::new(rows.to_vec()))
    }

    /// The canonical nearest-neighbour affinity neighbourhood: one step
    /// backwards along each of `z`, `y` and `x`.
    #[must_use]
    pub fn nearest() -> Self {
        Self::new(vec![[-1, 0, 0], [0, -1, 0], [0, 0, -1]])
    }

    /// Returns the offset vectors.
    #[must_use]
    #[rustfmt::skip]
    pub fn offsets(&self) -> &[[i32; AXES]] { &self.offsets }

    /// Returns the number of offset classes.
    #[must_use]
    #[rustfmt::skip]
    pub fn len(&self) -> usize { self.offsets.len() }

    /// Returns `true` when no offsets are defined.
    #[must_use]
    #[rustfmt::skip]
    pub fn is_empty(&self) -> bool { self.offsets.is_empty() }
}

/// Enumerated affinity graph for one grid shape and neighbourhood.
///
/// # Examples
/// ```
/// use malis_core::{AffinityGraph, GridShape, Neighbourhood};
///
/// let graph = AffinityGraph::new(GridShape::planar(2, 2), Neighbourhood::new(vec![[0, 0, 1]]))
///     .expect("valid grid");
/// assert_eq!(graph.slot_count(), 4);
/// assert_eq!(graph.edge_slots(), &[0, 2]);
/// assert_eq!(graph.endpoints(2), Some((2, 3)));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct AffinityGraph {
    shape: GridShape,
    neighbourhood: Neighbourhood,
    site_count: usize,
    linear_offsets: Vec<isize>,
    edge_slots: Vec<usize>,
}

impl AffinityGraph {
    /// Enumerates the valid edges of `shape` under `neighbourhood`.
    ///
    /// # Errors
    /// Returns [`GraphError`] when an extent is zero, the neighbourhood is
    /// empty, or the affinity buffer size overflows `usize`.
    #[instrument(
        name = "graph.build",
        err,
        skip(neighbourhood),
        fields(extents = ?shape.extents(), offsets = neighbourhood.len()),
    )]
    pub fn new(shape: GridShape, neighbourhood: Neighbourhood) -> Result<Self, GraphError> {
        if let Some(axis) = shape.extents().iter().position(|&extent| extent == 0) {
            return Err(GraphError::ZeroExtent { axis });
        }
        if neighbourhood.is_empty() {
            return Err(GraphError::EmptyNeighbourhood);
        }
        let overflow = || GraphError::SizeOverflow {
            extents: shape.extents(),
            offsets: neighbourhood.len(),
        };
        let site_count = shape.site_count().ok_or_else(overflow)?;
        site_count
            .checked_mul(neighbourhood.len())
            .filter(|&slots| isize::try_from(slots).is_ok())
            .ok_or_else(overflow)?;

        let strides = shape.strides();
        let linear_offsets = neighbourhood
            .offsets()
            .iter()
            .map(|offset| linear_offset(offset, &strides))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(overflow)?;

        let edge_slots = enumerate_edge_slots(&shape, &neighbourhood, site_count);
        debug!(
            sites = site_count,
            edges = edge_slots.len(),
            "affinity graph enumerated"
        );

        Ok(Self {
            shape,
            neighbourhood,
            site_count,
            linear_offsets,
            edge_slots,
        })
    }

    /// Returns the grid shape.
    #[must_use]
    #[rustfmt::skip]
    pub fn shape(&self) -> GridShape { self.shape }

    /// Returns the neighbourhood.
    #[must_use]
    #[rustfmt::skip]
    pub fn neighbourhood(&self) -> &Neighbourhood { &self.neighbourhood }

    /// Returns the number of sites (`nVert`).
    #[must_use]
    #[rustfmt::skip]
    pub fn site_count(&self) -> usize { self.site_count }

    /// Returns the number of offset classes (`D`).
    #[must_use]
    #[rustfmt::skip]
    pub fn offset_count(&self) -> usize { self.linear_offsets.len() }

    /// Returns the length of a dense affinity buffer: `D * nVert`.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.site_count.saturating_mul(self.offset_count())
    }

    /// Returns the number of valid edges (`nEdge`).
    #[must_use]
    #[rustfmt::skip]
    pub fn edge_count(&self) -> usize { self.edge_slots.len() }

    /// Returns the affinity slots of every valid edge in ascending order.
    #[must_use]
    #[rustfmt::skip]
    pub fn edge_slots(&self) -> &[usize] { &self.edge_slots }

    /// Returns the linear offset of every class, in neighbourhood order.
    #[must_use]
    #[rustfmt::skip]
    pub fn linear_offsets(&self) -> &[isize] { &self.linear_offsets }

    /// Returns `(origin, neighbour)` for a valid edge slot, or `None` when
    /// the slot does not name an in-bounds edge.
    #[must_use]
    pub fn endpoints(&self, slot: usize) -> Option<(usize, usize)> {
        self.edge_slots.binary_search(&slot).ok()?;
        self.slot_endpoints(slot)
    }

    /// Returns `true` when this graph was built for `shape` and `neighbourhood`.
    #[must_use]
    pub fn matches(&self, shape: GridShape, neighbourhood: &Neighbourhood) -> bool {
        self.shape == shape && &self.neighbourhood == neighbourhood
    }

    /// Pairs every valid edge with its weight from a dense affinity buffer.
    ///
    /// The caller must have checked `weights.len() == self.slot_count()`.
    pub(crate) fn weighted_edges<'a>(
        &'a self,
        weights: &'a [f32],
    ) -> impl Iterator<Item = WeightedEdge> + 'a {
        self.edge_slots.iter().filter_map(move |&slot| {
            let (source, target) = self.slot_endpoints(slot)?;
            let weight = *weights.get(slot)?;
            Some(WeightedEdge::new(slot, source, target, weight))
        })
    }

    fn slot_endpoints(&self, slot: usize) -> Option<(usize, usize)> {
        let class = slot.checked_div(self.site_count)?;
        let origin = slot.checked_rem(self.site_count)?;
        let offset = *self.linear_offsets.get(class)?;
        let neighbour = origin.checked_add_signed(offset)?;
        (neighbour < self.site_count).then_some((origin, neighbour))
    }
}

fn linear_offset(offset: &[i32; AXES], strides: &[usize; AXES]) -> Option<isize> {
    offset
        .iter()
        .zip(strides)
        .try_fold(0isize, |acc, (&step, &stride)| {
            let stride = isize::try_from(stride).ok()?;
            let step = isize::try_from(step).ok()?;
            acc.checked_add(step.checked_mul(stride)?)
        })
}

fn enumerate_edge_slots(
    shape: &GridShape,
    neighbourhood: &Neighbourhood,
    site_count: usize,
) -> Vec<usize> {
    let [depth, height, width] = shape.extents();
    let mut slots = Vec::new();
    let mut slot = 0usize;
    for offset in neighbourhood.offsets() {
        for z in 0..depth {
            for y in 0..height {
                for x in 0..width {
                    if in_bounds([z, y, x], offset, shape) {
                        slots.push(slot);
                    }
                    slot = slot.saturating_add(1);
                }
            }
        }
    }
    debug_assert_eq!(slot, site_count.saturating_mul(neighbourhood.len()));
    slots
}

fn in_bounds(position: [usize; AXES], offset: &[i32; AXES], shape: &GridShape) -> bool {
    position
        .iter()
        .zip(offset)
        .zip(shape.extents())
        .all(|((&coord, &step), extent)| {
            isize::try_from(step)
                .ok()
                .and_then(|step| coord.checked_add_signed(step))
                .is_some_and(|moved| moved < extent)
        })
}

/// Caller-owned memo of the most recently built [`AffinityGraph`].
///
/// The cache holds one graph keyed by its shape and neighbourhood; asking
/// for a different key rebuilds and replaces it.
///
/// # Examples
/// ```
/// use malis_core::{AffinityGraphCache, GridShape, Neighbourhood};
///
/// let mut cache = AffinityGraphCache::new();
/// let nhood = Neighbourhood::nearest();
/// let edges = cache.get_or_build(GridShape::new(2, 2, 2), &nhood)?.edge_count();
/// assert_eq!(edges, 12);
/// cache.get_or_build(GridShape::new(2, 2, 2), &nhood)?;
/// assert_eq!((cache.hits(), cache.misses()), (1, 1));
/// # Ok::<(), malis_core::GraphError>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct AffinityGraphCache {
    graph: Option<AffinityGraph>,
    hits: u64,
    misses: u64,
}

impl AffinityGraphCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached graph for `shape` and `neighbourhood`, building it
    /// first when the cache is empty or holds a different key.
    ///
    /// # Errors
    /// Propagates [`GraphError`] from [`AffinityGraph::new`]; the cache is
    /// left empty in that case.
    pub fn get_or_build(
        &mut self,
        shape: GridShape,
        neighbourhood: &Neighbourhood,
    ) -> Result<&AffinityGraph, GraphError> {
        let graph = match self.graph.take() {
            Some(graph) if graph.matches(shape, neighbourhood) => {
                self.hits = self.hits.saturating_add(1);
                graph
            }
            _ => {
                self.misses = self.misses.saturating_add(1);
                AffinityGraph::new(shape, neighbourhood.clone())?
            }
        };
        Ok(self.graph.insert(graph))
    }

    /// Returns the cached graph, if any.
    #[must_use]
    pub fn cached(&self) -> Option<&AffinityGraph> {
        self.graph.as_ref()
    }

    /// Number of lookups answered from the cache.
    #[must_use]
    #[rustfmt::skip]
    pub fn hits(&self) -> u64 { self.hits }

    /// Number of lookups that had to build a graph.
    #[must_use]
    #[rustfmt::skip]
    pub fn misses(&self) -> u64 { self.misses }

    /// Drops the cached graph.
    pub fn clear(&mut self) {
        self.graph = None;
    }
}
