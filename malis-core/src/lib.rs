//! MALIS loss weights and maximum-spanning-forest segmentation over
//! affinity graphs.
#![cfg_attr(docsrs, feature(doc_cfg))]

mod builder;
mod error;
mod forest;
mod grid;
mod malis;
mod segment;
#[cfg(test)]
mod test_utils;

pub use crate::{
    builder::MalisBuilder,
    error::{MalisError, MalisErrorCode, Result},
    forest::{
        ForestError, ForestErrorCode, Payload, SpanningForest, WeightedEdge,
        maximum_spanning_forest,
    },
    grid::{
        AXES, AffinityGraph, AffinityGraphCache, GraphError, GraphErrorCode, GridShape,
        Neighbourhood,
    },
    malis::{Malis, PairCounts, PairPolicy, malis_loss_weights, malis_loss_weights_for_shape},
    segment::{connected_components, marker_watershed},
};
