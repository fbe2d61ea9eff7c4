use malis_core::{AffinityGraph, GridShape, Neighbourhood};
use malis_test_support::tracing::RecordingLayer;
use tracing_subscriber::layer::SubscriberExt;

/// A `1 × 1 × len` grid whose only offset points one step along x.
#[must_use]
pub fn line_graph(len: usize) -> AffinityGraph {
    AffinityGraph::new(GridShape::planar(1, len), Neighbourhood::new(vec![[0, 0, 1]]))
        .expect("line grid is valid")
}

/// Runs `f` with a recording subscriber installed and returns its result
/// alongside the captured instrumentation.
pub fn recorded<T>(f: impl FnOnce() -> T) -> (T, RecordingLayer) {
    let layer = RecordingLayer::default();
    let subscriber = tracing_subscriber::registry().with(layer.clone());
    let value = tracing::subscriber::with_default(subscriber, f);
    (value, layer)
}
