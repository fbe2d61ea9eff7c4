//! Benchmark setup error type.
//!
//! Lets setup functions propagate failures with `?` instead of `.expect()`.

use malis_core::{GraphError, MalisError};

use crate::volume::VolumeError;

/// Errors that may occur during benchmark setup.
#[derive(Debug, thiserror::Error)]
pub enum BenchSetupError {
    /// Synthetic volume generation failed.
    #[error("synthetic volume generation failed: {0}")]
    Volume(#[from] VolumeError),
    /// Affinity graph construction failed.
    #[error("affinity graph construction failed: {0}")]
    Graph(#[from] GraphError),
    /// A MALIS or segmentation call rejected its inputs.
    #[error("MALIS operation failed: {0}")]
    Malis(#[from] MalisError),
}
