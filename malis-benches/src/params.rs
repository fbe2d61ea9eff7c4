//! Benchmark parameter types.

use std::fmt;

use malis_core::PairPolicy;

/// Grid extents of one benchmark volume.
#[derive(Clone, Copy, Debug)]
pub struct VolumeBenchParams {
    /// `[z, y, x]` extents.
    pub extents: [usize; 3],
}

impl fmt::Display for VolumeBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [z, y, x] = self.extents;
        write!(f, "{z}x{y}x{x}")
    }
}

/// Parameters for a MALIS weight benchmark run.
#[derive(Clone, Copy, Debug)]
pub struct MalisBenchParams {
    /// `[z, y, x]` extents.
    pub extents: [usize; 3],
    /// Pair policy under test.
    pub policy: PairPolicy,
}

impl fmt::Display for MalisBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let policy = match self.policy {
            PairPolicy::Positive => "positive",
            PairPolicy::Negative => "negative",
            PairPolicy::Signed => "signed",
        };
        write!(
            f,
            "{},{policy}",
            VolumeBenchParams {
                extents: self.extents
            }
        )
    }
}
