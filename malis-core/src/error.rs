//! Error types for the MALIS core library.
//!
//! Defines the crate-level error enum returned by the segmentation and loss
//! entry points together with a convenient result alias.

use std::fmt;

use thiserror::Error;

use crate::grid::{GraphError, GraphErrorCode};

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// Error type produced by the MALIS and segmentation entry points.
///
/// Every variant is raised during input validation, before any output buffer
/// is written, so a failed call leaves caller buffers untouched.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum MalisError {
    /// The configured pair-policy flag is not one of `1`, `0` or `-1`.
    #[error("pair policy flag must be 1 (positive), 0 (negative) or -1 (signed), got {got}")]
    InvalidPolicyFlag {
        /// The raw flag supplied by the caller.
        got: i32,
    },
    /// A caller-supplied buffer did not have the length implied by the graph.
    #[error("buffer `{buffer}` has length {got} but {expected} was expected")]
    LengthMismatch {
        /// Name of the offending buffer.
        buffer: &'static str,
        /// Length of the buffer as supplied.
        got: usize,
        /// Length required by the graph.
        expected: usize,
    },
    /// An edge that takes part in the spanning forest carried a NaN or
    /// infinite weight.
    #[error("edge {edge} has non-finite weight {weight}")]
    NonFiniteWeight {
        /// Slot or position of the offending edge.
        edge: usize,
        /// The rejected weight.
        weight: f32,
    },
    /// The affinity graph could not be built from the supplied shape.
    #[error("affinity graph construction failed: {error}")]
    Graph {
        #[source]
        /// Underlying graph construction error.
        error: GraphError,
    },
}

define_error_codes! {
    /// Stable codes describing [`MalisError`] variants.
    enum MalisErrorCode for MalisError {
        /// The configured pair-policy flag is not recognised.
        InvalidPolicyFlag => InvalidPolicyFlag { .. } => "MALIS_INVALID_POLICY_FLAG",
        /// A caller-supplied buffer had the wrong length.
        LengthMismatch => LengthMismatch { .. } => "MALIS_LENGTH_MISMATCH",
        /// An edge weight was NaN or infinite.
        NonFiniteWeight => NonFiniteWeight { .. } => "MALIS_NON_FINITE_WEIGHT",
        /// The affinity graph could not be built.
        GraphFailure => Graph { .. } => "MALIS_GRAPH_FAILURE",
    }
}

impl MalisError {
    /// Retrieve the inner [`GraphErrorCode`] when the error originated while
    /// building an [`crate::AffinityGraph`].
    pub const fn graph_code(&self) -> Option<GraphErrorCode> {
        match self {
            Self::Graph { error } => Some(error.code()),
            _ => None,
        }
    }
}

impl From<GraphError> for MalisError {
    fn from(error: GraphError) -> Self {
        Self::Graph { error }
    }
}

/// Checks that a caller buffer has exactly the expected length.
pub(crate) fn check_len(
    buffer: &'static str,
    got: usize,
    expected: usize,
) -> Result<()> {
    if got == expected {
        Ok(())
    } else {
        Err(MalisError::LengthMismatch {
            buffer,
            got,
            expected,
        })
    }
}

/// Convenient alias for results returned by the core API.
pub type Result<T> = core::result::Result<T, MalisError>;
