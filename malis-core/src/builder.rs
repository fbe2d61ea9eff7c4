//! Builder for configuring MALIS weight computation.
//!
//! Validates the integer pair-policy flag before constructing [`Malis`]
//! instances.

use crate::{PairPolicy, Result, error::MalisError, malis::Malis};

/// Configures and constructs [`Malis`] instances.
///
/// The policy is held as the raw integer flag so callers forwarding a mode
/// from elsewhere get a typed error rather than a silent fallback.
///
/// # Examples
/// ```
/// use malis_core::{MalisBuilder, PairPolicy};
///
/// let malis = MalisBuilder::new()
///     .with_pos_flag(-1)
///     .build()
///     .expect("builder configuration is valid");
/// assert_eq!(malis.policy(), PairPolicy::Signed);
/// ```
#[derive(Debug, Clone)]
pub struct MalisBuilder {
    pos_flag: i32,
}

impl Default for MalisBuilder {
    fn default() -> Self {
        Self {
            pos_flag: PairPolicy::Positive.flag(),
        }
    }
}

impl MalisBuilder {
    /// Creates a builder that selects positive pairs.
    ///
    /// # Examples
    /// ```
    /// use malis_core::MalisBuilder;
    ///
    /// assert_eq!(MalisBuilder::new().pos_flag(), 1);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects the pair policy.
    ///
    /// # Examples
    /// ```
    /// use malis_core::{MalisBuilder, PairPolicy};
    ///
    /// let builder = MalisBuilder::new().with_policy(PairPolicy::Negative);
    /// assert_eq!(builder.pos_flag(), 0);
    /// ```
    #[must_use]
    pub fn with_policy(mut self, policy: PairPolicy) -> Self {
        self.pos_flag = policy.flag();
        self
    }

    /// Overrides the raw pair-policy flag; validated by [`Self::build`].
    ///
    /// # Examples
    /// ```
    /// use malis_core::MalisBuilder;
    ///
    /// let builder = MalisBuilder::new().with_pos_flag(7);
    /// assert_eq!(builder.pos_flag(), 7);
    /// assert!(builder.build().is_err());
    /// ```
    #[must_use]
    pub fn with_pos_flag(mut self, flag: i32) -> Self {
        self.pos_flag = flag;
        self
    }

    /// Returns the configured pair-policy flag.
    #[must_use]
    pub fn pos_flag(&self) -> i32 {
        self.pos_flag
    }

    /// Validates the configuration and constructs a [`Malis`] instance.
    ///
    /// # Errors
    /// Returns [`MalisError::InvalidPolicyFlag`] when the flag is not `1`,
    /// `0` or `-1`.
    ///
    /// # Examples
    /// ```
    /// use malis_core::{MalisBuilder, MalisErrorCode};
    ///
    /// let err = MalisBuilder::new().with_pos_flag(2).build().unwrap_err();
    /// assert_eq!(err.code(), MalisErrorCode::InvalidPolicyFlag);
    /// ```
    pub fn build(self) -> Result<Malis> {
        let policy = PairPolicy::from_flag(self.pos_flag)
            .ok_or(MalisError::InvalidPolicyFlag { got: self.pos_flag })?;
        Ok(Malis::new(policy))
    }
}
