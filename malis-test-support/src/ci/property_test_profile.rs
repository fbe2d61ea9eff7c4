//! Environment-driven sizing for property suites.
//!
//! Every suite derives its proptest configuration from one
//! [`ProptestRunProfile`], so CI can scale all of them with a single variable.
//! Malformed overrides are reported through `tracing` and replaced by the
//! suite default rather than aborting the run.

use std::env;
use std::num::ParseIntError;

use thiserror::Error;

/// Environment variable overriding the number of cases per property.
pub const PROGTEST_CASES_ENV_KEY: &str = "PROGTEST_CASES";
/// Environment variable toggling forked proptest execution.
pub const MALIS_PBT_FORK_ENV_KEY: &str = "MALIS_PBT_FORK";

/// Why an override value was rejected.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum OverrideError {
    /// The case count is not an unsigned integer.
    #[error("`{raw}` is not a case count: {reason}")]
    Cases {
        /// The trimmed override value.
        raw: String,
        /// The integer parse failure.
        reason: ParseIntError,
    },
    /// The case count is zero.
    #[error("case count must be positive")]
    ZeroCases,
    /// The flag is not one of the recognised spellings.
    #[error("`{raw}` is not a flag; expected true/false, 1/0, yes/no or on/off")]
    Flag {
        /// The trimmed override value.
        raw: String,
    },
}

/// Case count and fork mode for one property suite.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProptestRunProfile {
    cases: u32,
    fork: bool,
}

impl ProptestRunProfile {
    /// Reads overrides from the process environment.
    ///
    /// # Examples
    ///
    /// ```
    /// use malis_test_support::ci::property_test_profile::ProptestRunProfile;
    ///
    /// let profile = ProptestRunProfile::load(64, false);
    /// assert!(profile.cases() > 0);
    /// ```
    #[must_use]
    pub fn load(default_cases: u32, default_fork: bool) -> Self {
        Self::from_lookup(default_cases, default_fork, |key| env::var(key).ok())
    }

    /// Reads overrides through `lookup`, which maps a variable name to its
    /// value when set.
    ///
    /// # Examples
    ///
    /// ```
    /// use malis_test_support::ci::property_test_profile::{
    ///     PROGTEST_CASES_ENV_KEY, ProptestRunProfile,
    /// };
    ///
    /// let profile = ProptestRunProfile::from_lookup(64, false, |key| {
    ///     (key == PROGTEST_CASES_ENV_KEY).then(|| "500".to_owned())
    /// });
    /// assert_eq!(profile.cases(), 500);
    /// assert!(!profile.fork());
    /// ```
    #[must_use]
    pub fn from_lookup<F>(default_cases: u32, default_fork: bool, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            cases: resolve(&lookup, PROGTEST_CASES_ENV_KEY, default_cases, parse_cases),
            fork: resolve(&lookup, MALIS_PBT_FORK_ENV_KEY, default_fork, parse_flag),
        }
    }

    /// Number of cases to run per property.
    #[must_use]
    pub fn cases(&self) -> u32 {
        self.cases
    }

    /// Whether cases run in forked subprocesses.
    #[must_use]
    pub fn fork(&self) -> bool {
        self.fork
    }
}

fn resolve<T, F>(
    lookup: &F,
    key: &'static str,
    default: T,
    parse: fn(&str) -> Result<T, OverrideError>,
) -> T
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    parse(&raw).unwrap_or_else(|error| {
        tracing::warn!(
            env = key,
            raw = %raw,
            %error,
            "ignoring invalid property-test override",
        );
        default
    })
}

/// Parses a positive case count.
///
/// # Errors
/// Returns [`OverrideError::Cases`] for non-integers and
/// [`OverrideError::ZeroCases`] for `0`.
pub fn parse_cases(raw: &str) -> Result<u32, OverrideError> {
    let trimmed = raw.trim();
    match trimmed.parse::<u32>() {
        Ok(0) => Err(OverrideError::ZeroCases),
        Ok(cases) => Ok(cases),
        Err(reason) => Err(OverrideError::Cases {
            raw: trimmed.to_owned(),
            reason,
        }),
    }
}

/// Parses a case-insensitive boolean flag.
///
/// # Errors
/// Returns [`OverrideError::Flag`] for unrecognised spellings.
pub fn parse_flag(raw: &str) -> Result<bool, OverrideError> {
    let trimmed = raw.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(OverrideError::Flag {
            raw: trimmed.to_owned(),
        }),
    }
}
