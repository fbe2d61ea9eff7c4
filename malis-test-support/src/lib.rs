//! Shared test utilities used across the MALIS crates.
//!
//! [`tracing::RecordingLayer`] captures spans and events so suites can assert
//! instrumentation, and [`ci::property_test_profile`] sizes property suites
//! from the environment.

pub mod ci;
pub mod tracing;
