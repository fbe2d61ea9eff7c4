//! Benchmark support crate for the MALIS workspace.
//!
//! Provides a seeded synthetic labelled volume and parameter types used by
//! the Criterion benchmarks for affinity graph construction, MALIS weight
//! accumulation, seeded watershed and connected components.

pub mod error;
pub mod params;
pub mod volume;
