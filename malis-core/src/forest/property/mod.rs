//! Property-based tests for the maximum spanning forest driver.
//!
//! Checks the Kruskal driver against an independent Prim oracle and verifies
//! the structural invariants every forest must satisfy, across graphs with
//! varied weight distributions.

mod oracle;
mod strategies;
mod types;
