//! Weave benchmarking suite
//!
//! Benchmarks for version handling, range consolidation and end-to-end
//! actor-graph resolution.

pub mod common;

pub use common::*;
