//! # weave-core
//!
//! Core types and errors shared across all Weave crates.
//!
//! This crate provides:
//! - Version and VersionRange types with a total order that includes
//!   "unbounded below" and "unbounded above" sentinels
//! - ConcretePackage, LooseRequirement and Manifest value types
//! - WeaveError enum for unified error handling
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `types`: Core data types (Version, Manifest, etc.)
//! - `error`: Error types and result aliases

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{WeaveError, WeaveResult};
pub use types::{
    compare_versions, ConcretePackage, LooseRequirement, Manifest, Version, VersionError,
    VersionRange,
};
