//! Core data types for Weave dependency resolution.
//!
//! This module provides the fundamental types used throughout Weave:
//! - Version types with sentinel bounds and inclusive ranges
//! - Concrete packages, loose requirements and manifests

pub mod package;
pub mod version;

// Re-export all public types
pub use package::{ConcretePackage, LooseRequirement, Manifest};
pub use version::{compare_versions, Version, VersionError, VersionRange};
