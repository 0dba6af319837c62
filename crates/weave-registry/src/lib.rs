//! Manifest providers for Weave
//!
//! This crate supplies the single capability the resolver consumes from the
//! outside world: looking up the manifest of a concrete package. Providers can
//! be backed by memory or a directory of manifest files, chained together and
//! memoized.

pub mod cache;
pub mod composite;
pub mod directory;
pub mod manifest_file;
pub mod memory;
pub mod provider;

// Re-export main types
pub use cache::{CacheStats, ManifestCache};
pub use composite::CompositeProvider;
pub use directory::DirectoryProvider;
pub use manifest_file::{ManifestFile, PackageSection, RequirementSpec};
pub use memory::InMemoryProvider;
pub use provider::ManifestProvider;

use weave_core::error::WeaveError;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, WeaveError>;
