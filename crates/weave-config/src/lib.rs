//! Configuration parsing for Weave
//!
//! This crate handles parsing and validation of weave.toml files and layers
//! global, project, environment and command-line settings into one
//! configuration.

pub mod merge;
pub mod toml;

// Re-export main types
pub use merge::{ConfigLayering, ConfigLoader, ConfigSource};
pub use self::toml::{ResolverSection, SourceSection, WeaveToml};

use weave_core::error::WeaveError;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, WeaveError>;
