//! Concurrent dependency resolution engine for Weave
//!
//! Resolution runs as a live graph of package actors. Each actor merges the
//! version rules its dependents send it, settles on the highest version they
//! all allow and keeps its own dependencies' rules in step with that
//! version's manifest. Once the graph is quiescent it is flattened into the
//! final package list.

pub mod actor;
pub mod cascade;
pub mod flatten;
pub mod range;
pub mod session;
pub mod tracker;

// Re-export main types
pub use actor::{diff_requirements, ActorHandle, RequirementEdit, RuleUpdate};
pub use cascade::{cascade, Cascade, CascadeWaiter};
pub use flatten::{dedup_packages, flatten};
pub use range::{consolidate, ConflictError, Rule};
pub use session::{resolve, ResolutionResult, Resolver, ResolverConfig, ROOT_OWNER};
pub use tracker::{ManifestQuery, Tracker, TrackerConfig, DEFAULT_MAILBOX_CAPACITY};

use weave_core::error::WeaveError;

/// Result type for resolver operations
pub type ResolverResult<T> = Result<T, WeaveError>;
