//! Error types and result aliases for Weave operations.
//!
//! Provides a unified error type that covers all possible error conditions
//! across the Weave crates with actionable error messages.

use crate::types::VersionError;
use thiserror::Error;

/// Unified error type for all Weave operations
#[derive(Error, Debug)]
pub enum WeaveError {
    // Version errors
    #[error("Malformed version '{input}': component '{token}' is not a non-negative integer")]
    MalformedVersion { input: String, token: String },

    #[error("Invalid package '{spec}': {reason}")]
    InvalidPackageSpec { spec: String, reason: String },

    // Resolution errors
    #[error(
        "Unsatisfiable constraints on {package}: {lower_owner} requires at least {lower_bound}, but {upper_owner} allows at most {upper_bound}"
    )]
    UnsatisfiableConstraints {
        package: String,
        lower_owner: String,
        lower_bound: String,
        upper_owner: String,
        upper_bound: String,
    },

    #[error("Flattening conflict: {name} resolved to both {first} and {second}")]
    FlatteningConflict {
        name: String,
        first: String,
        second: String,
    },

    #[error("Package '{name}' is required but has no resolved version")]
    UnresolvedPackage { name: String },

    #[error("Actor for package '{name}' is no longer running")]
    ActorUnavailable { name: String },

    #[error("Timed out after {elapsed_ms}ms waiting for {operation}")]
    Timeout { operation: String, elapsed_ms: u64 },

    // Manifest errors
    #[error("No manifest found for {name}@{version}")]
    ManifestNotFound { name: String, version: String },

    #[error("Failed to resolve manifest for {name}@{version}")]
    ManifestResolution {
        name: String,
        version: String,
        #[source]
        source: Box<WeaveError>,
    },

    #[error("Invalid manifest for {package}: {reason}")]
    InvalidManifest { package: String, reason: String },

    #[error("Manifest provider error: {message}")]
    Provider {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Config errors
    #[error("Failed to parse {file}: {message}")]
    TomlParse { file: String, message: String },

    #[error("Configuration field '{field}' is invalid: {reason}")]
    ConfigValidation { field: String, reason: String },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for Weave operations
pub type WeaveResult<T> = Result<T, WeaveError>;

impl WeaveError {
    /// Create a provider error from any error type
    pub fn provider<E>(message: String, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Provider {
            message,
            source: Some(Box::new(source)),
        }
    }

    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io { message, source }
    }

    /// Wrap a provider failure for the given package
    pub fn manifest_resolution(name: &str, version: &str, source: WeaveError) -> Self {
        Self::ManifestResolution {
            name: name.to_string(),
            version: version.to_string(),
            source: Box::new(source),
        }
    }

    /// Whether this error means the requested package set cannot be resolved
    pub fn is_resolution_failure(&self) -> bool {
        matches!(
            self,
            WeaveError::UnsatisfiableConstraints { .. }
                | WeaveError::FlatteningConflict { .. }
                | WeaveError::ManifestResolution { .. }
                | WeaveError::UnresolvedPackage { .. }
        )
    }

    /// Whether this error is a missing manifest, looking through wrappers
    pub fn is_not_found(&self) -> bool {
        match self {
            WeaveError::ManifestNotFound { .. } => true,
            WeaveError::ManifestResolution { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            WeaveError::MalformedVersion { .. } => {
                Some("Versions are dot or dash separated numbers, or one of '_', '^', 'latest'")
            },
            WeaveError::InvalidPackageSpec { .. } => {
                Some("Specify packages as name@version, e.g. 'vim@8.0'")
            },
            WeaveError::UnsatisfiableConstraints { .. } => {
                Some("Relax one of the conflicting requirements so their ranges overlap")
            },
            WeaveError::ManifestNotFound { .. } | WeaveError::ManifestResolution { .. } => {
                Some("Check the manifest directories with --manifests or the [[sources]] table")
            },
            WeaveError::FlatteningConflict { .. } => {
                Some("This indicates an inconsistent manifest source; re-run with --verbose")
            },
            WeaveError::Timeout { .. } => {
                Some("Increase manifest-timeout-ms or settle-timeout-ms in weave.toml")
            },
            WeaveError::ConfigValidation { .. } | WeaveError::TomlParse { .. } => {
                Some("Run 'weave check' to validate your configuration")
            },
            _ => None,
        }
    }
}

impl From<VersionError> for WeaveError {
    fn from(err: VersionError) -> Self {
        match err {
            VersionError::Malformed { input, token } => {
                WeaveError::MalformedVersion { input, token }
            },
        }
    }
}
