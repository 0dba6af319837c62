//! Package identity and manifest types.
//!
//! A manifest maps one concrete package to the ranges it requires of its
//! dependencies. Manifests are plain owned values; every provider hands out
//! its own copy.

use super::{Version, VersionRange};
use crate::error::{WeaveError, WeaveResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// A package pinned to one exact version
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConcretePackage {
    pub name: String,
    pub version: Version,
}

impl ConcretePackage {
    /// Create a concrete package
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }

    /// Create a concrete package, parsing the version string
    pub fn parse(name: impl Into<String>, version: &str) -> WeaveResult<Self> {
        Ok(Self::new(name, Version::parse(version)?))
    }
}

impl fmt::Display for ConcretePackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

impl FromStr for ConcretePackage {
    type Err = WeaveError;

    /// Parse `name@version`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| WeaveError::InvalidPackageSpec {
            spec: s.to_string(),
            reason: reason.to_string(),
        };

        let (name, version) = s
            .split_once('@')
            .ok_or_else(|| invalid("expected name@version"))?;

        if !Manifest::is_valid_name(name) {
            return Err(invalid("invalid package name"));
        }

        Ok(Self::new(name, Version::parse(version)?))
    }
}

/// A constraint one package imposes on a dependency
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LooseRequirement {
    pub name: String,
    pub min_version: Version,
    pub max_version: Version,
}

impl LooseRequirement {
    pub fn new(name: impl Into<String>, min_version: Version, max_version: Version) -> Self {
        Self {
            name: name.into(),
            min_version,
            max_version,
        }
    }

    /// Requirement on exactly one version
    pub fn exact(name: impl Into<String>, version: Version) -> Self {
        Self::new(name, version.clone(), version)
    }

    /// Acceptable range for the dependency
    pub fn range(&self) -> VersionRange {
        VersionRange::new(self.min_version.clone(), self.max_version.clone())
    }
}

impl fmt::Display for LooseRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.range())
    }
}

/// Dependency requirements of one concrete package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub target: ConcretePackage,
    #[serde(default)]
    pub requires: Vec<LooseRequirement>,
}

impl Manifest {
    /// Manifest with no requirements
    pub fn empty(target: ConcretePackage) -> Self {
        Self {
            target,
            requires: Vec::new(),
        }
    }

    /// Builder-style helper to append a requirement
    pub fn with_requirement(mut self, requirement: LooseRequirement) -> Self {
        self.requires.push(requirement);
        self
    }

    /// Find the requirement on a given dependency
    pub fn requirement(&self, name: &str) -> Option<&LooseRequirement> {
        self.requires.iter().find(|r| r.name == name)
    }

    /// Check the one-entry-per-dependency contract and the names involved
    pub fn validate(&self) -> WeaveResult<()> {
        let invalid = |reason: String| WeaveError::InvalidManifest {
            package: self.target.to_string(),
            reason,
        };

        if !Self::is_valid_name(&self.target.name) {
            return Err(invalid(format!(
                "invalid package name '{}'",
                self.target.name
            )));
        }

        let mut seen = HashSet::with_capacity(self.requires.len());
        for requirement in &self.requires {
            if !Self::is_valid_name(&requirement.name) {
                return Err(invalid(format!(
                    "invalid dependency name '{}'",
                    requirement.name
                )));
            }
            if !seen.insert(requirement.name.as_str()) {
                return Err(invalid(format!(
                    "dependency '{}' is listed more than once",
                    requirement.name
                )));
            }
        }

        Ok(())
    }

    /// Check if this is a valid package name
    pub fn is_valid_name(name: &str) -> bool {
        !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
            && !name.starts_with('-')
    }
}
