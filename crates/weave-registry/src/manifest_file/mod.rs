//! On-disk manifest file format
//!
//! ```toml
//! [package]
//! name = "vim"
//! version = "8.0"
//!
//! [requires.libc]
//! min = "2.0"
//! max = "latest"
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use weave_core::{ConcretePackage, LooseRequirement, Manifest, Version};

use crate::RegistryResult;

/// A manifest as written in a `.toml` file
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ManifestFile {
    /// Package identity
    pub package: PackageSection,
    /// Dependency name to accepted range
    #[serde(default)]
    pub requires: IndexMap<String, RequirementSpec>,
}

/// The `[package]` table
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PackageSection {
    pub name: String,
    pub version: Version,
}

/// One `[requires.<name>]` table; omitted bounds are unbounded
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RequirementSpec {
    #[serde(default = "earliest")]
    pub min: Version,
    #[serde(default = "latest")]
    pub max: Version,
}

fn earliest() -> Version {
    Version::Earliest
}

fn latest() -> Version {
    Version::Latest
}

impl ManifestFile {
    /// Parse manifest file contents
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Convert into the resolver's manifest model, checking its invariants
    pub fn into_manifest(self) -> RegistryResult<Manifest> {
        let requires = self
            .requires
            .into_iter()
            .map(|(name, spec)| LooseRequirement::new(name, spec.min, spec.max))
            .collect();

        let manifest = Manifest {
            target: ConcretePackage::new(self.package.name, self.package.version),
            requires,
        };
        manifest.validate()?;
        Ok(manifest)
    }

    /// Render a manifest back into file form
    pub fn from_manifest(manifest: &Manifest) -> Self {
        Self {
            package: PackageSection {
                name: manifest.target.name.clone(),
                version: manifest.target.version.clone(),
            },
            requires: manifest
                .requires
                .iter()
                .map(|r| {
                    (
                        r.name.clone(),
                        RequirementSpec {
                            min: r.min_version.clone(),
                            max: r.max_version.clone(),
                        },
                    )
                })
                .collect(),
        }
    }

    /// Serialize to TOML text
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
