//! In-memory manifest provider

use dashmap::DashMap;
use weave_core::error::WeaveError;
use weave_core::{ConcretePackage, Manifest, Version};

use crate::{ManifestProvider, RegistryResult};

/// Manifest provider backed by a concurrent map.
///
/// A request for `latest` is answered with the highest stored version of the
/// package.
#[derive(Debug, Default)]
pub struct InMemoryProvider {
    manifests: DashMap<ConcretePackage, Manifest>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a manifest under its target, replacing any previous entry
    pub fn insert(&self, manifest: Manifest) {
        self.manifests.insert(manifest.target.clone(), manifest);
    }

    /// Builder-style insert
    pub fn with_manifest(self, manifest: Manifest) -> Self {
        self.insert(manifest);
        self
    }

    pub fn len(&self) -> usize {
        self.manifests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manifests.is_empty()
    }

    fn newest(&self, name: &str) -> Option<Manifest> {
        self.manifests
            .iter()
            .filter(|entry| entry.key().name == name)
            .max_by(|a, b| a.key().version.cmp(&b.key().version))
            .map(|entry| entry.value().clone())
    }
}

impl ManifestProvider for InMemoryProvider {
    fn get_manifest(&self, name: &str, version: &Version) -> RegistryResult<Manifest> {
        let found = if version.is_latest() {
            self.newest(name)
        } else {
            let key = ConcretePackage::new(name, version.clone());
            self.manifests.get(&key).map(|entry| entry.value().clone())
        };

        found.ok_or_else(|| WeaveError::ManifestNotFound {
            name: name.to_string(),
            version: version.to_string(),
        })
    }

    fn describe(&self) -> String {
        format!("memory ({} manifests)", self.len())
    }
}
