//! Provider chaining several sources in priority order

use std::sync::Arc;
use tracing::debug;
use weave_core::error::WeaveError;
use weave_core::{Manifest, Version};

use crate::{ManifestProvider, RegistryResult};

/// Tries each source in order and returns the first manifest found.
///
/// Fails only when every source fails: with the last error that was not a
/// plain "not found", or with `ManifestNotFound` otherwise.
#[derive(Debug, Default, Clone)]
pub struct CompositeProvider {
    sources: Vec<Arc<dyn ManifestProvider>>,
}

impl CompositeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a lower-priority source
    pub fn push(&mut self, source: Arc<dyn ManifestProvider>) {
        self.sources.push(source);
    }

    /// Builder-style push
    pub fn with_source(mut self, source: Arc<dyn ManifestProvider>) -> Self {
        self.push(source);
        self
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl ManifestProvider for CompositeProvider {
    fn get_manifest(&self, name: &str, version: &Version) -> RegistryResult<Manifest> {
        let mut last_error = None;

        for source in &self.sources {
            match source.get_manifest(name, version) {
                Ok(manifest) => return Ok(manifest),
                Err(e) if e.is_not_found() => {
                    debug!("{}@{} not in {}", name, version, source.describe());
                },
                Err(e) => {
                    debug!("{} failed for {}@{}: {}", source.describe(), name, version, e);
                    last_error = Some(e);
                },
            }
        }

        Err(last_error.unwrap_or_else(|| WeaveError::ManifestNotFound {
            name: name.to_string(),
            version: version.to_string(),
        }))
    }

    fn describe(&self) -> String {
        let names: Vec<_> = self.sources.iter().map(|s| s.describe()).collect();
        format!("composite [{}]", names.join(", "))
    }
}
