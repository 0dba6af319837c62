//! Memoizing manifest provider

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use weave_core::{ConcretePackage, Manifest, Version};

use crate::{ManifestProvider, RegistryResult};

/// Caches successful lookups of an inner provider.
///
/// Entries are served as clones so callers never share state. Failures are
/// not cached; a later lookup retries the inner provider.
#[derive(Debug)]
pub struct ManifestCache {
    /// Wrapped provider
    inner: Arc<dyn ManifestProvider>,
    /// Cache storage keyed by the requested package
    entries: DashMap<ConcretePackage, Manifest>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ManifestCache {
    /// Create new cache in front of `inner`
    pub fn new(inner: Arc<dyn ManifestProvider>) -> Self {
        Self {
            inner,
            entries: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Check if a lookup is cached
    pub fn contains(&self, name: &str, version: &Version) -> bool {
        self.entries
            .contains_key(&ConcretePackage::new(name, version.clone()))
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            total_entries: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Clear all cached entries
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl ManifestProvider for ManifestCache {
    fn get_manifest(&self, name: &str, version: &Version) -> RegistryResult<Manifest> {
        let key = ConcretePackage::new(name, version.clone());
        if let Some(entry) = self.entries.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(entry.value().clone());
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let manifest = self.inner.get_manifest(name, version)?;
        self.entries.insert(key, manifest.clone());
        Ok(manifest)
    }

    fn describe(&self) -> String {
        format!("cached {}", self.inner.describe())
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Total number of entries
    pub total_entries: usize,
    /// Lookups served from the cache
    pub hits: u64,
    /// Lookups forwarded to the inner provider
    pub misses: u64,
}

impl CacheStats {
    /// Fraction of lookups served from the cache
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
