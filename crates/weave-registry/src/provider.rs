//! The manifest lookup capability consumed by the resolver

use std::fmt::Debug;
use std::sync::Arc;

use weave_core::{Manifest, Version};

use crate::RegistryResult;

/// Source of package manifests.
///
/// Implementations return an owned manifest on every call; callers are free
/// to mutate it without affecting the provider or any other caller. Calls are
/// synchronous and may block on IO, so async callers should run them on a
/// blocking pool.
pub trait ManifestProvider: Send + Sync + Debug {
    /// Look up the manifest for `name` at `version`.
    ///
    /// Fails with `ManifestNotFound` when the source has no such entry.
    /// When `version` is the `latest` sentinel the returned manifest's target
    /// names the concrete version that was selected.
    fn get_manifest(&self, name: &str, version: &Version) -> RegistryResult<Manifest>;

    /// Human-readable description of the source for logs
    fn describe(&self) -> String;
}

impl<P: ManifestProvider + ?Sized> ManifestProvider for Arc<P> {
    fn get_manifest(&self, name: &str, version: &Version) -> RegistryResult<Manifest> {
        (**self).get_manifest(name, version)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

impl<P: ManifestProvider + ?Sized> ManifestProvider for Box<P> {
    fn get_manifest(&self, name: &str, version: &Version) -> RegistryResult<Manifest> {
        (**self).get_manifest(name, version)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
