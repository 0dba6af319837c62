//! Manifest provider reading `<name>-<version>.toml` files from a directory

use camino::{Utf8Path, Utf8PathBuf};
use std::io::ErrorKind;
use tracing::debug;
use weave_core::error::WeaveError;
use weave_core::{Manifest, Version};

use crate::manifest_file::ManifestFile;
use crate::{ManifestProvider, RegistryResult};

/// Manifest provider backed by a directory of manifest files.
///
/// The manifest for `vim` at `8.0` lives in `<root>/vim-8.0.toml`; the
/// `latest` sentinel maps to `<root>/vim-latest.toml`, whose `[package]`
/// table names the concrete version it stands for.
#[derive(Debug, Clone)]
pub struct DirectoryProvider {
    root: Utf8PathBuf,
}

impl DirectoryProvider {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory this provider reads from
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Path of the manifest file for a package
    pub fn manifest_path(&self, name: &str, version: &Version) -> Utf8PathBuf {
        self.root.join(format!("{}-{}.toml", name, version))
    }

    fn check_identity(
        &self,
        manifest: &Manifest,
        name: &str,
        version: &Version,
        path: &Utf8Path,
    ) -> RegistryResult<()> {
        let mismatch = |what: &str, found: String| WeaveError::InvalidManifest {
            package: format!("{}@{}", name, version),
            reason: format!("{} declares {} '{}'", path, what, found),
        };

        if manifest.target.name != name {
            return Err(mismatch("name", manifest.target.name.clone()));
        }
        if manifest.target.version.is_sentinel() {
            return Err(mismatch("version", manifest.target.version.to_string()));
        }
        if !version.is_latest() && &manifest.target.version != version {
            return Err(mismatch("version", manifest.target.version.to_string()));
        }
        Ok(())
    }
}

impl ManifestProvider for DirectoryProvider {
    fn get_manifest(&self, name: &str, version: &Version) -> RegistryResult<Manifest> {
        let path = self.manifest_path(name, version);
        debug!("Reading manifest {}", path);

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(WeaveError::ManifestNotFound {
                    name: name.to_string(),
                    version: version.to_string(),
                });
            },
            Err(e) => return Err(WeaveError::io(format!("Failed to read {}", path), e)),
        };

        let manifest = ManifestFile::parse(&content)
            .map_err(|e| WeaveError::TomlParse {
                file: path.to_string(),
                message: e.message().to_string(),
            })?
            .into_manifest()?;

        self.check_identity(&manifest, name, version, &path)?;
        Ok(manifest)
    }

    fn describe(&self) -> String {
        format!("directory {}", self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, DirectoryProvider) {
        let temp = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        (temp, DirectoryProvider::new(root))
    }

    fn write(provider: &DirectoryProvider, file: &str, content: &str) {
        fs::write(provider.root().join(file), content).unwrap();
    }

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_reads_manifest_file() {
        let (_temp, provider) = setup();
        write(
            &provider,
            "vim-8.0.toml",
            "[package]\nname = \"vim\"\nversion = \"8.0\"\n\n[requires.libc]\nmin = \"2.0\"\n",
        );

        let manifest = provider.get_manifest("vim", &v("8.0")).unwrap();
        assert_eq!(manifest.target.to_string(), "vim@8.0");
        assert_eq!(manifest.requirement("libc").unwrap().range().to_string(), "[2.0, latest]");
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let (_temp, provider) = setup();
        let err = provider.get_manifest("vim", &v("8.0")).unwrap_err();
        assert!(matches!(err, WeaveError::ManifestNotFound { .. }));
    }

    #[test]
    fn test_latest_file() {
        let (_temp, provider) = setup();
        write(
            &provider,
            "vim-latest.toml",
            "[package]\nname = \"vim\"\nversion = \"9.1\"\n",
        );

        assert_eq!(
            provider.manifest_path("vim", &Version::Latest).file_name(),
            Some("vim-latest.toml")
        );
        let manifest = provider.get_manifest("vim", &Version::Latest).unwrap();
        assert_eq!(manifest.target.version, v("9.1"));
    }

    #[test]
    fn test_invalid_toml() {
        let (_temp, provider) = setup();
        write(&provider, "vim-8.0.toml", "[package\nname = ");

        let err = provider.get_manifest("vim", &v("8.0")).unwrap_err();
        assert!(matches!(err, WeaveError::TomlParse { .. }));
    }

    #[test]
    fn test_identity_mismatch() {
        let (_temp, provider) = setup();
        write(
            &provider,
            "vim-8.0.toml",
            "[package]\nname = \"emacs\"\nversion = \"8.0\"\n",
        );
        write(
            &provider,
            "vim-8.1.toml",
            "[package]\nname = \"vim\"\nversion = \"8.0\"\n",
        );

        assert!(matches!(
            provider.get_manifest("vim", &v("8.0")),
            Err(WeaveError::InvalidManifest { .. })
        ));
        assert!(matches!(
            provider.get_manifest("vim", &v("8.1")),
            Err(WeaveError::InvalidManifest { .. })
        ));
    }
}
