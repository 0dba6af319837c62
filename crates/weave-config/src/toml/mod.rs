//! weave.toml configuration parsing and serialization

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use weave_core::error::WeaveError;
use weave_core::{ConcretePackage, Manifest, Version};

use crate::ConfigResult;

/// Default bound on queued messages per package actor
pub const DEFAULT_MAILBOX_CAPACITY: usize = 64;

/// Complete weave.toml configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WeaveToml {
    /// Resolver tuning
    #[serde(default)]
    pub resolver: ResolverSection,

    /// Manifest directories, highest priority first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<SourceSection>,

    /// Packages to resolve, name to exact version
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub roots: BTreeMap<String, String>,
}

/// The `[resolver]` table; unset fields fall back to defaults
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResolverSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mailbox_capacity: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest_timeout_ms: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub settle_timeout_ms: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_manifests: Option<bool>,
}

/// One `[[sources]]` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSection {
    /// Directory holding `<name>-<version>.toml` manifests
    pub path: Utf8PathBuf,
}

impl ResolverSection {
    pub fn mailbox_capacity(&self) -> usize {
        self.mailbox_capacity.unwrap_or(DEFAULT_MAILBOX_CAPACITY)
    }

    pub fn manifest_timeout(&self) -> Option<Duration> {
        self.manifest_timeout_ms.map(Duration::from_millis)
    }

    pub fn settle_timeout(&self) -> Option<Duration> {
        self.settle_timeout_ms.map(Duration::from_millis)
    }

    pub fn cache_manifests(&self) -> bool {
        self.cache_manifests.unwrap_or(true)
    }

    /// Fill unset fields from a lower-priority section
    pub fn or(self, fallback: ResolverSection) -> ResolverSection {
        ResolverSection {
            mailbox_capacity: self.mailbox_capacity.or(fallback.mailbox_capacity),
            manifest_timeout_ms: self.manifest_timeout_ms.or(fallback.manifest_timeout_ms),
            settle_timeout_ms: self.settle_timeout_ms.or(fallback.settle_timeout_ms),
            cache_manifests: self.cache_manifests.or(fallback.cache_manifests),
        }
    }
}

impl WeaveToml {
    /// Root packages as concrete packages
    pub fn root_packages(&self) -> ConfigResult<Vec<ConcretePackage>> {
        self.roots
            .iter()
            .map(|(name, version)| {
                let version = Version::parse(version).map_err(|e| WeaveError::ConfigValidation {
                    field: format!("roots.{}", name),
                    reason: e.to_string(),
                })?;
                Ok(ConcretePackage::new(name.as_str(), version))
            })
            .collect()
    }

    /// Source directories in priority order
    pub fn source_paths(&self) -> Vec<Utf8PathBuf> {
        self.sources.iter().map(|s| s.path.clone()).collect()
    }

    /// Anchor relative source paths at `base`
    pub fn resolve_relative_paths(&mut self, base: &Utf8Path) {
        for source in &mut self.sources {
            if source.path.is_relative() {
                source.path = base.join(&source.path);
            }
        }
    }
}

/// Parse TOML string to WeaveToml configuration
pub fn parse_weave_toml(content: &str) -> ConfigResult<WeaveToml> {
    let config: WeaveToml = ::toml::from_str(content).map_err(|e| WeaveError::TomlParse {
        file: "weave.toml".to_string(),
        message: e.message().to_string(),
    })?;

    validate_config(&config)?;

    Ok(config)
}

/// Serialize WeaveToml to TOML string
pub fn serialize_weave_toml(config: &WeaveToml) -> ConfigResult<String> {
    ::toml::to_string_pretty(config).map_err(|e| WeaveError::TomlParse {
        file: "weave.toml".to_string(),
        message: format!("serialization error: {}", e),
    })
}

/// Validate configuration completeness
pub fn validate_config(config: &WeaveToml) -> ConfigResult<()> {
    let invalid = |field: &str, reason: String| WeaveError::ConfigValidation {
        field: field.to_string(),
        reason,
    };

    if config.resolver.mailbox_capacity == Some(0) {
        return Err(invalid(
            "resolver.mailbox-capacity",
            "must be at least 1".to_string(),
        ));
    }
    if config.resolver.manifest_timeout_ms == Some(0) {
        return Err(invalid(
            "resolver.manifest-timeout-ms",
            "must be greater than zero".to_string(),
        ));
    }
    if config.resolver.settle_timeout_ms == Some(0) {
        return Err(invalid(
            "resolver.settle-timeout-ms",
            "must be greater than zero".to_string(),
        ));
    }

    for (index, source) in config.sources.iter().enumerate() {
        if source.path.as_str().is_empty() {
            return Err(invalid(
                &format!("sources[{}].path", index),
                "must not be empty".to_string(),
            ));
        }
    }

    for name in config.roots.keys() {
        if !Manifest::is_valid_name(name) {
            return Err(invalid(
                &format!("roots.{}", name),
                format!("'{}' is not a valid package name", name),
            ));
        }
    }
    config.root_packages()?;

    Ok(())
}

/// Load and parse weave.toml from file path.
///
/// Relative source paths are anchored at the file's directory.
pub async fn load_from_file(path: &Utf8Path) -> ConfigResult<WeaveToml> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| WeaveError::io(format!("Failed to read {}", path), e))?;

    let mut config = parse_weave_toml(&content).map_err(|e| match e {
        WeaveError::TomlParse { message, .. } => WeaveError::TomlParse {
            file: path.to_string(),
            message,
        },
        WeaveError::ConfigValidation { field, reason } => WeaveError::ConfigValidation {
            field,
            reason: format!("{} (in {})", reason, path),
        },
        other => other,
    })?;

    if let Some(base) = path.parent() {
        config.resolve_relative_paths(base);
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_empty_config() {
        let config = parse_weave_toml("").unwrap();
        assert_eq!(config, WeaveToml::default());
        assert_eq!(config.resolver.mailbox_capacity(), DEFAULT_MAILBOX_CAPACITY);
        assert!(config.resolver.cache_manifests());
        assert!(config.resolver.manifest_timeout().is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[resolver]
mailbox-capacity = 16
manifest-timeout-ms = 30000
settle-timeout-ms = 120000
cache-manifests = false

[[sources]]
path = "manifests"

[[sources]]
path = "/opt/weave/manifests"

[roots]
vim = "8.0"
libc = "latest"
"#;

        let config = parse_weave_toml(toml).unwrap();
        assert_eq!(config.resolver.mailbox_capacity(), 16);
        assert_eq!(config.resolver.manifest_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.resolver.settle_timeout(), Some(Duration::from_secs(120)));
        assert!(!config.resolver.cache_manifests());
        assert_eq!(config.sources.len(), 2);

        let roots = config.root_packages().unwrap();
        assert_eq!(roots.len(), 2);
        assert!(roots.contains(&ConcretePackage::new("libc", Version::Latest)));
    }

    #[test]
    fn test_invalid_mailbox_capacity() {
        let err = parse_weave_toml("[resolver]\nmailbox-capacity = 0\n").unwrap_err();
        assert!(matches!(
            err,
            WeaveError::ConfigValidation { ref field, .. } if field == "resolver.mailbox-capacity"
        ));
    }

    #[test]
    fn test_invalid_root_version() {
        let err = parse_weave_toml("[roots]\nvim = \"eight\"\n").unwrap_err();
        assert!(matches!(
            err,
            WeaveError::ConfigValidation { ref field, .. } if field == "roots.vim"
        ));
    }

    #[test]
    fn test_invalid_root_name() {
        assert!(parse_weave_toml("[roots]\n\"-vim\" = \"8.0\"\n").is_err());
    }

    #[test]
    fn test_syntax_error() {
        let err = parse_weave_toml("[resolver\n").unwrap_err();
        assert!(matches!(err, WeaveError::TomlParse { .. }));
    }

    #[test]
    fn test_round_trip_serialization() {
        let toml = r#"
[resolver]
settle-timeout-ms = 500

[[sources]]
path = "manifests"

[roots]
vim = "8.0"
"#;

        let config = parse_weave_toml(toml).unwrap();
        let serialized = serialize_weave_toml(&config).unwrap();
        let reparsed = parse_weave_toml(&serialized).unwrap();

        assert_eq!(config, reparsed);
        assert!(!serialized.contains("mailbox-capacity"));
    }

    #[test]
    fn test_section_fallback() {
        let project = ResolverSection {
            mailbox_capacity: Some(8),
            ..ResolverSection::default()
        };
        let global = ResolverSection {
            mailbox_capacity: Some(128),
            settle_timeout_ms: Some(1000),
            ..ResolverSection::default()
        };

        let merged = project.or(global);
        assert_eq!(merged.mailbox_capacity(), 8);
        assert_eq!(merged.settle_timeout_ms, Some(1000));
        assert!(merged.manifest_timeout_ms.is_none());
    }

    #[tokio::test]
    async fn test_load_resolves_relative_sources() {
        let temp_dir = TempDir::new().unwrap();
        let temp_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        let config_path = temp_path.join("weave.toml");
        tokio::fs::write(
            &config_path,
            "[[sources]]\npath = \"manifests\"\n\n[[sources]]\npath = \"/abs/manifests\"\n",
        )
        .await
        .unwrap();

        let config = load_from_file(&config_path).await.unwrap();
        assert_eq!(
            config.source_paths(),
            vec![temp_path.join("manifests"), Utf8PathBuf::from("/abs/manifests")]
        );
    }

    #[tokio::test]
    async fn test_load_reports_file_name() {
        let temp_dir = TempDir::new().unwrap();
        let temp_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        let config_path = temp_path.join("weave.toml");
        tokio::fs::write(&config_path, "[resolver\n").await.unwrap();

        let err = load_from_file(&config_path).await.unwrap_err();
        assert!(matches!(
            err,
            WeaveError::TomlParse { ref file, .. } if file == config_path.as_str()
        ));

        let missing = load_from_file(&temp_path.join("absent.toml")).await.unwrap_err();
        assert!(matches!(missing, WeaveError::Io { .. }));
    }
}
