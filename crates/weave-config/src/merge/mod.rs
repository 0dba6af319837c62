//! Configuration layering, fallback logic, and environment overrides

use camino::{Utf8Path, Utf8PathBuf};
use std::collections::HashMap;
use tracing::debug;
use weave_core::error::WeaveError;

use crate::toml::{validate_config, SourceSection, WeaveToml};
use crate::ConfigResult;

/// Project configuration file name
pub const CONFIG_FILE_NAME: &str = "weave.toml";

/// Prefix of recognized environment overrides
pub const ENV_PREFIX: &str = "WEAVE_";

/// Main configuration loading interface
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Current working directory
    cwd: Utf8PathBuf,
}

/// Configuration layering and merging
#[derive(Debug, Default)]
pub struct ConfigLayering;

/// Where the project configuration came from
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// weave.toml found in the working directory or a parent
    Project(Utf8PathBuf),
    /// File named on the command line
    Explicit(Utf8PathBuf),
    /// No file found, built-in defaults
    Defaults,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new(cwd: Utf8PathBuf) -> Self {
        Self { cwd }
    }

    /// Load project configuration, falling back to defaults when no
    /// weave.toml exists
    pub async fn load_project_config(&self) -> ConfigResult<(WeaveToml, ConfigSource)> {
        let path = self.resolve_config_path(CONFIG_FILE_NAME);
        if path.exists() {
            debug!("Loading project config from {}", path);
            let config = crate::toml::load_from_file(&path).await?;
            return Ok((config, ConfigSource::Project(path)));
        }

        debug!("No {} found, using defaults", CONFIG_FILE_NAME);
        Ok((WeaveToml::default(), ConfigSource::Defaults))
    }

    /// Load a configuration file named explicitly, relative to the working
    /// directory
    pub async fn load_explicit_config(
        &self,
        path: &Utf8Path,
    ) -> ConfigResult<(WeaveToml, ConfigSource)> {
        let path = if path.is_relative() {
            self.cwd.join(path)
        } else {
            path.to_path_buf()
        };
        let config = crate::toml::load_from_file(&path).await?;
        Ok((config, ConfigSource::Explicit(path)))
    }

    /// Find configuration file in project (walks up directory tree)
    pub fn resolve_config_path(&self, filename: &str) -> Utf8PathBuf {
        let mut current = self.cwd.as_path();

        loop {
            let config_path = current.join(filename);
            if config_path.exists() {
                return config_path;
            }

            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }

        // Return path in current directory even if it doesn't exist
        self.cwd.join(filename)
    }

    /// Location of the global configuration file (`~/.weave/config.toml`)
    pub fn global_config_path() -> ConfigResult<Utf8PathBuf> {
        let home_dir = dirs::home_dir().ok_or_else(|| WeaveError::ConfigValidation {
            field: "home_dir".to_string(),
            reason: "Could not determine home directory".to_string(),
        })?;

        Ok(Utf8PathBuf::try_from(home_dir)
            .map_err(|e| WeaveError::ConfigValidation {
                field: "home_dir".to_string(),
                reason: format!("Invalid home directory path: {}", e),
            })?
            .join(".weave")
            .join("config.toml"))
    }

    /// Load global configuration
    pub async fn load_global_config(&self) -> ConfigResult<Option<WeaveToml>> {
        let global_config_path = Self::global_config_path()?;

        if global_config_path.exists() {
            debug!("Loading global config from {}", global_config_path);
            let config = crate::toml::load_from_file(&global_config_path).await?;
            Ok(Some(config))
        } else {
            Ok(None)
        }
    }
}

impl ConfigLayering {
    /// Merge configuration layers: global < project < environment < CLI
    pub fn merge_configs(
        global_config: Option<WeaveToml>,
        project_config: WeaveToml,
        env_overrides: HashMap<String, String>,
        cli_overrides: HashMap<String, String>,
    ) -> ConfigResult<WeaveToml> {
        let mut merged = project_config;

        // Global settings fill gaps; global sources rank below project ones
        if let Some(global) = global_config {
            merged.resolver = merged.resolver.or(global.resolver);
            for source in global.sources {
                if !merged.sources.contains(&source) {
                    merged.sources.push(source);
                }
            }
        }

        Self::apply_overrides(&mut merged, &env_overrides, ENV_PREFIX)?;
        Self::apply_overrides(&mut merged, &cli_overrides, "")?;

        validate_config(&merged)?;
        Ok(merged)
    }

    /// Apply `KEY=value` overrides; environment keys carry the `WEAVE_`
    /// prefix, CLI keys are bare kebab-case names
    fn apply_overrides(
        config: &mut WeaveToml,
        overrides: &HashMap<String, String>,
        prefix: &str,
    ) -> ConfigResult<()> {
        for (key, value) in overrides {
            let Some(setting) = Self::setting_name(key, prefix) else {
                continue;
            };

            match setting.as_str() {
                "mailbox-capacity" => {
                    config.resolver.mailbox_capacity = Some(parse_number(key, value)?);
                },
                "manifest-timeout-ms" => {
                    config.resolver.manifest_timeout_ms = Some(parse_number(key, value)?);
                },
                "settle-timeout-ms" => {
                    config.resolver.settle_timeout_ms = Some(parse_number(key, value)?);
                },
                "cache-manifests" => {
                    config.resolver.cache_manifests = Some(parse_flag(key, value)?);
                },
                "manifest-dir" => {
                    // Highest priority source
                    config.sources.insert(
                        0,
                        SourceSection {
                            path: Utf8PathBuf::from(value),
                        },
                    );
                },
                _ => {
                    // Unknown override, ignore
                },
            }
        }

        Ok(())
    }

    /// `WEAVE_MAILBOX_CAPACITY` and `mailbox-capacity` both name
    /// `mailbox-capacity`
    fn setting_name(key: &str, prefix: &str) -> Option<String> {
        let bare = key.strip_prefix(prefix)?;
        Some(bare.to_ascii_lowercase().replace('_', "-"))
    }

    /// Collect environment variable overrides
    pub fn collect_env_overrides() -> HashMap<String, String> {
        std::env::vars()
            .filter(|(key, _)| key.starts_with(ENV_PREFIX))
            .collect()
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> ConfigResult<T>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e| WeaveError::ConfigValidation {
        field: key.to_string(),
        reason: format!("Invalid number '{}': {}", value, e),
    })
}

fn parse_flag(key: &str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(WeaveError::ConfigValidation {
            field: key.to_string(),
            reason: format!("Expected a boolean, got '{}'", value),
        }),
    }
}
