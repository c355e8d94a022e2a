//! Configuration file layering.
//!
//! Builds the host configuration map from up to three file layers, merged
//! field-by-field:
//! 1. **Baseline** - the deployment file if present, else the embedded default
//! 2. **External** - the file named by `ZONEADMIN_CONF`
//! 3. **Override** - a mapping or file supplied by the caller

use super::env::EnvSource;
use super::host::HostConfig;
use super::merge::deep_merge_all;
use crate::error::{SettingsError, SettingsResult};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Embedded baseline configuration.
pub const DEFAULT_CONFIG: &str = include_str!("../../config/default_config.yaml");

/// Environment variable naming an extra configuration file.
pub const CONFIG_PATH_ENV: &str = "ZONEADMIN_CONF";

/// Container-provided configuration file.
pub const DEPLOYMENT_CONFIG_PATH: &str = "/srv/zoneadmin/configs/docker_config.yaml";

/// Configuration layer priority (lowest to highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigTier {
    /// Embedded defaults or the deployment file
    Baseline = 0,
    /// File named by the external config-path variable
    External = 1,
    /// Caller-supplied override (highest file-level priority)
    Override = 2,
}

impl std::fmt::Display for ConfigTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigTier::Baseline => write!(f, "baseline"),
            ConfigTier::External => write!(f, "external"),
            ConfigTier::Override => write!(f, "override"),
        }
    }
}

/// Where a merged layer came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSource {
    pub tier: ConfigTier,
    /// File path, or `None` for embedded defaults and in-memory overrides.
    pub path: Option<PathBuf>,
}

/// Caller-supplied top layer.
#[derive(Debug, Clone)]
pub enum ConfigOverride {
    /// An already-built mapping.
    Value(Value),
    /// A YAML file to read.
    File(PathBuf),
}

/// Paths consulted for each layer.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    /// Deployment-specific baseline, used instead of the embedded default when it exists
    pub deployment_file: Option<PathBuf>,
    /// Name of the variable holding an external config file path
    pub external_env_var: String,
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self::discover()
    }
}

impl ConfigPaths {
    /// Standard locations.
    pub fn discover() -> Self {
        Self {
            deployment_file: Some(PathBuf::from(DEPLOYMENT_CONFIG_PATH)),
            external_env_var: CONFIG_PATH_ENV.to_string(),
        }
    }

    /// Create paths with an explicit deployment file.
    pub fn with_deployment_file(deployment_file: Option<PathBuf>) -> Self {
        Self {
            deployment_file,
            external_env_var: CONFIG_PATH_ENV.to_string(),
        }
    }

    /// The deployment file, if configured and present on disk.
    pub fn effective_deployment_file(&self) -> Option<&Path> {
        self.deployment_file.as_deref().filter(|p| p.is_file())
    }
}

/// Loads and merges configuration file layers.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Paths for each layer
    pub paths: ConfigPaths,
    /// Merged document
    merged: Value,
    /// Layers that contributed, in merge order
    sources: Vec<ConfigSource>,
}

impl ConfigLoader {
    /// Load from the standard locations.
    pub fn load(env: &dyn EnvSource, overlay: Option<ConfigOverride>) -> SettingsResult<Self> {
        Self::load_with_paths(ConfigPaths::discover(), env, overlay)
    }

    /// Load with explicit paths.
    pub fn load_with_paths(
        paths: ConfigPaths,
        env: &dyn EnvSource,
        overlay: Option<ConfigOverride>,
    ) -> SettingsResult<Self> {
        let mut layers: Vec<Value> = Vec::new();
        let mut sources = Vec::new();

        // Layer 1: deployment file or embedded default
        match paths.effective_deployment_file() {
            Some(path) => {
                layers.push(read_yaml_file(path)?);
                sources.push(ConfigSource {
                    tier: ConfigTier::Baseline,
                    path: Some(path.to_path_buf()),
                });
            }
            None => {
                layers.push(parse_yaml(DEFAULT_CONFIG, Path::new("<embedded default>"))?);
                sources.push(ConfigSource {
                    tier: ConfigTier::Baseline,
                    path: None,
                });
            }
        }

        // Layer 2: external file named in the environment
        if let Some(external) = env.var(&paths.external_env_var).filter(|p| !p.is_empty()) {
            let path = PathBuf::from(external);
            layers.push(read_yaml_file(&path)?);
            sources.push(ConfigSource {
                tier: ConfigTier::External,
                path: Some(path),
            });
        }

        // Layer 3: caller override
        match overlay {
            Some(ConfigOverride::Value(value)) => {
                layers.push(value);
                sources.push(ConfigSource {
                    tier: ConfigTier::Override,
                    path: None,
                });
            }
            Some(ConfigOverride::File(path)) => {
                layers.push(read_yaml_file(&path)?);
                sources.push(ConfigSource {
                    tier: ConfigTier::Override,
                    path: Some(path),
                });
            }
            None => {}
        }

        for source in &sources {
            debug!(tier = %source.tier, path = ?source.path, "Merged configuration layer");
        }

        let merged = deep_merge_all(layers);
        info!(layers = sources.len(), "Loaded configuration files");

        Ok(Self {
            paths,
            merged,
            sources,
        })
    }

    /// The merged document.
    pub fn merged(&self) -> &Value {
        &self.merged
    }

    pub fn sources(&self) -> &[ConfigSource] {
        &self.sources
    }

    /// A host configuration map seeded from the merged document.
    pub fn host_config(&self) -> HostConfig {
        HostConfig::from_value(self.merged.clone())
    }

    pub fn into_host_config(self) -> HostConfig {
        HostConfig::from_value(self.merged)
    }
}

fn read_yaml_file(path: &Path) -> SettingsResult<Value> {
    let content = std::fs::read_to_string(path).map_err(|e| SettingsError::Config {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_yaml(&content, path)
}

fn parse_yaml(content: &str, path: &Path) -> SettingsResult<Value> {
    serde_yaml::from_str::<Value>(content).map_err(|e| SettingsError::Config {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
