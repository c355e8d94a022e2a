//! Environment overlay for registered settings.

use super::registry::SettingsRegistry;
use crate::config::{EnvSource, HostConfig};
use crate::error::{SettingsError, SettingsResult};
use serde_json::Value;
use std::path::PathBuf;
use tracing::{debug, info};

/// Suffix of the variable naming a file whose contents are the value.
pub const FILE_SUFFIX: &str = "_FILE";

/// A value found in the environment for one setting.
struct EnvValue {
    name: String,
    env_name: String,
    raw: Value,
    from_file: bool,
}

/// Overlay every registered setting from `env`.
///
/// For a setting `foo`, `FOO_FILE` names a file whose full contents are the
/// value and `FOO` holds the value directly. Both set at once is an error.
/// Every variable is resolved and coerced before anything is applied, so a
/// failure leaves the registry and host map untouched. Applied values are
/// marked environment-sourced and mirrored into `host` under `FOO`.
///
/// Returns the number of settings applied.
pub fn load_environment(
    registry: &SettingsRegistry,
    host: &HostConfig,
    env: &dyn EnvSource,
) -> SettingsResult<usize> {
    let mut found = Vec::new();

    for descriptor in registry.snapshot() {
        let env_name = descriptor.env_name();
        let file_env = format!("{}{}", env_name, FILE_SUFFIX);

        let (text, from_file) = match (env.var(&env_name), env.var(&file_env)) {
            (Some(_), Some(_)) => {
                return Err(SettingsError::EnvironmentConflict {
                    env: env_name,
                    file_env,
                });
            }
            (None, Some(path)) => {
                let path = PathBuf::from(path);
                let text = std::fs::read_to_string(&path).map_err(|source| {
                    SettingsError::SecretFile {
                        env: file_env.clone(),
                        path: path.clone(),
                        source,
                    }
                })?;
                (text, true)
            }
            (Some(text), None) => (text, false),
            (None, None) => continue,
        };

        let raw = Value::String(text);
        // Surface coercion errors before any mutation
        descriptor.kind().coerce(descriptor.name(), &raw)?;
        found.push(EnvValue {
            name: descriptor.name().to_string(),
            env_name,
            raw,
            from_file,
        });
    }

    for entry in &found {
        let mirrored = registry.update(&entry.name, |d| {
            d.set_from_environment(&entry.raw)?;
            Ok(d.value().to_json())
        })?;
        host.insert(entry.env_name.clone(), mirrored);
        debug!(setting = %entry.name, from_file = entry.from_file, "Setting sourced from environment");
    }

    info!(applied = found.len(), "Loaded settings from environment");
    Ok(found.len())
}
