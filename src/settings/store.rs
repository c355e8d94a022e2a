//! Domain-facing read and write helpers over persisted settings.
//!
//! Reads resolve host configuration map ⟩ stored row ⟩ compiled default.
//! Writes are immediate read-modify-write transactions against the store.

use super::catalog;
use super::duration::parse_duration;
use super::registry::SettingsRegistry;
use super::value::{SettingValue, is_truthy_text};
use crate::config::HostConfig;
use crate::error::{SettingsError, SettingsResult};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{error, info};

/// Forward or reverse DNS zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneType {
    Forward,
    Reverse,
}

impl ZoneType {
    fn setting_name(self) -> &'static str {
        match self {
            ZoneType::Forward => "forward_records_allow_edit",
            ZoneType::Reverse => "reverse_records_allow_edit",
        }
    }
}

impl std::str::FromStr for ZoneType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "forward" => Ok(ZoneType::Forward),
            "reverse" => Ok(ZoneType::Reverse),
            other => Err(format!("unknown zone type: {}", other)),
        }
    }
}

/// A named group from the static table, or an explicit list of names.
#[derive(Debug, Clone)]
pub enum GroupRef<'a> {
    Named(&'a str),
    Names(&'a [&'a str]),
}

#[derive(Clone)]
pub struct SettingStore {
    registry: Arc<SettingsRegistry>,
    host: HostConfig,
}

impl SettingStore {
    pub fn new(registry: Arc<SettingsRegistry>, host: HostConfig) -> Self {
        Self { registry, host }
    }

    pub fn registry(&self) -> &SettingsRegistry {
        &self.registry
    }

    /// Resolve one setting: host map ⟩ stored row ⟩ default.
    pub fn get(&self, name: &str) -> SettingsResult<SettingValue> {
        let descriptor = self.registry.get(name, true)?;

        if let Some(live) = self.host.get(&descriptor.env_name()) {
            return descriptor.kind().coerce(name, &live);
        }

        let row = self
            .registry
            .db()
            .get_setting_row(name)
            .map_err(|e| SettingsError::persistence(name, e))?;
        match row.and_then(|r| r.value) {
            Some(text) => descriptor.kind().coerce(name, &Value::String(text)),
            None => Ok(descriptor.default_value().clone()),
        }
    }

    /// Every registered setting resolved through `get`.
    pub fn get_all(&self) -> SettingsResult<BTreeMap<String, SettingValue>> {
        self.registry
            .names()
            .into_iter()
            .map(|name| {
                let value = self.get(&name)?;
                Ok((name, value))
            })
            .collect()
    }

    /// Settings belonging to a group. Names that are not registered are skipped.
    pub fn get_group(&self, group: GroupRef<'_>) -> SettingsResult<BTreeMap<String, SettingValue>> {
        let members: &[&str] = match group {
            GroupRef::Named(name) => catalog::group(name)
                .ok_or_else(|| SettingsError::UnknownGroup(name.to_string()))?,
            GroupRef::Names(names) => names,
        };

        let mut result = BTreeMap::new();
        for name in members {
            if self.registry.has(name) {
                result.insert(name.to_string(), self.get(name)?);
            }
        }
        Ok(result)
    }

    /// Record types offered in the editor for a zone type, sorted.
    ///
    /// The setting is a Dict, so legacy `{'A': True}` text has already been
    /// read by [`parse_json_lenient`](super::value::parse_json_lenient) during
    /// coercion. Anything that form cannot express is a coercion error.
    pub fn get_supported_record_types(&self, zone_type: ZoneType) -> SettingsResult<Vec<String>> {
        let name = zone_type.setting_name();
        let flags = match self.get(name)? {
            SettingValue::Dict(map) => map,
            other => {
                return Err(SettingsError::coercion(name, other, "expected a mapping"));
            }
        };

        let mut types: Vec<String> = flags
            .into_iter()
            .filter(|(_, enabled)| flag_enabled(enabled))
            .map(|(rtype, _)| rtype)
            .collect();
        types.sort();
        Ok(types)
    }

    /// Union of forward and reverse supported record types, de-duplicated and sorted.
    pub fn get_records_allowed_to_edit(&self) -> SettingsResult<Vec<String>> {
        let mut all = BTreeSet::new();
        all.extend(self.get_supported_record_types(ZoneType::Forward)?);
        all.extend(self.get_supported_record_types(ZoneType::Reverse)?);
        Ok(all.into_iter().collect())
    }

    /// TTL choices as `(seconds, label)` pairs, in configured order.
    pub fn get_ttl_options(&self) -> SettingsResult<Vec<(u64, String)>> {
        let raw = match self.get("ttl_options")? {
            SettingValue::Str(s) => s,
            other => other.to_stored_text(),
        };
        raw.split(',')
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .map(|label| Ok((parse_duration(label)?, label.to_string())))
            .collect()
    }

    /// Flip a boolean setting in the store, creating the row from the default if absent.
    pub fn toggle(&self, name: &str) -> SettingsResult<bool> {
        let descriptor = self.registry.get(name, true)?;
        let default = descriptor.default_value().as_bool();

        let stored = self
            .registry
            .db()
            .update_setting_with(name, |current| {
                let enabled = current.map_or(default, is_truthy_text);
                Ok((!enabled).to_string())
            })
            .map_err(|e| {
                error!(setting = %name, error = %e, "Cannot toggle setting, rolled back");
                SettingsError::persistence(name, e)
            })?;

        let enabled = is_truthy_text(&stored);
        info!(setting = %name, enabled, "Toggled setting");
        Ok(enabled)
    }

    /// Set the `maintenance` flag.
    pub fn set_maintenance(&self, mode: bool) -> SettingsResult<()> {
        self.registry
            .db()
            .update_setting_with("maintenance", |_| Ok(mode.to_string()))
            .map_err(|e| {
                error!(mode, error = %e, "Cannot set maintenance mode, rolled back");
                SettingsError::persistence("maintenance", e)
            })?;
        info!(mode, "Maintenance mode updated");
        Ok(())
    }

    /// Coerce `value` to the setting's kind and store it.
    pub fn set(&self, name: &str, value: &Value) -> SettingsResult<()> {
        let descriptor = self.registry.get(name, true)?;
        let text = descriptor.kind().coerce(name, value)?.to_stored_text();

        self.registry
            .db()
            .update_setting_with(name, |_| Ok(text))
            .map_err(|e| {
                error!(setting = %name, error = %e, "Cannot set setting, rolled back");
                SettingsError::persistence(name, e)
            })?;
        Ok(())
    }
}

fn flag_enabled(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => is_truthy_text(s),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => false,
    }
}
