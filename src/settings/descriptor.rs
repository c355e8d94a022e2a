//! A single named, typed setting.

use super::value::{SettingValue, ValueKind};
use crate::db::Database;
use crate::error::{SettingsError, SettingsResult};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

/// What `save` did with a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The value was written to the store.
    Written,
    /// The value came from the environment and is never written back.
    SkippedEnvironment,
}

/// A registered setting: its kind, default, current value and load state.
#[derive(Debug, Clone, Serialize)]
pub struct SettingDescriptor {
    name: String,
    kind: ValueKind,
    default: SettingValue,
    label: String,
    description: String,
    value: SettingValue,
    sourced_from_environment: bool,
    loaded: bool,
}

impl SettingDescriptor {
    /// Create a descriptor whose kind is taken from its default.
    pub fn new(name: impl Into<String>, default: impl Into<SettingValue>) -> Self {
        let default = default.into();
        Self {
            name: name.into(),
            kind: default.kind(),
            value: default.clone(),
            default,
            label: String::new(),
            description: String::new(),
            sourced_from_environment: false,
            loaded: false,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn default_value(&self) -> &SettingValue {
        &self.default
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// The current value, which equals the default until something is loaded.
    pub fn value(&self) -> &SettingValue {
        &self.value
    }

    /// `value` if loaded, otherwise the default.
    pub fn effective(&self) -> &SettingValue {
        if self.loaded { &self.value } else { &self.default }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn is_sourced_from_environment(&self) -> bool {
        self.sourced_from_environment
    }

    /// Name of the environment variable that supplies this setting.
    pub fn env_name(&self) -> String {
        self.name.to_uppercase()
    }

    /// Coerce `raw` to this setting's kind and make it current.
    ///
    /// On error the descriptor is left untouched.
    pub fn set(&mut self, raw: &Value) -> SettingsResult<()> {
        self.value = self.kind.coerce(&self.name, raw)?;
        self.loaded = true;
        Ok(())
    }

    /// Like `set`, but marks the value as environment-sourced.
    pub fn set_from_environment(&mut self, raw: &Value) -> SettingsResult<()> {
        self.set(raw)?;
        self.sourced_from_environment = true;
        Ok(())
    }

    /// Persist the current value unless it came from the environment.
    pub fn save(&self, db: &Database) -> SettingsResult<SaveOutcome> {
        if self.sourced_from_environment {
            debug!(setting = %self.name, "Skipping save of environment-sourced setting");
            return Ok(SaveOutcome::SkippedEnvironment);
        }

        let text = self.value.to_stored_text();
        match db.upsert_setting(&self.name, Some(&text)) {
            Ok(()) => Ok(SaveOutcome::Written),
            Err(e) => {
                error!(setting = %self.name, error = %e, "Cannot save setting, rolled back");
                Err(SettingsError::persistence(&self.name, e))
            }
        }
    }

    pub fn as_bool(&self) -> bool {
        self.value.as_bool()
    }

    /// Entry count for Dict and List settings.
    pub fn len(&self) -> SettingsResult<usize> {
        self.value
            .len()
            .ok_or_else(|| SettingsError::LengthUnsupported {
                name: self.name.clone(),
                kind: self.kind.to_string(),
            })
    }

    pub fn is_empty(&self) -> SettingsResult<bool> {
        self.len().map(|n| n == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_descriptor_is_unloaded_default() {
        let d = SettingDescriptor::new("session_timeout", 10i64).with_label("Session timeout");
        assert_eq!(d.kind(), ValueKind::Int);
        assert!(!d.is_loaded());
        assert!(!d.is_sourced_from_environment());
        assert_eq!(d.effective(), &SettingValue::Int(10));
        assert_eq!(d.env_name(), "SESSION_TIMEOUT");
        assert_eq!(d.label(), "Session timeout");
    }

    #[test]
    fn round_trip_per_kind() {
        let cases: Vec<(SettingDescriptor, Value)> = vec![
            (SettingDescriptor::new("b", false), json!(true)),
            (SettingDescriptor::new("i", 0i64), json!(42)),
            (SettingDescriptor::new("f", 0.0f64), json!(1.5)),
            (SettingDescriptor::new("s", ""), json!("hello")),
            (
                SettingDescriptor::new("d", SettingValue::Dict(Default::default())),
                json!({"A": true, "MX": false}),
            ),
            (SettingDescriptor::new("l", SettingValue::List(vec![])), json!(["a", 1])),
        ];

        for (mut d, raw) in cases {
            d.set(&raw).unwrap();
            assert!(d.is_loaded());
            assert_eq!(d.value().to_json(), raw, "{}", d.name());
        }
    }

    #[test]
    fn dict_json_text_round_trips_semantically() {
        let mut d = SettingDescriptor::new("d", SettingValue::Dict(Default::default()));
        d.set(&json!(r#"{"A": true, "CNAME": false}"#)).unwrap();
        let reencoded = d.value().to_stored_text();

        let mut again = SettingDescriptor::new("d", SettingValue::Dict(Default::default()));
        again.set(&json!(reencoded)).unwrap();
        assert_eq!(again.value(), d.value());
    }

    #[test]
    fn failed_set_leaves_descriptor_unloaded() {
        let mut d = SettingDescriptor::new("pdns_api_timeout", 30i64);
        assert!(d.set(&json!("soon")).is_err());
        assert!(!d.is_loaded());
        assert_eq!(d.value(), &SettingValue::Int(30));
    }

    #[test]
    fn len_only_for_containers() {
        let mut list = SettingDescriptor::new("l", SettingValue::List(vec![]));
        list.set(&json!("[1, 2, 3]")).unwrap();
        assert_eq!(list.len().unwrap(), 3);

        let scalar = SettingDescriptor::new("site_name", "x");
        assert!(matches!(
            scalar.len(),
            Err(SettingsError::LengthUnsupported { .. })
        ));
    }

    #[test]
    fn save_writes_row() {
        let db = Database::open_in_memory().unwrap();
        let mut d = SettingDescriptor::new("forward_records_allow_edit", SettingValue::Dict(Default::default()));
        d.set(&json!({"A": true})).unwrap();

        assert_eq!(d.save(&db).unwrap(), SaveOutcome::Written);
        let row = db.get_setting_row("forward_records_allow_edit").unwrap().unwrap();
        assert_eq!(row.value.as_deref(), Some(r#"{"A":true}"#));
    }

    #[test]
    fn save_skips_environment_values() {
        let db = Database::open_in_memory().unwrap();
        let mut d = SettingDescriptor::new("site_name", "x");
        d.set_from_environment(&json!("From Env")).unwrap();
        assert!(d.is_loaded());

        assert_eq!(d.save(&db).unwrap(), SaveOutcome::SkippedEnvironment);
        assert!(db.get_setting_row("site_name").unwrap().is_none());
    }
}
