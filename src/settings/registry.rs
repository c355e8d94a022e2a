//! The in-memory catalog of setting descriptors.
//!
//! A [`SettingsRegistry`] is built once at startup and shared by `Arc`. It is the
//! authoritative view of every setting; the database is consulted only to
//! backfill descriptors the environment did not supply, or when a caller
//! explicitly bypasses the cache.

use super::catalog;
use super::descriptor::{SaveOutcome, SettingDescriptor};
use super::value::SettingValue;
use crate::db::Database;
use crate::error::{SettingsError, SettingsResult};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

pub struct SettingsRegistry {
    settings: RwLock<BTreeMap<String, SettingDescriptor>>,
    db: Database,
    catalog_loaded: AtomicBool,
}

impl SettingsRegistry {
    /// Create an empty registry backed by `db`.
    pub fn new(db: Database) -> Self {
        Self {
            settings: RwLock::new(BTreeMap::new()),
            db,
            catalog_loaded: AtomicBool::new(false),
        }
    }

    /// Create a registry holding the full built-in catalog.
    pub fn build(db: Database) -> SettingsResult<Self> {
        let registry = Self::new(db);
        registry.populate_catalog()?;
        Ok(registry)
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, SettingDescriptor>> {
        self.settings.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, SettingDescriptor>> {
        self.settings.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register the built-in catalog. Only the first call has an effect.
    ///
    /// Returns `true` when this call populated the catalog.
    pub fn populate_catalog(&self) -> SettingsResult<bool> {
        let mut settings = self.write();
        if self.catalog_loaded.load(Ordering::Acquire) {
            return Ok(false);
        }

        let entries = catalog::catalog();
        if let Some(clash) = entries.iter().find(|d| settings.contains_key(d.name())) {
            return Err(SettingsError::AlreadyRegistered(clash.name().to_string()));
        }
        let count = entries.len();
        for descriptor in entries {
            settings.insert(descriptor.name().to_string(), descriptor);
        }
        self.catalog_loaded.store(true, Ordering::Release);

        debug!(count, "Registered built-in settings catalog");
        Ok(true)
    }

    /// Add one descriptor to the catalog.
    pub fn register(&self, descriptor: SettingDescriptor) -> SettingsResult<()> {
        let mut settings = self.write();
        if settings.contains_key(descriptor.name()) {
            return Err(SettingsError::AlreadyRegistered(
                descriptor.name().to_string(),
            ));
        }
        settings.insert(descriptor.name().to_string(), descriptor);
        Ok(())
    }

    pub fn has(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    /// All registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// Snapshot of every descriptor, sorted by name.
    pub fn snapshot(&self) -> Vec<SettingDescriptor> {
        self.read().values().cloned().collect()
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Get a descriptor by name.
    ///
    /// With `use_cache = false` the stored row (if any) is re-read and applied
    /// before returning. Environment-sourced descriptors ignore the stored row.
    pub fn get(&self, name: &str, use_cache: bool) -> SettingsResult<SettingDescriptor> {
        if !use_cache {
            if !self.has(name) {
                return Err(SettingsError::NotRegistered(name.to_string()));
            }
            let row = self
                .db
                .get_setting_row(name)
                .map_err(|e| SettingsError::persistence(name, e))?;
            if let Some(text) = row.and_then(|r| r.value) {
                return self.update(name, |d| {
                    if !d.is_sourced_from_environment() {
                        d.set(&Value::String(text))?;
                    }
                    Ok(d.clone())
                });
            }
        }

        self.read()
            .get(name)
            .cloned()
            .ok_or_else(|| SettingsError::NotRegistered(name.to_string()))
    }

    /// Resolved value for `name`, or `fallback` when the name is unregistered.
    pub fn value(&self, name: &str, fallback: SettingValue) -> SettingValue {
        match self.read().get(name) {
            Some(descriptor) => descriptor.effective().clone(),
            None => fallback,
        }
    }

    /// Resolved value of a registered setting.
    pub fn effective(&self, name: &str) -> SettingsResult<SettingValue> {
        self.read()
            .get(name)
            .map(|d| d.effective().clone())
            .ok_or_else(|| SettingsError::NotRegistered(name.to_string()))
    }

    pub fn bool_value(&self, name: &str) -> SettingsResult<bool> {
        self.effective(name).map(|v| v.as_bool())
    }

    pub fn str_value(&self, name: &str) -> SettingsResult<String> {
        self.effective(name).map(|v| match v {
            SettingValue::Str(s) => s,
            other => other.to_stored_text(),
        })
    }

    pub fn int_value(&self, name: &str) -> SettingsResult<i64> {
        let value = self.effective(name)?;
        value
            .as_i64()
            .ok_or_else(|| SettingsError::coercion(name, &value, "not an integer setting"))
    }

    /// Coerce and apply a new in-memory value.
    pub fn set(&self, name: &str, raw: &Value) -> SettingsResult<()> {
        self.update(name, |d| d.set(raw))
    }

    /// Persist the current value of `name`.
    pub fn save(&self, name: &str) -> SettingsResult<SaveOutcome> {
        let descriptor = self.get(name, true)?;
        descriptor.save(&self.db)
    }

    /// Run `f` against the registered descriptor under the write lock.
    pub(crate) fn update<T, F>(&self, name: &str, f: F) -> SettingsResult<T>
    where
        F: FnOnce(&mut SettingDescriptor) -> SettingsResult<T>,
    {
        let mut settings = self.write();
        let descriptor = settings
            .get_mut(name)
            .ok_or_else(|| SettingsError::NotRegistered(name.to_string()))?;
        f(descriptor)
    }

    /// Backfill every descriptor not yet loaded from its stored row.
    ///
    /// Descriptors already loaded (from the environment) are left untouched.
    /// Returns the number of descriptors populated.
    pub fn load_database(&self) -> SettingsResult<usize> {
        let rows = self
            .db
            .list_setting_rows()
            .map_err(|e| SettingsError::persistence("*", e))?;

        let mut settings = self.write();
        let mut applied = 0;
        for row in rows {
            let Some(text) = row.value else { continue };
            let Some(descriptor) = settings.get_mut(&row.name) else {
                debug!(setting = %row.name, "Ignoring stored row for unregistered setting");
                continue;
            };
            if descriptor.is_loaded() {
                continue;
            }
            descriptor.set(&Value::String(text))?;
            applied += 1;
        }

        info!(applied, "Loaded settings from database");
        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> SettingsRegistry {
        SettingsRegistry::build(Database::open_in_memory().unwrap()).unwrap()
    }

    #[test]
    fn populate_is_idempotent() {
        let r = SettingsRegistry::new(Database::open_in_memory().unwrap());
        assert!(r.populate_catalog().unwrap());
        let count = r.names().len();
        assert!(!r.populate_catalog().unwrap());
        assert_eq!(r.names().len(), count);
    }

    #[test]
    fn register_rejects_duplicates() {
        let r = registry();
        let err = r.register(SettingDescriptor::new("site_name", "again")).unwrap_err();
        assert!(matches!(err, SettingsError::AlreadyRegistered(name) if name == "site_name"));
        r.register(SettingDescriptor::new("custom_banner", "")).unwrap();
        assert!(r.has("custom_banner"));
    }

    #[test]
    fn custom_setting_blocks_catalog_clash() {
        let r = SettingsRegistry::new(Database::open_in_memory().unwrap());
        r.register(SettingDescriptor::new("site_name", "mine")).unwrap();
        assert!(r.populate_catalog().is_err());
    }

    #[test]
    fn unregistered_get_fails_loudly() {
        let r = registry();
        assert!(matches!(r.get("no_such_setting", true), Err(SettingsError::NotRegistered(_))));
        assert!(matches!(r.get("no_such_setting", false), Err(SettingsError::NotRegistered(_))));
    }

    #[test]
    fn value_uses_fallback_only_when_unregistered() {
        let r = registry();
        assert_eq!(r.value("nope", SettingValue::Int(7)), SettingValue::Int(7));
        assert_eq!(
            r.value("pdns_api_timeout", SettingValue::Int(7)),
            SettingValue::Int(30)
        );
        r.set("pdns_api_timeout", &json!("45")).unwrap();
        assert_eq!(r.value("pdns_api_timeout", SettingValue::Int(7)), SettingValue::Int(45));
    }

    #[test]
    fn uncached_get_rereads_store() {
        let r = registry();
        r.db().upsert_setting("site_name", Some("Stored Name")).unwrap();

        assert_eq!(r.get("site_name", true).unwrap().effective(), &SettingValue::from("Zone Admin"));
        let fresh = r.get("site_name", false).unwrap();
        assert_eq!(fresh.value(), &SettingValue::from("Stored Name"));
        assert!(fresh.is_loaded());
        // The cache now reflects the re-read
        assert_eq!(r.str_value("site_name").unwrap(), "Stored Name");
    }

    #[test]
    fn set_then_save_persists() {
        let r = registry();
        r.set("maintenance", &json!("t")).unwrap();
        assert_eq!(r.save("maintenance").unwrap(), SaveOutcome::Written);
        let row = r.db().get_setting_row("maintenance").unwrap().unwrap();
        assert_eq!(row.value.as_deref(), Some("true"));
    }

    #[test]
    fn load_database_fills_unloaded_only() {
        let r = registry();
        r.db().upsert_setting("site_name", Some("From DB")).unwrap();
        r.db().upsert_setting("pdns_api_url", Some("http://db:8081")).unwrap();
        r.update("pdns_api_url", |d| d.set_from_environment(&json!("http://env:8081")))
            .unwrap();

        let applied = r.load_database().unwrap();

        assert_eq!(applied, 1);
        assert_eq!(r.str_value("site_name").unwrap(), "From DB");
        assert_eq!(r.str_value("pdns_api_url").unwrap(), "http://env:8081");
    }

    #[test]
    fn load_database_surfaces_bad_rows() {
        let r = registry();
        r.db().upsert_setting("session_timeout", Some("ten")).unwrap();
        assert!(matches!(r.load_database(), Err(SettingsError::Coercion { .. })));
    }

    #[test]
    fn uncached_get_keeps_environment_value() {
        let r = registry();
        r.db().upsert_setting("pdns_api_key", Some("stale-db-key")).unwrap();
        let env: std::collections::HashMap<String, String> =
            [("PDNS_API_KEY".to_string(), "env-secret".to_string())].into();
        crate::settings::load_environment(&r, &crate::config::HostConfig::default(), &env).unwrap();
        r.load_database().unwrap();

        let descriptor = r.get("pdns_api_key", false).unwrap();

        assert_eq!(descriptor.value(), &SettingValue::from("env-secret"));
        assert!(descriptor.is_sourced_from_environment());
        assert_eq!(r.str_value("pdns_api_key").unwrap(), "env-secret");
    }
}
