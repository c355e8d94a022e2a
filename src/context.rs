//! Application context built once at startup.
//!
//! Bootstrap order: configuration files seed the host map, the environment
//! overrides registered settings, then stored rows fill in whatever the
//! environment left unset.

use crate::config::{ConfigLoader, ConfigOverride, ConfigPaths, ConfigSource, EnvSource, HostConfig};
use crate::db::Database;
use crate::error::{SettingsError, SettingsResult};
use crate::oauth::{OAuthProviders, RegistrationError};
use crate::settings::{SettingStore, SettingsRegistry, load_environment};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Fallback database file when neither the caller nor the host map names one.
pub const DEFAULT_DATABASE_PATH: &str = "zoneadmin.db";

#[derive(Clone)]
pub struct AppContext {
    host: HostConfig,
    registry: Arc<SettingsRegistry>,
    store: SettingStore,
    sources: Vec<ConfigSource>,
}

impl AppContext {
    /// Load configuration files, open the database and resolve every setting.
    ///
    /// `database` overrides the host map's `DATABASE_PATH`.
    pub fn bootstrap(
        paths: ConfigPaths,
        env: &dyn EnvSource,
        overlay: Option<ConfigOverride>,
        database: Option<PathBuf>,
    ) -> SettingsResult<Self> {
        let loader = ConfigLoader::load_with_paths(paths, env, overlay)?;
        let sources = loader.sources().to_vec();
        let host = loader.into_host_config();

        let db_path = database
            .or_else(|| host.get_str("DATABASE_PATH").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH));
        let db = open_database(&db_path)?;

        let mut ctx = Self::from_parts(host, db, env)?;
        ctx.sources = sources;
        Ok(ctx)
    }

    /// Build over an existing host map and database: environment, then stored rows.
    pub fn from_parts(host: HostConfig, db: Database, env: &dyn EnvSource) -> SettingsResult<Self> {
        let registry = Arc::new(SettingsRegistry::build(db)?);
        let from_env = load_environment(&registry, &host, env)?;
        let from_db = registry.load_database()?;
        info!(
            settings = registry.names().len(),
            from_env, from_db, "Settings resolved"
        );

        let store = SettingStore::new(registry.clone(), host.clone());
        Ok(Self {
            host,
            registry,
            store,
            sources: Vec::new(),
        })
    }

    /// Re-apply environment values. Database-sourced values are left alone.
    pub fn reload_environment(&self, env: &dyn EnvSource) -> SettingsResult<usize> {
        let applied = load_environment(&self.registry, &self.host, env)?;
        info!(applied, "Reloaded settings from environment");
        Ok(applied)
    }

    pub fn host(&self) -> &HostConfig {
        &self.host
    }

    pub fn registry(&self) -> &Arc<SettingsRegistry> {
        &self.registry
    }

    pub fn store(&self) -> &SettingStore {
        &self.store
    }

    /// Configuration layers that were merged, in order.
    pub fn config_sources(&self) -> &[ConfigSource] {
        &self.sources
    }

    /// OAuth clients for enabled providers.
    pub fn oauth_providers(&self) -> Result<OAuthProviders, RegistrationError> {
        OAuthProviders::from_registry(&self.registry)
    }
}

fn open_database(path: &Path) -> SettingsResult<Database> {
    let persistence = |e: anyhow::Error| SettingsError::Persistence {
        name: path.display().to_string(),
        reason: e.to_string(),
    };
    let db = Database::open(path).map_err(persistence)?;
    info!(
        path = %path.display(),
        schema = ?db.schema_version().map_err(persistence)?,
        overlays = db.setting_count().map_err(persistence)?,
        "Settings database ready"
    );
    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SettingValue;
    use serde_json::json;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn environment_beats_stored_row() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_setting("site_name", Some("From DB")).unwrap();
        db.upsert_setting("pdns_version", Some("4.8.0")).unwrap();

        let ctx = AppContext::from_parts(
            HostConfig::default(),
            db,
            &env(&[("SITE_NAME", "From Env")]),
        )
        .unwrap();

        let site = ctx.registry().get("site_name", true).unwrap();
        assert_eq!(site.value(), &SettingValue::from("From Env"));
        assert!(site.is_sourced_from_environment());
        assert_eq!(
            ctx.registry().effective("pdns_version").unwrap(),
            SettingValue::from("4.8.0")
        );
        assert_eq!(ctx.host().get("SITE_NAME"), Some(json!("From Env")));
    }

    #[test]
    fn reload_picks_up_new_environment() {
        let ctx = AppContext::from_parts(
            HostConfig::default(),
            Database::open_in_memory().unwrap(),
            &env(&[]),
        )
        .unwrap();
        assert!(!ctx.registry().bool_value("maintenance").unwrap());

        let applied = ctx.reload_environment(&env(&[("MAINTENANCE", "1"), ("SITE_NAME", "Reloaded")]));
        assert_eq!(applied.unwrap(), 2);
        assert!(ctx.registry().bool_value("maintenance").unwrap());
        assert_eq!(ctx.registry().str_value("site_name").unwrap(), "Reloaded");
    }

    #[test]
    fn bootstrap_reports_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let result = AppContext::bootstrap(
            ConfigPaths::with_deployment_file(None),
            &env(&[("SITE_NAME", "a"), ("SITE_NAME_FILE", "/nope")]),
            None,
            Some(dir.path().join("z.db")),
        );
        let err = result.err().unwrap();
        assert!(err.is_fatal_at_bootstrap());
    }
}
