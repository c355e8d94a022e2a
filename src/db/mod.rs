//! SQLite store for the `setting` overlay table.
//!
//! Only rows that differ from a compiled default live here. The schema is
//! owned by the embedded migrations; `settings` holds the row helpers.

pub mod settings;

use anyhow::{Context, Result, anyhow};
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

pub use settings::SettingRow;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Handle to the settings database.
///
/// One connection sits behind a mutex, so each read-modify-write of a setting
/// row runs in its own transaction with no other writer in between.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open the settings database at `path`, creating parent directories and
    /// the `setting` table as needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("cannot create {}", parent.display()))?;
        }

        let conn = Connection::open(path)?;
        // WAL lets the CLI read settings while a server holds the file.
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA busy_timeout=5000;",
        )?;
        Self::migrated(conn)
    }

    /// Private in-memory settings database.
    pub fn open_in_memory() -> Result<Self> {
        Self::migrated(Connection::open_in_memory()?)
    }

    fn migrated(mut conn: Connection) -> Result<Self> {
        let report = embedded::migrations::runner().run(&mut conn)?;
        for migration in report.applied_migrations() {
            debug!(version = migration.version(), name = migration.name(), "Applied settings migration");
        }
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("settings database lock poisoned"))
    }

    /// Latest applied schema version, `None` on a database never migrated.
    pub fn schema_version(&self) -> Result<Option<i64>> {
        self.with_conn(|conn| {
            let version = conn
                .query_row(
                    "SELECT MAX(version) FROM refinery_schema_history",
                    [],
                    |row| row.get::<_, Option<i64>>(0),
                )
                .optional()?;
            Ok(version.flatten())
        })
    }

    /// Number of persisted setting overlays.
    pub fn setting_count(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM setting", [], |row| row.get(0))?;
            Ok(usize::try_from(count).unwrap_or(0))
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.lock()?;
        f(&conn)
    }

    /// Mutable access, for helpers that open a transaction.
    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self.lock()?;
        f(&mut conn)
    }
}

/// Row timestamps are Unix milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
