//! Persisted setting rows.

use super::{Database, now_ms};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;

/// One row of the `setting` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettingRow {
    pub name: String,
    pub value: Option<String>,
    pub updated_at: i64,
}

/// Internal helper to read a row using an existing connection (avoids deadlock).
fn get_row_internal(conn: &Connection, name: &str) -> Result<Option<SettingRow>> {
    let row = conn
        .query_row(
            "SELECT name, value, updated_at FROM setting WHERE name = ?1",
            params![name],
            |row| {
                Ok(SettingRow {
                    name: row.get(0)?,
                    value: row.get(1)?,
                    updated_at: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(row)
}

fn upsert_internal(conn: &Connection, name: &str, value: Option<&str>) -> Result<()> {
    conn.execute(
        "INSERT INTO setting (name, value, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(name) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![name, value, now_ms()],
    )?;
    Ok(())
}

impl Database {
    /// Get the stored row for a setting, if one was ever written.
    pub fn get_setting_row(&self, name: &str) -> Result<Option<SettingRow>> {
        self.with_conn(|conn| get_row_internal(conn, name))
    }

    /// List every stored row ordered by name.
    pub fn list_setting_rows(&self) -> Result<Vec<SettingRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT name, value, updated_at FROM setting ORDER BY name")?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(SettingRow {
                        name: row.get(0)?,
                        value: row.get(1)?,
                        updated_at: row.get(2)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Create or overwrite the row for `name` in its own transaction.
    pub fn upsert_setting(&self, name: &str, value: Option<&str>) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            upsert_internal(&tx, name, value)?;
            tx.commit()?;
            Ok(())
        })
    }

    /// Read-modify-write a row atomically.
    ///
    /// `update` receives the current stored value (`None` when no row exists or
    /// the column is NULL) and returns the value to store. It runs inside one
    /// transaction while the connection lock is held; any error rolls the
    /// transaction back and leaves the row unchanged.
    pub fn update_setting_with<F>(&self, name: &str, update: F) -> Result<String>
    where
        F: FnOnce(Option<&str>) -> Result<String>,
    {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let current = get_row_internal(&tx, name)?.and_then(|row| row.value);
            let next = update(current.as_deref())?;
            if current.as_deref() != Some(next.as_str()) {
                upsert_internal(&tx, name, Some(&next))?;
            }
            tx.commit()?;
            Ok(next)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn missing_row_is_none() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.get_setting_row("site_name").unwrap().is_none());
    }

    #[test]
    fn upsert_creates_then_updates() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_setting("site_name", Some("First")).unwrap();
        db.upsert_setting("site_name", Some("Second")).unwrap();

        let rows = db.list_setting_rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value.as_deref(), Some("Second"));
        assert!(rows[0].updated_at > 0);
    }

    #[test]
    fn update_with_sees_current_value() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_setting("counter", Some("1")).unwrap();

        let next = db
            .update_setting_with("counter", |current| {
                let n: i64 = current.unwrap_or("0").parse()?;
                Ok((n + 1).to_string())
            })
            .unwrap();

        assert_eq!(next, "2");
        let row = db.get_setting_row("counter").unwrap().unwrap();
        assert_eq!(row.value.as_deref(), Some("2"));
    }

    #[test]
    fn failed_update_leaves_row_untouched() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_setting("maintenance", Some("false")).unwrap();

        let result = db.update_setting_with("maintenance", |_| Err(anyhow!("boom")));

        assert!(result.is_err());
        let row = db.get_setting_row("maintenance").unwrap().unwrap();
        assert_eq!(row.value.as_deref(), Some("false"));
    }

    #[test]
    fn file_backed_database_runs_migrations() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("nested").join("settings.db");
        let db = Database::open(&path).unwrap();
        db.upsert_setting("site_name", Some("On Disk")).unwrap();
        drop(db);

        let reopened = Database::open(&path).unwrap();
        let row = reopened.get_setting_row("site_name").unwrap().unwrap();
        assert_eq!(row.value.as_deref(), Some("On Disk"));
    }
}
