//! SQLite registry of installed mods

mod schema;

pub use schema::*;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const MOD_COLUMNS: &str = "name, mod_type, track_type, installed_at, files";

/// Database wrapper with thread-safe access
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create the database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path).context("Failed to open database")?;
        Self::with_connection(conn)
    }

    /// Throwaway database, used by tests and dry runs
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open database")?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init_schema()?;
        Ok(db)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("Database connection lock poisoned"))
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- Installed mods, keyed by display name
            CREATE TABLE IF NOT EXISTS mods (
                name TEXT PRIMARY KEY NOT NULL,
                mod_type TEXT NOT NULL,
                track_type TEXT,
                installed_at TEXT NOT NULL,
                files TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_mods_type ON mods(mod_type);
            "#,
        )
        .context("Failed to initialize database schema")?;

        Ok(())
    }

    /// Insert a mod, replacing any record with the same name
    pub fn upsert_mod(&self, record: &ModRecord) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO mods (name, mod_type, track_type, installed_at, files)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(name) DO UPDATE SET
                mod_type = excluded.mod_type,
                track_type = excluded.track_type,
                installed_at = excluded.installed_at,
                files = excluded.files
            "#,
            params![
                record.name,
                record.mod_type,
                record.track_type,
                record.installed_at,
                record.files,
            ],
        )
        .with_context(|| format!("Failed to save mod '{}'", record.name))?;
        Ok(())
    }

    /// Get a mod by name
    pub fn get_mod(&self, name: &str) -> Result<Option<ModRecord>> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {} FROM mods WHERE name = ?1", MOD_COLUMNS),
            params![name],
            |row| ModRecord::from_row(row),
        )
        .optional()
        .context("Failed to query mod")
    }

    /// All mods, by name
    pub fn list_mods(&self) -> Result<Vec<ModRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM mods ORDER BY name COLLATE NOCASE ASC",
            MOD_COLUMNS
        ))?;

        let mods = stmt
            .query_map([], |row| ModRecord::from_row(row))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(mods)
    }

    /// Delete a mod record. Returns whether a record existed.
    pub fn delete_mod(&self, name: &str) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn
            .execute("DELETE FROM mods WHERE name = ?1", params![name])
            .with_context(|| format!("Failed to delete mod '{}'", name))?;
        Ok(deleted > 0)
    }

    /// Rename a mod record
    pub fn rename_mod(&self, old_name: &str, new_name: &str) -> Result<()> {
        let conn = self.conn()?;
        let updated = conn
            .execute(
                "UPDATE mods SET name = ?2 WHERE name = ?1",
                params![old_name, new_name],
            )
            .with_context(|| format!("Failed to rename mod '{}'", old_name))?;

        if updated == 0 {
            anyhow::bail!("Mod '{}' not found", old_name);
        }
        Ok(())
    }
}
