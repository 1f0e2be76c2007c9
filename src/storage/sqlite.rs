use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use time::OffsetDateTime;

use super::{schema, SlotStore};
use crate::config::StorageOptions;

/// Key-value slots kept in a single SQLite table.
#[derive(Clone)]
pub struct SqliteSlots {
    db_path: Arc<PathBuf>,
    options: Arc<StorageOptions>,
}

impl SqliteSlots {
    pub fn open(options: &StorageOptions) -> Result<Self> {
        let db_path = &options.database_path;
        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating data directory {}", parent.display()))?;
        }
        let conn = Connection::open(db_path)
            .with_context(|| format!("opening database {}", db_path.display()))?;
        prepare_connection(&conn, options)?;
        schema::apply(&conn)?;
        Ok(Self {
            db_path: Arc::new(db_path.clone()),
            options: Arc::new(options.clone()),
        })
    }

    pub fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&*self.db_path)
            .with_context(|| format!("opening database {}", self.db_path.display()))?;
        prepare_connection(&conn, &self.options)?;
        Ok(conn)
    }

    pub fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.connect()?;
        f(&conn)
    }

    pub fn database_path(&self) -> &Path {
        &self.db_path
    }
}

impl SlotStore for SqliteSlots {
    fn read_slot(&self, key: &str) -> Result<Option<String>> {
        self.with_connection(|conn| {
            conn.query_row(
                "SELECT value FROM slots WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .with_context(|| format!("reading slot '{key}'"))
        })
    }

    fn write_slot(&self, key: &str, value: &str) -> Result<()> {
        self.with_connection(|conn| {
            let now = OffsetDateTime::now_utc().unix_timestamp();
            conn.execute(
                "INSERT INTO slots (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                                                updated_at = excluded.updated_at",
                params![key, value, now],
            )
            .with_context(|| format!("writing slot '{key}'"))?;
            Ok(())
        })
    }
}

fn prepare_connection(conn: &Connection, options: &StorageOptions) -> Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")
        .context("setting journal_mode=WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")
        .context("setting synchronous=NORMAL")?;
    conn.pragma_update(
        None,
        "wal_autocheckpoint",
        options.wal_autocheckpoint.to_string(),
    )
    .context("setting wal_autocheckpoint")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_slots() -> anyhow::Result<(TempDir, SqliteSlots)> {
        let temp = TempDir::new()?;
        let mut options = StorageOptions::default();
        options.database_path = temp.path().join("data/calnotes.db");
        let slots = SqliteSlots::open(&options)?;
        Ok((temp, slots))
    }

    #[test]
    fn missing_slot_reads_as_none() -> anyhow::Result<()> {
        let (_temp, slots) = open_slots()?;
        assert_eq!(slots.read_slot("calendarEvents")?, None);
        assert!(slots.database_path().exists());
        Ok(())
    }

    #[test]
    fn writes_overwrite_previous_value() -> anyhow::Result<()> {
        let (_temp, slots) = open_slots()?;
        slots.write_slot("calendarEvents", "{}")?;
        slots.write_slot("calendarEvents", r#"{"2024-03-05":["x"]}"#)?;
        assert_eq!(
            slots.read_slot("calendarEvents")?.as_deref(),
            Some(r#"{"2024-03-05":["x"]}"#)
        );
        let rows: i64 = slots.with_connection(|conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM slots", [], |row| row.get(0))?)
        })?;
        assert_eq!(rows, 1);
        Ok(())
    }
}
