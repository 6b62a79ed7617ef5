//! Durable per-instance allowance records, one SQLite row per instance key.
//!
//! The store itself does no locking; all mutation funnels through
//! [`crate::quota::QuotaManager`], which serializes access.

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use tracing::{debug, warn};

use crate::error::Result;

/// One allowance row.
#[derive(Debug, Clone, serde::Serialize)]
pub struct QuotaRecord {
    /// Instance identity: the port the service instance listens on.
    pub instance_key: u16,
    /// Summarization requests still permitted. Never negative.
    pub remaining: i64,
    /// Epoch milliseconds of the most recent mutation.
    pub last_updated_ms: i64,
}

fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// SQLite-backed counter store.
pub struct CounterStore {
    conn: Connection,
    db_path: PathBuf,
}

impl CounterStore {
    /// Open or create the counter database at `db_path`.
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open_with_flags(
            db_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        )?;
        let this = Self {
            conn,
            db_path: db_path.to_path_buf(),
        };
        this.migrate()?;
        Ok(this)
    }

    /// In-memory store, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let this = Self {
            conn: Connection::open_in_memory()?,
            db_path: PathBuf::from(":memory:"),
        };
        this.migrate()?;
        Ok(this)
    }

    /// Ensure the `quota` table exists with the current layout.
    ///
    /// An early single-instance layout had no `instance_key` column; such a
    /// table cannot be keyed and is dropped and recreated.
    fn migrate(&self) -> Result<()> {
        if self.table_exists("quota")? && !self.column_exists("quota", "instance_key")? {
            warn!(path = %self.db_path.display(), "dropping pre-instance-key quota table");
            self.conn.execute_batch("DROP TABLE quota;")?;
        }

        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS quota (
                instance_key INTEGER PRIMARY KEY,
                remaining INTEGER NOT NULL,
                last_updated_ms INTEGER NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    fn table_exists(&self, name: &str) -> Result<bool> {
        let found: Option<String> = self
            .conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn column_exists(&self, table: &str, column: &str) -> Result<bool> {
        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info({table})"))?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let name: String = row.get(1)?;
            if name == column {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Fetch the record for an instance key, if one exists.
    pub fn get(&self, instance_key: u16) -> Result<Option<QuotaRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT instance_key, remaining, last_updated_ms FROM quota \
                 WHERE instance_key = ?1",
                params![instance_key],
                |row| {
                    Ok(QuotaRecord {
                        instance_key: row.get(0)?,
                        remaining: row.get(1)?,
                        last_updated_ms: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    /// Create a record seeded with `remaining` unless one already exists.
    /// Returns true if a row was inserted.
    pub fn seed(&self, instance_key: u16, remaining: i64) -> Result<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO quota (instance_key, remaining, last_updated_ms) \
             VALUES (?1, ?2, ?3)",
            params![instance_key, remaining, now_ms()],
        )?;
        if inserted > 0 {
            debug!(instance_key, remaining, "seeded quota record");
        }
        Ok(inserted > 0)
    }

    /// Overwrite the remaining allowance for an existing record, stamping
    /// the mutation time. Returns true if a row was updated.
    pub fn set_remaining(&self, instance_key: u16, remaining: i64) -> Result<bool> {
        let updated = self.conn.execute(
            "UPDATE quota SET remaining = ?2, last_updated_ms = ?3 \
             WHERE instance_key = ?1",
            params![instance_key, remaining, now_ms()],
        )?;
        Ok(updated > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_then_get() {
        let store = CounterStore::open_in_memory().unwrap();
        assert!(store.seed(8000, 1000).unwrap());
        let record = store.get(8000).unwrap().unwrap();
        assert_eq!(record.instance_key, 8000);
        assert_eq!(record.remaining, 1000);
    }

    #[test]
    fn test_seed_is_idempotent() {
        let store = CounterStore::open_in_memory().unwrap();
        assert!(store.seed(8000, 1000).unwrap());
        store.set_remaining(8000, 7).unwrap();
        assert!(!store.seed(8000, 1000).unwrap());
        assert_eq!(store.get(8000).unwrap().unwrap().remaining, 7);
    }

    #[test]
    fn test_get_missing_key() {
        let store = CounterStore::open_in_memory().unwrap();
        assert!(store.get(8001).unwrap().is_none());
    }

    #[test]
    fn test_set_remaining_missing_key_updates_nothing() {
        let store = CounterStore::open_in_memory().unwrap();
        assert!(!store.set_remaining(8000, 5).unwrap());
    }

    #[test]
    fn test_records_are_per_key() {
        let store = CounterStore::open_in_memory().unwrap();
        store.seed(8000, 10).unwrap();
        store.seed(8001, 20).unwrap();
        store.set_remaining(8000, 9).unwrap();
        assert_eq!(store.get(8000).unwrap().unwrap().remaining, 9);
        assert_eq!(store.get(8001).unwrap().unwrap().remaining, 20);
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("user_count.db");
        {
            let store = CounterStore::open(&db_path).unwrap();
            store.seed(8000, 1000).unwrap();
            store.set_remaining(8000, 999).unwrap();
        }
        let store = CounterStore::open(&db_path).unwrap();
        assert_eq!(store.get(8000).unwrap().unwrap().remaining, 999);
    }
}
