//! SQLite storage backend for preflabels

use super::traits::{OpenStore, PreflabelRecord, PreflabelStore, StorageError, StorageResult};
use crate::group::ConceptGroup;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

/// SQLite-backed preflabel store
///
/// One table, one row per key. Thread-safe via an internal mutex on the
/// connection, which also makes every upsert a single serialized writer.
pub struct SqlitePreflabelStore {
    conn: Mutex<Connection>,
}

impl SqlitePreflabelStore {
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS preflabels (
                key TEXT NOT NULL PRIMARY KEY,
                preflabel TEXT NOT NULL,
                total INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            PRAGMA journal_mode = WAL;
            "#,
        )?;
        Ok(())
    }

    fn row_to_record(key: String, preflabel: String, total: i64, created_at: String) -> StorageResult<PreflabelRecord> {
        Ok(PreflabelRecord {
            key,
            preflabel,
            total: total.max(0) as u64,
            created_at: DateTime::parse_from_rfc3339(&created_at)
                .map_err(|e| StorageError::DateParse(e.to_string()))?
                .with_timezone(&Utc),
        })
    }
}

impl OpenStore for SqlitePreflabelStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl PreflabelStore for SqlitePreflabelStore {
    fn lookup(&self, key: &str) -> StorageResult<Option<String>> {
        let conn = self.conn.lock().unwrap();
        let preflabel = conn
            .query_row("SELECT preflabel FROM preflabels WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?;
        Ok(preflabel)
    }

    fn upsert(&self, group: &ConceptGroup) -> StorageResult<String> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        // The stored label wins on conflict; only the running total moves.
        tx.execute(
            r#"
            INSERT INTO preflabels (key, preflabel, total, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(key) DO UPDATE SET
                total = preflabels.total + excluded.total
            "#,
            params![group.key, group.preflabel, group.total as i64, Utc::now().to_rfc3339()],
        )?;

        let canonical: String = tx.query_row(
            "SELECT preflabel FROM preflabels WHERE key = ?1",
            params![group.key],
            |row| row.get(0),
        )?;
        tx.commit()?;

        if canonical != group.preflabel {
            debug!(key = %group.key, batch = %group.preflabel, canonical = %canonical, "preflabel override");
        }
        Ok(canonical)
    }

    fn record(&self, key: &str) -> StorageResult<Option<PreflabelRecord>> {
        let conn = self.conn.lock().unwrap();
        let row: Option<(String, String, i64, String)> = conn
            .query_row(
                "SELECT key, preflabel, total, created_at FROM preflabels WHERE key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?;

        match row {
            Some((key, preflabel, total, created_at)) => {
                Ok(Some(Self::row_to_record(key, preflabel, total, created_at)?))
            }
            None => Ok(None),
        }
    }

    fn count(&self) -> StorageResult<usize> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM preflabels", [], |row| row.get(0))?;
        Ok(count.max(0) as usize)
    }

    fn reset(&self) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM preflabels", [])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn create_test_store() -> SqlitePreflabelStore {
        SqlitePreflabelStore::open_in_memory().unwrap()
    }

    fn group(key: &str, preflabel: &str, total: usize) -> ConceptGroup {
        ConceptGroup {
            key: key.to_string(),
            total,
            preflabel: preflabel.to_string(),
            prefcount: total,
            alternates: BTreeMap::from([(preflabel.to_string(), total)]),
            labels: Vec::new(),
        }
    }

    #[test]
    fn test_upsert_new_key_returns_batch_label() {
        let store = create_test_store();
        assert_eq!(store.upsert(&group("fox", "fox", 5)).unwrap(), "fox");

        let record = store.record("fox").unwrap().unwrap();
        assert_eq!(record.preflabel, "fox");
        assert_eq!(record.total, 5);
    }

    #[test]
    fn test_upsert_existing_key_is_sticky() {
        let store = create_test_store();
        store.upsert(&group("fox", "fox", 5)).unwrap();

        assert_eq!(store.upsert(&group("fox", "foxes", 3)).unwrap(), "fox");
        let record = store.record("fox").unwrap().unwrap();
        assert_eq!(record.preflabel, "fox");
        assert_eq!(record.total, 8);
    }

    #[test]
    fn test_lookup() {
        let store = create_test_store();
        assert_eq!(store.lookup("fox").unwrap(), None);
        store.upsert(&group("fox", "red fox", 1)).unwrap();
        assert_eq!(store.lookup("fox").unwrap().as_deref(), Some("red fox"));
    }

    #[test]
    fn test_reset_clears_records() {
        let store = create_test_store();
        store.upsert(&group("fox", "fox", 1)).unwrap();
        store.upsert(&group("den", "den", 1)).unwrap();
        assert_eq!(store.count().unwrap(), 2);

        store.reset().unwrap();
        assert_eq!(store.count().unwrap(), 0);
        assert_eq!(store.upsert(&group("fox", "foxes", 2)).unwrap(), "foxes");
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sqlite").join("preflabels.db");

        {
            let store = SqlitePreflabelStore::open(&path).unwrap();
            store.upsert(&group("fox", "fox", 2)).unwrap();
        }

        let store = SqlitePreflabelStore::open(&path).unwrap();
        assert_eq!(store.upsert(&group("fox", "foxes", 4)).unwrap(), "fox");
        assert_eq!(store.record("fox").unwrap().unwrap().total, 6);
    }

    #[test]
    fn test_concurrent_upserts_do_not_lose_increments() {
        let store = Arc::new(create_test_store());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        store.upsert(&group("fox", &format!("fox-{}", i), 1)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.record("fox").unwrap().unwrap().total, 200);
        assert_eq!(store.count().unwrap(), 1);
    }
}
