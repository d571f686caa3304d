//! String key-value storage contracts and SQLite implementation.

use crate::db::{open_db, open_db_in_memory};
use crate::local::{LocalError, LocalResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// Durable string key-value storage, the shape of browser `localStorage`.
pub trait KvStorage {
    /// Reads one entry. `Ok(None)` when the key was never written.
    fn get_item(&self, key: &str) -> LocalResult<Option<String>>;
    /// Writes one entry, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> LocalResult<()>;
    /// Removes one entry. Removing an absent key is not an error.
    fn remove_item(&self, key: &str) -> LocalResult<()>;
}

/// SQLite-backed key-value storage over the `kv_entries` table.
pub struct SqliteKvStorage {
    conn: Connection,
}

impl SqliteKvStorage {
    /// Wraps a migrated connection.
    pub fn try_new(conn: Connection) -> LocalResult<Self> {
        ensure_kv_table(&conn)?;
        Ok(Self { conn })
    }

    /// Opens (or creates) a database file and wraps it.
    pub fn open(path: impl AsRef<Path>) -> LocalResult<Self> {
        Self::try_new(open_db(path)?)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> LocalResult<Self> {
        Self::try_new(open_db_in_memory()?)
    }
}

impl KvStorage for SqliteKvStorage {
    fn get_item(&self, key: &str) -> LocalResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT entry_value FROM kv_entries WHERE entry_key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_item(&self, key: &str, value: &str) -> LocalResult<()> {
        self.conn.execute(
            "INSERT INTO kv_entries (entry_key, entry_value, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(entry_key) DO UPDATE SET
                entry_value = excluded.entry_value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> LocalResult<()> {
        self.conn
            .execute("DELETE FROM kv_entries WHERE entry_key = ?1;", [key])?;
        Ok(())
    }
}

fn ensure_kv_table(conn: &Connection) -> LocalResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'kv_entries'
        );",
        [],
        |row| row.get(0),
    )?;
    if exists == 0 {
        return Err(LocalError::MissingRequiredTable("kv_entries"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{KvStorage, SqliteKvStorage};
    use crate::local::LocalError;
    use rusqlite::Connection;

    #[test]
    fn set_get_remove_roundtrip() {
        let storage = SqliteKvStorage::open_in_memory().expect("in-memory storage should open");
        assert_eq!(storage.get_item("k").expect("read should work"), None);

        storage.set_item("k", "v1").expect("first write");
        storage.set_item("k", "v2").expect("overwrite");
        assert_eq!(
            storage.get_item("k").expect("read should work").as_deref(),
            Some("v2")
        );

        storage.remove_item("k").expect("remove");
        storage.remove_item("k").expect("second remove is a no-op");
        assert_eq!(storage.get_item("k").expect("read should work"), None);
    }

    #[test]
    fn rejects_unmigrated_connection() {
        let conn = Connection::open_in_memory().expect("raw connection");
        let err = SqliteKvStorage::try_new(conn)
            .err()
            .expect("unmigrated connection must be rejected");
        assert!(matches!(err, LocalError::MissingRequiredTable("kv_entries")));
    }
}
