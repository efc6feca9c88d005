//! SQLite key/value backend
//!
//! Stores every key as one row of the `kv` table. Useful where a single
//! database file is preferred over one file per collection.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use super::backend::Backend;
use super::error::{StorageError, StorageResult};
use super::schema::{init_schema, needs_init};

/// Backend storing keys as rows of a SQLite table
pub struct SqliteBackend {
    conn: Mutex<Connection>,
}

impl SqliteBackend {
    /// Open or create the database at `path`
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StorageError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StorageResult<Self> {
        if needs_init(&conn) {
            init_schema(&conn)?;
        }
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Backend for SqliteBackend {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let value = self
            .conn()
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.conn().execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.conn().execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_in_memory_roundtrip() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        assert!(backend.get("bible_aura_chats").unwrap().is_none());

        backend.set("bible_aura_chats", "[]").unwrap();
        backend.set("bible_aura_chats", "[1]").unwrap();
        assert_eq!(backend.get("bible_aura_chats").unwrap().as_deref(), Some("[1]"));

        backend.remove("bible_aura_chats").unwrap();
        backend.remove("bible_aura_chats").unwrap();
        assert!(backend.get("bible_aura_chats").unwrap().is_none());
    }

    #[test]
    fn test_persists_to_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data").join("aura.db");

        {
            let backend = SqliteBackend::open(&path).unwrap();
            backend.set("bible_aura_sermons", "[]").unwrap();
        }

        let reopened = SqliteBackend::open(&path).unwrap();
        assert_eq!(
            reopened.get("bible_aura_sermons").unwrap().as_deref(),
            Some("[]")
        );
    }
}
