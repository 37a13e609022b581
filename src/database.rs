use rusqlite::{Connection, OptionalExtension};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),
    #[error("Failed to create database directory: {0}")]
    DirectoryError(String),
    #[error("Database connection lock was poisoned")]
    LockPoisoned,
}

/// Durable key/value storage for serialized collections.
///
/// Each collection is one JSON array stored under its own key, replaced whole on every write.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Create a new database connection and initialize the schema
    pub fn new(path: &str) -> Result<Self, DatabaseError> {
        let db_path = PathBuf::from(path);

        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| DatabaseError::DirectoryError(e.to_string()))?;
            }
        }

        let conn = Connection::open(&db_path)?;
        Self::with_connection(conn)
    }

    /// Open a throwaway database that lives for the process only
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, DatabaseError> {
        let db = Database {
            conn: Mutex::new(conn),
        };
        db.initialize_schema()?;
        Ok(db)
    }

    fn initialize_schema(&self) -> Result<(), DatabaseError> {
        self.conn()?.execute(
            "CREATE TABLE IF NOT EXISTS collections (
                key             TEXT PRIMARY KEY,
                records         TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, DatabaseError> {
        self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)
    }

    /// Read the serialized collection stored under `key`, if it was ever written
    pub fn load_collection(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let conn = self.conn()?;
        let records = conn
            .query_row(
                "SELECT records FROM collections WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(records)
    }

    /// Replace the serialized collection stored under `key`
    pub fn save_collection(&self, key: &str, records: &str) -> Result<(), DatabaseError> {
        let now = chrono::Utc::now().to_rfc3339();
        self.conn()?.execute(
            "INSERT INTO collections (key, records, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET records = excluded.records, updated_at = excluded.updated_at",
            rusqlite::params![key, records, now],
        )?;
        Ok(())
    }

    /// Drop a stored collection so the next load falls back to the bundled defaults
    pub fn remove_collection(&self, key: &str) -> Result<bool, DatabaseError> {
        let changed = self
            .conn()?
            .execute("DELETE FROM collections WHERE key = ?1", [key])?;
        Ok(changed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_loads_as_none() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.load_collection("dailyflow_tasks").unwrap(), None);
    }

    #[test]
    fn save_replaces_previous_value() {
        let db = Database::open_in_memory().unwrap();
        db.save_collection("dailyflow_notes", "[1]").unwrap();
        db.save_collection("dailyflow_notes", "[]").unwrap();
        assert_eq!(db.load_collection("dailyflow_notes").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn remove_reports_whether_key_existed() {
        let db = Database::open_in_memory().unwrap();
        db.save_collection("dailyflow_meetings", "[]").unwrap();
        assert!(db.remove_collection("dailyflow_meetings").unwrap());
        assert!(!db.remove_collection("dailyflow_meetings").unwrap());
        assert_eq!(db.load_collection("dailyflow_meetings").unwrap(), None);
    }

    #[test]
    fn file_database_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("app.db");
        let path = path.to_str().unwrap();
        {
            let db = Database::new(path).unwrap();
            db.save_collection("dailyflow_tasks", "[{\"Id\":1}]").unwrap();
        }
        let db = Database::new(path).unwrap();
        assert_eq!(
            db.load_collection("dailyflow_tasks").unwrap().as_deref(),
            Some("[{\"Id\":1}]")
        );
    }
}
