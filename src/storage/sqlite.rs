use super::IdentityBackend;
use crate::model::StorageError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

const STATE_KEY: &str = "seen_ids";

/// Keeps the identity set as one JSON-array row, so the whole set is replaced atomically.
pub struct SqliteStorage {
    conn: Connection,
    path: PathBuf,
}

impl SqliteStorage {
    /// Opens the database and creates the state table if needed.
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = db_path.as_ref().to_path_buf();
        let conn = Connection::open(&path)?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS identity_state (
                key TEXT PRIMARY KEY,
                ids TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            ",
        )?;

        Ok(Self { conn, path })
    }
}

impl IdentityBackend for SqliteStorage {
    fn load(&self) -> Result<Vec<String>, StorageError> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT ids FROM identity_state WHERE key = ?1",
                params![STATE_KEY],
                |row| row.get(0),
            )
            .optional()?;

        match raw {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, ids: &[String]) -> Result<(), StorageError> {
        let json = serde_json::to_string(ids)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO identity_state (key, ids, updated_at) VALUES (?1, ?2, ?3)",
            params![STATE_KEY, json, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("sqlite:{}", self.path.display())
    }
}
