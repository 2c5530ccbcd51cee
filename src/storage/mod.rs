// Identity store: the set of listing ids already seen, plus its durable backing.
pub mod json_file;
pub mod sqlite;

#[cfg(test)]
pub mod memory;

use crate::model::StorageError;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

pub use json_file::JsonFileBackend;
pub use sqlite::SqliteStorage;

/// Durable home of the identity set. Loading missing state yields an empty list.
pub trait IdentityBackend: Send {
    fn load(&self) -> Result<Vec<String>, StorageError>;
    fn save(&self, ids: &[String]) -> Result<(), StorageError>;
    fn describe(&self) -> String;
}

/// Picks the SQLite backend for `.db`/`.sqlite`/`.sqlite3` paths and the JSON file otherwise.
pub fn open_backend(path: &Path) -> Result<Box<dyn IdentityBackend>, StorageError> {
    let is_sqlite = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| matches!(e.to_ascii_lowercase().as_str(), "db" | "sqlite" | "sqlite3"))
        .unwrap_or(false);

    if is_sqlite {
        Ok(Box::new(SqliteStorage::new(path)?))
    } else {
        Ok(Box::new(JsonFileBackend::new(path)))
    }
}

/// Set of seen ids. Ids are only ever added during a process lifetime.
pub struct IdentityStore {
    ids: HashSet<String>,
    backend: Box<dyn IdentityBackend>,
    dirty: bool,
}

impl IdentityStore {
    pub fn open(backend: Box<dyn IdentityBackend>) -> Result<Self, StorageError> {
        let ids: HashSet<String> = backend.load()?.into_iter().collect();
        info!("Loaded {} known listings from {}", ids.len(), backend.describe());
        Ok(Self {
            ids,
            backend,
            dirty: false,
        })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Returns true if the id was not known before.
    pub fn insert(&mut self, id: &str) -> bool {
        if self.ids.contains(id) {
            return false;
        }
        self.ids.insert(id.to_string());
        self.dirty = true;
        true
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Writes the whole set if anything changed since the last successful flush.
    pub fn flush(&mut self) -> Result<(), StorageError> {
        if !self.dirty {
            return Ok(());
        }
        let mut ids: Vec<String> = self.ids.iter().cloned().collect();
        ids.sort();
        self.backend.save(&ids)?;
        self.dirty = false;
        debug!("Persisted {} identities to {}", ids.len(), self.backend.describe());
        Ok(())
    }

    pub fn describe(&self) -> String {
        self.backend.describe()
    }
}
