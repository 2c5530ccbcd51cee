use super::IdentityBackend;
use crate::model::StorageError;
use std::io;
use std::sync::{Arc, Mutex};

/// In-memory backend; records every save for inspection.
#[derive(Default)]
pub struct MemoryBackend {
    initial: Vec<String>,
    saves: Arc<Mutex<Vec<Vec<String>>>>,
    fail: bool,
}

impl MemoryBackend {
    pub fn with_ids(ids: &[&str]) -> Self {
        Self {
            initial: ids.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn saves(&self) -> Arc<Mutex<Vec<Vec<String>>>> {
        self.saves.clone()
    }
}

impl IdentityBackend for MemoryBackend {
    fn load(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.initial.clone())
    }

    fn save(&self, ids: &[String]) -> Result<(), StorageError> {
        if self.fail {
            return Err(io::Error::other("disk full").into());
        }
        self.saves.lock().unwrap().push(ids.to_vec());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
