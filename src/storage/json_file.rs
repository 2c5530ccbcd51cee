use super::IdentityBackend;
use crate::model::StorageError;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Identity set stored as a JSON array in a single file.
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl IdentityBackend for JsonFileBackend {
    fn load(&self) -> Result<Vec<String>, StorageError> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let ids: Vec<String> = serde_json::from_reader(BufReader::new(file))?;
        Ok(ids)
    }

    /// Writes next to the target and renames over it, so a crash never leaves a truncated file.
    fn save(&self, ids: &[String]) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp = self.temp_path();
        let written = write_synced(&tmp, ids)
            .and_then(|()| fs::rename(&tmp, &self.path).map_err(StorageError::from));
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("json:{}", self.path.display())
    }
}

fn write_synced(path: &Path, ids: &[String]) -> Result<(), StorageError> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, ids)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(())
}
