use std::fs;
use std::path::PathBuf;

use serde_json::Value;
use tracing::warn;

use crate::storage::{StorageBackend, StorageError};

/// File-per-store backend persisting under a caller-supplied directory.
///
/// Each store is serialized to `<escaped name>.json`, so contents survive
/// the process. Unparseable files load as absence.
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Create a backend rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", escape_name(name)))
    }

    fn try_save(&self, name: &str, value: &Value) -> Result<(), StorageError> {
        let text = serde_json::to_string(value)?;
        fs::write(self.path_for(name), text)?;
        Ok(())
    }
}

impl StorageBackend for FileBackend {
    fn load(&self, name: &str) -> Option<Value> {
        let text = fs::read_to_string(self.path_for(name)).ok()?;
        match serde_json::from_str(&text) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(store = name, %err, "discarding unparseable store file");
                None
            }
        }
    }

    fn save(&self, name: &str, value: &Value) {
        if let Err(err) = self.try_save(name, value) {
            warn!(store = name, %err, "failed to persist store");
        }
    }
}

/// Escape a store name into a unique, filesystem-safe file stem.
fn escape_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' => c.to_string(),
            other => format!("%{:04x}", other as u32),
        })
        .collect()
}
