#[cfg(test)]
#[path = "file_test.rs"]
mod tests;

use std::fs;
use std::path;

use anyhow::Result;
use serde_json::Map;
use serde_json::Value;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::StateStorage;

/// Keeps every key in a single JSON object on disk. Each write rewrites the
/// whole file, so the last writer wins.
pub struct FileStorage {
    pub file_path: path::PathBuf,
}

impl Default for FileStorage {
    fn default() -> FileStorage {
        return FileStorage::new(path::PathBuf::from(Config::get(ConfigKey::StorageFile)));
    }
}

impl FileStorage {
    pub fn new(file_path: path::PathBuf) -> FileStorage {
        return FileStorage { file_path };
    }

    fn read(&self) -> Result<Map<String, Value>> {
        if !self.file_path.exists() {
            return Ok(Map::new());
        }

        let payload = fs::read_to_string(&self.file_path)?;
        if payload.trim().is_empty() {
            return Ok(Map::new());
        }

        let doc: Map<String, Value> = serde_json::from_str(&payload)?;
        return Ok(doc);
    }

    fn write(&self, doc: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        fs::write(&self.file_path, serde_json::to_string_pretty(doc)?)?;
        return Ok(());
    }
}

impl StateStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let doc = self.read()?;
        return Ok(doc.get(key).map(|val| return val.to_string()));
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut doc = self.read().unwrap_or_else(|err| {
            tracing::warn!(error = ?err, "Discarding unreadable storage file");
            return Map::new();
        });
        doc.insert(key.to_string(), serde_json::from_str(value)?);
        return self.write(&doc);
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut doc = self.read()?;
        if doc.remove(key).is_some() {
            self.write(&doc)?;
        }
        return Ok(());
    }
}
