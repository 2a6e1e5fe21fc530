use anyhow::Result;
use dashmap::DashMap;

use crate::domain::models::StateStorage;

#[derive(Default)]
pub struct MemoryStorage {
    values: DashMap<String, String>,
}

impl StateStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        return Ok(self.values.get(key).map(|val| return val.to_string()));
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        return Ok(());
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values.remove(key);
        return Ok(());
    }
}
