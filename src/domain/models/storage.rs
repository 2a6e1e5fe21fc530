use anyhow::Result;

pub const SELECTED_MODEL_KEY: &str = "ttmdocs.selected-model";
pub const SELECTED_KNOWLEDGE_BASE_KEY: &str = "ttmdocs.selected-knowledge-base";

/// Persistent string storage keyed by name. Values are JSON documents.
pub trait StateStorage {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;
}
