use serde::Deserialize;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeBaseFile {
    pub uuid: String,
    pub filename: String,
    #[serde(default)]
    pub file_path: String,
    #[serde(default)]
    pub size_tokens: u64,
    pub source: String,
    #[serde(default)]
    pub created_at: Option<String>,
    pub owner_uuid: String,
}

/// Token count and file list are owned by the backend and only displayed here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeBase {
    pub uuid: String,
    pub title: String,
    pub description: String,
    pub token_count: u64,
    pub path: String,
    pub created_at: String,
    pub updated_at: String,
    pub owner_uuid: String,
    #[serde(default)]
    pub files: Vec<KnowledgeBaseFile>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeBaseList {
    pub knowledge_bases: Vec<KnowledgeBase>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeBaseCreate {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeBaseUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl KnowledgeBaseUpdate {
    pub fn is_empty(&self) -> bool {
        return self.title.is_none() && self.description.is_none();
    }
}
