#[cfg(test)]
#[path = "file_test.rs"]
mod tests;

use std::collections::BTreeMap;
use std::path;

use anyhow::Result;
use serde::Deserialize;
use serde::Serialize;
use tokio::fs;

use super::ApiError;

pub const SUPPORTED_FILE_TYPES: [&str; 6] = ["pdf", "docx", "pptx", "txt", "md", "csv"];

/// Page number to extracted text.
pub type EncodedContent = BTreeMap<u32, String>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub uuid: String,
    pub filename: String,
    pub source: String,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub size_bytes: Option<u64>,
    pub added: String,
    #[serde(default)]
    pub knowledge_base_id: Option<u64>,
    pub owner_uuid: String,
    #[serde(default)]
    pub encoded_content: Option<EncodedContent>,
}

impl FileRecord {
    pub fn has_content(&self) -> bool {
        return self
            .encoded_content
            .as_ref()
            .map(|content| return !content.is_empty())
            .unwrap_or(false);
    }

    pub fn without_content(&self) -> FileRecord {
        let mut record = self.clone();
        record.encoded_content = None;
        return record;
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileList {
    pub files: Vec<FileRecord>,
}

/// One entry of an upload response. The backend reports files it failed to
/// process alongside the ones it stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UploadResult {
    Uploaded(FileRecord),
    Failed { filename: String, error: String },
}

impl UploadResult {
    #[cfg(test)]
    pub fn record(&self) -> Option<&FileRecord> {
        return match self {
            UploadResult::Uploaded(record) => Some(record),
            UploadResult::Failed { .. } => None,
        };
    }

    #[cfg(test)]
    pub fn filename(&self) -> &str {
        return match self {
            UploadResult::Uploaded(record) => &record.filename,
            UploadResult::Failed { filename, .. } => filename,
        };
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knowledge_base_uuid: Option<String>,
}

/// A file picked from the local filesystem, already read into memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

pub fn is_supported_file(filename: &str) -> bool {
    let extension = path::Path::new(filename)
        .extension()
        .map(|ext| return ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    return SUPPORTED_FILE_TYPES.contains(&extension.as_str());
}

fn mime_type_for(filename: &str) -> &'static str {
    let extension = path::Path::new(filename)
        .extension()
        .map(|ext| return ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    return match extension.as_str() {
        "pdf" => "application/pdf",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "csv" => "text/csv",
        _ => "application/octet-stream",
    };
}

impl LocalFile {
    /// Rejects unsupported file types before anything is sent to the backend.
    pub fn new(name: &str, bytes: Vec<u8>) -> Result<LocalFile> {
        if !is_supported_file(name) {
            tracing::warn!(filename = name, "Rejected unsupported file type");
            return Err(ApiError::Validation(format!(
                "{name} is not a supported file type. Supported types are: {}",
                SUPPORTED_FILE_TYPES.join(", ")
            ))
            .into());
        }

        return Ok(LocalFile {
            name: name.to_string(),
            mime_type: mime_type_for(name).to_string(),
            bytes,
        });
    }

    pub async fn from_path(file_path: &path::Path) -> Result<LocalFile> {
        let name = file_path
            .file_name()
            .map(|name| return name.to_string_lossy().to_string())
            .unwrap_or_default();

        if !is_supported_file(&name) {
            return LocalFile::new(&name, vec![]);
        }

        let bytes = fs::read(file_path).await?;
        return LocalFile::new(&name, bytes);
    }

    pub fn size(&self) -> u64 {
        return self.bytes.len() as u64;
    }
}
