#[cfg(test)]
#[path = "file_ingestion_test.rs"]
mod tests;

use std::sync::Arc;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use futures::future::join_all;
use tokio_util::sync::CancellationToken;

use super::Mutation;
use super::QueryCache;
use crate::domain::models::ApiBox;
use crate::domain::models::ApiError;
use crate::domain::models::ExternalProvider;
use crate::domain::models::ExternalUploadRequest;
use crate::domain::models::LocalFile;
use crate::domain::models::ProgressFn;
use crate::domain::models::UploadResult;

/// Where uploaded bytes come from. Implementations only cover the first
/// stage of ingestion, the backend upload call.
#[async_trait]
pub trait UploadOrigin {
    fn describe(&self) -> String;

    async fn upload(
        &self,
        api: &ApiBox,
        knowledge_base_id: Option<&str>,
        progress: Option<ProgressFn>,
    ) -> Result<Vec<UploadResult>>;
}

pub struct LocalUpload {
    pub files: Vec<LocalFile>,
}

#[async_trait]
impl UploadOrigin for LocalUpload {
    fn describe(&self) -> String {
        return format!("{} local file(s)", self.files.len());
    }

    async fn upload(
        &self,
        api: &ApiBox,
        knowledge_base_id: Option<&str>,
        progress: Option<ProgressFn>,
    ) -> Result<Vec<UploadResult>> {
        if self.files.is_empty() {
            bail!(ApiError::Validation("No files selected".to_string()));
        }

        return api
            .upload_local_files(&self.files, knowledge_base_id, progress)
            .await;
    }
}

async fn upload_external(
    api: &ApiBox,
    provider: ExternalProvider,
    file_id: &str,
    knowledge_base_id: Option<&str>,
) -> Result<Vec<UploadResult>> {
    let req = ExternalUploadRequest {
        file_ids: vec![file_id.to_string()],
        knowledge_base_uuid: knowledge_base_id.map(|id| return id.to_string()),
    };

    return api.upload_external_files(provider, &req).await;
}

pub struct GoogleDriveUpload {
    pub file_id: String,
}

#[async_trait]
impl UploadOrigin for GoogleDriveUpload {
    fn describe(&self) -> String {
        return format!("Google Drive file {}", self.file_id);
    }

    async fn upload(
        &self,
        api: &ApiBox,
        knowledge_base_id: Option<&str>,
        _progress: Option<ProgressFn>,
    ) -> Result<Vec<UploadResult>> {
        return upload_external(api, ExternalProvider::Google, &self.file_id, knowledge_base_id)
            .await;
    }
}

pub struct BoxUpload {
    pub file_id: String,
}

#[async_trait]
impl UploadOrigin for BoxUpload {
    fn describe(&self) -> String {
        return format!("Box file {}", self.file_id);
    }

    async fn upload(
        &self,
        api: &ApiBox,
        knowledge_base_id: Option<&str>,
        _progress: Option<ProgressFn>,
    ) -> Result<Vec<UploadResult>> {
        return upload_external(api, ExternalProvider::Box, &self.file_id, knowledge_base_id)
            .await;
    }
}

/// Uploads files and, when they land in a knowledge base, fetches each one
/// again with its extracted content.
pub struct FileIngestion {
    api: ApiBox,
    cache: Arc<QueryCache>,
}

impl FileIngestion {
    pub fn new(api: ApiBox, cache: Arc<QueryCache>) -> FileIngestion {
        return FileIngestion { api, cache };
    }

    /// `cancel` only aborts the upload. Once it has completed, hydration runs
    /// to the end.
    pub async fn ingest(
        &self,
        origin: &(dyn UploadOrigin + Send + Sync),
        knowledge_base_id: Option<&str>,
        progress: Option<ProgressFn>,
        cancel: &CancellationToken,
    ) -> Result<Vec<UploadResult>> {
        tracing::debug!(
            origin = %origin.describe(),
            knowledge_base_id = knowledge_base_id.unwrap_or_default(),
            "Uploading"
        );

        let results = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(origin = %origin.describe(), "Upload cancelled");
                bail!(ApiError::Cancelled);
            }
            res = origin.upload(&self.api, knowledge_base_id, progress) => res?,
        };

        Mutation::UploadFiles.apply(&self.cache);

        if knowledge_base_id.is_none() {
            return Ok(results);
        }

        let hydrated = join_all(results.into_iter().map(|result| return self.hydrate(result))).await;
        return Ok(hydrated);
    }

    async fn hydrate(&self, result: UploadResult) -> UploadResult {
        let record = match result {
            UploadResult::Uploaded(record) => record,
            failed => return failed,
        };

        match self.api.get_file(&record.uuid, true).await {
            Ok(full) => return UploadResult::Uploaded(full),
            Err(err) => {
                tracing::warn!(
                    file_id = record.uuid.as_str(),
                    error = %err,
                    "Failed to load file content, keeping the record without it"
                );
                return UploadResult::Uploaded(record.without_content());
            }
        }
    }
}
