#[cfg(test)]
#[path = "resources_test.rs"]
mod tests;

use std::sync::Arc;

use anyhow::bail;
use anyhow::Result;
use tokio_util::sync::CancellationToken;

use super::Mutation;
use super::QueryCache;
use crate::domain::models::ApiBox;
use crate::domain::models::ApiError;
use crate::domain::models::FileRecord;
use crate::domain::models::FileUpdate;
use crate::domain::models::KnowledgeBase;
use crate::domain::models::KnowledgeBaseCreate;
use crate::domain::models::KnowledgeBaseUpdate;
use crate::domain::models::QueryKey;

pub struct KnowledgeBaseService {
    api: ApiBox,
    cache: Arc<QueryCache>,
}

impl KnowledgeBaseService {
    pub fn new(api: ApiBox, cache: Arc<QueryCache>) -> KnowledgeBaseService {
        return KnowledgeBaseService { api, cache };
    }

    pub async fn list(&self, cancel: &CancellationToken) -> Result<Arc<Vec<KnowledgeBase>>> {
        let api = self.api.clone();
        return self
            .cache
            .fetch(&QueryKey::knowledge_bases(), cancel, || {
                return async move { return api.list_knowledge_bases().await };
            })
            .await;
    }

    pub async fn get(&self, id: &str, cancel: &CancellationToken) -> Result<Arc<KnowledgeBase>> {
        let api = self.api.clone();
        let kb_id = id.to_string();
        return self
            .cache
            .fetch(&QueryKey::knowledge_base(id), cancel, || {
                return async move { return api.get_knowledge_base(&kb_id).await };
            })
            .await;
    }

    pub async fn create(&self, req: &KnowledgeBaseCreate) -> Result<KnowledgeBase> {
        if req.title.trim().is_empty() {
            bail!(ApiError::Validation(
                "Knowledge base title cannot be empty".to_string()
            ));
        }

        let res = self.api.create_knowledge_base(req).await?;
        Mutation::CreateKnowledgeBase.apply(&self.cache);

        return Ok(res);
    }

    pub async fn update(&self, id: &str, req: &KnowledgeBaseUpdate) -> Result<KnowledgeBase> {
        if req.is_empty() {
            bail!(ApiError::Validation("Nothing to update".to_string()));
        }

        let res = self.api.update_knowledge_base(id, req).await?;
        Mutation::UpdateKnowledgeBase { id: id.to_string() }.apply(&self.cache);

        return Ok(res);
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.api.delete_knowledge_base(id).await?;
        Mutation::DeleteKnowledgeBase { id: id.to_string() }.apply(&self.cache);

        return Ok(());
    }
}

pub struct FileService {
    api: ApiBox,
    cache: Arc<QueryCache>,
}

impl FileService {
    pub fn new(api: ApiBox, cache: Arc<QueryCache>) -> FileService {
        return FileService { api, cache };
    }

    pub async fn list(
        &self,
        knowledge_base_id: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Arc<Vec<FileRecord>>> {
        let api = self.api.clone();
        let kb_id = knowledge_base_id.map(|id| return id.to_string());
        return self
            .cache
            .fetch(&QueryKey::files(knowledge_base_id), cancel, || {
                return async move { return api.list_files(kb_id.as_deref()).await };
            })
            .await;
    }

    pub async fn get(
        &self,
        id: &str,
        include_content: bool,
        cancel: &CancellationToken,
    ) -> Result<Arc<FileRecord>> {
        let api = self.api.clone();
        let file_id = id.to_string();
        return self
            .cache
            .fetch(&QueryKey::file(id, include_content), cancel, || {
                return async move { return api.get_file(&file_id, include_content).await };
            })
            .await;
    }

    pub async fn update(&self, id: &str, req: &FileUpdate) -> Result<FileRecord> {
        if req.filename.is_none() && req.knowledge_base_uuid.is_none() {
            bail!(ApiError::Validation("Nothing to update".to_string()));
        }

        let res = self.api.update_file(id, req).await?;
        Mutation::UpdateFile { id: id.to_string() }.apply(&self.cache);
        self.cache.remove(&QueryKey::new(&["file", id]));

        return Ok(res);
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.api.delete_file(id).await?;
        Mutation::DeleteFile { id: id.to_string() }.apply(&self.cache);
        self.cache.remove(&QueryKey::new(&["file", id]));

        return Ok(());
    }
}
