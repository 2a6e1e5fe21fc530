use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;

use super::AuthorizeRequest;
use super::AuthorizeResponse;
use super::ChatMessage;
use super::ChatSession;
use super::ExternalFile;
use super::ExternalProvider;
use super::FileRecord;
use super::FileUpdate;
use super::KnowledgeBase;
use super::KnowledgeBaseCreate;
use super::KnowledgeBaseUpdate;
use super::LlmModelDescriptor;
use super::LocalFile;
use super::OAuthProvider;
use super::UploadResult;
use super::User;

/// Receives upload progress as a percentage between 0 and 100.
pub type ProgressFn = Arc<dyn Fn(u8) + Send + Sync>;

#[derive(Copy, Clone, Debug, PartialEq, Eq, strum::Display)]
pub enum CompletionEndpoint {
    /// Direct passthrough to the selected LLM.
    #[strum(serialize = "chat/completions")]
    Llm,
    /// Multi-agent orchestration.
    #[strum(serialize = "chat/agent/completions")]
    Agent,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub message: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knowledge_base_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub file_ids: Vec<String>,
    /// Legacy page context, only sent when no file ids are attached.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<serde_json::Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalUploadRequest {
    pub file_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knowledge_base_uuid: Option<String>,
}

/// The Talk to My Docs REST API.
#[async_trait]
pub trait Api {
    async fn list_chats(&self) -> Result<Vec<ChatSession>>;

    async fn chat_messages(&self, chat_id: &str) -> Result<Vec<ChatMessage>>;

    async fn rename_chat(&self, chat_id: &str, name: &str) -> Result<ChatSession>;

    async fn delete_chat(&self, chat_id: &str) -> Result<()>;

    /// Posts a message and returns the assistant's reply, which carries the
    /// authoritative chat id.
    async fn post_completion(
        &self,
        endpoint: CompletionEndpoint,
        req: &CompletionRequest,
    ) -> Result<ChatMessage>;

    async fn llm_catalog(&self) -> Result<Vec<LlmModelDescriptor>>;

    async fn list_knowledge_bases(&self) -> Result<Vec<KnowledgeBase>>;

    async fn get_knowledge_base(&self, id: &str) -> Result<KnowledgeBase>;

    async fn create_knowledge_base(&self, req: &KnowledgeBaseCreate) -> Result<KnowledgeBase>;

    async fn update_knowledge_base(
        &self,
        id: &str,
        req: &KnowledgeBaseUpdate,
    ) -> Result<KnowledgeBase>;

    async fn delete_knowledge_base(&self, id: &str) -> Result<()>;

    async fn list_files(&self, knowledge_base_id: Option<&str>) -> Result<Vec<FileRecord>>;

    async fn get_file(&self, id: &str, include_content: bool) -> Result<FileRecord>;

    async fn update_file(&self, id: &str, req: &FileUpdate) -> Result<FileRecord>;

    async fn delete_file(&self, id: &str) -> Result<()>;

    async fn upload_local_files(
        &self,
        files: &[LocalFile],
        knowledge_base_id: Option<&str>,
        progress: Option<ProgressFn>,
    ) -> Result<Vec<UploadResult>>;

    async fn upload_external_files(
        &self,
        provider: ExternalProvider,
        req: &ExternalUploadRequest,
    ) -> Result<Vec<UploadResult>>;

    async fn list_external_files(
        &self,
        provider: ExternalProvider,
        folder_id: Option<&str>,
    ) -> Result<Vec<ExternalFile>>;

    async fn oauth_providers(&self) -> Result<Vec<OAuthProvider>>;

    async fn oauth_authorize(&self, req: &AuthorizeRequest) -> Result<AuthorizeResponse>;

    async fn oauth_callback(&self, params: &BTreeMap<String, String>) -> Result<()>;

    async fn current_user(&self) -> Result<User>;
}

pub type ApiBox = Arc<dyn Api + Send + Sync>;
