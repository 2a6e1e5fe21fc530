#[cfg(test)]
#[path = "http_test.rs"]
mod tests;

use std::collections::BTreeMap;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::multipart;
use reqwest::Method;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Api;
use crate::domain::models::ApiError;
use crate::domain::models::AuthorizeRequest;
use crate::domain::models::AuthorizeResponse;
use crate::domain::models::ChatMessage;
use crate::domain::models::ChatSession;
use crate::domain::models::CompletionEndpoint;
use crate::domain::models::CompletionRequest;
use crate::domain::models::ExternalFile;
use crate::domain::models::ExternalFileList;
use crate::domain::models::ExternalProvider;
use crate::domain::models::ExternalUploadRequest;
use crate::domain::models::FileList;
use crate::domain::models::FileRecord;
use crate::domain::models::FileUpdate;
use crate::domain::models::KnowledgeBase;
use crate::domain::models::KnowledgeBaseCreate;
use crate::domain::models::KnowledgeBaseList;
use crate::domain::models::KnowledgeBaseUpdate;
use crate::domain::models::LlmCatalog;
use crate::domain::models::LlmModelDescriptor;
use crate::domain::models::LocalFile;
use crate::domain::models::OAuthProvider;
use crate::domain::models::OAuthProviderList;
use crate::domain::models::ProgressFn;
use crate::domain::models::UploadResult;
use crate::domain::models::User;

const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

pub struct HttpApi {
    client: reqwest::Client,
    url: String,
    token: String,
    user_email: String,
}

impl Default for HttpApi {
    fn default() -> HttpApi {
        let timeout = Config::get(ConfigKey::RequestTimeoutSeconds)
            .parse::<u64>()
            .unwrap_or(90);

        return HttpApi::new(
            Config::get(ConfigKey::ApiURL),
            Config::get(ConfigKey::ApiToken),
            Config::get(ConfigKey::DevUserEmail),
            Duration::from_secs(timeout),
        );
    }
}

fn percent(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    return ((sent.min(total) * 100) / total) as u8;
}

/// Splits a file into chunks for a streamed multipart part, reporting the
/// running total through `progress` as each chunk is handed to the transport.
fn progress_part(
    file: &LocalFile,
    sent: Arc<AtomicU64>,
    total: u64,
    progress: ProgressFn,
) -> Result<multipart::Part> {
    let chunks = file
        .bytes
        .chunks(UPLOAD_CHUNK_SIZE)
        .map(|chunk| return chunk.to_vec())
        .collect::<Vec<Vec<u8>>>();

    let stream = futures::stream::iter(chunks.into_iter().map(move |chunk| {
        let done = sent.fetch_add(chunk.len() as u64, Ordering::SeqCst) + chunk.len() as u64;
        progress(percent(done, total));
        return Ok::<Vec<u8>, std::io::Error>(chunk);
    }));

    let part = multipart::Part::stream_with_length(reqwest::Body::wrap_stream(stream), file.size())
        .file_name(file.name.to_string())
        .mime_str(&file.mime_type)?;

    return Ok(part);
}

impl HttpApi {
    pub fn new(url: String, token: String, user_email: String, timeout: Duration) -> HttpApi {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        return HttpApi {
            client,
            url: url.trim_end_matches('/').to_string(),
            token,
            user_email,
        };
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{url}/api/v1/{path}", url = self.url);
        tracing::debug!(method = %method, url = url.as_str(), "Request");

        let mut req = self.client.request(method, url);
        if !self.token.is_empty() {
            req = req.bearer_auth(&self.token);
        }
        if !self.user_email.is_empty() {
            req = req.header("X-User-Email", &self.user_email);
        }

        return req;
    }

    async fn send(&self, req: RequestBuilder) -> Result<reqwest::Response> {
        let res = req.send().await.map_err(ApiError::from)?;
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }

        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str::<serde_json::Value>(&text).ok();
        tracing::error!(status = status.as_u16(), body = text.as_str(), "Request failed");

        return Err(ApiError::Status {
            status: status.as_u16(),
            body,
        }
        .into());
    }

    async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T> {
        let res = self.send(req).await?;
        let body = res.json::<T>().await.map_err(ApiError::from)?;
        return Ok(body);
    }
}

#[async_trait]
impl Api for HttpApi {
    async fn list_chats(&self) -> Result<Vec<ChatSession>> {
        return self.send_json(self.request(Method::GET, "chat")).await;
    }

    async fn chat_messages(&self, chat_id: &str) -> Result<Vec<ChatMessage>> {
        let path = format!("chat/{chat_id}/messages");
        return self.send_json(self.request(Method::GET, &path)).await;
    }

    async fn rename_chat(&self, chat_id: &str, name: &str) -> Result<ChatSession> {
        let path = format!("chat/{chat_id}");
        let req = self
            .request(Method::PATCH, &path)
            .json(&serde_json::json!({ "name": name }));
        return self.send_json(req).await;
    }

    async fn delete_chat(&self, chat_id: &str) -> Result<()> {
        let path = format!("chat/{chat_id}");
        self.send(self.request(Method::DELETE, &path)).await?;
        return Ok(());
    }

    async fn post_completion(
        &self,
        endpoint: CompletionEndpoint,
        req: &CompletionRequest,
    ) -> Result<ChatMessage> {
        let builder = self
            .request(Method::POST, &endpoint.to_string())
            .json(req);
        let msg: ChatMessage = self.send_json(builder).await?;
        tracing::debug!(chat_id = ?msg.chat_id, endpoint = %endpoint, "Completion response");
        return Ok(msg);
    }

    async fn llm_catalog(&self) -> Result<Vec<LlmModelDescriptor>> {
        let res: LlmCatalog = self
            .send_json(self.request(Method::GET, "chat/llm/catalog"))
            .await?;
        return Ok(res.data);
    }

    async fn list_knowledge_bases(&self) -> Result<Vec<KnowledgeBase>> {
        let res: KnowledgeBaseList = self
            .send_json(self.request(Method::GET, "knowledge-bases/"))
            .await?;
        return Ok(res.knowledge_bases);
    }

    async fn get_knowledge_base(&self, id: &str) -> Result<KnowledgeBase> {
        let path = format!("knowledge-bases/{id}");
        return self.send_json(self.request(Method::GET, &path)).await;
    }

    async fn create_knowledge_base(&self, req: &KnowledgeBaseCreate) -> Result<KnowledgeBase> {
        let builder = self.request(Method::POST, "knowledge-bases/").json(req);
        return self.send_json(builder).await;
    }

    async fn update_knowledge_base(
        &self,
        id: &str,
        req: &KnowledgeBaseUpdate,
    ) -> Result<KnowledgeBase> {
        let path = format!("knowledge-bases/{id}");
        let builder = self.request(Method::PUT, &path).json(req);
        return self.send_json(builder).await;
    }

    async fn delete_knowledge_base(&self, id: &str) -> Result<()> {
        let path = format!("knowledge-bases/{id}");
        self.send(self.request(Method::DELETE, &path)).await?;
        return Ok(());
    }

    async fn list_files(&self, knowledge_base_id: Option<&str>) -> Result<Vec<FileRecord>> {
        let mut req = self.request(Method::GET, "files/");
        if let Some(id) = knowledge_base_id {
            req = req.query(&[("knowledge_base_uuid", id)]);
        }
        let res: FileList = self.send_json(req).await?;
        return Ok(res.files);
    }

    async fn get_file(&self, id: &str, include_content: bool) -> Result<FileRecord> {
        let path = format!("files/{id}");
        let req = self
            .request(Method::GET, &path)
            .query(&[("include_content", include_content)]);
        return self.send_json(req).await;
    }

    async fn update_file(&self, id: &str, req: &FileUpdate) -> Result<FileRecord> {
        let path = format!("files/{id}");
        let builder = self.request(Method::PUT, &path).json(req);
        return self.send_json(builder).await;
    }

    async fn delete_file(&self, id: &str) -> Result<()> {
        let path = format!("files/{id}");
        self.send(self.request(Method::DELETE, &path)).await?;
        return Ok(());
    }

    async fn upload_local_files(
        &self,
        files: &[LocalFile],
        knowledge_base_id: Option<&str>,
        progress: Option<ProgressFn>,
    ) -> Result<Vec<UploadResult>> {
        let total = files.iter().map(|file| return file.size()).sum::<u64>();
        let sent = Arc::new(AtomicU64::new(0));

        let mut form = multipart::Form::new();
        for file in files {
            let part = match &progress {
                Some(progress) => progress_part(file, sent.clone(), total, progress.clone())?,
                None => multipart::Part::bytes(file.bytes.clone())
                    .file_name(file.name.to_string())
                    .mime_str(&file.mime_type)?,
            };
            form = form.part("files", part);
        }

        let mut req = self.request(Method::POST, "files/local/upload").multipart(form);
        if let Some(id) = knowledge_base_id {
            req = req.query(&[("knowledge_base_uuid", id)]);
        }

        let res: Vec<UploadResult> = self.send_json(req).await?;
        if let Some(progress) = progress {
            progress(100);
        }

        return Ok(res);
    }

    async fn upload_external_files(
        &self,
        provider: ExternalProvider,
        req: &ExternalUploadRequest,
    ) -> Result<Vec<UploadResult>> {
        let path = match provider {
            ExternalProvider::Google => "files/drive/upload",
            ExternalProvider::Box => "files/box/upload",
        };
        let builder = self.request(Method::POST, path).json(req);
        return self.send_json(builder).await;
    }

    async fn list_external_files(
        &self,
        provider: ExternalProvider,
        folder_id: Option<&str>,
    ) -> Result<Vec<ExternalFile>> {
        let path = format!("docs/{provider}/files/");
        let mut req = self.request(Method::GET, &path);
        if let Some(id) = folder_id {
            req = req.query(&[("folder_id", id)]);
        }
        let res: ExternalFileList = self.send_json(req).await?;
        return Ok(res.files);
    }

    async fn oauth_providers(&self) -> Result<Vec<OAuthProvider>> {
        let res: OAuthProviderList = self.send_json(self.request(Method::GET, "oauth/")).await?;
        return Ok(res.providers);
    }

    async fn oauth_authorize(&self, req: &AuthorizeRequest) -> Result<AuthorizeResponse> {
        let builder = self.request(Method::POST, "oauth/authorize/").json(req);
        return self.send_json(builder).await;
    }

    async fn oauth_callback(&self, params: &BTreeMap<String, String>) -> Result<()> {
        let builder = self.request(Method::POST, "oauth/callback/").json(params);
        self.send(builder).await?;
        return Ok(());
    }

    async fn current_user(&self) -> Result<User> {
        return self.send_json(self.request(Method::GET, "user")).await;
    }
}
