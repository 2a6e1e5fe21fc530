use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use mockito::Matcher;
use serde_json::json;

use super::percent;
use super::HttpApi;
use crate::domain::models::Api;
use crate::domain::models::ApiError;
use crate::domain::models::CompletionEndpoint;
use crate::domain::models::CompletionRequest;
use crate::domain::models::ExternalFileType;
use crate::domain::models::ExternalProvider;
use crate::domain::models::ExternalUploadRequest;
use crate::domain::models::LocalFile;
use crate::domain::models::ProgressFn;
use crate::domain::models::Role;

impl HttpApi {
    fn with_url(url: String) -> HttpApi {
        return HttpApi::new(
            url,
            "test-token".to_string(),
            "".to_string(),
            Duration::from_secs(5),
        );
    }
}

fn file_json(uuid: &str, filename: &str) -> serde_json::Value {
    return json!({
        "uuid": uuid,
        "filename": filename,
        "source": "local",
        "added": "2025-01-01T00:00:00+00:00",
        "owner_uuid": "user-1"
    });
}

#[test]
fn it_calculates_progress() {
    assert_eq!(percent(0, 200), 0);
    assert_eq!(percent(50, 200), 25);
    assert_eq!(percent(400, 200), 100);
    assert_eq!(percent(0, 0), 100);
}

#[tokio::test]
async fn it_lists_chats() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/chat")
        .match_header("authorization", "Bearer test-token")
        .with_status(200)
        .with_body(
            json!([{
                "uuid": "123",
                "name": "New Chat",
                "model": "ttmdocs-agents",
                "created_at": "2025-01-01T00:00:00",
                "updated_at": "2025-01-01T00:01:00"
            }])
            .to_string(),
        )
        .create_async()
        .await;

    let api = HttpApi::with_url(server.url());
    let res = api.list_chats().await?;

    assert_eq!(res.len(), 1);
    assert_eq!(res[0].uuid, "123");
    assert_eq!(res[0].model, Some("ttmdocs-agents".to_string()));
    mock.assert_async().await;

    return Ok(());
}

#[tokio::test]
async fn it_posts_agent_completions() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/v1/chat/agent/completions")
        .match_body(Matcher::Json(json!({
            "message": "Hello",
            "model": "ttmdocs-agents"
        })))
        .with_status(200)
        .with_body(
            json!({
                "role": "assistant",
                "content": "Agents Say Hello World!",
                "chat_id": "123",
                "uuid": "abc-123"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let api = HttpApi::with_url(server.url());
    let req = CompletionRequest {
        message: "Hello".to_string(),
        model: "ttmdocs-agents".to_string(),
        ..CompletionRequest::default()
    };
    let res = api.post_completion(CompletionEndpoint::Agent, &req).await?;

    assert_eq!(res.role, Role::Assistant);
    assert_eq!(res.chat_id, Some("123".to_string()));
    mock.assert_async().await;

    return Ok(());
}

#[tokio::test]
async fn it_keeps_structured_error_payloads() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/v1/files/drive/upload")
        .with_status(400)
        .with_body(json!({"detail": "No file IDs provided"}).to_string())
        .create_async()
        .await;

    let api = HttpApi::with_url(server.url());
    let res = api
        .upload_external_files(ExternalProvider::Google, &ExternalUploadRequest::default())
        .await;

    let err = res.unwrap_err();
    let api_err = err.downcast_ref::<ApiError>().unwrap();
    assert_eq!(
        *api_err,
        ApiError::Status {
            status: 400,
            body: Some(json!({"detail": "No file IDs provided"})),
        }
    );
    assert!(api_err.detail().is_some());
    mock.assert_async().await;

    return Ok(());
}

#[tokio::test]
async fn it_reports_errors_without_payloads() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/user")
        .with_status(502)
        .with_body("bad gateway")
        .create_async()
        .await;

    let api = HttpApi::with_url(server.url());
    let err = api.current_user().await.unwrap_err();

    assert_eq!(
        err.downcast_ref::<ApiError>(),
        Some(&ApiError::Status {
            status: 502,
            body: None
        })
    );
    mock.assert_async().await;

    return Ok(());
}

#[tokio::test]
async fn it_reports_transport_failures() {
    let api = HttpApi::with_url("http://127.0.0.1:1".to_string());
    let err = api.list_knowledge_bases().await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ApiError>(),
        Some(ApiError::Transport(_))
    ));
}

#[tokio::test]
async fn it_gets_files_with_content() -> Result<()> {
    let mut body = file_json("f-1", "a.pdf");
    body["encoded_content"] = json!({"1": "hello"});

    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/files/f-1")
        .match_query(Matcher::UrlEncoded(
            "include_content".to_string(),
            "true".to_string(),
        ))
        .with_status(200)
        .with_body(body.to_string())
        .create_async()
        .await;

    let api = HttpApi::with_url(server.url());
    let res = api.get_file("f-1", true).await?;

    assert!(res.has_content());
    mock.assert_async().await;

    return Ok(());
}

#[tokio::test]
async fn it_lists_box_folders() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/docs/box/files/")
        .match_query(Matcher::UrlEncoded(
            "folder_id".to_string(),
            "0".to_string(),
        ))
        .with_status(200)
        .with_body(
            json!({"files": [
                {"id": "1", "type": "folder", "name": "Reports"},
                {"id": "2", "type": "web_link", "name": "Wiki"}
            ]})
            .to_string(),
        )
        .create_async()
        .await;

    let api = HttpApi::with_url(server.url());
    let res = api
        .list_external_files(ExternalProvider::Box, Some("0"))
        .await?;

    assert_eq!(res.len(), 2);
    assert_eq!(res[0].file_type, ExternalFileType::Folder);
    assert_eq!(res[1].file_type, ExternalFileType::WebLink);
    mock.assert_async().await;

    return Ok(());
}

#[tokio::test]
async fn it_uploads_local_files_with_progress() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/v1/files/local/upload")
        .match_query(Matcher::UrlEncoded(
            "knowledge_base_uuid".to_string(),
            "kb-1".to_string(),
        ))
        .match_header(
            "content-type",
            Matcher::Regex("multipart/form-data".to_string()),
        )
        .match_body(Matcher::Regex("notes.txt".to_string()))
        .with_status(200)
        .with_body(json!([file_json("f-1", "notes.txt")]).to_string())
        .create_async()
        .await;

    let reports = Arc::new(Mutex::new(Vec::<u8>::new()));
    let reports_clone = reports.clone();
    let progress: ProgressFn = Arc::new(move |pct| {
        reports_clone.lock().unwrap().push(pct);
    });

    let file = LocalFile::new("notes.txt", vec![b'a'; 200 * 1024])?;
    let api = HttpApi::with_url(server.url());
    let res = api
        .upload_local_files(&[file], Some("kb-1"), Some(progress))
        .await?;

    assert_eq!(res.len(), 1);
    assert_eq!(res[0].filename(), "notes.txt");
    mock.assert_async().await;

    let reports = reports.lock().unwrap();
    assert!(reports.len() > 1);
    assert_eq!(reports.last(), Some(&100));
    assert!(reports.windows(2).all(|w| return w[0] <= w[1]));

    return Ok(());
}

#[tokio::test]
async fn it_posts_oauth_callback_params() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/v1/oauth/callback/")
        .match_body(Matcher::Json(json!({"code": "abc", "state": "xyz"})))
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let mut params = BTreeMap::new();
    params.insert("state".to_string(), "xyz".to_string());
    params.insert("code".to_string(), "abc".to_string());

    let api = HttpApi::with_url(server.url());
    api.oauth_callback(&params).await?;
    mock.assert_async().await;

    return Ok(());
}
