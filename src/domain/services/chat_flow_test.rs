use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use mockito::Matcher;
use serde_json::json;
use test_utils::assistant_message_json;
use tokio_util::sync::CancellationToken;

use super::ChatPhase;
use super::ChatService;
use super::SendMessage;
use crate::domain::models::ApiError;
use crate::domain::models::ChatMessage;
use crate::domain::models::ChatSession;
use crate::domain::models::LlmModelDescriptor;
use crate::domain::models::QueryKey;
use crate::domain::models::Role;
use crate::domain::models::Route;
use crate::domain::services::QueryCache;
use crate::infrastructure::api::HttpApi;

fn service(url: String) -> (ChatService, Arc<QueryCache>) {
    let cache = Arc::new(QueryCache::new(Duration::from_secs(60)));
    let api = HttpApi::new(url, "".to_string(), "".to_string(), Duration::from_secs(5));
    return (ChatService::new(Arc::new(api), cache.clone()), cache);
}

fn gpt() -> LlmModelDescriptor {
    return LlmModelDescriptor {
        name: "GPT-4o".to_string(),
        model: "gpt-4o".to_string(),
        llm_id: "azure-openai-gpt-4-o".to_string(),
        is_active: true,
        is_deprecated: false,
    };
}

fn existing_message(chat_id: &str) -> ChatMessage {
    let mut message = ChatMessage::optimistic_user("Earlier", "gpt-4o", Some(chat_id));
    message.uuid = Some("m-0".to_string());
    return message;
}

#[tokio::test]
async fn it_navigates_to_new_agent_chats() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/v1/chat/agent/completions")
        .match_body(Matcher::Json(json!({
            "message": "Hello",
            "model": "ttmdocs-agents"
        })))
        .with_status(200)
        .with_body(assistant_message_json("123", "abc-123", "Agents Say Hello World!").to_string())
        .create_async()
        .await;

    let (service, cache) = service(server.url());
    let res = service
        .send_message(SendMessage::new("Hello", LlmModelDescriptor::agent()))
        .await?;

    assert_eq!(res.navigate_to, Some(Route::Chat("123".to_string())));
    assert_eq!(res.navigate_to.unwrap().to_path(), "/chat/123");

    let messages = cache
        .get::<Vec<ChatMessage>>(&QueryKey::messages(Some("123")))
        .unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[0].chat_id, Some("123".to_string()));
    assert!(messages[1].content.contains("Agents Say Hello World!"));
    assert!(cache
        .get::<Vec<ChatMessage>>(&QueryKey::messages(None))
        .is_none());
    assert_eq!(service.phase(Some("123")), ChatPhase::Idle);
    mock.assert_async().await;

    return Ok(());
}

#[tokio::test]
async fn it_appends_replies_to_existing_chats() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/v1/chat/completions")
        .match_body(Matcher::Json(json!({
            "message": "Summarize",
            "model": "gpt-4o",
            "chat_id": "123",
            "knowledge_base_id": "kb-1"
        })))
        .with_status(200)
        .with_body(assistant_message_json("123", "m-2", "A summary").to_string())
        .create_async()
        .await;

    let (service, cache) = service(server.url());
    cache.set(&QueryKey::messages(Some("123")), vec![existing_message("123")]);
    cache.set(&QueryKey::chats(), Vec::<String>::new());

    let mut req = SendMessage::new("  Summarize ", gpt());
    req.chat_id = Some("123".to_string());
    req.knowledge_base_id = Some("kb-1".to_string());
    let res = service.send_message(req).await?;

    assert_eq!(res.navigate_to, None);
    let messages = cache
        .get::<Vec<ChatMessage>>(&QueryKey::messages(Some("123")))
        .unwrap();
    let contents = messages
        .iter()
        .map(|e| return e.content.as_str())
        .collect::<Vec<&str>>();
    assert_eq!(contents, vec!["Earlier", "Summarize", "A summary"]);
    assert!(messages[1].is_local());
    assert!(!cache.is_stale(&QueryKey::chats()));
    mock.assert_async().await;

    return Ok(());
}

#[tokio::test]
async fn it_rolls_back_failed_sends() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/v1/chat/completions")
        .with_status(500)
        .with_body(json!({"detail": "model unavailable"}).to_string())
        .create_async()
        .await;

    let (service, cache) = service(server.url());
    let before = vec![existing_message("123")];
    cache.set(&QueryKey::messages(Some("123")), before.clone());

    let mut req = SendMessage::new("Hello", gpt());
    req.chat_id = Some("123".to_string());
    let err = service.send_message(req).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ApiError>(),
        Some(ApiError::Status { status: 500, .. })
    ));
    assert_eq!(
        *cache
            .get::<Vec<ChatMessage>>(&QueryKey::messages(Some("123")))
            .unwrap(),
        before
    );
    assert_eq!(service.phase(Some("123")), ChatPhase::Failed);
    mock.assert_async().await;

    return Ok(());
}

#[tokio::test]
async fn it_removes_the_draft_when_a_new_chat_fails() -> Result<()> {
    let (service, cache) = service("http://127.0.0.1:1".to_string());

    let res = service
        .send_message(SendMessage::new("Hello", LlmModelDescriptor::agent()))
        .await;

    assert!(res.is_err());
    assert!(cache
        .get::<Vec<ChatMessage>>(&QueryKey::messages(None))
        .is_none());
    assert_eq!(service.phase(None), ChatPhase::Failed);

    return Ok(());
}

#[tokio::test]
async fn it_rejects_empty_messages_without_sending() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let (service, cache) = service(server.url());
    let err = service
        .send_message(SendMessage::new("   \n", gpt()))
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ApiError>(),
        Some(ApiError::Validation(_))
    ));
    assert!(cache
        .get::<Vec<ChatMessage>>(&QueryKey::messages(None))
        .is_none());
    mock.assert_async().await;

    return Ok(());
}

#[tokio::test]
async fn it_prefers_file_ids_over_pages() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/v1/chat/completions")
        .match_body(Matcher::Json(json!({
            "message": "What is in these?",
            "model": "gpt-4o",
            "file_ids": ["f-1", "f-2"]
        })))
        .with_status(200)
        .with_body(assistant_message_json("456", "m-1", "Two reports").to_string())
        .create_async()
        .await;

    let (service, _cache) = service(server.url());
    let mut req = SendMessage::new("What is in these?", gpt());
    req.file_ids = vec!["f-1".to_string(), "f-2".to_string()];
    req.pages = Some(json!({"a.pdf": {"1": "page text"}}));
    let res = service.send_message(req).await?;

    assert_eq!(res.chat_id, "456");
    mock.assert_async().await;

    return Ok(());
}

#[test]
fn it_rejects_double_submits() -> Result<()> {
    let (service, _cache) = service("http://127.0.0.1:1".to_string());

    assert_eq!(service.compose(Some("123"), "Hi"), ChatPhase::Composing);
    service.begin_submit(Some("123"))?;
    assert_eq!(service.compose(Some("123"), ""), ChatPhase::Submitting);

    let err = service.begin_submit(Some("123")).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ApiError>(),
        Some(ApiError::Validation(_))
    ));
    service.begin_submit(Some("456"))?;

    return Ok(());
}

#[tokio::test]
async fn it_invalidates_only_the_listing_on_delete() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("DELETE", "/api/v1/chat/123")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let (service, cache) = service(server.url());
    cache.set(&QueryKey::chats(), Vec::<String>::new());
    cache.set(&QueryKey::messages(Some("123")), vec![existing_message("123")]);

    service.delete_chat("123").await?;

    assert!(cache.is_stale(&QueryKey::chats()));
    assert!(!cache.is_stale(&QueryKey::messages(Some("123"))));
    mock.assert_async().await;

    return Ok(());
}

#[tokio::test]
async fn it_reads_messages_through_the_cache() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/chat/123/messages")
        .with_status(200)
        .with_body(json!([assistant_message_json("123", "m-1", "Hi there")]).to_string())
        .expect(1)
        .create_async()
        .await;

    let (service, _cache) = service(server.url());
    let cancel = CancellationToken::new();
    let first = service.chat_messages("123", &cancel).await?;
    let second = service.chat_messages("123", &cancel).await?;

    assert_eq!(first, second);
    assert_eq!(first[0].content, "Hi there");
    mock.assert_async().await;

    return Ok(());
}

fn session_json(uuid: &str, name: &str) -> serde_json::Value {
    return json!({
        "uuid": uuid,
        "name": name,
        "created_at": "2025-01-01T00:00:00",
        "updated_at": "2025-01-01T00:00:00"
    });
}

#[tokio::test]
async fn it_renames_chats() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("PATCH", "/api/v1/chat/123")
        .match_body(Matcher::Json(json!({ "name": "Budget" })))
        .with_status(200)
        .with_body(session_json("123", "Budget").to_string())
        .create_async()
        .await;

    let (service, cache) = service(server.url());
    let sessions: Vec<ChatSession> = serde_json::from_value(json!([
        session_json("123", "Old"),
        session_json("456", "Other")
    ]))?;
    cache.set(&QueryKey::chats(), sessions);

    let res = service.rename_chat("123", "  Budget ").await?;
    assert_eq!(res.name, "Budget");

    let cached = cache.get::<Vec<ChatSession>>(&QueryKey::chats()).unwrap();
    assert_eq!(cached[0].name, "Budget");
    assert_eq!(cached[1].name, "Other");
    assert!(cache.is_stale(&QueryKey::chats()));
    mock.assert_async().await;

    return Ok(());
}

#[tokio::test]
async fn it_restores_the_name_when_rename_fails() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("PATCH", "/api/v1/chat/123")
        .with_status(500)
        .create_async()
        .await;

    let (service, cache) = service(server.url());
    let sessions: Vec<ChatSession> =
        serde_json::from_value(json!([session_json("123", "Old")]))?;
    cache.set(&QueryKey::chats(), sessions);

    assert!(service.rename_chat("123", "Budget").await.is_err());

    let cached = cache.get::<Vec<ChatSession>>(&QueryKey::chats()).unwrap();
    assert_eq!(cached[0].name, "Old");
    assert!(!cache.is_stale(&QueryKey::chats()));

    let err = service.rename_chat("123", " ").await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ApiError>(),
        Some(ApiError::Validation(_))
    ));

    return Ok(());
}
