use std::env;

use serde_json::json;
use serde_json::Value;

pub fn insta_snapshot<F: FnOnce()>(f: F) {
    let mut settings = insta::Settings::clone_current();
    let snapshot_path = env::current_dir().unwrap().join("./test/snapshots");
    settings.set_snapshot_path(snapshot_path);
    settings.bind(f);
}

pub fn file_record_json(uuid: &str, filename: &str) -> Value {
    return json!({
        "uuid": uuid,
        "filename": filename,
        "source": "local",
        "file_path": format!("/uploads/{filename}"),
        "mime_type": "application/pdf",
        "size_bytes": 1024,
        "added": "2025-01-01T00:00:00+00:00",
        "knowledge_base_id": 1,
        "owner_uuid": "user-1"
    });
}

pub fn file_record_with_content_json(uuid: &str, filename: &str, text: &str) -> Value {
    let mut body = file_record_json(uuid, filename);
    body["encoded_content"] = json!({ "1": text });
    return body;
}

pub fn knowledge_base_json(uuid: &str, title: &str) -> Value {
    return json!({
        "uuid": uuid,
        "title": title,
        "description": format!("All about {title}"),
        "token_count": 1200,
        "path": format!("kb/{uuid}"),
        "created_at": "2025-01-01T00:00:00+00:00",
        "updated_at": "2025-01-02T00:00:00+00:00",
        "owner_uuid": "user-1",
        "files": []
    });
}

pub fn assistant_message_json(chat_id: &str, uuid: &str, content: &str) -> Value {
    return json!({
        "role": "assistant",
        "content": content,
        "chat_id": chat_id,
        "uuid": uuid
    });
}

pub fn user_json(provider_types: &[&str]) -> Value {
    let identities = provider_types
        .iter()
        .map(|provider_type| return json!({ "provider_type": provider_type }))
        .collect::<Vec<Value>>();

    return json!({
        "uuid": "user-1",
        "email": "user@example.com",
        "identities": identities
    });
}
