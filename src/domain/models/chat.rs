#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;

use serde::Deserialize;
use serde::Serialize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A chat as listed by the backend. `updated_at` and `model` reflect the last
/// message in the chat.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSession {
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub model: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_progress: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl ChatMessage {
    /// Builds the local copy of a message the user just submitted. It has no
    /// server identifier until the backend answers.
    pub fn optimistic_user(text: &str, model: &str, chat_id: Option<&str>) -> ChatMessage {
        return ChatMessage {
            role: Role::User,
            content: text.to_string(),
            chat_id: chat_id.map(|id| return id.to_string()),
            components: None,
            error: None,
            in_progress: None,
            model: Some(model.to_string()),
            uuid: None,
            created_at: None,
        };
    }

    pub fn is_local(&self) -> bool {
        return self.uuid.is_none();
    }

    pub fn has_error(&self) -> bool {
        return self
            .error
            .as_ref()
            .map(|err| return !err.is_empty())
            .unwrap_or(false);
    }
}
