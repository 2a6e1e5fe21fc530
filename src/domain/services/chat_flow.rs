#[cfg(test)]
#[path = "chat_flow_test.rs"]
mod tests;

use std::sync::Arc;

use anyhow::bail;
use anyhow::Result;
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

use super::Mutation;
use super::with_optimistic;
use super::OptimisticUpdate;
use super::QueryCache;
use crate::domain::models::ApiBox;
use crate::domain::models::ApiError;
use crate::domain::models::ChatMessage;
use crate::domain::models::ChatSession;
use crate::domain::models::CompletionEndpoint;
use crate::domain::models::CompletionRequest;
use crate::domain::models::LlmModelDescriptor;
use crate::domain::models::QueryKey;
use crate::domain::models::Route;
use crate::domain::models::DRAFT_CHAT_ID;

#[derive(Copy, Clone, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ChatPhase {
    Empty,
    Composing,
    Submitting,
    Idle,
    Failed,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SendMessage {
    pub text: String,
    pub model: LlmModelDescriptor,
    /// `None` starts a new chat.
    pub chat_id: Option<String>,
    pub knowledge_base_id: Option<String>,
    pub file_ids: Vec<String>,
    pub pages: Option<serde_json::Value>,
}

impl SendMessage {
    pub fn new(text: &str, model: LlmModelDescriptor) -> SendMessage {
        return SendMessage {
            text: text.to_string(),
            model,
            chat_id: None,
            knowledge_base_id: None,
            file_ids: vec![],
            pages: None,
        };
    }

    fn payload(&self) -> CompletionRequest {
        // Attached files replace the legacy page context.
        let pages = if self.file_ids.is_empty() {
            self.pages.clone()
        } else {
            None
        };

        return CompletionRequest {
            message: self.text.trim().to_string(),
            model: self.model.model.to_string(),
            chat_id: self.chat_id.clone(),
            knowledge_base_id: self.knowledge_base_id.clone(),
            file_ids: self.file_ids.clone(),
            pages,
        };
    }

    fn endpoint(&self) -> CompletionEndpoint {
        if self.model.is_agent() {
            return CompletionEndpoint::Agent;
        }
        return CompletionEndpoint::Llm;
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentMessage {
    pub chat_id: String,
    pub reply: ChatMessage,
    /// Set when the send created a chat and the view should move to it.
    pub navigate_to: Option<Route>,
}

fn append(message: ChatMessage) -> impl FnOnce(Option<&Vec<ChatMessage>>) -> Vec<ChatMessage> {
    return move |current: Option<&Vec<ChatMessage>>| -> Vec<ChatMessage> {
        let mut messages = current.cloned().unwrap_or_default();
        messages.push(message);
        return messages;
    };
}

pub struct ChatService {
    api: ApiBox,
    cache: Arc<QueryCache>,
    phases: DashMap<String, ChatPhase>,
}

impl ChatService {
    pub fn new(api: ApiBox, cache: Arc<QueryCache>) -> ChatService {
        return ChatService {
            api,
            cache,
            phases: DashMap::new(),
        };
    }

    fn phase_key(chat_id: Option<&str>) -> String {
        return chat_id.unwrap_or(DRAFT_CHAT_ID).to_string();
    }

    pub fn phase(&self, chat_id: Option<&str>) -> ChatPhase {
        return self
            .phases
            .get(&ChatService::phase_key(chat_id))
            .map(|e| return *e)
            .unwrap_or(ChatPhase::Empty);
    }

    /// Tracks the input box. A pending submission keeps its phase.
    pub fn compose(&self, chat_id: Option<&str>, text: &str) -> ChatPhase {
        let key = ChatService::phase_key(chat_id);
        let mut phase = self.phases.entry(key).or_insert(ChatPhase::Empty);
        if *phase != ChatPhase::Submitting {
            *phase = if text.trim().is_empty() {
                ChatPhase::Empty
            } else {
                ChatPhase::Composing
            };
        }

        return *phase;
    }

    fn begin_submit(&self, chat_id: Option<&str>) -> Result<()> {
        let mut phase = self
            .phases
            .entry(ChatService::phase_key(chat_id))
            .or_insert(ChatPhase::Empty);
        if *phase == ChatPhase::Submitting {
            bail!(ApiError::Validation(
                "A message is already being sent to this chat".to_string()
            ));
        }
        *phase = ChatPhase::Submitting;

        return Ok(());
    }

    fn set_phase(&self, chat_id: Option<&str>, phase: ChatPhase) {
        self.phases.insert(ChatService::phase_key(chat_id), phase);
    }

    /// Sends a message. The user's message shows up in the message cache
    /// before the backend answers and is rolled back when the send fails.
    pub async fn send_message(&self, req: SendMessage) -> Result<SentMessage> {
        let text = req.text.trim();
        if text.is_empty() {
            bail!(ApiError::Validation("Message cannot be empty".to_string()));
        }

        let chat_id = req.chat_id.as_deref();
        self.begin_submit(chat_id)?;

        let key = QueryKey::messages(chat_id);
        let user_message = ChatMessage::optimistic_user(text, &req.model.model, chat_id);
        let update = OptimisticUpdate::apply(&self.cache, &key, append(user_message.clone()));

        let endpoint = req.endpoint();
        tracing::debug!(
            endpoint = %endpoint,
            chat_id = chat_id.unwrap_or(DRAFT_CHAT_ID),
            "Sending message"
        );

        let res = self
            .api
            .post_completion(endpoint, &req.payload())
            .await
            .and_then(|reply| {
                let returned_id = reply
                    .chat_id
                    .clone()
                    .or_else(|| return req.chat_id.clone());
                match returned_id {
                    Some(id) => return Ok((id, reply)),
                    None => bail!(ApiError::Decode(
                        "completion response has no chat id".to_string()
                    )),
                }
            });

        let (new_id, reply) = match res {
            Ok(res) => res,
            Err(err) => {
                tracing::error!(error = %err, "Failed to send message, rolling back");
                update.rollback();
                self.set_phase(chat_id, ChatPhase::Failed);
                return Err(err);
            }
        };
        update.commit();

        let mut navigate_to = None;
        match chat_id {
            Some(id) => {
                self.cache
                    .update(&QueryKey::messages(Some(id)), append(reply.clone()));
            }
            None => {
                let mut first = user_message;
                first.chat_id = Some(new_id.to_string());
                self.cache
                    .set(&QueryKey::messages(Some(&new_id)), vec![first, reply.clone()]);
                self.cache.remove(&key);
                self.phases.remove(DRAFT_CHAT_ID);

                Mutation::CreateChat {
                    id: new_id.to_string(),
                }
                .apply(&self.cache);
                navigate_to = Some(Route::Chat(new_id.to_string()));
            }
        }
        self.set_phase(Some(&new_id), ChatPhase::Idle);

        return Ok(SentMessage {
            chat_id: new_id,
            reply,
            navigate_to,
        });
    }

    pub async fn list_chats(&self, cancel: &CancellationToken) -> Result<Arc<Vec<ChatSession>>> {
        let api = self.api.clone();
        return self
            .cache
            .fetch(&QueryKey::chats(), cancel, || {
                return async move { return api.list_chats().await };
            })
            .await;
    }

    pub async fn chat_messages(
        &self,
        chat_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Arc<Vec<ChatMessage>>> {
        let api = self.api.clone();
        let id = chat_id.to_string();
        return self
            .cache
            .fetch(&QueryKey::messages(Some(chat_id)), cancel, || {
                return async move { return api.chat_messages(&id).await };
            })
            .await;
    }

    pub async fn rename_chat(&self, chat_id: &str, name: &str) -> Result<ChatSession> {
        let name = name.trim();
        if name.is_empty() {
            bail!(ApiError::Validation("Chat name cannot be empty".to_string()));
        }

        // Show the new name in a cached listing while the request runs.
        let key = QueryKey::chats();
        let session = if self.cache.get::<Vec<ChatSession>>(&key).is_some() {
            let renamed = |sessions: Option<&Vec<ChatSession>>| {
                return sessions
                    .cloned()
                    .unwrap_or_default()
                    .into_iter()
                    .map(|mut session| {
                        if session.uuid == chat_id {
                            session.name = name.to_string();
                        }
                        return session;
                    })
                    .collect::<Vec<ChatSession>>();
            };
            with_optimistic(&self.cache, &key, renamed, || {
                return self.api.rename_chat(chat_id, name);
            })
            .await?
        } else {
            self.api.rename_chat(chat_id, name).await?
        };

        Mutation::RenameChat {
            id: chat_id.to_string(),
        }
        .apply(&self.cache);

        return Ok(session);
    }

    pub async fn delete_chat(&self, chat_id: &str) -> Result<()> {
        self.api.delete_chat(chat_id).await?;
        self.phases.remove(chat_id);
        Mutation::DeleteChat {
            id: chat_id.to_string(),
        }
        .apply(&self.cache);

        return Ok(());
    }
}
