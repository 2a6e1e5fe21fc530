#[cfg(test)]
#[path = "query_key_test.rs"]
mod tests;

use std::fmt;

use super::ExternalProvider;

/// Hierarchical address of a cached server resource. The first segment is the
/// namespace, later segments discriminate. Keys sharing a prefix are
/// invalidated together.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<String>);

/// Message list key used for a chat the server has not created yet.
pub const DRAFT_CHAT_ID: &str = "new";

impl QueryKey {
    pub fn new(segments: &[&str]) -> QueryKey {
        return QueryKey(segments.iter().map(|e| return e.to_string()).collect());
    }

    pub fn chats() -> QueryKey {
        return QueryKey::new(&["chats"]);
    }

    pub fn messages(chat_id: Option<&str>) -> QueryKey {
        return QueryKey::new(&["messages", chat_id.unwrap_or(DRAFT_CHAT_ID)]);
    }

    pub fn knowledge_bases() -> QueryKey {
        return QueryKey::new(&["knowledge-bases"]);
    }

    pub fn knowledge_base(id: &str) -> QueryKey {
        return QueryKey::new(&["knowledge-bases", id]);
    }

    pub fn files(knowledge_base_id: Option<&str>) -> QueryKey {
        return match knowledge_base_id {
            Some(id) => QueryKey::new(&["files", id]),
            None => QueryKey::new(&["files"]),
        };
    }

    pub fn file(id: &str, include_content: bool) -> QueryKey {
        let content = if include_content { "content" } else { "meta" };
        return QueryKey::new(&["file", id, content]);
    }

    pub fn external_files(provider: ExternalProvider, folder_id: Option<&str>) -> QueryKey {
        let provider = provider.to_string();
        return match folder_id {
            Some(id) => QueryKey::new(&["external-files", &provider, id]),
            None => QueryKey::new(&["external-files", &provider]),
        };
    }

    pub fn oauth_providers() -> QueryKey {
        return QueryKey::new(&["oauth-providers"]);
    }

    pub fn current_user() -> QueryKey {
        return QueryKey::new(&["current-user"]);
    }

    pub fn llm_catalog() -> QueryKey {
        return QueryKey::new(&["llm-catalog"]);
    }

    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        return self.0.starts_with(&prefix.0);
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        return write!(f, "{}", self.0.join("/"));
    }
}
