#[cfg(test)]
#[path = "invalidation_test.rs"]
mod tests;

use super::QueryCache;
use crate::domain::models::QueryKey;

/// A server write and the cached reads it makes stale.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mutation {
    CreateKnowledgeBase,
    UpdateKnowledgeBase { id: String },
    DeleteKnowledgeBase { id: String },
    UploadFiles,
    UpdateFile { id: String },
    DeleteFile { id: String },
    RenameChat { id: String },
    DeleteChat { id: String },
    CreateChat { id: String },
}

impl Mutation {
    pub fn invalidations(&self) -> Vec<QueryKey> {
        match self {
            Mutation::CreateKnowledgeBase => return vec![QueryKey::knowledge_bases()],
            Mutation::UpdateKnowledgeBase { id } | Mutation::DeleteKnowledgeBase { id } => {
                return vec![QueryKey::knowledge_bases(), QueryKey::knowledge_base(id)];
            }
            // The unscoped listing holds the new files as well, its prefix
            // covers every knowledge base scoped listing.
            Mutation::UploadFiles => {
                return vec![QueryKey::knowledge_bases(), QueryKey::files(None)];
            }
            // Token counts and file lists of knowledge bases change with files.
            Mutation::UpdateFile { .. } | Mutation::DeleteFile { .. } => {
                return vec![QueryKey::files(None), QueryKey::knowledge_bases()];
            }
            // Message caches stay, only the listing changes.
            Mutation::RenameChat { .. } | Mutation::DeleteChat { .. } | Mutation::CreateChat { .. } => {
                return vec![QueryKey::chats()];
            }
        }
    }

    pub fn apply(&self, cache: &QueryCache) {
        tracing::debug!(mutation = ?self, "Applying invalidations");
        for key in self.invalidations().iter() {
            cache.invalidate(key);
        }
    }
}
