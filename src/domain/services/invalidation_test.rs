use std::time::Duration;

use super::Mutation;
use crate::domain::models::QueryKey;
use crate::domain::services::QueryCache;

#[test]
fn it_invalidates_only_the_listing_for_new_knowledge_bases() {
    assert_eq!(
        Mutation::CreateKnowledgeBase.invalidations(),
        vec![QueryKey::knowledge_bases()]
    );
}

#[test]
fn it_invalidates_the_knowledge_base_and_its_listing() {
    let mutation = Mutation::DeleteKnowledgeBase {
        id: "kb-1".to_string(),
    };
    assert_eq!(
        mutation.invalidations(),
        vec![QueryKey::knowledge_bases(), QueryKey::knowledge_base("kb-1")]
    );
}

#[test]
fn it_invalidates_every_file_listing_on_uploads() {
    let mutation = Mutation::UploadFiles;
    assert_eq!(
        mutation.invalidations(),
        vec![QueryKey::knowledge_bases(), QueryKey::files(None)]
    );

    let cache = QueryCache::new(Duration::from_secs(60));
    cache.set(&QueryKey::files(None), 1);
    cache.set(&QueryKey::files(Some("kb-1")), 2);
    cache.set(&QueryKey::files(Some("kb-2")), 3);
    cache.set(&QueryKey::file("f-1", false), 4);

    mutation.apply(&cache);

    assert!(cache.is_stale(&QueryKey::files(None)));
    assert!(cache.is_stale(&QueryKey::files(Some("kb-1"))));
    assert!(cache.is_stale(&QueryKey::files(Some("kb-2"))));
    assert!(!cache.is_stale(&QueryKey::file("f-1", false)));
}

#[test]
fn it_leaves_message_caches_on_chat_deletes() {
    let cache = QueryCache::new(Duration::from_secs(60));
    cache.set(&QueryKey::chats(), 1);
    cache.set(&QueryKey::messages(Some("123")), 2);

    Mutation::DeleteChat {
        id: "123".to_string(),
    }
    .apply(&cache);

    assert!(cache.is_stale(&QueryKey::chats()));
    assert!(!cache.is_stale(&QueryKey::messages(Some("123"))));
}

#[test]
fn it_refreshes_knowledge_bases_when_files_change() {
    let cache = QueryCache::new(Duration::from_secs(60));
    cache.set(&QueryKey::knowledge_bases(), 1);
    cache.set(&QueryKey::files(Some("kb-1")), 2);
    cache.set(&QueryKey::chats(), 3);

    Mutation::UpdateFile {
        id: "f-1".to_string(),
    }
    .apply(&cache);

    assert!(cache.is_stale(&QueryKey::knowledge_bases()));
    assert!(cache.is_stale(&QueryKey::files(Some("kb-1"))));
    assert!(!cache.is_stale(&QueryKey::chats()));
}
