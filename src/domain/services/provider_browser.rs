#[cfg(test)]
#[path = "provider_browser_test.rs"]
mod tests;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::QueryCache;
use crate::domain::models::ApiBox;
use crate::domain::models::ApiError;
use crate::domain::models::ExternalFile;
use crate::domain::models::ExternalFileType;
use crate::domain::models::ExternalProvider;
use crate::domain::models::QueryKey;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BrowseOutcome {
    /// The browser moved into a folder and needs a new listing.
    OpenFolder(String),
    /// The file should be uploaded through the provider's origin.
    Upload(String),
    /// Web links are shown but do nothing.
    Inert,
}

/// Navigation state for one provider's file picker. Search only filters the
/// current listing and never reaches the backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderBrowser {
    pub provider: ExternalProvider,
    pub folder_id: Option<String>,
    pub search: String,
}

impl ProviderBrowser {
    pub fn new(provider: ExternalProvider) -> ProviderBrowser {
        return ProviderBrowser {
            provider,
            folder_id: provider.root_folder_id(),
            search: "".to_string(),
        };
    }

    pub fn listing_key(&self) -> QueryKey {
        return QueryKey::external_files(self.provider, self.folder_id.as_deref());
    }

    pub fn is_root(&self) -> bool {
        return self.folder_id == self.provider.root_folder_id();
    }

    pub fn set_search(&mut self, search: &str) {
        self.search = search.to_string();
    }

    /// Returns to the provider's root folder.
    pub fn reset(&mut self) {
        self.folder_id = self.provider.root_folder_id();
        self.search = "".to_string();
    }

    /// Lists the current folder. A failed listing is logged and shown as
    /// empty.
    pub async fn load(
        &self,
        cache: &QueryCache,
        api: &ApiBox,
        cancel: &CancellationToken,
    ) -> Arc<Vec<ExternalFile>> {
        let api = api.clone();
        let provider = self.provider;
        let folder_id = self.folder_id.clone();

        let res = cache
            .fetch(&self.listing_key(), cancel, || {
                return async move {
                    return api
                        .list_external_files(provider, folder_id.as_deref())
                        .await;
                };
            })
            .await;

        match res {
            Ok(listing) => return listing,
            Err(err) => {
                let cancelled = err
                    .downcast_ref::<ApiError>()
                    .map(|e| return e.is_cancelled())
                    .unwrap_or(false);
                if cancelled {
                    return Arc::new(vec![]);
                }

                tracing::error!(
                    provider = %self.provider,
                    folder_id = self.folder_id.as_deref().unwrap_or_default(),
                    error = %err,
                    "Failed to list provider files"
                );
                return Arc::new(vec![]);
            }
        }
    }

    pub fn filtered<'a>(&self, listing: &'a [ExternalFile]) -> Vec<&'a ExternalFile> {
        let search = self.search.trim().to_lowercase();
        return listing
            .iter()
            .filter(|e| return search.is_empty() || e.name.to_lowercase().contains(&search))
            .collect();
    }

    pub fn select(&mut self, entry: &ExternalFile) -> BrowseOutcome {
        match entry.file_type {
            ExternalFileType::Folder => {
                self.folder_id = Some(entry.id.to_string());
                self.search = "".to_string();
                return BrowseOutcome::OpenFolder(entry.id.to_string());
            }
            ExternalFileType::File => return BrowseOutcome::Upload(entry.id.to_string()),
            ExternalFileType::WebLink => return BrowseOutcome::Inert,
        }
    }
}
