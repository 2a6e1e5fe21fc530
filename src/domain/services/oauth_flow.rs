#[cfg(test)]
#[path = "oauth_flow_test.rs"]
mod tests;

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use reqwest::Url;
use tokio_util::sync::CancellationToken;

use super::QueryCache;
use crate::domain::models::ApiBox;
use crate::domain::models::AuthorizeRequest;
use crate::domain::models::OAuthProvider;
use crate::domain::models::QueryKey;
use crate::domain::models::Route;
use crate::domain::models::OAUTH_CALLBACK_PATH;

/// Error code shown on the sources page when the callback exchange fails.
pub const OAUTH_CALLBACK_FAILED: &str = "oauth_callback_failed";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OAuthState {
    Idle,
    /// The user should be sent to the provider's consent page.
    Redirecting { url: String },
    Exchanging,
    Settled(Route),
}

/// Parses callback parameters from a query string, a `?`-prefixed query or a
/// full callback URL.
pub fn parse_callback_query(query: &str) -> BTreeMap<String, String> {
    let query = query.trim();
    let url = if query.contains("://") {
        Url::parse(query)
    } else {
        Url::parse(&format!(
            "http://localhost{OAUTH_CALLBACK_PATH}?{}",
            query.trim_start_matches('?')
        ))
    };

    match url {
        Ok(url) => {
            return url
                .query_pairs()
                .map(|(key, val)| return (key.to_string(), val.to_string()))
                .collect();
        }
        Err(err) => {
            tracing::warn!(error = %err, "Unparseable callback query");
            return BTreeMap::new();
        }
    }
}

pub struct OAuthFlow {
    api: ApiBox,
    cache: Arc<QueryCache>,
    app_url: String,
    state: OAuthState,
}

impl OAuthFlow {
    pub fn new(api: ApiBox, cache: Arc<QueryCache>, app_url: &str) -> OAuthFlow {
        return OAuthFlow {
            api,
            cache,
            app_url: app_url.trim_end_matches('/').to_string(),
            state: OAuthState::Idle,
        };
    }

    #[cfg(test)]
    pub fn state(&self) -> &OAuthState {
        return &self.state;
    }

    pub fn redirect_uri(&self) -> String {
        return format!("{}{OAUTH_CALLBACK_PATH}", self.app_url);
    }

    pub async fn available_providers(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Arc<Vec<OAuthProvider>>> {
        let api = self.api.clone();
        return self
            .cache
            .fetch(&QueryKey::oauth_providers(), cancel, || {
                return async move { return api.oauth_providers().await };
            })
            .await;
    }

    pub async fn authorize(&mut self, provider_id: &str) -> Result<&OAuthState> {
        let req = AuthorizeRequest {
            provider_id: provider_id.to_string(),
            redirect_uri: self.redirect_uri(),
        };
        tracing::debug!(provider_id, redirect_uri = req.redirect_uri.as_str(), "Authorizing");

        let res = self.api.oauth_authorize(&req).await;
        match res {
            Ok(res) => {
                self.state = OAuthState::Redirecting {
                    url: res.redirect_url,
                };
                return Ok(&self.state);
            }
            Err(err) => {
                self.state = OAuthState::Idle;
                return Err(err);
            }
        }
    }

    /// Finishes a connection from the parameters the provider redirected
    /// back with. Provider errors are relayed verbatim without contacting
    /// the backend.
    pub async fn handle_callback(&mut self, params: &BTreeMap<String, String>) -> Route {
        let route = self.exchange(params).await;
        self.state = OAuthState::Settled(route.clone());
        return route;
    }

    async fn exchange(&mut self, params: &BTreeMap<String, String>) -> Route {
        if let Some(error) = params.get("error") {
            tracing::warn!(error = error.as_str(), "Provider returned an error");
            return Route::Sources {
                error: Some(error.to_string()),
            };
        }

        if !params.contains_key("state") {
            tracing::warn!("Callback has neither an error nor a state parameter");
            return Route::Sources {
                error: Some(OAUTH_CALLBACK_FAILED.to_string()),
            };
        }

        self.state = OAuthState::Exchanging;
        match self.api.oauth_callback(params).await {
            Ok(_) => {
                self.cache.invalidate(&QueryKey::current_user());
                return Route::Sources { error: None };
            }
            Err(err) => {
                tracing::error!(error = %err, "OAuth callback exchange failed");
                return Route::Sources {
                    error: Some(OAUTH_CALLBACK_FAILED.to_string()),
                };
            }
        }
    }
}
