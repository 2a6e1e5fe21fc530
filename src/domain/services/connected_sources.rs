#[cfg(test)]
#[path = "connected_sources_test.rs"]
mod tests;

use crate::domain::models::ConnectedSource;
use crate::domain::models::OAuthProvider;
use crate::domain::models::SourceStatus;
use crate::domain::models::User;

/// Document sources the user has linked, one entry per source. Identities are
/// matched on their exact provider tag.
pub fn connected_sources(user: &User) -> Vec<ConnectedSource> {
    let mut res: Vec<ConnectedSource> = vec![];
    for identity in user.identities.iter() {
        if let Some(source) = identity.provider_type.source() {
            if !res.iter().any(|e| return e.source == source) {
                res.push(ConnectedSource {
                    source,
                    is_connected: true,
                });
            }
        }
    }

    return res;
}

pub fn source_statuses(providers: &[OAuthProvider], user: Option<&User>) -> Vec<SourceStatus> {
    let connected = user.map(connected_sources).unwrap_or_default();

    return providers
        .iter()
        .map(|provider| {
            let is_connected = provider
                .provider_type
                .source()
                .map(|source| return connected.iter().any(|e| return e.source == source))
                .unwrap_or(false);

            return SourceStatus {
                provider: provider.clone(),
                is_connected,
            };
        })
        .collect();
}
