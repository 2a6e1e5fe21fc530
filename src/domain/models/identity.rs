use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use super::ExternalProvider;

/// Identity tag decided by the backend. Unknown tags are kept verbatim so a
/// newer backend does not break deserialization.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProviderType {
    GoogleOauth,
    BoxOauth,
    DatarobotUser,
    ExternalEmail,
    Other(String),
}

impl From<String> for ProviderType {
    fn from(value: String) -> ProviderType {
        return match value.as_str() {
            "google_oauth" => ProviderType::GoogleOauth,
            "box_oauth" => ProviderType::BoxOauth,
            "datarobot_user" => ProviderType::DatarobotUser,
            "external_email" => ProviderType::ExternalEmail,
            _ => ProviderType::Other(value),
        };
    }
}

impl From<ProviderType> for String {
    fn from(value: ProviderType) -> String {
        return value.to_string();
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProviderType::GoogleOauth => return write!(f, "google_oauth"),
            ProviderType::BoxOauth => return write!(f, "box_oauth"),
            ProviderType::DatarobotUser => return write!(f, "datarobot_user"),
            ProviderType::ExternalEmail => return write!(f, "external_email"),
            ProviderType::Other(tag) => return write!(f, "{tag}"),
        }
    }
}

impl ProviderType {
    /// The document source this identity links, matched on the exact tag.
    pub fn source(&self) -> Option<ExternalProvider> {
        return match self {
            ProviderType::GoogleOauth => Some(ExternalProvider::Google),
            ProviderType::BoxOauth => Some(ExternalProvider::Box),
            _ => None,
        };
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub provider_type: ProviderType,
    #[serde(default)]
    pub provider_id: Option<String>,
    #[serde(default)]
    pub provider_user_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub uuid: String,
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub identities: Vec<Identity>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthProvider {
    pub id: String,
    #[serde(rename = "type")]
    pub provider_type: ProviderType,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthProviderList {
    pub providers: Vec<OAuthProvider>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizeRequest {
    pub provider_id: String,
    pub redirect_uri: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizeResponse {
    pub redirect_url: String,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ConnectedSource {
    pub source: ExternalProvider,
    pub is_connected: bool,
}

/// An available provider paired with whether the user has linked it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceStatus {
    pub provider: OAuthProvider,
    pub is_connected: bool,
}
