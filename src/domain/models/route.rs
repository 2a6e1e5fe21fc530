use reqwest::Url;

pub const SOURCES_PATH: &str = "/settings/sources";
pub const OAUTH_CALLBACK_PATH: &str = "/oauth/callback";

/// Where the view should go after a flow settles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    Chat(String),
    Sources { error: Option<String> },
}

impl Route {
    pub fn to_path(&self) -> String {
        match self {
            Route::Chat(id) => return format!("/chat/{id}"),
            Route::Sources { error: None } => return SOURCES_PATH.to_string(),
            Route::Sources { error: Some(code) } => {
                let query = Url::parse_with_params("http://localhost/", &[("error", code)])
                    .ok()
                    .and_then(|url| return url.query().map(|e| return e.to_string()))
                    .unwrap_or_default();
                return format!("{SOURCES_PATH}?{query}");
            }
        }
    }
}
