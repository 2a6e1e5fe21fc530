use std::fmt;

/// Failures surfaced by the backend client. Boxed into `anyhow::Error` and
/// recovered with `downcast_ref` where callers need to tell them apart.
#[derive(Clone, Debug, PartialEq)]
pub enum ApiError {
    /// The request never completed.
    Transport(String),
    /// The server answered with an error status. `body` holds the structured
    /// payload when the server sent one.
    Status {
        status: u16,
        body: Option<serde_json::Value>,
    },
    Decode(String),
    Cancelled,
    /// Rejected locally, never sent.
    Validation(String),
}

impl ApiError {
    pub fn is_cancelled(&self) -> bool {
        return *self == ApiError::Cancelled;
    }

    pub fn detail(&self) -> Option<&serde_json::Value> {
        return match self {
            ApiError::Status { body, .. } => body.as_ref(),
            _ => None,
        };
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ApiError::Transport(msg) => return write!(f, "request failed: {msg}"),
            ApiError::Status { status, body: None } => {
                return write!(f, "server responded with status {status}")
            }
            ApiError::Status {
                status,
                body: Some(body),
            } => return write!(f, "server responded with status {status}: {body}"),
            ApiError::Decode(msg) => return write!(f, "unexpected response: {msg}"),
            ApiError::Cancelled => return write!(f, "request cancelled"),
            ApiError::Validation(msg) => return write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> ApiError {
        return match err.downcast::<ApiError>() {
            Ok(api_err) => api_err,
            Err(err) => ApiError::Transport(format!("{err:#}")),
        };
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> ApiError {
        if err.is_decode() {
            return ApiError::Decode(err.to_string());
        }
        return ApiError::Transport(err.to_string());
    }
}
