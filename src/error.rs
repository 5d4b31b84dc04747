use reqwest::StatusCode;

/// Failures talking to the file server.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("not authorized")]
    Unauthorized,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("server returned {status}: {message}")]
    Http { status: StatusCode, message: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid server URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Map a non-success status and its body onto an error. `subject` names
    /// the path the request was about.
    pub fn from_status(status: StatusCode, body: &str, subject: &str) -> Self {
        let message = server_message(body).unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string()
            } else {
                trimmed.to_string()
            }
        });
        match status {
            StatusCode::NOT_FOUND => ApiError::NotFound(subject.to_string()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized,
            StatusCode::CONFLICT => ApiError::Conflict(message),
            _ => ApiError::Http { status, message },
        }
    }
}

/// Pull `message` or `error` out of a JSON error body.
fn server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .or_else(|| value.get("error"))
        .and_then(|m| m.as_str())
        .map(String::from)
}
